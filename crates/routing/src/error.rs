use thiserror::Error;

/// Errors that abort a planning call. Anything that merely rules out a route is
/// reported as an absent route instead.
#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("no read-only provider available for chain {chain_id}")]
    Provider { chain_id: u32 },

    #[error("failed to estimate bridge approval gas for {token}: {reason}")]
    BridgeGasEstimate { token: String, reason: String },

    #[error("failed to fetch bridge fee estimate from chain {from_chain} to {to_chain}: {reason}")]
    BridgeFeeEstimate {
        from_chain: u32,
        to_chain: u32,
        reason: String,
    },

    #[error("unsupported chain: {chain_id}")]
    UnsupportedChain { chain_id: u32 },

    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl RoutingError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Provider { .. } => "PROVIDER_ERROR",
            Self::BridgeGasEstimate { .. } => "BRIDGE_GAS_ESTIMATE_ERROR",
            Self::BridgeFeeEstimate { .. } => "BRIDGE_FEE_ESTIMATE_ERROR",
            Self::UnsupportedChain { .. } => "UNSUPPORTED_CHAIN",
            Self::Snapshot(_) => "SNAPSHOT_ERROR",
        }
    }
}
