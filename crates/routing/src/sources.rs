//! Boundaries to the systems the planner reads from: balances, allow-lists, DEX quotes and
//! the bridge. Implementations encode "nothing found" in their return values; only the
//! bridge estimates can fail outright.

use std::fmt::Debug;

use async_trait::async_trait;

use crate::{
    Address, DexQuotes, ReadOnlyProvider, TokenAddress, TokenAmount, TokenBalanceResult,
    TokenInfo, U256,
};

#[async_trait]
pub trait BalanceSource: Send + Sync + Debug {
    /// Never fails; errors are reported through [`TokenBalanceResult::success`].
    async fn fetch_balances(&self, chain_id: u32, owner: Address) -> TokenBalanceResult;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AllowListKind {
    Bridge,
    Swap,
    Onramp,
}

#[async_trait]
pub trait AllowListSource: Send + Sync + Debug {
    async fn fetch_allow_list(&self, kind: AllowListKind) -> eyre::Result<Vec<TokenInfo>>;
}

#[async_trait]
pub trait DexQuoter: Send + Sync + Debug {
    /// Quotes for selling each of `candidates` into `required`. Candidates that could not be
    /// quoted are left out of the map.
    async fn fetch_quotes(
        &self,
        chain_id: u32,
        owner: Address,
        required: &TokenAmount,
        candidates: &[TokenAddress],
    ) -> DexQuotes;
}

/// Fees for one bridge deposit, all denominated in the source chain's native asset.
///
/// `total_fees` is always derived from the parts; a total supplied on input is ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", from = "FeeParts")]
pub struct BridgeFeeEstimate {
    pub source_chain_gas: U256,
    pub bridge_fee: U256,
    pub platform_fee: U256,
    pub total_fees: U256,
}

impl BridgeFeeEstimate {
    pub fn new(source_chain_gas: U256, bridge_fee: U256, platform_fee: U256) -> Self {
        Self {
            source_chain_gas,
            bridge_fee,
            platform_fee,
            total_fees: source_chain_gas
                .saturating_add(bridge_fee)
                .saturating_add(platform_fee),
        }
    }

    /// Everything the owner pays in native currency for a deposit, source-chain gas included.
    pub fn total_with_approval(&self, approval_gas: U256) -> U256 {
        self.total_fees.saturating_add(approval_gas)
    }
}

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeeParts {
    source_chain_gas: U256,
    bridge_fee: U256,
    platform_fee: U256,
}

impl From<FeeParts> for BridgeFeeEstimate {
    fn from(parts: FeeParts) -> Self {
        Self::new(parts.source_chain_gas, parts.bridge_fee, parts.platform_fee)
    }
}

/// The source-chain counterpart of a destination-chain token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1Representation {
    pub l1_address: TokenAddress,
    pub l2_address: TokenAddress,
}

#[async_trait]
pub trait BridgeAdapter: Send + Sync + Debug {
    async fn fee_estimate(&self, from_chain: u32, to_chain: u32)
        -> eyre::Result<BridgeFeeEstimate>;

    /// `None` when the token has no cross-chain mapping.
    async fn l1_representation(&self, l2_token: TokenAddress) -> Option<L1Representation>;

    /// Gas for approving the bridge to spend `amount` of the ERC20 `token`.
    async fn estimate_approval_gas(
        &self,
        provider: &ReadOnlyProvider,
        owner: Address,
        token: Address,
        amount: U256,
    ) -> eyre::Result<U256>;
}
