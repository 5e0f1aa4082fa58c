use std::time::Duration;

use crate::{RoutingError, TokenInfo};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingConfig {
    /// Source chain assets are bridged from.
    pub l1_chain_id: u32,
    /// Destination chain the shortfall lives on.
    pub l2_chain_id: u32,
    /// Upper bound for each resolver and each context fetch.
    pub resolver_timeout: Duration,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            l1_chain_id: utils::Chain::Ethereum as u32,
            l2_chain_id: utils::Chain::ImmutableZkEvm as u32,
            resolver_timeout: Duration::from_secs(10),
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), RoutingError> {
        for chain_id in [self.l1_chain_id, self.l2_chain_id] {
            utils::get_chain(chain_id).ok_or(RoutingError::UnsupportedChain { chain_id })?;
        }
        Ok(())
    }

    pub fn chain_ids(&self) -> [u32; 2] {
        [self.l1_chain_id, self.l2_chain_id]
    }

    /// Native asset of `chain_id`, the denomination of its gas and bridge fees.
    pub fn native_token(&self, chain_id: u32) -> Result<TokenInfo, RoutingError> {
        utils::get_chain(chain_id)
            .map(TokenInfo::native)
            .ok_or(RoutingError::UnsupportedChain { chain_id })
    }
}
