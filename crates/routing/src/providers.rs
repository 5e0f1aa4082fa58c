use std::collections::HashMap;

use alloy::providers::{ProviderBuilder, RootProvider};

use crate::RoutingError;

pub type ReadOnlyProvider = RootProvider<alloy::transports::http::Http<reqwest::Client>>;

/// Read-only RPC connections keyed by chain id.
#[derive(Debug, Clone, Default)]
pub struct ReadOnlyProviders {
    providers: HashMap<u32, ReadOnlyProvider>,
}

impl ReadOnlyProviders {
    /// Connects to every chain in `chain_ids` using the registry's RPC urls.
    pub fn new(chain_ids: &[u32]) -> Result<Self, RoutingError> {
        let providers = chain_ids
            .iter()
            .map(|&chain_id| {
                let chain = utils::get_chain(chain_id)
                    .ok_or(RoutingError::UnsupportedChain { chain_id })?;
                let rpc_url = reqwest::Url::parse(chain.rpc_url)
                    .map_err(|_| RoutingError::Provider { chain_id })?;
                Ok((chain_id, ProviderBuilder::new().on_http(rpc_url)))
            })
            .collect::<Result<HashMap<_, _>, RoutingError>>()?;
        Ok(Self { providers })
    }

    pub fn get(&self, chain_id: u32) -> Result<&ReadOnlyProvider, RoutingError> {
        self.providers
            .get(&chain_id)
            .ok_or(RoutingError::Provider { chain_id })
    }

    pub fn contains(&self, chain_id: u32) -> bool {
        self.providers.contains_key(&chain_id)
    }
}
