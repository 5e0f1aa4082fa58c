use crate::{
    balances::ChainBalances,
    quote_cache::QuoteCache,
    sources::{BridgeAdapter, DexQuoter},
    Address, BalanceCheckResult, ReadOnlyProviders, RoutingConfig, TokenAddress, TokenInfo,
};

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllowLists {
    #[serde(default)]
    pub bridge: Vec<TokenInfo>,
    #[serde(default)]
    pub swap: Vec<TokenInfo>,
    #[serde(default)]
    pub onramp: Vec<TokenInfo>,
}

impl AllowLists {
    pub fn swappable(&self) -> Vec<TokenAddress> {
        self.swap.iter().map(|token| token.address).collect()
    }

    pub fn is_bridgeable(&self, token: TokenAddress) -> bool {
        self.bridge.iter().any(|allowed| allowed.address == token)
    }

    pub fn is_onrampable(&self, token: TokenAddress) -> bool {
        self.onramp.iter().any(|allowed| allowed.address == token)
    }
}

/// Everything the resolvers read during one planning call. Immutable apart from the quote cache.
#[derive(Debug)]
pub struct RoutingContext<'a> {
    pub config: &'a RoutingConfig,
    pub owner: Address,
    pub providers: &'a ReadOnlyProviders,
    pub balances: ChainBalances,
    pub allow_lists: AllowLists,
    pub balance_check: &'a BalanceCheckResult,
    pub dex: &'a dyn DexQuoter,
    pub bridge: &'a dyn BridgeAdapter,
    pub quote_cache: QuoteCache,
}
