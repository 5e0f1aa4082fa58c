use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use async_trait::async_trait;
use hex_literal::hex;

use crate::{
    context::RoutingContext,
    quote_cache::QuoteCache,
    sources::{
        AllowListKind, AllowListSource, BalanceSource, BridgeAdapter, BridgeFeeEstimate,
        DexQuoter, L1Representation,
    },
    snapshot::{ApprovalGas, Snapshot},
    Address, AvailableRoutingOptions, BalanceCheckResult, BalanceRequirement, BridgeRequirement,
    DexQuote, DexQuotes, ItemType, ReadOnlyProvider, ReadOnlyProviders, RoutingCalculator,
    RoutingConfig, RoutingRequest, TokenAddress, TokenAmount, TokenBalance, TokenBalanceResult,
    TokenInfo, U256,
};

pub const L1: u32 = 1;
pub const L2: u32 = 13371;
pub const OWNER: Address = Address::new(hex!("000007357111e4789005d4ebff401a18d99770ce"));

fn token(name: &str, symbol: &str, decimals: u8, address: TokenAddress) -> TokenInfo {
    TokenInfo {
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
        address,
    }
}

pub fn l1_eth() -> TokenInfo {
    token("Ether", "ETH", 18, TokenAddress::Native)
}

pub fn l1_usdc() -> TokenInfo {
    token("USD Coin", "USDC", 6, Address::repeat_byte(0xaa).into())
}

pub fn l1_imx() -> TokenInfo {
    token("Immutable X", "IMX", 18, Address::repeat_byte(0xbb).into())
}

pub fn l1_gog() -> TokenInfo {
    token("Guild of Guardians", "GOG", 18, Address::repeat_byte(0xcc).into())
}

pub fn l2_eth() -> TokenInfo {
    token("Ether", "ETH", 18, Address::repeat_byte(0x11).into())
}

pub fn l2_usdc() -> TokenInfo {
    token("USD Coin", "USDC", 6, Address::repeat_byte(0x22).into())
}

pub fn l2_imx() -> TokenInfo {
    token("Immutable X", "IMX", 18, TokenAddress::Native)
}

pub fn l2_gog() -> TokenInfo {
    token("Guild of Guardians", "GOG", 18, Address::repeat_byte(0x33).into())
}

pub fn balance(token: &TokenInfo, value: u64) -> TokenBalance {
    TokenBalance::new(U256::from(value), token.clone())
}

pub fn amount(token: &TokenInfo, value: u64) -> TokenAmount {
    TokenAmount::new(U256::from(value), token.clone())
}

/// Quote selling `principal` of `token`, `with_slippage` once the buffer is added.
pub fn dex_quote(token: &TokenInfo, principal: u64, with_slippage: u64) -> DexQuote {
    DexQuote {
        amount: amount(token, principal),
        amount_with_max_slippage: amount(token, with_slippage),
        fees: Vec::new(),
        approval: None,
        swap: None,
    }
}

pub trait DexQuoteExt {
    fn with_fees(self, fees: Vec<TokenAmount>) -> Self;
    fn with_approval(self, approval: TokenAmount) -> Self;
    fn with_swap_gas(self, gas: TokenAmount) -> Self;
}

impl DexQuoteExt for DexQuote {
    fn with_fees(mut self, fees: Vec<TokenAmount>) -> Self {
        self.fees = fees;
        self
    }

    fn with_approval(mut self, approval: TokenAmount) -> Self {
        self.approval = Some(approval);
        self
    }

    fn with_swap_gas(mut self, gas: TokenAmount) -> Self {
        self.swap = Some(gas);
        self
    }
}

pub fn erc20_requirement(token: &TokenInfo, required: u64, current: u64) -> BalanceRequirement {
    BalanceRequirement::new(
        ItemType::Erc20,
        token.clone(),
        U256::from(required),
        U256::from(current),
    )
}

pub fn native_requirement(token: &TokenInfo, required: u64, current: u64) -> BalanceRequirement {
    BalanceRequirement::new(
        ItemType::Native,
        token.clone(),
        U256::from(required),
        U256::from(current),
    )
}

pub fn bridge_req(token: &TokenInfo, value: u64) -> BridgeRequirement {
    let amount = U256::from(value);
    BridgeRequirement {
        amount,
        formatted_amount: utils::format_amount(amount, token.decimals),
        l2_address: token.address,
    }
}

/// Snapshot-backed collaborators with knobs for the failure modes the snapshot cannot express.
#[derive(Debug, Clone, Default)]
pub struct TestSources {
    pub snapshot: Snapshot,
    pub failing_approval_gas: bool,
    pub dex_delay: Option<Duration>,
    pub balance_delay: Option<(u32, Duration)>,
    pub failing_allow_list: Option<AllowListKind>,
    pub allow_list_delay: Option<(AllowListKind, Duration)>,
    pub dex_calls: Arc<AtomicUsize>,
    pub dex_amounts: Arc<Mutex<Vec<U256>>>,
}

#[async_trait]
impl BalanceSource for TestSources {
    async fn fetch_balances(&self, chain_id: u32, owner: Address) -> TokenBalanceResult {
        if let Some((slow_chain, delay)) = self.balance_delay {
            if slow_chain == chain_id {
                tokio::time::sleep(delay).await;
            }
        }
        self.snapshot.fetch_balances(chain_id, owner).await
    }
}

#[async_trait]
impl AllowListSource for TestSources {
    async fn fetch_allow_list(&self, kind: AllowListKind) -> eyre::Result<Vec<TokenInfo>> {
        if let Some((slow_kind, delay)) = self.allow_list_delay {
            if slow_kind == kind {
                tokio::time::sleep(delay).await;
            }
        }
        if self.failing_allow_list == Some(kind) {
            eyre::bail!("allow-list service returned 503");
        }
        self.snapshot.fetch_allow_list(kind).await
    }
}

#[async_trait]
impl DexQuoter for TestSources {
    async fn fetch_quotes(
        &self,
        chain_id: u32,
        owner: Address,
        required: &TokenAmount,
        candidates: &[TokenAddress],
    ) -> DexQuotes {
        self.dex_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut amounts) = self.dex_amounts.lock() {
            amounts.push(required.amount);
        }
        if let Some(delay) = self.dex_delay {
            tokio::time::sleep(delay).await;
        }
        self.snapshot
            .fetch_quotes(chain_id, owner, required, candidates)
            .await
    }
}

#[async_trait]
impl BridgeAdapter for TestSources {
    async fn fee_estimate(
        &self,
        from_chain: u32,
        to_chain: u32,
    ) -> eyre::Result<BridgeFeeEstimate> {
        self.snapshot.fee_estimate(from_chain, to_chain).await
    }

    async fn l1_representation(&self, l2_token: TokenAddress) -> Option<L1Representation> {
        self.snapshot.l1_representation(l2_token).await
    }

    async fn estimate_approval_gas(
        &self,
        provider: &ReadOnlyProvider,
        owner: Address,
        token: Address,
        amount: U256,
    ) -> eyre::Result<U256> {
        if self.failing_approval_gas {
            eyre::bail!("execution reverted: approve");
        }
        self.snapshot
            .estimate_approval_gas(provider, owner, token, amount)
            .await
    }
}

/// Builder for one planning scenario. Balances for both chains start out empty but usable.
#[derive(Debug)]
pub struct TestEnv {
    pub config: RoutingConfig,
    pub providers: ReadOnlyProviders,
    pub sources: TestSources,
    pub balance_check: BalanceCheckResult,
}

impl TestEnv {
    pub fn new() -> Self {
        let mut sources = TestSources::default();
        sources.snapshot.set_balances(L1, TokenBalanceResult::ok(vec![]));
        sources.snapshot.set_balances(L2, TokenBalanceResult::ok(vec![]));
        sources.snapshot.bridge_fee = Some(BridgeFeeEstimate::default());
        Self {
            config: RoutingConfig {
                l1_chain_id: L1,
                l2_chain_id: L2,
                resolver_timeout: Duration::from_secs(5),
            },
            providers: ReadOnlyProviders::new(&[L1, L2]).expect("registry chains"),
            sources,
            balance_check: BalanceCheckResult::default(),
        }
    }

    pub fn with_l1_balances(self, balances: Vec<TokenBalance>) -> Self {
        self.with_l1_result(TokenBalanceResult::ok(balances))
    }

    pub fn with_l2_balances(self, balances: Vec<TokenBalance>) -> Self {
        self.with_l2_result(TokenBalanceResult::ok(balances))
    }

    pub fn with_l1_result(mut self, result: TokenBalanceResult) -> Self {
        self.sources.snapshot.set_balances(L1, result);
        self
    }

    pub fn with_l2_result(mut self, result: TokenBalanceResult) -> Self {
        self.sources.snapshot.set_balances(L2, result);
        self
    }

    pub fn with_bridge_allow_list(mut self, tokens: Vec<TokenInfo>) -> Self {
        self.sources.snapshot.allow_lists.bridge = tokens;
        self
    }

    pub fn with_swap_allow_list(mut self, tokens: Vec<TokenInfo>) -> Self {
        self.sources.snapshot.allow_lists.swap = tokens;
        self
    }

    pub fn with_onramp_allow_list(mut self, tokens: Vec<TokenInfo>) -> Self {
        self.sources.snapshot.allow_lists.onramp = tokens;
        self
    }

    pub fn with_mapping(mut self, l1: &TokenInfo, l2: &TokenInfo) -> Self {
        self.sources.snapshot.token_mappings.push(L1Representation {
            l1_address: l1.address,
            l2_address: l2.address,
        });
        self
    }

    pub fn with_bridge_fee(
        mut self,
        source_chain_gas: u64,
        bridge_fee: u64,
        platform_fee: u64,
    ) -> Self {
        self.sources.snapshot.bridge_fee = Some(BridgeFeeEstimate::new(
            U256::from(source_chain_gas),
            U256::from(bridge_fee),
            U256::from(platform_fee),
        ));
        self
    }

    pub fn without_bridge_fee(mut self) -> Self {
        self.sources.snapshot.bridge_fee = None;
        self
    }

    pub fn with_approval_gas(mut self, l1_token: &TokenInfo, gas: u64) -> Self {
        let token = l1_token.address.contract().expect("erc20 token");
        self.sources.snapshot.approval_gas.push(ApprovalGas {
            token,
            gas: U256::from(gas),
        });
        self
    }

    pub fn with_quote(mut self, quote: DexQuote) -> Self {
        self.sources.snapshot.dex_quotes.push(quote);
        self
    }

    pub fn with_requirements(mut self, requirements: Vec<BalanceRequirement>) -> Self {
        self.balance_check = BalanceCheckResult::new(requirements);
        self
    }

    pub fn with_providers(mut self, providers: ReadOnlyProviders) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_resolver_timeout(mut self, timeout: Duration) -> Self {
        self.config.resolver_timeout = timeout;
        self
    }

    pub fn with_failing_bridge(mut self) -> Self {
        self.sources.failing_approval_gas = true;
        self
    }

    pub fn with_slow_dex(mut self, delay: Duration) -> Self {
        self.sources.dex_delay = Some(delay);
        self
    }

    pub fn with_slow_balances(mut self, chain_id: u32, delay: Duration) -> Self {
        self.sources.balance_delay = Some((chain_id, delay));
        self
    }

    pub fn with_failing_allow_list(mut self, kind: AllowListKind) -> Self {
        self.sources.failing_allow_list = Some(kind);
        self
    }

    pub fn with_slow_allow_list(mut self, kind: AllowListKind, delay: Duration) -> Self {
        self.sources.allow_list_delay = Some((kind, delay));
        self
    }

    /// Amounts every DEX quote fetch asked to acquire, in call order.
    pub fn quoted_amounts(&self) -> Vec<U256> {
        self.sources
            .dex_amounts
            .lock()
            .map(|amounts| amounts.clone())
            .unwrap_or_default()
    }

    /// Returns the counter of DEX quote fetches alongside the env.
    pub fn with_counting_dex(self) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::clone(&self.sources.dex_calls);
        (self, calls)
    }

    pub fn fee_estimate(&self) -> BridgeFeeEstimate {
        self.sources.snapshot.bridge_fee.clone().unwrap_or_default()
    }

    pub fn l2_balances(&self) -> Vec<TokenBalance> {
        self.sources
            .snapshot
            .chain_balances()
            .remove(&L2)
            .map(|result| result.balances)
            .unwrap_or_default()
    }

    /// Resolver context over the snapshot, as the calculator would build it.
    pub fn ctx(&self) -> RoutingContext<'_> {
        RoutingContext {
            config: &self.config,
            owner: OWNER,
            providers: &self.providers,
            balances: self.sources.snapshot.chain_balances(),
            allow_lists: self.sources.snapshot.allow_lists.clone(),
            balance_check: &self.balance_check,
            dex: &self.sources,
            bridge: &self.sources,
            quote_cache: QuoteCache::new(),
        }
    }

    pub fn calculator(&self) -> RoutingCalculator {
        let sources = Arc::new(self.sources.clone());
        RoutingCalculator::new(
            self.config.clone(),
            Arc::new(self.providers.clone()),
            sources.clone(),
            sources.clone(),
            sources.clone(),
            sources,
        )
    }

    pub fn request(&self, options: AvailableRoutingOptions) -> RoutingRequest {
        RoutingRequest {
            owner: OWNER,
            balance_check: self.balance_check.clone(),
            options,
        }
    }
}
