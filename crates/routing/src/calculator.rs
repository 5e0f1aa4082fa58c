use std::{future::Future, sync::Arc};

use futures::{
    future::{join_all, BoxFuture},
    stream::FuturesUnordered,
    FutureExt, StreamExt,
};
use tokio::sync::{mpsc::UnboundedSender, OnceCell};
use tracing::{debug, info, instrument, warn};

use crate::{
    balances::{usable_balances, ChainBalances, L2Balances},
    bridge::bridge_route,
    bridge_swap::bridge_and_swap_routes,
    context::{AllowLists, RoutingContext},
    gate,
    onramp::onramp_route,
    quote_cache::QuoteCache,
    sources::{
        AllowListKind, AllowListSource, BalanceSource, BridgeAdapter, BridgeFeeEstimate,
        DexQuoter,
    },
    swap::swap_routes,
    Address, AvailableRoutingOptions, BalanceCheckResult, BalanceRequirement, FundingRoute,
    FundingStep, ReadOnlyProviders, RoutingConfig, RoutingError, RoutingOutcome, RoutingStrategy,
    Snapshot, TokenBalanceResult,
};

/// Inputs for one planning call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingRequest {
    pub owner: Address,
    pub balance_check: BalanceCheckResult,
    pub options: AvailableRoutingOptions,
}

/// Routes produced by one resolver, each a list of ordered steps.
type Routes = Vec<Vec<FundingStep>>;

type ResolverFuture<'a> = BoxFuture<'a, (RoutingStrategy, Result<Routes, RoutingError>)>;

#[derive(Debug, Clone)]
pub struct RoutingCalculator {
    config: RoutingConfig,
    providers: Arc<ReadOnlyProviders>,
    balances: Arc<dyn BalanceSource>,
    allow_lists: Arc<dyn AllowListSource>,
    dex: Arc<dyn DexQuoter>,
    bridge: Arc<dyn BridgeAdapter>,
}

impl RoutingCalculator {
    pub fn new(
        config: RoutingConfig,
        providers: Arc<ReadOnlyProviders>,
        balances: Arc<dyn BalanceSource>,
        allow_lists: Arc<dyn AllowListSource>,
        dex: Arc<dyn DexQuoter>,
        bridge: Arc<dyn BridgeAdapter>,
    ) -> Self {
        Self {
            config,
            providers,
            balances,
            allow_lists,
            dex,
            bridge,
        }
    }

    /// Calculator whose collaborators all answer from `snapshot`.
    pub fn from_snapshot(
        config: RoutingConfig,
        providers: Arc<ReadOnlyProviders>,
        snapshot: Arc<Snapshot>,
    ) -> Self {
        Self::new(
            config,
            providers,
            snapshot.clone(),
            snapshot.clone(),
            snapshot.clone(),
            snapshot,
        )
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub async fn calculate(
        &self,
        request: &RoutingRequest,
    ) -> Result<RoutingOutcome, RoutingError> {
        self.run(request, None).await
    }

    /// Like [`Self::calculate`], also sending every route to `updates` as soon as the resolver
    /// producing it completes. Routes arrive in completion order, not priority order.
    pub async fn calculate_with_updates(
        &self,
        request: &RoutingRequest,
        updates: UnboundedSender<FundingRoute>,
    ) -> Result<RoutingOutcome, RoutingError> {
        self.run(request, Some(&updates)).await
    }

    #[instrument(skip_all, fields(owner = %request.owner))]
    async fn run(
        &self,
        request: &RoutingRequest,
        updates: Option<&UnboundedSender<FundingRoute>>,
    ) -> Result<RoutingOutcome, RoutingError> {
        let options = request.options;
        if !options.any() {
            return Ok(RoutingOutcome::NoRouteOptions {
                message: "No routing options are available".to_string(),
            });
        }

        let chains = self.required_chains(options);
        for &chain_id in &chains {
            self.providers.get(chain_id)?;
        }

        let Some(requirement) = gate::insufficient_requirement(&request.balance_check) else {
            debug!("balance check does not have exactly one fungible shortfall");
            return Ok(no_routes_found());
        };

        let (balances, allow_lists) = tokio::join!(
            self.fetch_balances(request.owner, &chains),
            self.fetch_allow_lists(options),
        );
        let ctx = RoutingContext {
            config: &self.config,
            owner: request.owner,
            providers: &self.providers,
            balances,
            allow_lists,
            balance_check: &request.balance_check,
            dex: self.dex.as_ref(),
            bridge: self.bridge.as_ref(),
            quote_cache: QuoteCache::new(),
        };
        let fee_estimate = OnceCell::new();

        let resolvers = FuturesUnordered::new();
        if options.swap {
            resolvers.push(self.bounded(RoutingStrategy::Swap, resolve_swap(&ctx, requirement)));
        }
        if options.bridge {
            resolvers.push(self.bounded(
                RoutingStrategy::Bridge,
                self.resolve_bridge(&ctx, requirement, &fee_estimate),
            ));
        }
        if options.onramp {
            let routes = onramp_route(&ctx, requirement).map(|step| vec![step]);
            resolvers.push(self.bounded(
                RoutingStrategy::Onramp,
                std::future::ready(Ok(routes.into_iter().collect())),
            ));
        }
        if options.bridge && options.swap {
            resolvers.push(self.bounded(
                RoutingStrategy::BridgeAndSwap,
                self.resolve_bridge_and_swap(&ctx, requirement, &fee_estimate),
            ));
        }

        let funding_routes = collect_routes(resolvers, updates).await?;
        info!(routes = funding_routes.len(), "routing finished");
        if funding_routes.is_empty() {
            return Ok(no_routes_found());
        }
        Ok(RoutingOutcome::RoutesFound { funding_routes })
    }

    /// Chains whose balances and providers the enabled strategies read.
    fn required_chains(&self, options: AvailableRoutingOptions) -> Vec<u32> {
        let mut chains = Vec::with_capacity(2);
        if options.bridge {
            chains.push(self.config.l1_chain_id);
        }
        if options.swap {
            chains.push(self.config.l2_chain_id);
        }
        chains
    }

    async fn fetch_balances(&self, owner: Address, chains: &[u32]) -> ChainBalances {
        let timeout = self.config.resolver_timeout;
        join_all(chains.iter().map(|&chain_id| async move {
            let fetch = self.balances.fetch_balances(chain_id, owner);
            let result = tokio::time::timeout(timeout, fetch).await.unwrap_or_else(|_| {
                TokenBalanceResult::failed(format!("balance fetch for chain {chain_id} timed out"))
            });
            if !result.success {
                warn!(chain_id, error = ?result.error, "balances unavailable, chain is unusable");
            }
            (chain_id, result)
        }))
        .await
        .into_iter()
        .collect()
    }

    async fn fetch_allow_lists(&self, options: AvailableRoutingOptions) -> AllowLists {
        let timeout = self.config.resolver_timeout;
        let fetch = move |kind: AllowListKind, enabled: bool| async move {
            if !enabled {
                return Vec::new();
            }
            match tokio::time::timeout(timeout, self.allow_lists.fetch_allow_list(kind)).await {
                Ok(Ok(tokens)) => tokens,
                Ok(Err(err)) => {
                    warn!(?kind, %err, "failed to fetch allow-list");
                    Vec::new()
                }
                Err(_) => {
                    warn!(?kind, "allow-list fetch timed out");
                    Vec::new()
                }
            }
        };
        let (bridge, swap, onramp) = tokio::join!(
            fetch(AllowListKind::Bridge, options.bridge),
            fetch(AllowListKind::Swap, options.swap),
            fetch(AllowListKind::Onramp, options.onramp),
        );
        AllowLists {
            bridge,
            swap,
            onramp,
        }
    }

    /// The deposit fee estimate, fetched at most once per planning call.
    async fn fee_estimate<'c>(
        &self,
        cell: &'c OnceCell<BridgeFeeEstimate>,
    ) -> Result<&'c BridgeFeeEstimate, RoutingError> {
        let (from_chain, to_chain) = (self.config.l1_chain_id, self.config.l2_chain_id);
        cell.get_or_try_init(|| async {
            self.bridge
                .fee_estimate(from_chain, to_chain)
                .await
                .map_err(|err| RoutingError::BridgeFeeEstimate {
                    from_chain,
                    to_chain,
                    reason: err.to_string(),
                })
        })
        .await
    }

    async fn resolve_bridge(
        &self,
        ctx: &RoutingContext<'_>,
        requirement: &BalanceRequirement,
        fee_estimate: &OnceCell<BridgeFeeEstimate>,
    ) -> Result<Routes, RoutingError> {
        let fees = self.fee_estimate(fee_estimate).await?;
        let step = bridge_route(ctx, &gate::bridge_requirement(requirement), fees).await?;
        Ok(step.into_iter().map(|step| vec![step]).collect())
    }

    async fn resolve_bridge_and_swap(
        &self,
        ctx: &RoutingContext<'_>,
        requirement: &BalanceRequirement,
        fee_estimate: &OnceCell<BridgeFeeEstimate>,
    ) -> Result<Routes, RoutingError> {
        let fees = self.fee_estimate(fee_estimate).await?;
        let pairs = bridge_and_swap_routes(ctx, requirement, fees).await?;
        Ok(pairs.into_iter().map(Vec::from).collect())
    }

    /// Bounds `resolver` by the configured timeout; a resolver that runs out of time yields no
    /// routes.
    fn bounded<'a, F>(&self, strategy: RoutingStrategy, resolver: F) -> ResolverFuture<'a>
    where
        F: Future<Output = Result<Routes, RoutingError>> + Send + 'a,
    {
        let timeout = self.config.resolver_timeout;
        async move {
            let result = match tokio::time::timeout(timeout, resolver).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(%strategy, ?timeout, "resolver timed out");
                    Ok(Vec::new())
                }
            };
            (strategy, result)
        }
        .boxed()
    }
}

async fn resolve_swap(
    ctx: &RoutingContext<'_>,
    requirement: &BalanceRequirement,
) -> Result<Routes, RoutingError> {
    let Some(l2) = usable_balances(&ctx.balances, ctx.config.l2_chain_id) else {
        return Ok(Vec::new());
    };
    if ctx.allow_lists.swap.is_empty() {
        return Ok(Vec::new());
    }
    let balances = L2Balances::new(&l2.balances);
    let steps = swap_routes(ctx, requirement, &balances, &ctx.allow_lists.swappable()).await;
    Ok(steps.into_iter().map(|step| vec![step]).collect())
}

/// Drains resolvers in completion order, stamping each route with its strategy's priority.
async fn collect_routes(
    mut resolvers: FuturesUnordered<ResolverFuture<'_>>,
    updates: Option<&UnboundedSender<FundingRoute>>,
) -> Result<Vec<FundingRoute>, RoutingError> {
    let mut funding_routes = Vec::new();
    while let Some((strategy, result)) = resolvers.next().await {
        let routes = result?;
        debug!(%strategy, routes = routes.len(), "resolver finished");
        for steps in routes {
            let route = FundingRoute {
                priority: strategy.priority(),
                steps,
            };
            if let Some(updates) = updates {
                // a dropped receiver only stops the stream, not the planning call
                let _ = updates.send(route.clone());
            }
            funding_routes.push(route);
        }
    }
    Ok(funding_routes)
}

fn no_routes_found() -> RoutingOutcome {
    RoutingOutcome::NoRoutesFound {
        message: "Routes not found".to_string(),
    }
}
