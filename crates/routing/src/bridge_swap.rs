use std::collections::HashMap;

use futures::future::join_all;
use tracing::debug;

use crate::{
    balances::{usable_balances, L2Balances},
    bridge::bridge_route,
    context::RoutingContext,
    fees::{amount_to_bridge, pinned_requirement, quoted_amount_with_fees},
    sources::{BridgeFeeEstimate, L1Representation},
    swap::{dex_quotes, swap_routes},
    BalanceRequirement, BridgeRequirement, FundingStep, RoutingError, TokenAddress, U256,
};

/// Two-step routes that bridge a different token to the destination chain and then swap it
/// into the shortfall token. Each returned pair is `[bridge, swap]`.
pub async fn bridge_and_swap_routes(
    ctx: &RoutingContext<'_>,
    requirement: &BalanceRequirement,
    fee_estimate: &BridgeFeeEstimate,
) -> Result<Vec<[FundingStep; 2]>, RoutingError> {
    let required_token = requirement.token_address();
    let (Some(l1), Some(l2)) = (
        usable_balances(&ctx.balances, ctx.config.l1_chain_id),
        usable_balances(&ctx.balances, ctx.config.l2_chain_id),
    ) else {
        return Ok(Vec::new());
    };
    if ctx.allow_lists.bridge.is_empty()
        || ctx.allow_lists.swap.is_empty()
        || l1.balances.is_empty()
        || l2.balances.is_empty()
    {
        return Ok(Vec::new());
    }

    let candidates = bridgeable_swap_candidates(ctx, required_token).await;
    if candidates.is_empty() {
        debug!("no token is both bridgeable and swappable");
        return Ok(Vec::new());
    }

    let quotes = dex_quotes(ctx, requirement).await;
    let l2_view = L2Balances::new(&l2.balances);
    let bridge_requirements: Vec<BridgeRequirement> = candidates
        .iter()
        .filter_map(|representation| {
            let quote = quotes.get(&representation.l2_address)?;
            let l1_balance = l1.find(representation.l1_address)?;
            let l2_balance = l2_view
                .real(representation.l2_address)
                .map_or(U256::ZERO, |balance| balance.balance);
            let pinned = pinned_requirement(
                &ctx.balance_check.balance_requirements,
                representation.l2_address,
            );

            let amount = amount_to_bridge(quoted_amount_with_fees(quote), l2_balance, pinned);
            if amount.is_zero() || amount > l1_balance.balance {
                debug!(
                    token = %representation.l2_address,
                    %amount,
                    "cannot bridge amount needed for swap"
                );
                return None;
            }
            Some(BridgeRequirement {
                amount,
                formatted_amount: utils::format_amount(amount, l1_balance.token.decimals),
                l2_address: representation.l2_address,
            })
        })
        .collect();

    let bridged = join_all(bridge_requirements.iter().map(|bridge_requirement| async move {
        bridge_route(ctx, bridge_requirement, fee_estimate)
            .await
            .map(|step| step.map(|step| (bridge_requirement, step)))
    }))
    .await
    .into_iter()
    .collect::<Result<Vec<_>, _>>()?
    .into_iter()
    .flatten()
    .collect::<Vec<_>>();
    if bridged.is_empty() {
        return Ok(Vec::new());
    }

    // swap against what the owner will hold once the bridge lands, restricted to bridged tokens
    let credits: HashMap<TokenAddress, U256> = bridged
        .iter()
        .map(|(bridge_requirement, _)| (bridge_requirement.l2_address, bridge_requirement.amount))
        .collect();
    let bridged_tokens: Vec<TokenAddress> = credits.keys().copied().collect();
    let post_bridge = L2Balances::with_bridged(&l2.balances, credits);
    let mut swaps: HashMap<TokenAddress, FundingStep> =
        swap_routes(ctx, requirement, &post_bridge, &bridged_tokens)
            .await
            .into_iter()
            .map(|step| (step.funding_item.token.address, step))
            .collect();

    Ok(bridged
        .into_iter()
        .filter_map(|(bridge_requirement, bridge_step)| {
            let swap_step = swaps.remove(&bridge_requirement.l2_address)?;
            Some([bridge_step, swap_step])
        })
        .collect())
}

/// Swappable destination tokens, other than the shortfall token, whose source-chain
/// counterpart is allowed for bridging.
async fn bridgeable_swap_candidates(
    ctx: &RoutingContext<'_>,
    required_token: TokenAddress,
) -> Vec<L1Representation> {
    let swappable = ctx
        .allow_lists
        .swappable()
        .into_iter()
        .filter(|token| *token != required_token);
    join_all(swappable.map(|token| ctx.bridge.l1_representation(token)))
        .await
        .into_iter()
        .flatten()
        .filter(|representation| ctx.allow_lists.is_bridgeable(representation.l1_address))
        .collect()
}
