use std::sync::Arc;

use tracing::debug;

use crate::{
    balances::L2Balances,
    context::RoutingContext,
    fees::{can_cover_approval_fees, can_cover_requirement, can_cover_swap_fees},
    BalanceRequirement, DexQuotes, FundingItem, FundingStep, FundingStepType, StepFees,
    TokenAddress, TokenAmount,
};

/// Quotes for acquiring the shortfall of `requirement`, fetched once per planning call.
///
/// Quotes are always requested for the full swap allow-list so that every caller sharing the
/// cache entry finds the candidates it needs.
pub async fn dex_quotes(
    ctx: &RoutingContext<'_>,
    requirement: &BalanceRequirement,
) -> Arc<DexQuotes> {
    let required_token = requirement.token_address();
    let required = TokenAmount::new(requirement.delta.balance, requirement.required.token.clone());
    let candidates: Vec<TokenAddress> = ctx
        .allow_lists
        .swappable()
        .into_iter()
        .filter(|token| *token != required_token)
        .collect();

    ctx.quote_cache
        .get_or_fetch(required_token, || async {
            if candidates.is_empty() {
                return DexQuotes::new();
            }
            ctx.dex
                .fetch_quotes(ctx.config.l2_chain_id, ctx.owner, &required, &candidates)
                .await
        })
        .await
}

/// One swap step per candidate in `swappable` that the owner can afford to sell for the
/// shortfall. Candidates are independent alternatives.
pub async fn swap_routes(
    ctx: &RoutingContext<'_>,
    requirement: &BalanceRequirement,
    l2: &L2Balances<'_>,
    swappable: &[TokenAddress],
) -> Vec<FundingStep> {
    let required_token = requirement.token_address();
    let quotes = dex_quotes(ctx, requirement).await;

    let mut steps = Vec::new();
    for &candidate in swappable.iter().filter(|token| **token != required_token) {
        let Some(quote) = quotes.get(&candidate) else {
            debug!(token = %candidate, "no quote for candidate");
            continue;
        };

        let sold = &quote.amount_with_max_slippage;
        let Some(held) = l2.available(candidate).filter(|held| *held >= sold.amount) else {
            debug!(token = %candidate, "insufficient balance to swap");
            continue;
        };

        let approval = quote.approval.as_ref();
        if !can_cover_approval_fees(l2, approval) {
            debug!(token = %candidate, "cannot cover approval gas");
            continue;
        }

        let swap_fees = quote.swap_fees();
        if !can_cover_swap_fees(l2, approval, &swap_fees, candidate, sold.amount) {
            debug!(token = %candidate, "cannot cover swap fees");
            continue;
        }

        if !can_cover_requirement(
            held,
            &ctx.balance_check.balance_requirements,
            candidate,
            sold.amount,
            approval,
            &swap_fees,
        ) {
            debug!(token = %candidate, "swap would break another requirement");
            continue;
        }

        steps.push(FundingStep {
            step_type: FundingStepType::Swap,
            chain_id: ctx.config.l2_chain_id,
            funding_item: FundingItem {
                item_type: candidate.item_type(),
                funds_required: sold.as_formatted(),
                user_balance: l2.reported(&quote.amount.token),
                token: quote.amount.token.clone(),
            },
            fees: StepFees {
                approval_gas_fee: quote.approval.clone(),
                gas_fee: quote.swap.clone(),
                protocol_fees: quote.fees.clone(),
            },
        });
    }
    steps
}
