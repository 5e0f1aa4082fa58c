use tracing::debug;

use crate::{
    context::RoutingContext, BalanceRequirement, FundingItem, FundingStep, FundingStepType,
    StepFees,
};

/// Buying the shortfall token with fiat. On-ramping replaces the whole requirement, so the
/// step asks for the full required amount rather than the delta.
pub fn onramp_route(
    ctx: &RoutingContext<'_>,
    requirement: &BalanceRequirement,
) -> Option<FundingStep> {
    let token = requirement.token_address();
    if !ctx.allow_lists.is_onrampable(token) {
        debug!(%token, "token not allowed for onramp");
        return None;
    }

    let required = &requirement.required;
    Some(FundingStep {
        step_type: FundingStepType::Onramp,
        chain_id: ctx.config.l2_chain_id,
        funding_item: FundingItem {
            item_type: requirement.item_type,
            funds_required: crate::FormattedAmount {
                amount: required.balance,
                formatted_amount: required.formatted_balance.clone(),
            },
            user_balance: requirement.current.as_balance(),
            token: required.token.clone(),
        },
        fees: StepFees::default(),
    })
}
