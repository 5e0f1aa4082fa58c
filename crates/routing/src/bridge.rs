use tracing::debug;

use crate::{
    balances::usable_balances,
    context::RoutingContext,
    fees::has_sufficient_l1_eth,
    sources::BridgeFeeEstimate,
    BridgeRequirement, FundingItem, FundingStep, FundingStepType, RoutingError, StepFees,
    TokenAddress, TokenAmount, U256,
};

/// Resolves bridging `requirement` from the source chain to the destination chain.
///
/// Returns `Ok(None)` when bridging cannot cover the requirement. A missing source-chain
/// provider or a failed approval-gas estimate aborts the whole planning call.
pub async fn bridge_route(
    ctx: &RoutingContext<'_>,
    requirement: &BridgeRequirement,
    fee_estimate: &BridgeFeeEstimate,
) -> Result<Option<FundingStep>, RoutingError> {
    let l1_chain_id = ctx.config.l1_chain_id;
    let provider = ctx.providers.get(l1_chain_id)?;

    let Some(l1_balances) = usable_balances(&ctx.balances, l1_chain_id) else {
        debug!(chain_id = l1_chain_id, "no usable l1 balances, skipping bridge");
        return Ok(None);
    };

    let Some(representation) = ctx.bridge.l1_representation(requirement.l2_address).await else {
        debug!(token = %requirement.l2_address, "no l1 representation, skipping bridge");
        return Ok(None);
    };
    let l1_address = representation.l1_address;
    if !ctx.allow_lists.is_bridgeable(l1_address) {
        debug!(token = %l1_address, "token not allowed for bridging");
        return Ok(None);
    }

    let approval_gas = match l1_address {
        TokenAddress::Native => U256::ZERO,
        TokenAddress::Erc20(token) => ctx
            .bridge
            .estimate_approval_gas(provider, ctx.owner, token, requirement.amount)
            .await
            .map_err(|err| RoutingError::BridgeGasEstimate {
                token: token.to_string(),
                reason: err.to_string(),
            })?,
    };
    let total_fees = fee_estimate.total_with_approval(approval_gas);

    // native deposits pay the amount and the fees out of the same balance
    let native_needed = match l1_address {
        TokenAddress::Native => requirement.amount.saturating_add(total_fees),
        TokenAddress::Erc20(_) => total_fees,
    };
    if !has_sufficient_l1_eth(l1_balances, native_needed) {
        debug!(%native_needed, "insufficient l1 native balance for bridge fees");
        return Ok(None);
    }

    let Some(l1_balance) = l1_balances.find(l1_address) else {
        return Ok(None);
    };
    if l1_balance.balance < requirement.amount {
        debug!(token = %l1_address, "insufficient l1 balance to bridge");
        return Ok(None);
    }

    let fee_token = ctx.config.native_token(l1_chain_id)?;
    let fee = |amount: U256| TokenAmount::new(amount, fee_token.clone());

    Ok(Some(FundingStep {
        step_type: FundingStepType::Bridge,
        chain_id: l1_chain_id,
        funding_item: FundingItem {
            item_type: l1_address.item_type(),
            funds_required: crate::FormattedAmount {
                amount: requirement.amount,
                formatted_amount: requirement.formatted_amount.clone(),
            },
            user_balance: l1_balance.as_balance(),
            token: l1_balance.token.clone(),
        },
        fees: StepFees {
            approval_gas_fee: Some(fee(approval_gas)),
            gas_fee: Some(fee(fee_estimate.source_chain_gas)),
            protocol_fees: vec![
                fee(fee_estimate.bridge_fee),
                fee(fee_estimate.platform_fee),
            ],
        },
    }))
}
