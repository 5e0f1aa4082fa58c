use crate::{BalanceCheckResult, BalanceRequirement, BridgeRequirement};

/// The one requirement to fund, if planning applies at all.
///
/// Returns `None` unless exactly one requirement is insufficient; multi-asset shortfalls are
/// not planned. Non-fungible shortfalls are counted but never returned.
pub fn insufficient_requirement(check: &BalanceCheckResult) -> Option<&BalanceRequirement> {
    let mut insufficient = check
        .balance_requirements
        .iter()
        .filter(|req| !req.sufficient);
    match (insufficient.next(), insufficient.next()) {
        (Some(req), None) if req.item_type.is_fungible() => Some(req),
        _ => None,
    }
}

/// Bridging covers the shortfall only, never the full required balance.
pub fn bridge_requirement(requirement: &BalanceRequirement) -> BridgeRequirement {
    BridgeRequirement {
        amount: requirement.delta.balance,
        formatted_amount: requirement.delta.formatted_balance.clone(),
        l2_address: requirement.token_address(),
    }
}
