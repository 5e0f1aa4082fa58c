//! Affordability arithmetic. All amounts are integer smallest units; a check that would go
//! negative fails instead of wrapping.

use std::collections::HashMap;

use crate::{
    balances::L2Balances, BalanceRequirement, TokenAddress, TokenAmount, TokenBalanceResult, U256,
};

/// True when the native balance covers `total_fees`, boundary included.
pub fn has_sufficient_l1_eth(balances: &TokenBalanceResult, total_fees: U256) -> bool {
    balances
        .find(TokenAddress::Native)
        .is_some_and(|native| native.balance >= total_fees)
}

/// Approval gas is only owed when the quote asks for an approval.
pub fn can_cover_approval_fees(l2: &L2Balances<'_>, approval: Option<&TokenAmount>) -> bool {
    let Some(approval) = approval.filter(|fee| !fee.amount.is_zero()) else {
        return true;
    };
    l2.available(approval.token.address)
        .is_some_and(|balance| balance >= approval.amount)
}

/// Checks every obligation of a swap at once. Obligations sharing a token draw from the same
/// balance, so they are summed per token before comparing.
pub fn can_cover_swap_fees(
    l2: &L2Balances<'_>,
    approval: Option<&TokenAmount>,
    swap_fees: &[TokenAmount],
    sold_token: TokenAddress,
    sold_amount: U256,
) -> bool {
    let mut owed: HashMap<TokenAddress, U256> = HashMap::new();
    let mut owe = |token: TokenAddress, amount: U256| {
        let entry = owed.entry(token).or_insert(U256::ZERO);
        *entry = entry.saturating_add(amount);
    };

    if let Some(approval) = approval.filter(|fee| !fee.amount.is_zero()) {
        owe(approval.token.address, approval.amount);
    }
    owe(sold_token, sold_amount);
    for fee in swap_fees.iter().filter(|fee| !fee.amount.is_zero()) {
        owe(fee.token.address, fee.amount);
    }

    owed.iter().all(|(token, amount)| {
        l2.available(*token)
            .is_some_and(|balance| balance >= *amount)
    })
}

/// A swap must not spend funds another requirement in the same token still needs.
pub fn can_cover_requirement(
    l2_balance: U256,
    requirements: &[BalanceRequirement],
    sold_token: TokenAddress,
    sold_amount: U256,
    approval: Option<&TokenAmount>,
    swap_fees: &[TokenAmount],
) -> bool {
    let Some(pinned) = pinned_requirement(requirements, sold_token) else {
        return true;
    };

    let mut remaining = match l2_balance.checked_sub(pinned) {
        Some(remaining) if !remaining.is_zero() => remaining,
        _ => return false,
    };
    let approval_in_sold = approval
        .filter(|fee| fee.token.address == sold_token)
        .map(|fee| fee.amount);
    let fees_in_sold = swap_fees
        .iter()
        .filter(|fee| fee.token.address == sold_token)
        .map(|fee| fee.amount);
    let spent = std::iter::once(sold_amount)
        .chain(approval_in_sold)
        .chain(fees_in_sold);
    for amount in spent {
        remaining = match remaining.checked_sub(amount) {
            Some(remaining) => remaining,
            None => return false,
        };
    }
    true
}

/// Required balance of the fungible requirement denominated in `token`, if there is one.
pub fn pinned_requirement(
    requirements: &[BalanceRequirement],
    token: TokenAddress,
) -> Option<U256> {
    requirements
        .iter()
        .filter(|req| req.item_type.is_fungible())
        .find(|req| req.token_address() == token)
        .map(|req| req.required.balance)
}

/// How much of a token must be bridged so that, after landing, the owner holds `quoted` for the
/// swap on top of whatever `pinned` amount another requirement keeps locked in that token.
pub fn amount_to_bridge(quoted: U256, l2_balance: U256, pinned: Option<U256>) -> U256 {
    match pinned {
        Some(required) if l2_balance < required => {
            quoted.saturating_add(required).saturating_sub(l2_balance)
        }
        Some(required) => quoted.saturating_sub(l2_balance - required),
        None => quoted.saturating_sub(l2_balance),
    }
}

/// The quoted amount with slippage plus every fee the swap charges in the sold token itself.
pub fn quoted_amount_with_fees(quote: &crate::DexQuote) -> U256 {
    let sold = quote.sold_token();
    quote
        .approval
        .iter()
        .chain(quote.swap.iter())
        .chain(quote.fees.iter())
        .filter(|fee| fee.token.address == sold)
        .fold(quote.amount_with_max_slippage.amount, |total, fee| {
            total.saturating_add(fee.amount)
        })
}
