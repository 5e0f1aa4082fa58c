use std::collections::HashMap;

use crate::{Balance, TokenAddress, TokenBalance, TokenBalanceResult, TokenInfo, U256};

pub type ChainBalances = HashMap<u32, TokenBalanceResult>;

/// The chain's balances, if they were fetched successfully.
pub fn usable_balances(balances: &ChainBalances, chain_id: u32) -> Option<&TokenBalanceResult> {
    balances.get(&chain_id).filter(|result| result.success)
}

/// Destination-chain balances as seen by the swap resolver.
///
/// `bridged` holds amounts that a preceding bridge step will deliver. They count towards
/// affordability checks but are never reported back as the owner's balance.
#[derive(Debug, Clone)]
pub struct L2Balances<'a> {
    balances: &'a [TokenBalance],
    bridged: HashMap<TokenAddress, U256>,
}

impl<'a> L2Balances<'a> {
    pub fn new(balances: &'a [TokenBalance]) -> Self {
        Self {
            balances,
            bridged: HashMap::new(),
        }
    }

    pub fn with_bridged(
        balances: &'a [TokenBalance],
        bridged: HashMap<TokenAddress, U256>,
    ) -> Self {
        Self { balances, bridged }
    }

    pub fn real(&self, token: TokenAddress) -> Option<&'a TokenBalance> {
        self.balances
            .iter()
            .find(|balance| balance.token.address == token)
    }

    /// Balance available once pending bridge deliveries land.
    pub fn available(&self, token: TokenAddress) -> Option<U256> {
        let real = self.real(token).map(|balance| balance.balance);
        let bridged = self.bridged.get(&token).copied();
        match (real, bridged) {
            (None, None) => None,
            (real, bridged) => Some(
                real.unwrap_or(U256::ZERO)
                    .saturating_add(bridged.unwrap_or(U256::ZERO)),
            ),
        }
    }

    /// The owner's actual balance of `token`, zero if they hold none.
    pub fn reported(&self, token: &TokenInfo) -> Balance {
        self.real(token.address)
            .map(TokenBalance::as_balance)
            .unwrap_or_else(|| TokenBalance::new(U256::ZERO, token.clone()).as_balance())
    }
}
