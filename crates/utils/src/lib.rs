use std::collections::HashMap;
use std::sync::OnceLock;

use alloy::primitives::{utils::format_units, U256};

static CHAINS: OnceLock<HashMap<u32, &'static ChainData>> = OnceLock::new();

pub fn get_supported_chains() -> &'static HashMap<u32, &'static ChainData> {
    CHAINS.get_or_init(|| {
        let mut map = HashMap::new();
        for chain in [
            Chain::Ethereum,
            Chain::Arbitrum,
            Chain::Base,
            Chain::ImmutableZkEvm,
            // Add new chains here
        ] {
            let data: &ChainData = chain.into();
            map.insert(data.id, data);
        }
        map
    })
}

pub fn get_chain(id: u32) -> Option<&'static ChainData> {
    get_supported_chains().get(&id).copied()
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NativeCurrency {
    pub name: &'static str,
    pub symbol: &'static str,
    pub decimals: u8,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainData {
    pub id: u32,
    pub name: &'static str,
    pub rpc_url: &'static str,
    pub native_currency: NativeCurrency,
}

const ETHER: NativeCurrency = NativeCurrency {
    name: "Ether",
    symbol: "ETH",
    decimals: 18,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chain {
    Ethereum = 1,
    Arbitrum = 42161,
    Base = 8453,
    ImmutableZkEvm = 13371,
}

impl TryFrom<u32> for Chain {
    type Error = &'static str;

    fn try_from(id: u32) -> Result<Self, Self::Error> {
        match id {
            1 => Ok(Chain::Ethereum),
            42161 => Ok(Chain::Arbitrum),
            8453 => Ok(Chain::Base),
            13371 => Ok(Chain::ImmutableZkEvm),
            _ => Err("Unsupported chain"),
        }
    }
}

impl From<Chain> for &'static ChainData {
    fn from(chain: Chain) -> Self {
        match chain {
            Chain::Ethereum => &ChainData {
                id: Chain::Ethereum as u32,
                name: "Ethereum",
                rpc_url: "https://eth.llamarpc.com",
                native_currency: ETHER,
            },
            Chain::Arbitrum => &ChainData {
                id: Chain::Arbitrum as u32,
                name: "Arbitrum",
                rpc_url: "https://arb1.arbitrum.io/rpc",
                native_currency: ETHER,
            },
            Chain::Base => &ChainData {
                id: Chain::Base as u32,
                name: "Base",
                rpc_url: "https://mainnet.base.org",
                native_currency: ETHER,
            },
            Chain::ImmutableZkEvm => &ChainData {
                id: Chain::ImmutableZkEvm as u32,
                name: "Immutable zkEVM",
                rpc_url: "https://rpc.immutable.com",
                native_currency: NativeCurrency {
                    name: "IMX",
                    symbol: "IMX",
                    decimals: 18,
                },
            },
        }
    }
}

/// Renders a smallest-unit amount as a decimal string, e.g. `1500000` with 6 decimals is
/// `"1.500000"`.
/// Falls back to the raw integer if `decimals` is out of range.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    format_units(amount, decimals).unwrap_or_else(|_| amount.to_string())
}
