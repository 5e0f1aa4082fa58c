pub use alloy::primitives::{Address, U256};

pub mod balances;
pub mod bridge;
pub mod bridge_swap;
pub mod calculator;
pub mod config;
pub mod context;
pub mod error;
pub mod fees;
pub mod gate;
pub mod onramp;
pub mod providers;
pub mod quote_cache;
pub mod snapshot;
pub mod sources;
pub mod swap;

#[cfg(test)]
pub(crate) mod test_utils;

pub use calculator::{RoutingCalculator, RoutingRequest};
pub use config::RoutingConfig;
pub use error::RoutingError;
pub use providers::{ReadOnlyProvider, ReadOnlyProviders};
pub use snapshot::{PlanRequest, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemType {
    Native,
    Erc20,
    Erc721,
}

impl ItemType {
    /// Only fungible requirements can be funded.
    pub fn is_fungible(&self) -> bool {
        matches!(self, Self::Native | Self::Erc20)
    }
}

/// Location of a token on a chain. Serialized as `null` for the chain's native asset,
/// or the ERC20 contract address otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(from = "Option<Address>", into = "Option<Address>")]
pub enum TokenAddress {
    #[default]
    Native,
    Erc20(Address),
}

impl TokenAddress {
    pub fn is_native(&self) -> bool {
        matches!(self, Self::Native)
    }

    pub fn contract(&self) -> Option<Address> {
        match self {
            Self::Native => None,
            Self::Erc20(address) => Some(*address),
        }
    }

    /// Item type of a fungible token living at this address.
    pub fn item_type(&self) -> ItemType {
        match self {
            Self::Native => ItemType::Native,
            Self::Erc20(_) => ItemType::Erc20,
        }
    }
}

impl From<Option<Address>> for TokenAddress {
    fn from(address: Option<Address>) -> Self {
        address.map_or(Self::Native, Self::Erc20)
    }
}

impl From<TokenAddress> for Option<Address> {
    fn from(address: TokenAddress) -> Self {
        address.contract()
    }
}

impl From<Address> for TokenAddress {
    fn from(address: Address) -> Self {
        Self::Erc20(address)
    }
}

impl core::fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Native => write!(f, "native"),
            Self::Erc20(address) => write!(f, "{address}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenInfo {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(default)]
    pub address: TokenAddress,
}

impl TokenInfo {
    pub fn native(chain: &utils::ChainData) -> Self {
        Self {
            name: chain.native_currency.name.to_string(),
            symbol: chain.native_currency.symbol.to_string(),
            decimals: chain.native_currency.decimals,
            address: TokenAddress::Native,
        }
    }
}

/// A balance held by the owner, in the token's smallest unit.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalance {
    pub balance: U256,
    #[serde(default)]
    pub formatted_balance: String,
    pub token: TokenInfo,
}

impl TokenBalance {
    pub fn new(balance: U256, token: TokenInfo) -> Self {
        Self {
            formatted_balance: utils::format_amount(balance, token.decimals),
            balance,
            token,
        }
    }

    pub fn as_balance(&self) -> Balance {
        Balance {
            balance: self.balance,
            formatted_balance: self.formatted_balance.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Balance {
    pub balance: U256,
    #[serde(default)]
    pub formatted_balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedAmount {
    pub amount: U256,
    #[serde(default)]
    pub formatted_amount: String,
}

/// An amount denominated in a specific token, used for quotes and fees.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenAmount {
    pub amount: U256,
    #[serde(default)]
    pub formatted_amount: String,
    pub token: TokenInfo,
}

impl TokenAmount {
    pub fn new(amount: U256, token: TokenInfo) -> Self {
        Self {
            formatted_amount: utils::format_amount(amount, token.decimals),
            amount,
            token,
        }
    }

    pub fn as_formatted(&self) -> FormattedAmount {
        FormattedAmount {
            amount: self.amount,
            formatted_amount: self.formatted_amount.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceRequirement {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub sufficient: bool,
    pub required: TokenBalance,
    pub current: TokenBalance,
    /// Shortfall, `required - current`. Zero when sufficient.
    pub delta: Balance,
}

impl BalanceRequirement {
    /// Builds a requirement for `token`, deriving `delta` and `sufficient` from the two balances.
    pub fn new(item_type: ItemType, token: TokenInfo, required: U256, current: U256) -> Self {
        let delta = required.saturating_sub(current);
        Self {
            item_type,
            sufficient: current >= required,
            delta: Balance {
                balance: delta,
                formatted_balance: utils::format_amount(delta, token.decimals),
            },
            required: TokenBalance::new(required, token.clone()),
            current: TokenBalance::new(current, token),
        }
    }

    pub fn token_address(&self) -> TokenAddress {
        self.required.token.address
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceCheckResult {
    pub sufficient: bool,
    pub balance_requirements: Vec<BalanceRequirement>,
}

impl BalanceCheckResult {
    pub fn new(balance_requirements: Vec<BalanceRequirement>) -> Self {
        Self {
            sufficient: balance_requirements.iter().all(|req| req.sufficient),
            balance_requirements,
        }
    }
}

/// Per-chain balance fetch result. A chain whose result is missing or unsuccessful is unusable.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenBalanceResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub balances: Vec<TokenBalance>,
}

impl TokenBalanceResult {
    pub fn ok(balances: Vec<TokenBalance>) -> Self {
        Self {
            success: true,
            error: None,
            balances,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            balances: Vec::new(),
        }
    }

    pub fn find(&self, token: TokenAddress) -> Option<&TokenBalance> {
        self.balances
            .iter()
            .find(|balance| balance.token.address == token)
    }
}

/// Amount to move across the bridge, addressed by its destination-chain token.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeRequirement {
    pub amount: U256,
    pub formatted_amount: String,
    pub l2_address: TokenAddress,
}

/// DEX quote for selling a candidate token into the required token.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DexQuote {
    /// Principal of the token being sold.
    pub amount: TokenAmount,
    /// Principal plus the max slippage buffer; this is what the owner must hold.
    pub amount_with_max_slippage: TokenAmount,
    /// Protocol fees, each in its own token.
    #[serde(default)]
    pub fees: Vec<TokenAmount>,
    #[serde(default)]
    pub approval: Option<TokenAmount>,
    #[serde(default)]
    pub swap: Option<TokenAmount>,
}

impl DexQuote {
    /// Swap gas followed by every protocol fee.
    pub fn swap_fees(&self) -> Vec<TokenAmount> {
        self.swap.iter().chain(self.fees.iter()).cloned().collect()
    }

    pub fn sold_token(&self) -> TokenAddress {
        self.amount.token.address
    }
}

pub type DexQuotes = std::collections::HashMap<TokenAddress, DexQuote>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FundingStepType {
    Bridge,
    Swap,
    Onramp,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingItem {
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub funds_required: FormattedAmount,
    pub user_balance: Balance,
    pub token: TokenInfo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepFees {
    pub approval_gas_fee: Option<TokenAmount>,
    /// Bridge source-chain gas or swap gas, depending on the step.
    pub gas_fee: Option<TokenAmount>,
    pub protocol_fees: Vec<TokenAmount>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingStep {
    #[serde(rename = "type")]
    pub step_type: FundingStepType,
    pub chain_id: u32,
    pub funding_item: FundingItem,
    pub fees: StepFees,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingRoute {
    /// Lower is preferred.
    pub priority: u8,
    pub steps: Vec<FundingStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RoutingStrategy {
    Swap,
    Bridge,
    Onramp,
    BridgeAndSwap,
}

impl RoutingStrategy {
    pub fn priority(&self) -> u8 {
        match self {
            Self::Swap => 1,
            Self::Bridge => 2,
            Self::Onramp => 3,
            Self::BridgeAndSwap => 4,
        }
    }
}

impl core::fmt::Display for RoutingStrategy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Swap => write!(f, "swap"),
            Self::Bridge => write!(f, "bridge"),
            Self::Onramp => write!(f, "onramp"),
            Self::BridgeAndSwap => write!(f, "bridge_and_swap"),
        }
    }
}

/// Strategies the caller allows. Bridge-and-swap runs when both `bridge` and `swap` are enabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableRoutingOptions {
    #[serde(default)]
    pub bridge: bool,
    #[serde(default)]
    pub swap: bool,
    #[serde(default)]
    pub onramp: bool,
}

impl AvailableRoutingOptions {
    pub fn all() -> Self {
        Self {
            bridge: true,
            swap: true,
            onramp: true,
        }
    }

    pub fn any(&self) -> bool {
        self.bridge || self.swap || self.onramp
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingOutcome {
    NoRouteOptions {
        message: String,
    },
    NoRoutesFound {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    RoutesFound {
        funding_routes: Vec<FundingRoute>,
    },
}

impl RoutingOutcome {
    pub fn funding_routes(&self) -> &[FundingRoute] {
        match self {
            Self::RoutesFound { funding_routes } => funding_routes,
            _ => &[],
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoRouteOptions { .. } => "no_route_options",
            Self::NoRoutesFound { .. } => "no_routes_found",
            Self::RoutesFound { .. } => "routes_found",
        }
    }
}
