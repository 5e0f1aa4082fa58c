//! A recorded view of every collaborator result for one planning call.
//!
//! Lets the engine run without live balance, DEX or bridge services: the CLI reads a snapshot
//! from a file and the HTTP surface accepts one inline with the request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    balances::ChainBalances,
    context::AllowLists,
    sources::{
        AllowListKind, AllowListSource, BalanceSource, BridgeAdapter, BridgeFeeEstimate,
        DexQuoter, L1Representation,
    },
    Address, AvailableRoutingOptions, BalanceCheckResult, DexQuote, DexQuotes, ReadOnlyProvider,
    RoutingError, RoutingRequest, TokenAddress, TokenAmount, TokenBalanceResult, TokenInfo, U256,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainBalanceEntry {
    pub chain_id: u32,
    #[serde(flatten)]
    pub result: TokenBalanceResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalGas {
    pub token: Address,
    pub gas: U256,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub balances: Vec<ChainBalanceEntry>,
    #[serde(default)]
    pub allow_lists: AllowLists,
    /// Quotes for selling each candidate into the shortfall token.
    #[serde(default)]
    pub dex_quotes: Vec<DexQuote>,
    /// Missing estimate fails every bridge-based strategy.
    #[serde(default)]
    pub bridge_fee: Option<BridgeFeeEstimate>,
    #[serde(default)]
    pub token_mappings: Vec<L1Representation>,
    /// ERC20 tokens without an entry need no approval.
    #[serde(default)]
    pub approval_gas: Vec<ApprovalGas>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, RoutingError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn chain_balances(&self) -> ChainBalances {
        self.balances
            .iter()
            .map(|entry| (entry.chain_id, entry.result.clone()))
            .collect()
    }

    /// Replaces the balances recorded for `chain_id`.
    pub fn set_balances(&mut self, chain_id: u32, result: TokenBalanceResult) {
        self.balances.retain(|entry| entry.chain_id != chain_id);
        self.balances.push(ChainBalanceEntry { chain_id, result });
    }
}

#[async_trait]
impl BalanceSource for Snapshot {
    async fn fetch_balances(&self, chain_id: u32, _owner: Address) -> TokenBalanceResult {
        self.balances
            .iter()
            .find(|entry| entry.chain_id == chain_id)
            .map(|entry| entry.result.clone())
            .unwrap_or_else(|| {
                TokenBalanceResult::failed(format!("no balances for chain {chain_id}"))
            })
    }
}

#[async_trait]
impl AllowListSource for Snapshot {
    async fn fetch_allow_list(&self, kind: AllowListKind) -> eyre::Result<Vec<TokenInfo>> {
        Ok(match kind {
            AllowListKind::Bridge => self.allow_lists.bridge.clone(),
            AllowListKind::Swap => self.allow_lists.swap.clone(),
            AllowListKind::Onramp => self.allow_lists.onramp.clone(),
        })
    }
}

#[async_trait]
impl DexQuoter for Snapshot {
    async fn fetch_quotes(
        &self,
        _chain_id: u32,
        _owner: Address,
        _required: &TokenAmount,
        candidates: &[TokenAddress],
    ) -> DexQuotes {
        self.dex_quotes
            .iter()
            .filter(|quote| candidates.contains(&quote.sold_token()))
            .map(|quote| (quote.sold_token(), quote.clone()))
            .collect()
    }
}

#[async_trait]
impl BridgeAdapter for Snapshot {
    async fn fee_estimate(
        &self,
        from_chain: u32,
        to_chain: u32,
    ) -> eyre::Result<BridgeFeeEstimate> {
        self.bridge_fee
            .clone()
            .ok_or_else(|| eyre::eyre!("no bridge fee estimate for {from_chain} -> {to_chain}"))
    }

    async fn l1_representation(&self, l2_token: TokenAddress) -> Option<L1Representation> {
        self.token_mappings
            .iter()
            .find(|mapping| mapping.l2_address == l2_token)
            .copied()
    }

    async fn estimate_approval_gas(
        &self,
        _provider: &ReadOnlyProvider,
        _owner: Address,
        token: Address,
        _amount: U256,
    ) -> eyre::Result<U256> {
        Ok(self
            .approval_gas
            .iter()
            .find(|entry| entry.token == token)
            .map_or(U256::ZERO, |entry| entry.gas))
    }
}

/// A complete planning request: the routing inputs plus the snapshot to plan against.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub owner: Address,
    pub balance_check: BalanceCheckResult,
    #[serde(default = "AvailableRoutingOptions::all")]
    pub options: AvailableRoutingOptions,
    #[serde(default)]
    pub snapshot: Snapshot,
}

impl PlanRequest {
    pub fn from_json(json: &str) -> Result<Self, RoutingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Splits into the routing inputs and the snapshot backing the collaborators.
    pub fn into_parts(self) -> (RoutingRequest, Snapshot) {
        (
            RoutingRequest {
                owner: self.owner,
                balance_check: self.balance_check,
                options: self.options,
            },
            self.snapshot,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;

    const PLAN: &str = r#"{
        "owner": "0x0000000000000000000000000000000000000abc",
        "balanceCheck": {
            "sufficient": false,
            "balanceRequirements": [{
                "type": "ERC20",
                "sufficient": false,
                "required": {
                    "balance": "0x64",
                    "formattedBalance": "0.0001",
                    "token": { "name": "USD Coin", "symbol": "USDC", "decimals": 6, "address": "0x2222222222222222222222222222222222222222" }
                },
                "current": {
                    "balance": "0x0",
                    "token": { "name": "USD Coin", "symbol": "USDC", "decimals": 6, "address": "0x2222222222222222222222222222222222222222" }
                },
                "delta": { "balance": "0x64" }
            }]
        },
        "options": { "bridge": true, "swap": false },
        "snapshot": {
            "balances": [
                { "chainId": 1, "success": true, "balances": [
                    { "balance": "0x3e8", "token": { "name": "Ether", "symbol": "ETH", "decimals": 18, "address": null } }
                ] },
                { "chainId": 13371, "success": false, "error": "indexer unavailable" }
            ],
            "allowLists": {
                "bridge": [{ "name": "USD Coin", "symbol": "USDC", "decimals": 6, "address": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa" }]
            },
            "bridgeFee": { "sourceChainGas": "0x1", "bridgeFee": "0x2", "platformFee": "0x3", "totalFees": "0x63" },
            "tokenMappings": [{
                "l1Address": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                "l2Address": "0x2222222222222222222222222222222222222222"
            }],
            "approvalGas": [{ "token": "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "gas": "0x5" }]
        }
    }"#;

    #[test]
    fn parses_plan_request() {
        let (request, snapshot) = PlanRequest::from_json(PLAN).unwrap().into_parts();
        assert!(request.options.bridge);
        assert!(!request.options.swap);
        assert!(!request.options.onramp);
        let requirement = &request.balance_check.balance_requirements[0];
        assert_eq!(requirement.token_address(), l2_usdc().address);
        assert_eq!(requirement.delta.balance, U256::from(100));

        let balances = snapshot.chain_balances();
        assert!(balances[&L1].success);
        assert_eq!(balances[&L1].balances[0].token.address, TokenAddress::Native);
        assert!(!balances[&L2].success);
        assert_eq!(balances[&L2].error.as_deref(), Some("indexer unavailable"));
        assert_eq!(snapshot.allow_lists.bridge, vec![l1_usdc()]);
        assert!(snapshot.allow_lists.swap.is_empty());
        // the supplied total disagrees with its parts and is recomputed
        let fee = snapshot.bridge_fee.unwrap();
        assert_eq!(fee.total_fees, U256::from(6));
        assert_eq!(fee.total_with_approval(U256::from(5)), U256::from(11));
    }

    #[test]
    fn options_default_to_all() {
        let request = PlanRequest::from_json(
            r#"{ "owner": "0x0000000000000000000000000000000000000abc", "balanceCheck": { "sufficient": true, "balanceRequirements": [] } }"#,
        )
        .unwrap();
        assert_eq!(request.options, AvailableRoutingOptions::all());
        assert_eq!(request.snapshot, Snapshot::default());
    }

    #[test]
    fn malformed_json_is_a_snapshot_error() {
        let err = Snapshot::from_json("{ \"balances\": 3 }").unwrap_err();
        assert_eq!(err.code(), "SNAPSHOT_ERROR");
    }

    #[tokio::test]
    async fn missing_chain_is_reported_as_failed() {
        let snapshot = Snapshot::default();
        let result = snapshot.fetch_balances(L1, OWNER).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("chain 1"));
    }

    #[tokio::test]
    async fn quotes_are_limited_to_candidates() {
        let snapshot = Snapshot {
            dex_quotes: vec![dex_quote(&l2_imx(), 1, 2), dex_quote(&l2_gog(), 3, 4)],
            ..Default::default()
        };
        let required = amount(&l2_usdc(), 10);
        let quotes = snapshot
            .fetch_quotes(L2, OWNER, &required, &[l2_gog().address])
            .await;
        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key(&l2_gog().address));
    }

    #[tokio::test]
    async fn bridge_lookups() {
        let PlanRequest { snapshot, .. } = PlanRequest::from_json(PLAN).unwrap();
        let mapping = snapshot.l1_representation(l2_usdc().address).await.unwrap();
        assert_eq!(mapping.l1_address, l1_usdc().address);
        assert!(snapshot.l1_representation(l2_gog().address).await.is_none());

        let providers = crate::ReadOnlyProviders::new(&[L1]).unwrap();
        let provider = providers.get(L1).unwrap();
        let usdc = l1_usdc().address.contract().unwrap();
        let gas = snapshot
            .estimate_approval_gas(provider, OWNER, usdc, U256::from(1))
            .await
            .unwrap();
        assert_eq!(gas, U256::from(5));

        let err = Snapshot::default().fee_estimate(L1, L2).await.unwrap_err();
        assert!(err.to_string().contains("no bridge fee estimate"));
    }

    #[test]
    fn set_balances_replaces_chain_entry() {
        let mut snapshot = Snapshot::default();
        snapshot.set_balances(L1, TokenBalanceResult::failed("down"));
        snapshot.set_balances(L1, TokenBalanceResult::ok(vec![balance(&l1_eth(), 1)]));
        assert_eq!(snapshot.balances.len(), 1);
        assert!(snapshot.chain_balances()[&L1].success);
    }
}
