use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Upstream record shapes are deliberately lenient: every field is optional so
// one odd record never fails the whole response. Required-field checks happen
// in the normalizer, one record at a time.

// ---------------------------------------------------------------------------
// Subgraph: investments schema (FPMM state subgraph)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphAccount {
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphMarket {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub volume: Option<Value>,
}

/// `fixedProductMarketMakers` entry. `investmentAmount` is a raw USDC integer
/// (6 decimals), serialized by the subgraph as a string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphInvestment {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub investment_amount: Option<Value>,
    #[serde(default)]
    pub shares_bought: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub buyer: Option<GraphAccount>,
    #[serde(default)]
    pub market: Option<GraphMarket>,
}

// ---------------------------------------------------------------------------
// Subgraph: trades schema (CTF subgraph)
// ---------------------------------------------------------------------------

/// `trades` entry. `amount` is already a whole-dollar decimal.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GraphTrade {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "type")]
    pub trade_type: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default)]
    pub account: Option<Value>,
    #[serde(default)]
    pub market: Option<GraphMarket>,
}

/// Market row used for the "top markets" footer.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct MarketSummary {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub volume: Option<Decimal>,
}

// ---------------------------------------------------------------------------
// Trade (Data API REST)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiTrade {
    #[serde(default)]
    pub price: Option<Value>,
    #[serde(default)]
    pub size: Option<Value>,
    #[serde(default)]
    pub side: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub maker: Option<String>,
    #[serde(default)]
    pub taker: Option<String>,
    #[serde(default)]
    pub proxy_wallet: Option<String>,
    #[serde(default)]
    pub condition_id: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub timestamp: Option<Value>,
}

// ---------------------------------------------------------------------------
// Chain log (JSON-RPC eth_getLogs)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<String>,
    #[serde(default)]
    pub log_index: Option<String>,
}

/// A decoded `LogInvestmentChanged` event. The amount has already been scaled
/// from raw USDC units to dollars by the chain decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestmentLog {
    pub id: String,
    pub buyer: String,
    pub market: String,
    pub amount_usd: Decimal,
    pub block_number: u64,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_trade_tolerates_missing_fields() {
        let trade: ApiTrade = serde_json::from_value(json!({
            "price": 0.5,
            "size": "20000",
            "transactionHash": "0xabc"
        }))
        .unwrap();

        assert_eq!(trade.transaction_hash.as_deref(), Some("0xabc"));
        assert!(trade.taker.is_none());
        assert!(trade.timestamp.is_none());
    }

    #[test]
    fn test_graph_investment_camel_case() {
        let inv: GraphInvestment = serde_json::from_value(json!({
            "id": "0x1",
            "investmentAmount": "60000000000",
            "timestamp": "100",
            "buyer": { "id": "0xbuyer" },
            "market": { "id": "0xm", "question": "Q?", "volume": "10" }
        }))
        .unwrap();

        assert_eq!(inv.buyer.and_then(|b| b.id).as_deref(), Some("0xbuyer"));
        assert_eq!(inv.investment_amount, Some(json!("60000000000")));
    }
}
