use metrics::counter;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use thiserror::Error;

use super::types::{GraphInvestment, GraphTrade, MarketSummary};

/// Goldsky-hosted FPMM state subgraph.
pub const STATE_SUBGRAPH_URL: &str = "https://api.goldsky.com/api/public/project_cl6mb8i9h0003e201j6li0diw/subgraphs/state-subgraph/0.0.5/gn";

const INVESTMENTS_QUERY: &str = r#"
query GetWhaleTrades($timestamp: BigInt!, $amount: BigDecimal!, $first: Int!) {
  fixedProductMarketMakers(
    where: {timestamp_gte: $timestamp, investmentAmount_gte: $amount}
    orderBy: timestamp
    orderDirection: desc
    first: $first
  ) {
    id
    investmentAmount
    sharesBought
    timestamp
    buyer { id }
    market { id question volume }
  }
}
"#;

const TRADES_QUERY: &str = r#"
query GetWhaleTrades($timestamp: BigInt!, $amount: BigDecimal!, $first: Int!) {
  trades(
    where: {timestamp_gte: $timestamp, amount_gte: $amount}
    orderBy: timestamp
    orderDirection: desc
    first: $first
  ) {
    id
    type
    amount
    timestamp
    account
    market { id question }
  }
}
"#;

const TOP_MARKETS_QUERY: &str = r#"
query GetTopMarkets($first: Int!) {
  markets(orderBy: volume, orderDirection: desc, first: $first) {
    id
    question
    volume
  }
}
"#;

const INTROSPECTION_QUERY: &str = "{ __schema { queryType { fields { name } } } }";

#[derive(Debug, Error)]
pub enum SubgraphError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("GraphQL errors: {0}")]
    GraphQl(String),

    #[error("schema mismatch: {0}")]
    Schema(String),
}

/// Minimal GraphQL-over-HTTP client for the Polymarket subgraphs.
#[derive(Debug, Clone)]
pub struct SubgraphClient {
    http: Client,
    url: String,
}

impl SubgraphClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    /// Newest-first FPMM investments at or after `since` with a raw (1e6-scaled)
    /// investment amount of at least `min_amount_raw`.
    pub async fn investments(
        &self,
        since: i64,
        min_amount_raw: &str,
        first: usize,
    ) -> Result<Vec<Value>, SubgraphError> {
        let vars = json!({
            "timestamp": since.to_string(),
            "amount": min_amount_raw,
            "first": first,
        });
        let data = self.execute(INVESTMENTS_QUERY, vars).await?;
        collection(&data, "fixedProductMarketMakers")
    }

    /// Newest-first CTF trades at or after `since` with `amount >= min_amount` dollars.
    pub async fn trades(
        &self,
        since: i64,
        min_amount: &str,
        first: usize,
    ) -> Result<Vec<Value>, SubgraphError> {
        let vars = json!({
            "timestamp": since.to_string(),
            "amount": min_amount,
            "first": first,
        });
        let data = self.execute(TRADES_QUERY, vars).await?;
        collection(&data, "trades")
    }

    pub async fn top_markets(&self, first: usize) -> Result<Vec<MarketSummary>, SubgraphError> {
        let data = self.execute(TOP_MARKETS_QUERY, json!({ "first": first })).await?;
        let rows = collection(&data, "markets")?;
        Ok(decode_rows(rows))
    }

    /// Names of the root query fields the endpoint exposes.
    pub async fn query_fields(&self) -> Result<Vec<String>, SubgraphError> {
        let data = self.execute(INTROSPECTION_QUERY, json!({})).await?;
        parse_query_fields(&data)
    }

    async fn execute(&self, query: &str, variables: Value) -> Result<Value, SubgraphError> {
        let body = json!({ "query": query, "variables": variables });
        let resp = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let envelope: Value = resp.json().await?;
        unwrap_envelope(envelope)
    }
}

/// Split a GraphQL response into its `data` member, treating an `errors`
/// array or a missing `data` as failure.
fn unwrap_envelope(mut envelope: Value) -> Result<Value, SubgraphError> {
    if let Some(errors) = envelope.get("errors").and_then(|e| e.as_array()) {
        if !errors.is_empty() {
            let messages: Vec<&str> = errors
                .iter()
                .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                .collect();
            return Err(SubgraphError::GraphQl(messages.join("; ")));
        }
    }

    match envelope.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(SubgraphError::Schema("response has no data".into())),
    }
}

fn collection(data: &Value, field: &str) -> Result<Vec<Value>, SubgraphError> {
    data.get(field)
        .and_then(|v| v.as_array())
        .cloned()
        .ok_or_else(|| SubgraphError::Schema(format!("missing collection '{field}'")))
}

fn parse_query_fields(data: &Value) -> Result<Vec<String>, SubgraphError> {
    let fields = data
        .pointer("/__schema/queryType/fields")
        .and_then(|f| f.as_array())
        .ok_or_else(|| SubgraphError::Schema("introspection result has no fields".into()))?;

    Ok(fields
        .iter()
        .filter_map(|f| f.get("name").and_then(|n| n.as_str()))
        .map(str::to_string)
        .collect())
}

/// Decode rows one by one, dropping any that do not fit the target shape.
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> Vec<T> {
    rows.into_iter()
        .filter_map(|row| match serde_json::from_value::<T>(row) {
            Ok(v) => Some(v),
            Err(e) => {
                counter!("records_dropped_total", "stage" => "decode").increment(1);
                tracing::debug!(error = %e, "Subgraph: skipping malformed row");
                None
            }
        })
        .collect()
}

pub fn decode_investments(rows: Vec<Value>) -> Vec<GraphInvestment> {
    decode_rows(rows)
}

pub fn decode_trades(rows: Vec<Value>) -> Vec<GraphTrade> {
    decode_rows(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;

    /// Recorder that tallies `records_dropped_total` and ignores everything else.
    #[derive(Default)]
    struct DroppedRecords(Arc<AtomicU64>);

    impl Recorder for DroppedRecords {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            if key.name() == "records_dropped_total" {
                Counter::from_arc(Arc::clone(&self.0))
            } else {
                Counter::noop()
            }
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_unwrap_envelope_errors() {
        let envelope = json!({
            "errors": [{ "message": "Type `Query` has no field `fixedProductMarketMakers`" }]
        });
        let err = unwrap_envelope(envelope).unwrap_err();
        assert!(matches!(err, SubgraphError::GraphQl(ref m) if m.contains("no field")));
    }

    #[test]
    fn test_unwrap_envelope_null_data() {
        let err = unwrap_envelope(json!({ "data": null })).unwrap_err();
        assert!(matches!(err, SubgraphError::Schema(_)));
    }

    #[test]
    fn test_collection_missing_field() {
        let data = json!({ "markets": [] });
        assert!(collection(&data, "trades").is_err());
        assert_eq!(collection(&data, "markets").unwrap().len(), 0);
    }

    #[test]
    fn test_parse_query_fields() {
        let data = json!({
            "__schema": { "queryType": { "fields": [
                { "name": "markets" }, { "name": "fpmmTrades" }, { "name": "_meta" }
            ]}}
        });
        assert_eq!(
            parse_query_fields(&data).unwrap(),
            vec!["markets", "fpmmTrades", "_meta"]
        );
    }

    #[test]
    fn test_decode_top_markets_drops_bad_rows() {
        let rows = vec![
            json!({ "id": "0x1", "question": "Will it rain?", "volume": "1200.5" }),
            json!({ "id": "0x2" }),
        ];
        let markets: Vec<MarketSummary> = decode_rows(rows);
        assert_eq!(markets.len(), 1);
        assert_eq!(markets[0].question, "Will it rain?");
    }

    #[test]
    fn test_malformed_rows_counted_as_dropped() {
        let recorder = DroppedRecords::default();
        let rows = vec![
            json!({ "id": "0x1", "question": "Will it rain?" }),
            json!({ "id": "0x2" }),
            json!("not an object"),
        ];

        let markets: Vec<MarketSummary> =
            metrics::with_local_recorder(&recorder, || decode_rows(rows));

        assert_eq!(markets.len(), 1);
        assert_eq!(recorder.0.load(Ordering::SeqCst), 2);
    }
}
