use metrics::counter;
use reqwest::Client;
use serde_json::Value;
use thiserror::Error;

use super::types::ApiTrade;

pub const DATA_API_BASE: &str = "https://data-api.polymarket.com";

#[derive(Debug, Error)]
pub enum DataClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// Unauthenticated client for the Data API trade feed.
#[derive(Debug, Clone)]
pub struct DataClient {
    http: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Fetch the most recent `limit` trades across all markets.
    ///
    /// The endpoint has no time filter; callers window the result themselves.
    /// Entries that do not look like trade objects are skipped individually.
    pub async fn get_recent_trades(&self, limit: usize) -> Result<Vec<ApiTrade>, DataClientError> {
        let url = format!("{}/trades", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await?
            .error_for_status()?;

        let body: Value = resp.json().await?;
        parse_trade_list(body)
    }
}

fn parse_trade_list(body: Value) -> Result<Vec<ApiTrade>, DataClientError> {
    let items = match body {
        Value::Array(items) => items,
        other => {
            return Err(DataClientError::Unexpected(format!(
                "expected JSON array, got {}",
                json_kind(&other)
            )))
        }
    };

    let trades = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<ApiTrade>(item) {
            Ok(t) => Some(t),
            Err(e) => {
                counter!("records_dropped_total", "stage" => "decode").increment(1);
                tracing::debug!(error = %e, "Data API: skipping malformed trade entry");
                None
            }
        })
        .collect();
    Ok(trades)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
