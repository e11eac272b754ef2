use std::sync::atomic::{AtomicU64, Ordering};

use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

use super::types::RpcLog;

pub const POLYGON_RPC: &str = "https://polygon-rpc.com";

#[derive(Debug, Error)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

/// JSON-RPC over HTTP client for a Polygon node.
#[derive(Debug)]
pub struct RpcClient {
    http: Client,
    url: String,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(http: Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            next_id: AtomicU64::new(1),
        }
    }

    pub async fn block_number(&self) -> Result<u64, RpcError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::Unexpected(format!("eth_blockNumber returned {result}")))?;
        parse_hex_u64(hex).ok_or_else(|| RpcError::Unexpected(format!("bad block number {hex}")))
    }

    /// Logs emitted by `address` with `topic0` in `[from_block, to_block]`.
    pub async fn get_logs(
        &self,
        address: &str,
        topic0: &str,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<RpcLog>, RpcError> {
        let params = json!([{
            "address": address,
            "topics": [topic0],
            "fromBlock": format!("0x{from_block:x}"),
            "toBlock": format!("0x{to_block:x}"),
        }]);
        let result = self.call("eth_getLogs", params).await?;
        serde_json::from_value(result).map_err(|e| RpcError::Unexpected(e.to_string()))
    }

    /// Unix timestamp (seconds) of a block.
    pub async fn block_timestamp(&self, number: u64) -> Result<i64, RpcError> {
        let result = self
            .call("eth_getBlockByNumber", json!([format!("0x{number:x}"), false]))
            .await?;
        let ts = result
            .get("timestamp")
            .and_then(|t| t.as_str())
            .and_then(parse_hex_u64)
            .ok_or_else(|| RpcError::Unexpected(format!("block {number} has no timestamp")))?;
        i64::try_from(ts).map_err(|_| RpcError::Unexpected(format!("timestamp {ts} out of range")))
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        let resp: Value = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        unwrap_rpc_response(resp)
    }
}

fn unwrap_rpc_response(mut resp: Value) -> Result<Value, RpcError> {
    if let Some(err) = resp.get("error") {
        return Err(RpcError::Rpc {
            code: err.get("code").and_then(|c| c.as_i64()).unwrap_or_default(),
            message: err
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("unknown")
                .to_string(),
        });
    }
    match resp.get_mut("result").map(Value::take) {
        Some(result) if !result.is_null() => Ok(result),
        _ => Err(RpcError::Unexpected("response has no result".into())),
    }
}

/// Parse a `0x`-prefixed hex quantity.
pub fn parse_hex_u64(hex: &str) -> Option<u64> {
    let digits = hex.strip_prefix("0x").unwrap_or(hex);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, 16).ok()
}
