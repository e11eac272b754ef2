use std::str::FromStr;

use metrics::counter;
use rust_decimal::Decimal;
use serde_json::Value;

use crate::errors::TrackerError;
use crate::ingestion::chain_decoder::USDC_DECIMALS;
use crate::models::{RawRecord, Side, SourceBatch, Trade};
use crate::polymarket::types::{ApiTrade, GraphInvestment, GraphMarket, GraphTrade, InvestmentLog};

/// Maximum characters of a market question kept in the label.
pub const MARKET_LABEL_CHARS: usize = 50;

/// Values at or above this are epoch milliseconds rather than seconds.
const MILLIS_CUTOFF: i64 = 1_000_000_000_000;

/// Unit an upstream reports timestamps in. Fixed per source shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Seconds,
    Millis,
}

// The upstream schemas do not describe their own scale, so each shape's
// amount scale and timestamp unit is pinned here.
/// Subgraph `investmentAmount`: raw USDC integer, 6 decimals.
const INVESTMENT_AMOUNT_SCALE: u32 = USDC_DECIMALS;
/// Subgraph `trades.amount`: whole-dollar decimal.
const GRAPH_TRADE_AMOUNT_SCALE: u32 = 0;
const SUBGRAPH_TIME_UNIT: TimeUnit = TimeUnit::Seconds;
const REST_TIME_UNIT: TimeUnit = TimeUnit::Seconds;

/// Map a batch of raw upstream records into canonical trades, in upstream
/// order. Records with missing or invalid required fields are dropped one at
/// a time and logged; the rest of the batch is unaffected.
pub fn normalize(batch: SourceBatch) -> impl Iterator<Item = Trade> {
    let source = batch.source;
    batch
        .records
        .into_iter()
        .filter_map(move |record| match normalize_record(record) {
            Ok(trade) => Some(trade),
            Err(e) => {
                counter!("records_dropped_total", "stage" => "normalize").increment(1);
                tracing::warn!(error = %e, source = %source, "Dropping malformed record");
                None
            }
        })
}

pub fn normalize_record(record: RawRecord) -> Result<Trade, TrackerError> {
    let trade = match record {
        RawRecord::Investment(r) => from_investment(r)?,
        RawRecord::GraphTrade(r) => from_graph_trade(r)?,
        RawRecord::ChainLog(r) => from_chain_log(r),
        RawRecord::Rest(r) => from_api_trade(r)?,
    };

    if trade.id.is_empty() {
        return Err(TrackerError::Decode("empty trade id".into()));
    }
    if trade.usd_notional.is_sign_negative() && !trade.usd_notional.is_zero() {
        return Err(TrackerError::Decode(format!(
            "negative notional {} for {}",
            trade.usd_notional, trade.id
        )));
    }
    Ok(trade)
}

fn from_investment(r: GraphInvestment) -> Result<Trade, TrackerError> {
    let raw_amount = r
        .investment_amount
        .as_ref()
        .and_then(value_to_decimal)
        .ok_or_else(|| missing("investmentAmount"))?;
    let wallet = r
        .buyer
        .and_then(|b| b.id)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| missing("buyer.id"))?;
    let timestamp = r
        .timestamp
        .as_ref()
        .and_then(value_to_i64)
        .map(|ts| to_epoch_seconds(ts, SUBGRAPH_TIME_UNIT))
        .ok_or_else(|| missing("timestamp"))?;
    let (market_id, market_label) = market_fields(r.market.as_ref());

    let id = r
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{wallet}:{market_id}:{timestamp}"));

    Ok(Trade {
        id,
        wallet,
        market_id,
        market_label,
        usd_notional: scale_down(raw_amount, INVESTMENT_AMOUNT_SCALE),
        timestamp,
        side: Side::Buy,
    })
}

fn from_graph_trade(r: GraphTrade) -> Result<Trade, TrackerError> {
    let amount = r
        .amount
        .as_ref()
        .and_then(value_to_decimal)
        .ok_or_else(|| missing("amount"))?;
    let wallet = r
        .account
        .as_ref()
        .and_then(account_id)
        .ok_or_else(|| missing("account"))?;
    let timestamp = r
        .timestamp
        .as_ref()
        .and_then(value_to_i64)
        .map(|ts| to_epoch_seconds(ts, SUBGRAPH_TIME_UNIT))
        .ok_or_else(|| missing("timestamp"))?;
    let (market_id, market_label) = market_fields(r.market.as_ref());

    let id = r
        .id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| format!("{wallet}:{market_id}:{timestamp}"));

    Ok(Trade {
        id,
        wallet,
        market_id,
        market_label,
        usd_notional: scale_down(amount, GRAPH_TRADE_AMOUNT_SCALE),
        timestamp,
        side: r
            .trade_type
            .as_deref()
            .map(Side::from_api_str)
            .unwrap_or(Side::Unknown),
    })
}

fn from_chain_log(r: InvestmentLog) -> Trade {
    let market_label = format!("Market {}...", truncate_chars(&r.market, 10));
    Trade {
        id: r.id,
        wallet: r.buyer,
        market_id: r.market,
        market_label,
        usd_notional: r.amount_usd,
        timestamp: r.timestamp,
        side: Side::Buy,
    }
}

fn from_api_trade(r: ApiTrade) -> Result<Trade, TrackerError> {
    let id = r
        .transaction_hash
        .filter(|h| !h.is_empty())
        .ok_or_else(|| missing("transactionHash"))?;
    let price = r
        .price
        .as_ref()
        .and_then(value_to_decimal)
        .ok_or_else(|| missing("price"))?;
    let size = r
        .size
        .as_ref()
        .and_then(value_to_decimal)
        .ok_or_else(|| missing("size"))?;
    let timestamp = r
        .timestamp
        .as_ref()
        .and_then(value_to_i64)
        .map(|ts| to_epoch_seconds(ts, REST_TIME_UNIT))
        .ok_or_else(|| missing("timestamp"))?;

    // The reported side is the taker's, so the taker is the wallet that
    // initiated the trade; fall back to maker, then the proxy wallet.
    let wallet = [r.taker, r.maker, r.proxy_wallet]
        .into_iter()
        .flatten()
        .find(|w| !w.is_empty())
        .ok_or_else(|| missing("taker/maker"))?;

    let usd_notional = price.checked_mul(size).ok_or_else(|| {
        TrackerError::Decode(format!("notional overflow: {price} x {size} for {id}"))
    })?;

    let title = match (r.title.as_deref(), r.outcome.as_deref()) {
        (Some(title), Some(outcome)) if !outcome.is_empty() => format!("{title} [{outcome}]"),
        (Some(title), _) => title.to_string(),
        (None, _) => "Unknown market".to_string(),
    };

    Ok(Trade {
        id,
        wallet,
        market_id: r.condition_id.unwrap_or_default(),
        market_label: market_label(&title),
        usd_notional,
        timestamp,
        side: r
            .side
            .as_deref()
            .map(Side::from_api_str)
            .unwrap_or(Side::Unknown),
    })
}

fn missing(field: &str) -> TrackerError {
    TrackerError::Decode(format!("missing or invalid field '{field}'"))
}

fn market_fields(market: Option<&GraphMarket>) -> (String, String) {
    let id = market.and_then(|m| m.id.clone()).unwrap_or_default();
    let label = match market.and_then(|m| m.question.as_deref()) {
        Some(q) if !q.is_empty() => market_label(q),
        _ if !id.is_empty() => format!("Market {}...", truncate_chars(&id, 10)),
        _ => "Unknown market".to_string(),
    };
    (id, label)
}

/// Question truncated to `MARKET_LABEL_CHARS` characters, with an ellipsis
/// when anything was cut.
pub fn market_label(question: &str) -> String {
    let question = question.trim();
    if question.chars().count() > MARKET_LABEL_CHARS {
        format!("{}…", truncate_chars(question, MARKET_LABEL_CHARS))
    } else {
        question.to_string()
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn scale_down(value: Decimal, decimals: u32) -> Decimal {
    if decimals == 0 {
        value
    } else {
        value / Decimal::from(10u64.pow(decimals))
    }
}

/// Convert a timestamp in the given unit to epoch seconds.
pub fn to_epoch_seconds(value: i64, unit: TimeUnit) -> i64 {
    match unit {
        TimeUnit::Seconds => value,
        TimeUnit::Millis => value / 1000,
    }
}

/// Epoch seconds from a user-supplied value that may be seconds or milliseconds.
pub fn epoch_seconds_lenient(value: i64) -> i64 {
    if value >= MILLIS_CUTOFF {
        to_epoch_seconds(value, TimeUnit::Millis)
    } else {
        to_epoch_seconds(value, TimeUnit::Seconds)
    }
}

fn value_to_decimal(v: &Value) -> Option<Decimal> {
    match v {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

fn value_to_i64(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Subgraph `account` is either a bare address or an `{ id }` object.
fn account_id(v: &Value) -> Option<String> {
    match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(o) => o
            .get("id")
            .and_then(|id| id.as_str())
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        _ => None,
    }
}
