use rust_decimal::Decimal;
use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::TrackerError;
use crate::ingestion::source::raw_usdc_amount;
use crate::models::SourceKind;
use crate::polymarket::data_client::DATA_API_BASE;
use crate::polymarket::rpc_client::POLYGON_RPC;
use crate::polymarket::subgraph_client::STATE_SUBGRAPH_URL;

/// Polymarket FixedProductMarketMakerFactory on Polygon.
const DEFAULT_FPMM_FACTORY: &str = "0x8B9805A2f595B6705e74F7310829f2d299D21522";

const DEFAULT_LOG_FILE: &str = "whale-tracker.log";

/// Placeholder values shipped in sample configs; treated as "not configured".
const PLACEHOLDER_BOT_TOKEN: &str = "your_bot_token";
const PLACEHOLDER_CHAT_ID: &str = "your_chat_id";

/// Which query shape the indexed-query source speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubgraphSchema {
    /// FPMM `fixedProductMarketMakers` with raw 1e6 `investmentAmount`.
    Investments,
    /// CTF `trades` with whole-dollar `amount`.
    Trades,
}

impl FromStr for SubgraphSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "investments" | "fpmm" => Ok(SubgraphSchema::Investments),
            "trades" | "ctf" => Ok(SubgraphSchema::Trades),
            other => Err(format!("unknown subgraph schema '{other}' (expected investments or trades)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    /// Full-screen ranked table, redrawn every cycle.
    Table,
    /// One printed block per new whale trade.
    Feed,
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "table" => Ok(DisplayMode::Table),
            "feed" => Ok(DisplayMode::Feed),
            other => Err(format!("unknown display mode '{other}' (expected table or feed)")),
        }
    }
}

/// Thresholds and cadence for the display. Built once at startup and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayConfig {
    pub whale_threshold: Decimal,
    pub alert_threshold: Decimal,
    pub max_rows: usize,
    pub poll_interval: Duration,
    pub lookback_secs: i64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            whale_threshold: Decimal::from(50_000),
            alert_threshold: Decimal::from(100_000),
            max_rows: 10,
            poll_interval: Duration::from_secs(10),
            lookback_secs: 86_400,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub display: DisplayConfig,

    // Sources
    pub primary_source: SourceKind,
    pub fallback_source: Option<SourceKind>,
    pub fetch_limit: usize,
    pub http_timeout: Duration,
    pub subgraph_url: String,
    pub subgraph_schema: SubgraphSchema,
    pub polygon_rpc_url: String,
    pub fpmm_factory_address: String,
    pub chain_block_range: u64,
    pub data_api_url: String,

    // Run parameters
    pub since: Option<i64>,
    pub market_filter: Option<String>,
    pub display_mode: DisplayMode,

    // Telegram (optional, alerts are only logged without it)
    pub telegram_bot_token: Option<String>,
    pub telegram_chat_id: Option<String>,

    // Observability
    pub metrics_addr: Option<SocketAddr>,
    pub log_file: String,
    pub log_json: bool,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, TrackerError> {
        let defaults = DisplayConfig::default();

        let fallback_raw = env::var("FALLBACK_SOURCE").unwrap_or_else(|_| "chain".into());
        let fallback_source = match fallback_raw.trim().to_lowercase().as_str() {
            "" | "none" => None,
            other => Some(parse_value::<SourceKind>("FALLBACK_SOURCE", other)?),
        };

        Ok(Self {
            display: DisplayConfig {
                whale_threshold: env_or("WHALE_THRESHOLD_USD", defaults.whale_threshold)?,
                alert_threshold: env_or("ALERT_THRESHOLD_USD", defaults.alert_threshold)?,
                max_rows: env_or("MAX_ROWS", defaults.max_rows)?,
                poll_interval: Duration::from_secs(env_or(
                    "POLL_INTERVAL_SECS",
                    defaults.poll_interval.as_secs(),
                )?),
                lookback_secs: env_or("LOOKBACK_SECS", defaults.lookback_secs)?,
            },

            primary_source: env_or("PRIMARY_SOURCE", SourceKind::Subgraph)?,
            fallback_source,
            fetch_limit: env_or("FETCH_LIMIT", 50usize)?,
            http_timeout: Duration::from_secs(env_or("HTTP_TIMEOUT_SECS", 10u64)?),
            subgraph_url: env::var("SUBGRAPH_URL").unwrap_or_else(|_| STATE_SUBGRAPH_URL.into()),
            subgraph_schema: env_or("SUBGRAPH_SCHEMA", SubgraphSchema::Investments)?,
            polygon_rpc_url: env::var("POLYGON_RPC_URL").unwrap_or_else(|_| POLYGON_RPC.into()),
            fpmm_factory_address: env::var("FPMM_FACTORY_ADDRESS")
                .unwrap_or_else(|_| DEFAULT_FPMM_FACTORY.into()),
            chain_block_range: env_or("CHAIN_BLOCK_RANGE", 1_000u64)?,
            data_api_url: env::var("DATA_API_URL").unwrap_or_else(|_| DATA_API_BASE.into()),

            since: None,
            market_filter: None,
            display_mode: env_or("DISPLAY_MODE", DisplayMode::Table)?,

            telegram_bot_token: env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|t| !t.is_empty() && t != PLACEHOLDER_BOT_TOKEN),
            telegram_chat_id: env::var("TELEGRAM_CHAT_ID")
                .ok()
                .filter(|c| !c.is_empty() && c != PLACEHOLDER_CHAT_ID),

            metrics_addr: match env::var("METRICS_ADDR") {
                Ok(addr) if !addr.is_empty() => Some(parse_value("METRICS_ADDR", &addr)?),
                _ => None,
            },
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| DEFAULT_LOG_FILE.into()),
            log_json: env::var("LOG_FORMAT")
                .map(|f| f.eq_ignore_ascii_case("json"))
                .unwrap_or(false),
        })
    }

    /// Reject settings the poll loop cannot run with.
    pub fn validate(&self) -> Result<(), TrackerError> {
        let d = &self.display;
        if d.whale_threshold.is_sign_negative() && !d.whale_threshold.is_zero() {
            return Err(invalid("WHALE_THRESHOLD_USD must not be negative"));
        }
        if d.alert_threshold.is_sign_negative() && !d.alert_threshold.is_zero() {
            return Err(invalid("ALERT_THRESHOLD_USD must not be negative"));
        }
        if raw_usdc_amount(d.whale_threshold).is_none() {
            return Err(invalid("WHALE_THRESHOLD_USD is too large"));
        }
        if d.max_rows == 0 {
            return Err(invalid("MAX_ROWS must be greater than zero"));
        }
        if d.poll_interval.is_zero() {
            return Err(invalid("POLL_INTERVAL_SECS must be greater than zero"));
        }
        if d.lookback_secs <= 0 {
            return Err(invalid("LOOKBACK_SECS must be greater than zero"));
        }
        if self.fetch_limit == 0 {
            return Err(invalid("FETCH_LIMIT must be greater than zero"));
        }
        if self.http_timeout.is_zero() {
            return Err(invalid("HTTP_TIMEOUT_SECS must be greater than zero"));
        }
        if self.chain_block_range == 0 {
            return Err(invalid("CHAIN_BLOCK_RANGE must be greater than zero"));
        }
        if self.fallback_source == Some(self.primary_source) {
            return Err(invalid("FALLBACK_SOURCE must differ from PRIMARY_SOURCE"));
        }
        if d.alert_threshold < d.whale_threshold {
            tracing::warn!(
                alert = %d.alert_threshold,
                whale = %d.whale_threshold,
                "Alert threshold is below whale threshold; every displayed whale will alert"
            );
        }
        Ok(())
    }

    /// Bot token and chat id, when both are configured.
    pub fn telegram(&self) -> Option<(&str, &str)> {
        match (&self.telegram_bot_token, &self.telegram_chat_id) {
            (Some(token), Some(chat_id)) => Some((token.as_str(), chat_id.as_str())),
            _ => None,
        }
    }
}

fn invalid(msg: &str) -> TrackerError {
    TrackerError::Configuration(msg.to_string())
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, TrackerError>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse()
        .map_err(|e| TrackerError::Configuration(format!("{key}={raw:?} is invalid: {e}")))
}

/// Parse `key` from the environment, using `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T, TrackerError>
where
    T: FromStr,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => parse_value(key, &raw),
        _ => Ok(default),
    }
}
