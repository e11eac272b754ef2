use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde_json::json;

use whale_tracker::config::DisplayConfig;
use whale_tracker::ingestion::{EventSource, PipelineConfig};
use whale_tracker::models::{RawRecord, Side, SourceBatch, SourceKind, Trade};
use whale_tracker::polymarket::types::{ApiTrade, GraphAccount, GraphInvestment, GraphMarket};
use whale_tracker::services::AlertSink;
use whale_tracker::TrackerError;

/// Upstream stand-in that replays a scripted sequence of fetch outcomes.
///
/// Once the script runs out every fetch returns an empty batch, or fails if
/// the source was built with [`ScriptedSource::always_failing`].
#[allow(dead_code)]
pub struct ScriptedSource {
    kind: SourceKind,
    script: Mutex<VecDeque<Result<Vec<RawRecord>, String>>>,
    exhausted_error: Option<String>,
    fetches: Arc<AtomicUsize>,
    probes: Arc<AtomicUsize>,
    last_since: Arc<Mutex<Option<i64>>>,
}

#[allow(dead_code)]
impl ScriptedSource {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            script: Mutex::new(VecDeque::new()),
            exhausted_error: None,
            fetches: Arc::new(AtomicUsize::new(0)),
            probes: Arc::new(AtomicUsize::new(0)),
            last_since: Arc::new(Mutex::new(None)),
        }
    }

    pub fn always_failing(kind: SourceKind, reason: &str) -> Self {
        Self {
            exhausted_error: Some(reason.to_string()),
            ..Self::new(kind)
        }
    }

    pub fn then_ok(self, records: Vec<RawRecord>) -> Self {
        self.script.lock().unwrap().push_back(Ok(records));
        self
    }

    pub fn then_fail(self, reason: &str) -> Self {
        self.script.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    /// Shared fetch counter, readable after the source moves into a router.
    pub fn fetch_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.fetches)
    }

    pub fn probe_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.probes)
    }

    pub fn since_seen(&self) -> Arc<Mutex<Option<i64>>> {
        Arc::clone(&self.last_since)
    }
}

#[async_trait]
impl EventSource for ScriptedSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, since: i64, _limit: usize) -> Result<SourceBatch, TrackerError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        *self.last_since.lock().unwrap() = Some(since);

        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(records)) => Ok(SourceBatch::new(self.kind, records)),
            Some(Err(reason)) => Err(TrackerError::upstream(self.kind, reason)),
            None => match &self.exhausted_error {
                Some(reason) => Err(TrackerError::upstream(self.kind, reason)),
                None => Ok(SourceBatch::new(self.kind, Vec::new())),
            },
        }
    }

    async fn probe(&self) -> Result<Vec<String>, TrackerError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(vec!["fixedProductMarketMakers".into(), "trades".into()])
    }
}

/// Alert sink that records every message and can fail on the Nth call (1-based).
#[allow(dead_code)]
#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<String>>,
    calls: AtomicUsize,
    fail_on: Option<usize>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(call: usize) -> Self {
        Self {
            fail_on: Some(call),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn send(&self, message: &str) -> Result<(), TrackerError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(call) {
            return Err(TrackerError::Sink(format!("simulated failure on call {call}")));
        }
        self.sent.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

/// Pipeline settings with the given thresholds and a window covering the last day.
#[allow(dead_code)]
pub fn pipeline_config(whale_threshold: Decimal, alert_threshold: Decimal) -> PipelineConfig {
    PipelineConfig {
        display: DisplayConfig {
            whale_threshold,
            alert_threshold,
            poll_interval: Duration::from_millis(10),
            ..DisplayConfig::default()
        },
        fetch_limit: 100,
        since_floor: 0,
        market_filter: None,
    }
}

#[allow(dead_code)]
pub fn now() -> i64 {
    Utc::now().timestamp()
}

/// Subgraph investment row with a raw (1e6-scaled) USDC amount.
#[allow(dead_code)]
pub fn investment(id: &str, raw_amount: &str, timestamp: i64, question: &str) -> RawRecord {
    RawRecord::Investment(GraphInvestment {
        id: Some(id.into()),
        investment_amount: Some(json!(raw_amount)),
        shares_bought: None,
        timestamp: Some(json!(timestamp.to_string())),
        buyer: Some(GraphAccount {
            id: Some("0xbuyer00000000000000000000000000000000001".into()),
        }),
        market: Some(GraphMarket {
            id: Some("0xmarket000000000000000000000000000000001".into()),
            question: Some(question.into()),
            volume: None,
        }),
    })
}

/// Data API trade; notional is `price * size`.
#[allow(dead_code)]
pub fn api_trade(tx_hash: &str, price: &str, size: &str, timestamp: i64, title: &str) -> RawRecord {
    RawRecord::Rest(ApiTrade {
        price: Some(json!(price)),
        size: Some(json!(size)),
        side: Some("BUY".into()),
        title: Some(title.into()),
        outcome: Some("Yes".into()),
        maker: Some("0xmaker0000000000000000000000000000000001".into()),
        taker: Some("0xtaker0000000000000000000000000000000001".into()),
        proxy_wallet: None,
        condition_id: Some("0xcondition".into()),
        transaction_hash: Some(tx_hash.into()),
        timestamp: Some(json!(timestamp)),
    })
}

#[allow(dead_code)]
pub fn trade(id: &str, usd_notional: Decimal, timestamp: i64) -> Trade {
    Trade {
        id: id.into(),
        wallet: "0xwallet000000000000000000000000000000001".into(),
        market_id: "0xmarket".into(),
        market_label: "Will the Fed cut rates in December?".into(),
        usd_notional,
        timestamp,
        side: Side::Buy,
    }
}
