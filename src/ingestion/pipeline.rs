use std::collections::VecDeque;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use rust_decimal::Decimal;

use crate::config::DisplayConfig;
use crate::intelligence::{filter_new, select, SeenSet, WhaleBoard};
use crate::models::{SourceKind, Trade};
use crate::services::alerts::{dispatch, DispatchReport};
use crate::services::notifier::AlertSink;

use super::normalizer::normalize;
use super::router::SourceRouter;
use super::source::EventSource;

/// How many recent alert lines are kept for the display footer.
const RECENT_ALERTS: usize = 5;

/// Markets listed in the footer.
const TOP_MARKETS: usize = 5;

/// Per-run settings for the cycle, fixed at startup.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub display: DisplayConfig,
    pub fetch_limit: usize,
    /// Earliest timestamp (epoch seconds) the run is interested in.
    pub since_floor: i64,
    pub market_filter: Option<String>,
}

impl PipelineConfig {
    /// Lower bound for this cycle: `max(since_floor, now - lookback)`.
    pub fn window_start(&self, now: i64) -> i64 {
        self.since_floor.max(now - self.display.lookback_secs)
    }
}

/// State carried between poll cycles. Owned by the poll loop; only one cycle
/// runs at a time, so no locking is involved.
#[derive(Debug)]
pub struct PipelineState {
    pub seen: SeenSet,
    pub board: WhaleBoard,
    pub cycle: u64,
    pub recent_alerts: VecDeque<String>,
    pub top_markets: Vec<String>,
}

impl PipelineState {
    pub fn new(display: &DisplayConfig) -> Self {
        Self {
            seen: SeenSet::new(),
            board: WhaleBoard::new(display.whale_threshold, display.max_rows),
            cycle: 0,
            recent_alerts: VecDeque::with_capacity(RECENT_ALERTS),
            top_markets: Vec::new(),
        }
    }
}

/// What happened in one cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle: u64,
    pub source: SourceKind,
    /// True when the primary failed and the batch came from the fallback, or
    /// when nothing could be fetched at all.
    pub degraded: bool,
    pub fetched: usize,
    pub normalized: usize,
    pub new: usize,
    /// New trades at or above the whale threshold, ranked.
    pub whales: Vec<Trade>,
    pub alerts: DispatchReport,
}

/// Run one fetch → normalize → dedupe → filter → alert cycle.
///
/// Never fails: upstream problems surface as a degraded report with no whales.
pub async fn run_cycle<P, S, N>(
    router: &SourceRouter<P, S>,
    state: &mut PipelineState,
    config: &PipelineConfig,
    sink: Option<&N>,
    now: i64,
) -> CycleReport
where
    P: EventSource,
    S: EventSource,
    N: AlertSink + ?Sized,
{
    let start = Instant::now();
    state.cycle += 1;
    counter!("poll_cycles_total").increment(1);

    let window_start = config.window_start(now);

    // Fetching
    let batch = router.get_batch(window_start, config.fetch_limit).await;
    let source = batch.source;
    let degraded = !batch.ok || source != router.primary().kind();
    let fetched = batch.len();

    // Normalizing (plus the window and market filters the upstream may not apply)
    let mut normalized = 0usize;
    let trades = normalize(batch)
        .inspect(|_| normalized += 1)
        .filter(|t| t.timestamp >= window_start)
        .filter(|t| match config.market_filter.as_deref() {
            Some(needle) => t.matches_market(needle),
            None => true,
        });

    // Deduplicating
    let new_trades: Vec<Trade> = filter_new(&mut state.seen, trades, now).collect();
    let new = new_trades.len();
    counter!("trades_new_total").increment(new as u64);

    // Filtering. A batch never holds more than `fetch_limit` records, so the
    // cap here keeps every new whale; the board applies the display cap.
    let whales = select(new_trades, config.display.whale_threshold, config.fetch_limit);
    counter!("whales_detected_total").increment(whales.len() as u64);

    state.board.update(&whales, window_start);
    let evicted = state.seen.evict_older_than(now - config.display.lookback_secs);
    if evicted > 0 {
        tracing::debug!(evicted, "Evicted expired ids from seen set");
    }

    // Dispatching
    let alerts = dispatch(&whales, config.display.alert_threshold, sink).await;
    for message in &alerts.messages {
        if state.recent_alerts.len() == RECENT_ALERTS {
            state.recent_alerts.pop_front();
        }
        state.recent_alerts.push_back(message.clone());
    }

    state.top_markets = router
        .top_markets(TOP_MARKETS)
        .await
        .into_iter()
        .map(|m| m.question.chars().take(30).collect())
        .collect();

    gauge!("seen_set_size").set(state.seen.len() as f64);
    gauge!("whales_displayed").set(state.board.rows().len() as f64);
    histogram!("poll_cycle_seconds").record(start.elapsed().as_secs_f64());

    let largest = whales.first().map(|t| t.usd_notional).unwrap_or(Decimal::ZERO);
    tracing::info!(
        cycle = state.cycle,
        source = %source,
        degraded,
        fetched,
        normalized,
        new,
        whales = whales.len(),
        largest = %largest,
        alerts = alerts.messages.len(),
        "Poll cycle complete"
    );

    CycleReport {
        cycle: state.cycle,
        source,
        degraded,
        fetched,
        normalized,
        new,
        whales,
        alerts,
    }
}
