pub mod feed;
pub mod layout;
pub mod terminal;

pub use feed::FeedPresenter;
pub use terminal::TerminalPresenter;

use chrono::{DateTime, Utc};

use crate::ingestion::pipeline::{CycleReport, PipelineState};
use crate::models::Trade;

/// Row shown when the board is empty, including when every upstream failed.
pub const NO_WHALES_PLACEHOLDER: &str = "No recent whales (try extending --since)";

/// Receives one rendered snapshot per poll cycle.
pub trait Presenter {
    fn render(&mut self, snapshot: &Snapshot) -> anyhow::Result<()>;
}

/// Everything the display needs for one refresh.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// Ranked board rows, at most `max_rows`.
    pub rows: Vec<Trade>,
    /// Whales first detected in this cycle.
    pub new_whales: Vec<Trade>,
    pub summary: String,
    pub top_markets: Vec<String>,
    pub alerts: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn from_cycle(state: &PipelineState, report: &CycleReport) -> Self {
        let updated_at = Utc::now();
        let mut summary = format!(
            "Cycle {} | Source: {} | Fetched: {} | New: {} | Board: {} | Seen: {} | Updated: {}",
            report.cycle,
            report.source,
            report.fetched,
            report.new,
            state.board.len(),
            state.seen.len(),
            updated_at.format("%H:%M:%S UTC"),
        );
        if report.degraded {
            summary.push_str(" | DEGRADED");
        }

        Self {
            rows: state.board.rows().to_vec(),
            new_whales: report.whales.clone(),
            summary,
            top_markets: state.top_markets.clone(),
            alerts: state.recent_alerts.iter().cloned().collect(),
            updated_at,
        }
    }
}

/// Format an epoch-seconds timestamp with `fmt`, or "N/A" if out of range.
pub fn format_timestamp(timestamp: i64, fmt: &str) -> String {
    match DateTime::<Utc>::from_timestamp(timestamp, 0) {
        Some(dt) => dt.format(fmt).to_string(),
        None => "N/A".to_string(),
    }
}
