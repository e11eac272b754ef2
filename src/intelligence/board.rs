use rust_decimal::Decimal;

use crate::models::Trade;

use super::ranker::select;

/// How many whales the board retains per displayed row, so rows expiring out
/// of the lookback window can be backfilled by the next-largest trade.
const RETAIN_FACTOR: usize = 10;

/// Rolling set of whale trades shown on screen.
///
/// Each cycle's new whales are admitted, entries older than the lookback
/// window are expired, and the display rows are the top of the ranking.
#[derive(Debug)]
pub struct WhaleBoard {
    whale_threshold: Decimal,
    max_rows: usize,
    trades: Vec<Trade>,
}

impl WhaleBoard {
    pub fn new(whale_threshold: Decimal, max_rows: usize) -> Self {
        Self {
            whale_threshold,
            max_rows,
            trades: Vec::new(),
        }
    }

    /// Add newly detected whales and drop anything with a timestamp before `cutoff`.
    pub fn update(&mut self, new_whales: &[Trade], cutoff: i64) {
        let retained = std::mem::take(&mut self.trades)
            .into_iter()
            .chain(new_whales.iter().cloned())
            .filter(|t| t.timestamp >= cutoff);

        let capacity = self.max_rows.saturating_mul(RETAIN_FACTOR);
        self.trades = select(retained, self.whale_threshold, capacity);
    }

    /// Ranked rows for display, at most `max_rows`.
    pub fn rows(&self) -> &[Trade] {
        &self.trades[..self.trades.len().min(self.max_rows)]
    }

    pub fn len(&self) -> usize {
        self.trades.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trades.is_empty()
    }
}
