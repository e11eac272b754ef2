use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::Side;

/// Canonical trade produced by the normalizer. Every upstream shape is mapped
/// into this before any downstream stage sees it.
///
/// Invariants: `usd_notional >= 0`, `id` non-empty and stable across repeated
/// fetches of the same underlying event, `timestamp` in epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: String,
    pub wallet: String,
    pub market_id: String,
    pub market_label: String,
    pub usd_notional: Decimal,
    pub timestamp: i64,
    pub side: Side,
}

impl Trade {
    /// First 10 characters of the wallet followed by "...".
    pub fn wallet_short(&self) -> String {
        if self.wallet.chars().count() > 10 {
            format!("{}...", self.wallet.chars().take(10).collect::<String>())
        } else {
            self.wallet.clone()
        }
    }

    pub fn traded_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }

    /// Case-insensitive substring match against the market label and id.
    pub fn matches_market(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.market_label.to_lowercase().contains(&needle)
            || self.market_id.to_lowercase().contains(&needle)
    }
}

impl fmt::Display for Trade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Trade: id={} wallet={} side={} notional={} market={}",
            self.id.chars().take(12).collect::<String>(),
            self.wallet_short(),
            self.side,
            self.usd_notional.round_dp(2),
            self.market_label,
        )
    }
}

/// Whole-dollar amount with thousands separators, e.g. `$1,234,567`.
pub fn format_usd(amount: Decimal) -> String {
    let rounded = amount.round_dp(0).abs().normalize().to_string();
    let mut grouped = String::with_capacity(rounded.len() + rounded.len() / 3);
    for (i, ch) in rounded.chars().enumerate() {
        if i > 0 && (rounded.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if amount.is_sign_negative() && !amount.round_dp(0).is_zero() {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}
