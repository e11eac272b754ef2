use std::cmp::Ordering;

use rust_decimal::Decimal;

use crate::models::Trade;

/// Keep trades with `usd_notional >= whale_threshold`, ordered by notional
/// descending, then by timestamp descending, then by id for a total order.
/// At most `max_rows` trades are returned.
pub fn select<I>(trades: I, whale_threshold: Decimal, max_rows: usize) -> Vec<Trade>
where
    I: IntoIterator<Item = Trade>,
{
    let mut whales: Vec<Trade> = trades
        .into_iter()
        .filter(|t| t.usd_notional >= whale_threshold)
        .collect();

    whales.sort_by(rank_order);
    whales.truncate(max_rows);
    whales
}

fn rank_order(a: &Trade, b: &Trade) -> Ordering {
    b.usd_notional
        .cmp(&a.usd_notional)
        .then_with(|| b.timestamp.cmp(&a.timestamp))
        .then_with(|| a.id.cmp(&b.id))
}
