use std::collections::HashMap;

use crate::models::Trade;

/// Trade ids already emitted, mapped to the time (epoch seconds) they were
/// first seen.
///
/// Created once at startup, owned by the poll loop and mutated only by
/// [`filter_new`] and [`SeenSet::evict_older_than`]. Lives in memory only;
/// a restart starts from an empty set.
#[derive(Debug, Default)]
pub struct SeenSet {
    entries: HashMap<String, i64>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `id` as seen at `now`. Returns `true` if it was not seen before.
    pub fn insert(&mut self, id: &str, now: i64) -> bool {
        if self.entries.contains_key(id) {
            return false;
        }
        self.entries.insert(id.to_string(), now);
        true
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn first_seen(&self, id: &str) -> Option<i64> {
        self.entries.get(id).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Forget ids first seen before `cutoff`. Such events are outside the
    /// monitored window, so forgetting them cannot produce a false duplicate.
    pub fn evict_older_than(&mut self, cutoff: i64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, first_seen| *first_seen >= cutoff);
        before - self.entries.len()
    }
}

/// Pass through only trades whose id has not been seen, marking each as seen
/// as it goes. Check and insert happen together per trade, so a repeat inside
/// the same batch is dropped as well.
pub fn filter_new<'a, I>(seen: &'a mut SeenSet, trades: I, now: i64) -> impl Iterator<Item = Trade> + 'a
where
    I: IntoIterator<Item = Trade>,
    I::IntoIter: 'a,
{
    trades
        .into_iter()
        .filter(move |trade| seen.insert(&trade.id, now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use rust_decimal::Decimal;

    fn trade(id: &str) -> Trade {
        Trade {
            id: id.into(),
            wallet: "0xw".into(),
            market_id: "m".into(),
            market_label: "Market".into(),
            usd_notional: Decimal::from(1),
            timestamp: 100,
            side: Side::Buy,
        }
    }

    #[test]
    fn test_duplicate_within_batch_emitted_once() {
        let mut seen = SeenSet::new();
        let out: Vec<Trade> = filter_new(&mut seen, vec![trade("a"), trade("b"), trade("a")], 10).collect();
        let ids: Vec<&str> = out.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_duplicate_across_cycles_emitted_once() {
        let mut seen = SeenSet::new();
        let first = filter_new(&mut seen, vec![trade("a")], 10).count();
        let second = filter_new(&mut seen, vec![trade("a")], 20).count();
        assert_eq!(first, 1);
        assert_eq!(second, 0);
        assert_eq!(seen.first_seen("a"), Some(10));
    }

    #[test]
    fn test_evict_older_than() {
        let mut seen = SeenSet::new();
        seen.insert("old", 100);
        seen.insert("new", 200);

        assert_eq!(seen.evict_older_than(150), 1);
        assert!(!seen.contains("old"));
        assert!(seen.contains("new"));
    }

    #[test]
    fn test_evicted_id_is_new_again() {
        let mut seen = SeenSet::new();
        assert!(seen.insert("a", 100));
        seen.evict_older_than(101);
        assert!(seen.insert("a", 200));
    }
}
