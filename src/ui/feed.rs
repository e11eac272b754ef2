use std::io::Write;

use crate::models::{format_usd, Trade};

use super::{format_timestamp, Presenter, Snapshot};

const RULE: &str = "────────────────────────────";

/// Line-oriented display: prints each new whale trade once, as it is detected.
pub struct FeedPresenter<W: Write> {
    out: W,
    announced: bool,
}

impl<W: Write> FeedPresenter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            announced: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_trade(&mut self, trade: &Trade) -> std::io::Result<()> {
        writeln!(self.out, "🐋  {}", trade.market_label)?;
        writeln!(self.out, "{}  |  {}", trade.side, format_usd(trade.usd_notional))?;
        writeln!(self.out, "{RULE}")?;
        writeln!(self.out, "Wallet: {}", trade.wallet_short())?;
        writeln!(self.out, "Tx:     {}", trade.id)?;
        writeln!(
            self.out,
            "Time:   {}",
            format_timestamp(trade.timestamp, "%Y-%m-%d %H:%M:%S UTC")
        )?;
        writeln!(self.out)
    }
}

impl<W: Write> Presenter for FeedPresenter<W> {
    fn render(&mut self, snapshot: &Snapshot) -> anyhow::Result<()> {
        if !self.announced {
            writeln!(self.out, "🔍 Polymarket Whale Tracker running...\n")?;
            self.announced = true;
        }

        // Oldest first so the scrollback reads chronologically.
        let mut fresh: Vec<&Trade> = snapshot.new_whales.iter().collect();
        fresh.sort_by_key(|t| t.timestamp);
        for trade in fresh {
            self.write_trade(trade)?;
        }

        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Side;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn whale(id: &str, ts: i64) -> Trade {
        Trade {
            id: id.into(),
            wallet: "0xabcdef0123456789".into(),
            market_id: "0xm".into(),
            market_label: "Bitcoin above 100k on Friday?".into(),
            usd_notional: Decimal::from(10_000),
            timestamp: ts,
            side: Side::Buy,
        }
    }

    fn snapshot(new_whales: Vec<Trade>) -> Snapshot {
        Snapshot {
            rows: new_whales.clone(),
            new_whales,
            summary: String::new(),
            top_markets: Vec::new(),
            alerts: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_feed_prints_new_whales_oldest_first() {
        let mut feed = FeedPresenter::new(Vec::new());
        feed.render(&snapshot(vec![whale("0xnewer", 200), whale("0xolder", 100)]))
            .unwrap();

        let out = String::from_utf8(feed.into_inner()).unwrap();
        assert!(out.starts_with("🔍 Polymarket Whale Tracker running..."));
        assert!(out.contains("BUY  |  $10,000"));
        let older = out.find("0xolder").unwrap();
        let newer = out.find("0xnewer").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn test_feed_banner_printed_once() {
        let mut feed = FeedPresenter::new(Vec::new());
        feed.render(&snapshot(Vec::new())).unwrap();
        feed.render(&snapshot(Vec::new())).unwrap();

        let out = String::from_utf8(feed.into_inner()).unwrap();
        assert_eq!(out.matches("Whale Tracker running").count(), 1);
    }
}
