use async_trait::async_trait;
use serde_json::json;

use crate::errors::TrackerError;
use crate::models::{format_usd, Trade};

/// Destination for whale alerts.
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn send(&self, message: &str) -> Result<(), TrackerError>;
}

/// Telegram notification service. Fire-and-forget from the caller's point of
/// view: errors are returned so the dispatcher can log them per alert.
#[derive(Debug, Clone)]
pub struct Notifier {
    http: reqwest::Client,
    bot_token: String,
    chat_id: String,
}

impl Notifier {
    pub fn new(http: reqwest::Client, bot_token: String, chat_id: String) -> Self {
        Self {
            http,
            bot_token,
            chat_id,
        }
    }
}

#[async_trait]
impl AlertSink for Notifier {
    async fn send(&self, message: &str) -> Result<(), TrackerError> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let body = json!({
            "chat_id": self.chat_id,
            "text": message,
        });

        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| TrackerError::Sink(format!("Telegram request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(TrackerError::Sink(format!(
                "Telegram sendMessage returned {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Format a whale alert for a single trade.
pub fn format_whale_alert(trade: &Trade) -> String {
    format!(
        "🐋 Whale Alert: {} {} on {} ({})",
        format_usd(trade.usd_notional),
        trade.side,
        trade.market_label,
        trade.wallet_short(),
    )
}
