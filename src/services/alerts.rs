use metrics::counter;
use rust_decimal::Decimal;

use crate::models::Trade;

use super::notifier::{format_whale_alert, AlertSink};

/// Outcome of one dispatch pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Formatted alerts, in input order, whether or not a sink was present.
    pub messages: Vec<String>,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// Send one alert per trade with `usd_notional >= alert_threshold`, in input
/// order. A failed send is logged and does not stop the remaining alerts.
///
/// Without a sink the alerts are still formatted and logged, but nothing is sent.
pub async fn dispatch<S>(trades: &[Trade], alert_threshold: Decimal, sink: Option<&S>) -> DispatchReport
where
    S: AlertSink + ?Sized,
{
    let mut report = DispatchReport::default();

    for trade in trades.iter().filter(|t| t.usd_notional >= alert_threshold) {
        let message = format_whale_alert(trade);
        tracing::warn!(
            id = %trade.id,
            wallet = %trade.wallet,
            notional = %trade.usd_notional,
            "{message}"
        );

        if let Some(sink) = sink {
            report.attempted += 1;
            match sink.send(&message).await {
                Ok(()) => {
                    report.delivered += 1;
                    counter!("alerts_sent_total").increment(1);
                }
                Err(e) => {
                    report.failed += 1;
                    counter!("alerts_failed_total").increment(1);
                    tracing::warn!(error = %e, id = %trade.id, "Alert delivery failed");
                }
            }
        }

        report.messages.push(message);
    }

    report
}
