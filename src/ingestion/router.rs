use metrics::counter;

use crate::models::SourceBatch;
use crate::polymarket::MarketSummary;

use super::source::EventSource;

/// How many probe fields to surface in the diagnostic log line.
const PROBE_FIELDS_SHOWN: usize = 10;

/// Primary-then-secondary fetch with graceful degradation.
///
/// Never returns an error: a total failure yields an empty, failed batch.
pub struct SourceRouter<P, S> {
    primary: P,
    secondary: Option<S>,
}

impl<P: EventSource, S: EventSource> SourceRouter<P, S> {
    pub fn new(primary: P, secondary: Option<S>) -> Self {
        Self { primary, secondary }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    /// Fetch from the primary; on an upstream failure, run the primary's
    /// diagnostic probe (failures ignored) and fall back to the secondary.
    pub async fn get_batch(&self, since: i64, limit: usize) -> SourceBatch {
        let primary_kind = self.primary.kind();

        let err = match self.primary.fetch(since, limit).await {
            Ok(batch) => {
                tracing::debug!(
                    source = %primary_kind,
                    records = batch.len(),
                    "Primary source returned batch"
                );
                return batch;
            }
            Err(e) => e,
        };

        counter!("source_failures_total", "source" => primary_kind.as_str()).increment(1);
        tracing::warn!(error = %err, source = %primary_kind, "Primary source fetch failed");

        match self.primary.probe().await {
            Ok(fields) if !fields.is_empty() => {
                let shown: Vec<&str> = fields
                    .iter()
                    .take(PROBE_FIELDS_SHOWN)
                    .map(String::as_str)
                    .collect();
                tracing::warn!(
                    source = %primary_kind,
                    "Available query fields: {}{}",
                    shown.join(", "),
                    if fields.len() > PROBE_FIELDS_SHOWN { ", ..." } else { "" }
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(error = %e, source = %primary_kind, "Capability probe failed");
            }
        }

        let Some(secondary) = &self.secondary else {
            tracing::warn!(source = %primary_kind, "No fallback source configured, cycle degrades to empty");
            return SourceBatch::failed(primary_kind);
        };

        let secondary_kind = secondary.kind();
        counter!("source_fallbacks_total", "source" => secondary_kind.as_str()).increment(1);
        tracing::info!(from = %primary_kind, to = %secondary_kind, "Falling back to secondary source");

        match secondary.fetch(since, limit).await {
            Ok(batch) => batch,
            Err(e) => {
                counter!("source_failures_total", "source" => secondary_kind.as_str()).increment(1);
                tracing::error!(error = %e, source = %secondary_kind, "Fallback source fetch failed");
                SourceBatch::failed(secondary_kind)
            }
        }
    }

    /// Best-effort top-markets lookup against the primary. Empty on failure.
    pub async fn top_markets(&self, count: usize) -> Vec<MarketSummary> {
        match self.primary.top_markets(count).await {
            Ok(markets) => markets,
            Err(e) => {
                tracing::debug!(error = %e, "Top markets lookup failed");
                Vec::new()
            }
        }
    }
}
