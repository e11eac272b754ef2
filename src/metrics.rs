use std::net::SocketAddr;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter listening on `addr` and register all
/// tracker metrics. Without a call to this the metric macros are no-ops.
pub fn init_metrics(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;

    // Pre-register counters so they appear even before the first increment.
    counter!("poll_cycles_total").absolute(0);
    counter!("trades_new_total").absolute(0);
    counter!("whales_detected_total").absolute(0);
    counter!("alerts_sent_total").absolute(0);
    counter!("alerts_failed_total").absolute(0);

    gauge!("seen_set_size").set(0.0);
    gauge!("whales_displayed").set(0.0);

    histogram!("poll_cycle_seconds").record(0.0);

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
