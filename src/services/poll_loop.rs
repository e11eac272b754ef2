use std::future::Future;

use chrono::Utc;
use tokio::time::sleep;

use crate::ingestion::pipeline::{run_cycle, PipelineConfig, PipelineState};
use crate::ingestion::router::SourceRouter;
use crate::ingestion::source::EventSource;
use crate::services::notifier::AlertSink;
use crate::ui::{Presenter, Snapshot};

/// Drive poll cycles on a fixed interval until `shutdown` resolves.
///
/// One cycle runs to completion before the interval wait starts, so cycles
/// never overlap and the seen set has a single writer. Both the cycle and the
/// wait are abandoned as soon as `shutdown` fires; an interrupted cycle is not
/// rendered.
pub async fn run_poll_loop<P, S, N, R, F>(
    router: &SourceRouter<P, S>,
    config: &PipelineConfig,
    sink: Option<&N>,
    presenter: &mut R,
    shutdown: F,
) -> PipelineState
where
    P: EventSource,
    S: EventSource,
    N: AlertSink + ?Sized,
    R: Presenter + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let mut state = PipelineState::new(&config.display);

    tracing::info!(
        interval_secs = config.display.poll_interval.as_secs(),
        whale_threshold = %config.display.whale_threshold,
        alert_threshold = %config.display.alert_threshold,
        since = config.since_floor,
        "Whale poll loop started"
    );

    loop {
        let now = Utc::now().timestamp();

        let report = tokio::select! {
            report = run_cycle(router, &mut state, config, sink, now) => report,
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested during poll cycle");
                break;
            }
        };

        let snapshot = Snapshot::from_cycle(&state, &report);
        if let Err(e) = presenter.render(&snapshot) {
            tracing::error!(error = %e, cycle = report.cycle, "Failed to render snapshot");
        }

        tokio::select! {
            _ = sleep(config.display.poll_interval) => {}
            _ = &mut shutdown => {
                tracing::info!("Shutdown requested");
                break;
            }
        }
    }

    state
}
