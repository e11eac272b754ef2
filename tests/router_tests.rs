mod common;

use std::sync::atomic::Ordering;

use common::{api_trade, investment, now, ScriptedSource};
use whale_tracker::ingestion::SourceRouter;
use whale_tracker::models::SourceKind;

#[tokio::test]
async fn test_primary_success_skips_fallback() {
    let primary = ScriptedSource::new(SourceKind::Subgraph)
        .then_ok(vec![investment("0x1", "60000000000", now(), "Q?")]);
    let secondary = ScriptedSource::new(SourceKind::ChainLog);
    let primary_probes = primary.probe_counter();
    let secondary_fetches = secondary.fetch_counter();
    let router = SourceRouter::new(primary, Some(secondary));

    let batch = router.get_batch(0, 50).await;

    assert!(batch.ok);
    assert_eq!(batch.source, SourceKind::Subgraph);
    assert_eq!(batch.len(), 1);
    assert_eq!(primary_probes.load(Ordering::SeqCst), 0);
    assert_eq!(secondary_fetches.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_primary_failure_falls_back_and_probes() {
    let primary = ScriptedSource::new(SourceKind::Subgraph).then_fail("HTTP 502");
    let secondary = ScriptedSource::new(SourceKind::Rest)
        .then_ok(vec![api_trade("0xtx", "0.5", "20000", now(), "Q?")]);
    let primary_probes = primary.probe_counter();
    let secondary_since = secondary.since_seen();
    let router = SourceRouter::new(primary, Some(secondary));

    let batch = router.get_batch(1_700_000_000, 50).await;

    assert!(batch.ok);
    assert_eq!(batch.source, SourceKind::Rest);
    assert_eq!(batch.len(), 1);
    assert_eq!(primary_probes.load(Ordering::SeqCst), 1);
    assert_eq!(*secondary_since.lock().unwrap(), Some(1_700_000_000));
}

#[tokio::test]
async fn test_both_sources_failing_yields_empty_batch() {
    let primary = ScriptedSource::always_failing(SourceKind::Subgraph, "HTTP 500");
    let secondary = ScriptedSource::always_failing(SourceKind::ChainLog, "timeout");
    let router = SourceRouter::new(primary, Some(secondary));

    let batch = router.get_batch(0, 50).await;

    assert!(!batch.ok);
    assert!(batch.is_empty());
    assert_eq!(batch.source, SourceKind::ChainLog);
}

#[tokio::test]
async fn test_failure_without_fallback_yields_empty_batch() {
    let primary = ScriptedSource::always_failing(SourceKind::Rest, "HTTP 429");
    let fetches = primary.fetch_counter();
    let router = SourceRouter::<_, ScriptedSource>::new(primary, None);

    let batch = router.get_batch(0, 50).await;

    assert!(!batch.ok);
    assert!(batch.is_empty());
    assert_eq!(batch.source, SourceKind::Rest);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_primary_retried_every_cycle() {
    let primary = ScriptedSource::new(SourceKind::Subgraph)
        .then_fail("HTTP 502")
        .then_ok(vec![investment("0x2", "70000000000", now(), "Q?")]);
    let fetches = primary.fetch_counter();
    let router = SourceRouter::new(primary, Some(ScriptedSource::new(SourceKind::ChainLog)));

    let first = router.get_batch(0, 50).await;
    assert_eq!(first.source, SourceKind::ChainLog);

    let second = router.get_batch(0, 50).await;
    assert_eq!(second.source, SourceKind::Subgraph);
    assert_eq!(second.len(), 1);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}
