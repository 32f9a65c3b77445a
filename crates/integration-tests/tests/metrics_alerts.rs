//! Metrics sampling and alert evaluation

use std::sync::Arc;
use std::time::Duration;

use hostctl_core::application::{
    shutdown_channel, AlertEvaluator, MetricsPoller, MetricsSampler, SnapshotCache,
};
use hostctl_core::domain::{AlertKind, MetricsSnapshot, Severity};
use hostctl_core::port::time_provider::SystemTimeProvider;
use hostctl_infra_system::SysinfoHostQuery;

fn sampler() -> Arc<MetricsSampler> {
    Arc::new(
        MetricsSampler::new(Arc::new(SysinfoHostQuery::new()), Arc::new(SystemTimeProvider))
            .with_window(Duration::from_millis(250)),
    )
}

#[tokio::test]
async fn test_live_sample_is_within_bounds() {
    let snapshot = sampler().sample().await;

    assert!((0.0..=100.0).contains(&snapshot.cpu_usage_percent));
    assert!((0.0..=100.0).contains(&snapshot.memory_usage_percent));
    assert!(snapshot.cpu_core_count > 0);
    assert!(snapshot.total_memory_bytes > 0);
    assert_eq!(
        snapshot.used_memory_bytes,
        snapshot.total_memory_bytes - snapshot.available_memory_bytes
    );
    assert!(snapshot
        .network_interfaces
        .iter()
        .all(|iface| iface.bytes_received > 0 || iface.bytes_sent > 0));
}

/// CPU 95 against the default 80 raises exactly one HIGH alert; CPU 50 none
#[test]
fn test_cpu_threshold_scenario() {
    let alerts = AlertEvaluator::new(Arc::new(SystemTimeProvider));

    let raised = alerts.evaluate(&MetricsSnapshot {
        cpu_usage_percent: 95.0,
        memory_usage_percent: 40.0,
        ..Default::default()
    });
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].kind, AlertKind::Cpu);
    assert_eq!(raised[0].severity, Severity::High);
    assert_eq!(raised[0].value, 95.0);

    let raised = alerts.evaluate(&MetricsSnapshot {
        cpu_usage_percent: 50.0,
        memory_usage_percent: 40.0,
        ..Default::default()
    });
    assert!(raised.is_empty());
    assert_eq!(alerts.history().len(), 1);
}

#[test]
fn test_disk_threshold_is_stored_only() {
    let alerts = AlertEvaluator::new(Arc::new(SystemTimeProvider));
    alerts.set_disk_threshold(0.0);

    let raised = alerts.evaluate(&MetricsSnapshot::default());

    assert!(raised.is_empty());
    assert_eq!(alerts.thresholds().disk, 0.0);
}

#[tokio::test]
async fn test_poller_caches_and_stops() {
    let cache = SnapshotCache::new();
    let poller = MetricsPoller::new(sampler(), cache.clone()).with_interval(Duration::from_millis(50));
    let (tx, token) = shutdown_channel();

    let handle = tokio::spawn(poller.run(token));

    let mut cached = None;
    for _ in 0..40 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cached = cache.latest().await;
        if cached.is_some() {
            break;
        }
    }
    tx.shutdown();

    assert!(cached.is_some());
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("poller should stop on shutdown")
        .unwrap();
}
