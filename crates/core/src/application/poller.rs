// Metrics Poller - keeps a recent snapshot cached for readers

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::constants::DEFAULT_POLL_INTERVAL;
use super::{AlertEvaluator, MetricsSampler, ShutdownToken};
use crate::domain::MetricsSnapshot;

/// Shared slot holding the most recent snapshot
#[derive(Clone, Default)]
pub struct SnapshotCache {
    inner: Arc<RwLock<Option<MetricsSnapshot>>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn latest(&self) -> Option<MetricsSnapshot> {
        self.inner.read().await.clone()
    }

    pub async fn store(&self, snapshot: MetricsSnapshot) {
        *self.inner.write().await = Some(snapshot);
    }
}

/// Background sampler
///
/// Samples every `interval`, stores the result in the cache and, when an
/// evaluator is attached, runs alert evaluation on it.
pub struct MetricsPoller {
    sampler: Arc<MetricsSampler>,
    cache: SnapshotCache,
    alerts: Option<Arc<AlertEvaluator>>,
    interval: Duration,
}

impl MetricsPoller {
    /// Create a new poller
    ///
    /// # Arguments
    /// * `sampler` - Snapshot source
    /// * `cache` - Slot updated after every sample
    pub fn new(sampler: Arc<MetricsSampler>, cache: SnapshotCache) -> Self {
        Self {
            sampler,
            cache,
            alerts: None,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_alerts(mut self, alerts: Arc<AlertEvaluator>) -> Self {
        self.alerts = Some(alerts);
        self
    }

    /// Take one sample, cache it and evaluate alerts if attached
    pub async fn poll_once(&self) -> MetricsSnapshot {
        let snapshot = self.sampler.sample().await;

        if let Some(alerts) = &self.alerts {
            let raised = alerts.evaluate(&snapshot);
            if !raised.is_empty() {
                debug!(count = raised.len(), "Poller raised alerts");
            }
        }

        self.cache.store(snapshot.clone()).await;
        snapshot
    }

    /// Run the polling loop until `shutdown` fires
    ///
    /// Should be spawned in tokio::spawn
    pub async fn run(self, mut shutdown: ShutdownToken) {
        info!(
            interval_ms = self.interval.as_millis() as u64,
            evaluate_alerts = self.alerts.is_some(),
            "Metrics poller started"
        );

        let mut tick = interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                _ = tick.tick() => {
                    tokio::select! {
                        _ = shutdown.wait() => break,
                        _ = self.poll_once() => {}
                    }
                }
            }
        }

        info!("Metrics poller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::shutdown_channel;
    use crate::port::host_query::mocks::MockHostQuery;
    use crate::port::time_provider::SystemTimeProvider;
    use crate::port::{CpuTicks, MemoryInfo};

    fn sampler(host: MockHostQuery) -> Arc<MetricsSampler> {
        Arc::new(
            MetricsSampler::new(Arc::new(host), Arc::new(SystemTimeProvider))
                .with_window(Duration::from_millis(1)),
        )
    }

    #[tokio::test]
    async fn test_poll_once_fills_cache() {
        let cache = SnapshotCache::new();
        let poller = MetricsPoller::new(sampler(MockHostQuery::new()), cache.clone());

        assert!(cache.latest().await.is_none());
        let snapshot = poller.poll_once().await;
        assert_eq!(cache.latest().await, Some(snapshot));
    }

    #[tokio::test]
    async fn test_poll_evaluates_alerts_when_attached() {
        let host = MockHostQuery::new()
            .with_ticks(vec![
                CpuTicks::default(),
                CpuTicks {
                    user: 99,
                    idle: 1,
                    ..Default::default()
                },
            ])
            .with_memory(Ok(MemoryInfo {
                total_bytes: 100,
                available_bytes: 90,
            }));
        let alerts = Arc::new(AlertEvaluator::new(Arc::new(SystemTimeProvider)));
        let poller = MetricsPoller::new(sampler(host), SnapshotCache::new()).with_alerts(alerts.clone());

        poller.poll_once().await;

        let history = alerts.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, 99.0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let cache = SnapshotCache::new();
        let poller = MetricsPoller::new(sampler(MockHostQuery::new()), cache.clone())
            .with_interval(Duration::from_millis(10));
        let (tx, token) = shutdown_channel();

        let handle = tokio::spawn(poller.run(token));
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.shutdown();

        tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .expect("poller should stop")
            .unwrap();
        assert!(cache.latest().await.is_some());
    }
}
