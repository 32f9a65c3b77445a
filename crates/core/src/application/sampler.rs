// Metrics Sampler - one hardware/OS snapshot per call

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::constants::CPU_SAMPLE_WINDOW;
use crate::domain::{percent, round2, MetricsSnapshot, NetworkStat};
use crate::port::{CpuIdentity, HostQuery, MemoryInfo, TimeProvider};

/// Metrics sampler
///
/// A failing sub-probe degrades to a zero value or an empty list with a
/// warning; `sample()` itself never fails.
pub struct MetricsSampler {
    host: Arc<dyn HostQuery>,
    time_provider: Arc<dyn TimeProvider>,
    window: Duration,
}

impl MetricsSampler {
    pub fn new(host: Arc<dyn HostQuery>, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            host,
            time_provider,
            window: CPU_SAMPLE_WINDOW,
        }
    }

    /// Override the gap between the two CPU tick observations
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    /// Take a snapshot; suspends for about one sampling window
    pub async fn sample(&self) -> MetricsSnapshot {
        let cpu_usage_percent = self.cpu_usage().await;

        let identity = self.host.cpu_identity().await.unwrap_or_else(|e| {
            warn!(error = %e, "CPU identity probe failed");
            CpuIdentity::default()
        });

        let memory = self.host.memory().await.unwrap_or_else(|e| {
            warn!(error = %e, "Memory probe failed");
            MemoryInfo::default()
        });
        let used = memory.total_bytes.saturating_sub(memory.available_bytes);

        let disks = self.host.disks().await.unwrap_or_else(|e| {
            warn!(error = %e, "Disk probe failed");
            Vec::new()
        });

        let network_interfaces: Vec<NetworkStat> = match self.host.network_interfaces().await {
            Ok(interfaces) => interfaces.into_iter().filter(NetworkStat::has_traffic).collect(),
            Err(e) => {
                warn!(error = %e, "Network probe failed");
                Vec::new()
            }
        };

        let snapshot = MetricsSnapshot {
            sampled_at: self.time_provider.now(),
            cpu_usage_percent,
            cpu_core_count: identity.logical_cores,
            cpu_model: identity.model,
            total_memory_bytes: memory.total_bytes,
            used_memory_bytes: used,
            available_memory_bytes: memory.available_bytes,
            memory_usage_percent: percent(used, memory.total_bytes),
            disks,
            network_interfaces,
        };

        debug!(
            cpu = snapshot.cpu_usage_percent,
            memory = snapshot.memory_usage_percent,
            disks = snapshot.disks.len(),
            interfaces = snapshot.network_interfaces.len(),
            "Metrics sampled"
        );

        snapshot
    }

    async fn cpu_usage(&self) -> f64 {
        let before = match self.host.cpu_ticks().await {
            Ok(ticks) => ticks,
            Err(e) => {
                warn!(error = %e, "CPU tick probe failed");
                return 0.0;
            }
        };

        tokio::time::sleep(self.window).await;

        match self.host.cpu_ticks().await {
            Ok(after) => round2(after.load_since(&before) * 100.0),
            Err(e) => {
                warn!(error = %e, "CPU tick probe failed");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DiskStat;
    use crate::port::host_query::mocks::MockHostQuery;
    use crate::port::time_provider::SystemTimeProvider;
    use crate::port::{CpuTicks, QueryError};

    fn sampler(host: MockHostQuery) -> MetricsSampler {
        MetricsSampler::new(Arc::new(host), Arc::new(SystemTimeProvider))
            .with_window(Duration::from_millis(1))
    }

    fn iface(name: &str, rx: u64, tx: u64) -> NetworkStat {
        NetworkStat {
            name: name.to_string(),
            display_name: name.to_string(),
            bytes_received: rx,
            bytes_sent: tx,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_cpu_from_tick_delta() {
        let host = MockHostQuery::new().with_ticks(vec![
            CpuTicks {
                user: 100,
                idle: 900,
                ..Default::default()
            },
            CpuTicks {
                user: 175,
                idle: 925,
                ..Default::default()
            },
        ]);

        let snapshot = sampler(host).sample().await;
        assert_eq!(snapshot.cpu_usage_percent, 75.0);
        assert_eq!(snapshot.cpu_core_count, 4);
    }

    #[tokio::test]
    async fn test_memory_used_and_percent() {
        let host = MockHostQuery::new().with_memory(Ok(MemoryInfo {
            total_bytes: 3000,
            available_bytes: 1000,
        }));

        let snapshot = sampler(host).sample().await;
        assert_eq!(snapshot.used_memory_bytes, 2000);
        assert_eq!(snapshot.memory_usage_percent, 66.67);
    }

    #[tokio::test]
    async fn test_idle_interfaces_filtered() {
        let host = MockHostQuery::new().with_networks(Ok(vec![
            iface("lo", 0, 0),
            iface("eth0", 10, 0),
            iface("wlan0", 0, 5),
        ]));

        let snapshot = sampler(host).sample().await;
        let names: Vec<_> = snapshot
            .network_interfaces
            .iter()
            .map(|n| n.name.as_str())
            .collect();
        assert_eq!(names, vec!["eth0", "wlan0"]);
    }

    #[tokio::test]
    async fn test_failing_probes_degrade() {
        // No ticks scripted: CPU probe errors
        let host = MockHostQuery::new()
            .with_memory(Err(QueryError::Io("meminfo".to_string())))
            .with_disks(Err(QueryError::Unsupported("disks".to_string())))
            .with_networks(Ok(vec![iface("eth0", 1, 1)]));

        let snapshot = sampler(host).sample().await;
        assert_eq!(snapshot.cpu_usage_percent, 0.0);
        assert_eq!(snapshot.total_memory_bytes, 0);
        assert_eq!(snapshot.memory_usage_percent, 0.0);
        assert!(snapshot.disks.is_empty());
        assert_eq!(snapshot.network_interfaces.len(), 1);
    }

    #[tokio::test]
    async fn test_disks_kept_in_probe_order() {
        let disk = |name: &str| DiskStat {
            name: name.to_string(),
            ..Default::default()
        };
        let host = MockHostQuery::new().with_disks(Ok(vec![disk("sda"), disk("nvme0n1")]));

        let snapshot = sampler(host).sample().await;
        assert_eq!(snapshot.disks[0].name, "sda");
        assert_eq!(snapshot.disks[1].name, "nvme0n1");
    }
}
