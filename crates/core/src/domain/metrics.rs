// Hardware/OS metrics snapshot

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Round to 2 decimal places, halves away from zero
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / whole` as a percentage rounded to 2 decimals; 0 when `whole` is 0
pub fn percent(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round2(part as f64 / whole as f64 * 100.0)
}

/// Per-disk counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiskStat {
    pub name: String,
    pub model: String,
    pub size_bytes: u64,
    /// Cumulative bytes read
    pub reads: u64,
    /// Cumulative bytes written
    pub writes: u64,
}

/// Per-interface network counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkStat {
    pub name: String,
    pub display_name: String,
    pub addresses: Vec<String>,
    pub bytes_received: u64,
    pub bytes_sent: u64,
    /// Link speed in bits per second, 0 when the host does not report it
    pub speed_bps: u64,
}

impl NetworkStat {
    /// Interfaces that never moved a byte are left out of snapshots
    pub fn has_traffic(&self) -> bool {
        self.bytes_received > 0 || self.bytes_sent > 0
    }
}

/// Point-in-time hardware/OS snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub sampled_at: DateTime<Utc>,
    pub cpu_usage_percent: f64,
    pub cpu_core_count: usize,
    pub cpu_model: String,
    pub total_memory_bytes: u64,
    pub used_memory_bytes: u64,
    pub available_memory_bytes: u64,
    pub memory_usage_percent: f64,
    pub disks: Vec<DiskStat>,
    pub network_interfaces: Vec<NetworkStat>,
}

/// Static host description
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub os_name: Option<String>,
    pub os_version: Option<String>,
    pub kernel_version: Option<String>,
    pub host_name: Option<String>,
    pub uptime_secs: u64,
    pub process_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2_half_up() {
        assert_eq!(round2(12.345_f64 + 1e-9), 12.35);
        assert_eq!(round2(12.344), 12.34);
        assert_eq!(round2(99.999), 100.0);
    }

    #[test]
    fn test_percent_handles_zero_total() {
        assert_eq!(percent(5, 0), 0.0);
        assert_eq!(percent(1, 3), 33.33);
        assert_eq!(percent(2, 3), 66.67);
    }

    #[test]
    fn test_traffic_filter() {
        let idle = NetworkStat {
            name: "lo0".into(),
            ..Default::default()
        };
        assert!(!idle.has_traffic());

        let busy = NetworkStat {
            bytes_sent: 1,
            ..idle.clone()
        };
        assert!(busy.has_traffic());
    }
}
