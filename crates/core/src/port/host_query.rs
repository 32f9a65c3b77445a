// Host query port (OS-Query Adapter)
// Raw process table and hardware counters; implemented over sysinfo in infra-system
use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{DiskStat, NetworkStat, ProcessDescriptor, SystemInfo};

/// Cumulative CPU time counters, in clock ticks, across all cores
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTicks {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTicks {
    pub fn total(&self) -> u64 {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
            self.steal,
        ]
        .iter()
        .fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn idle_total(&self) -> u64 {
        self.idle.saturating_add(self.iowait)
    }

    /// Busy fraction in [0, 1] over the interval since `earlier`
    ///
    /// Returns 0 when no ticks elapsed or the counters went backwards.
    pub fn load_since(&self, earlier: &CpuTicks) -> f64 {
        let total = self.total().saturating_sub(earlier.total());
        if total == 0 {
            return 0.0;
        }
        let idle = self.idle_total().saturating_sub(earlier.idle_total());
        let busy = total.saturating_sub(idle);
        (busy as f64 / total as f64).clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CpuIdentity {
    pub model: String,
    pub logical_cores: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryInfo {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// A probe that could not be answered
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("probe not supported on this platform: {0}")]
    Unsupported(String),

    #[error("probe I/O failure: {0}")]
    Io(String),

    #[error("probe returned malformed data: {0}")]
    Parse(String),
}

/// Host query port
///
/// Every probe is independent: a failure in one must not prevent callers
/// from using the others.
#[async_trait]
pub trait HostQuery: Send + Sync {
    /// Full process table, in no particular order
    async fn processes(&self) -> Result<Vec<ProcessDescriptor>, QueryError>;

    /// Single process lookup; `Ok(None)` when the pid does not exist
    async fn process(&self, pid: u32) -> Result<Option<ProcessDescriptor>, QueryError>;

    /// System-wide CPU tick counters at this instant
    async fn cpu_ticks(&self) -> Result<CpuTicks, QueryError>;

    async fn cpu_identity(&self) -> Result<CpuIdentity, QueryError>;

    async fn memory(&self) -> Result<MemoryInfo, QueryError>;

    async fn disks(&self) -> Result<Vec<DiskStat>, QueryError>;

    /// Every interface, including ones with no traffic
    async fn network_interfaces(&self) -> Result<Vec<NetworkStat>, QueryError>;

    async fn system_info(&self) -> Result<SystemInfo, QueryError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// In-memory host whose probes are set up by the test
    pub struct MockHostQuery {
        pub processes: Mutex<Vec<ProcessDescriptor>>,
        /// Successive `cpu_ticks` observations; the last one repeats
        pub ticks: Mutex<VecDeque<CpuTicks>>,
        pub identity: CpuIdentity,
        pub memory: Mutex<Result<MemoryInfo, QueryError>>,
        pub disks: Mutex<Result<Vec<DiskStat>, QueryError>>,
        pub networks: Mutex<Result<Vec<NetworkStat>, QueryError>>,
        pub info: SystemInfo,
    }

    impl MockHostQuery {
        pub fn new() -> Self {
            Self {
                processes: Mutex::new(Vec::new()),
                ticks: Mutex::new(VecDeque::new()),
                identity: CpuIdentity {
                    model: "Mock CPU".to_string(),
                    logical_cores: 4,
                },
                memory: Mutex::new(Ok(MemoryInfo {
                    total_bytes: 8 * 1024 * 1024 * 1024,
                    available_bytes: 2 * 1024 * 1024 * 1024,
                })),
                disks: Mutex::new(Ok(Vec::new())),
                networks: Mutex::new(Ok(Vec::new())),
                info: SystemInfo::default(),
            }
        }

        pub fn with_processes(self, processes: Vec<ProcessDescriptor>) -> Self {
            *self.processes.lock().unwrap() = processes;
            self
        }

        pub fn with_ticks(self, ticks: Vec<CpuTicks>) -> Self {
            *self.ticks.lock().unwrap() = ticks.into();
            self
        }

        pub fn with_disks(self, disks: Result<Vec<DiskStat>, QueryError>) -> Self {
            *self.disks.lock().unwrap() = disks;
            self
        }

        pub fn with_networks(self, networks: Result<Vec<NetworkStat>, QueryError>) -> Self {
            *self.networks.lock().unwrap() = networks;
            self
        }

        pub fn with_memory(self, memory: Result<MemoryInfo, QueryError>) -> Self {
            *self.memory.lock().unwrap() = memory;
            self
        }
    }

    impl Default for MockHostQuery {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl HostQuery for MockHostQuery {
        async fn processes(&self) -> Result<Vec<ProcessDescriptor>, QueryError> {
            Ok(self.processes.lock().unwrap().clone())
        }

        async fn process(&self, pid: u32) -> Result<Option<ProcessDescriptor>, QueryError> {
            Ok(self
                .processes
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.pid == pid)
                .cloned())
        }

        async fn cpu_ticks(&self) -> Result<CpuTicks, QueryError> {
            let mut ticks = self.ticks.lock().unwrap();
            match ticks.len() {
                0 => Err(QueryError::Unsupported("no ticks scripted".to_string())),
                1 => Ok(ticks[0]),
                _ => Ok(ticks.pop_front().unwrap_or_default()),
            }
        }

        async fn cpu_identity(&self) -> Result<CpuIdentity, QueryError> {
            Ok(self.identity.clone())
        }

        async fn memory(&self) -> Result<MemoryInfo, QueryError> {
            self.memory.lock().unwrap().clone()
        }

        async fn disks(&self) -> Result<Vec<DiskStat>, QueryError> {
            self.disks.lock().unwrap().clone()
        }

        async fn network_interfaces(&self) -> Result<Vec<NetworkStat>, QueryError> {
            self.networks.lock().unwrap().clone()
        }

        async fn system_info(&self) -> Result<SystemInfo, QueryError> {
            Ok(self.info.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_since_busy_fraction() {
        let before = CpuTicks {
            user: 100,
            system: 50,
            idle: 850,
            ..Default::default()
        };
        let after = CpuTicks {
            user: 160,
            system: 90,
            idle: 950,
            ..Default::default()
        };

        // 100 busy out of 200 elapsed
        assert!((after.load_since(&before) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_iowait_counts_as_idle() {
        let before = CpuTicks::default();
        let after = CpuTicks {
            user: 25,
            iowait: 75,
            ..Default::default()
        };
        assert!((after.load_since(&before) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_load_since_without_progress_is_zero() {
        let ticks = CpuTicks {
            user: 10,
            idle: 10,
            ..Default::default()
        };
        assert_eq!(ticks.load_since(&ticks), 0.0);

        // Counter reset must not produce a bogus value
        assert_eq!(CpuTicks::default().load_since(&ticks), 0.0);
    }
}
