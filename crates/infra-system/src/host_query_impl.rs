// Host query implementation
// reason: sysinfo for cross-platform process and hardware data
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use sysinfo::{
    Disks, Networks, Pid, Process, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System,
    Users,
};
use tracing::debug;

use hostctl_core::domain::{DiskStat, NetworkStat, ProcessDescriptor, ProcessState, SystemInfo};
use hostctl_core::port::{CpuIdentity, CpuTicks, HostQuery, MemoryInfo, QueryError};

/// Host query backed by sysinfo
///
/// sysinfo state is kept between calls so per-process CPU and disk
/// counters have a previous observation to diff against.
pub struct SysinfoHostQuery {
    system: Mutex<System>,
    users: Mutex<Users>,
    synthetic_ticks: Mutex<SyntheticTicks>,
}

/// Busy/idle counters integrated from sysinfo's global usage, for hosts
/// without a readable tick source
struct SyntheticTicks {
    busy_ms: u64,
    idle_ms: u64,
    last: Instant,
}

impl SysinfoHostQuery {
    /// Create a new host query
    ///
    /// # Example
    /// ```ignore
    /// let host = SysinfoHostQuery::new();
    /// ```
    pub fn new() -> Self {
        Self {
            system: Mutex::new(System::new_all()),
            users: Mutex::new(Users::new_with_refreshed_list()),
            synthetic_ticks: Mutex::new(SyntheticTicks {
                busy_ms: 0,
                idle_ms: 0,
                last: Instant::now(),
            }),
        }
    }

    fn system(&self) -> MutexGuard<'_, System> {
        self.system.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn refresh_users(&self) -> MutexGuard<'_, Users> {
        let mut users = self.users.lock().unwrap_or_else(PoisonError::into_inner);
        *users = Users::new_with_refreshed_list();
        users
    }

    fn synthesize_ticks(&self) -> CpuTicks {
        let usage = {
            let mut sys = self.system();
            sys.refresh_cpu_usage();
            sys.global_cpu_usage().clamp(0.0, 100.0) as f64
        };

        let mut ticks = self
            .synthetic_ticks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let elapsed = ticks.last.elapsed().as_millis() as u64;
        let busy = (elapsed as f64 * usage / 100.0).round() as u64;
        ticks.busy_ms += busy;
        ticks.idle_ms += elapsed.saturating_sub(busy);
        ticks.last = Instant::now();

        CpuTicks {
            user: ticks.busy_ms,
            idle: ticks.idle_ms,
            ..Default::default()
        }
    }
}

impl Default for SysinfoHostQuery {
    fn default() -> Self {
        Self::new()
    }
}

fn map_state(status: ProcessStatus) -> ProcessState {
    match status {
        ProcessStatus::Run => ProcessState::Running,
        ProcessStatus::Sleep | ProcessStatus::Idle | ProcessStatus::UninterruptibleDiskSleep => {
            ProcessState::Sleeping
        }
        ProcessStatus::Stop | ProcessStatus::Tracing => ProcessState::Stopped,
        ProcessStatus::Zombie | ProcessStatus::Dead => ProcessState::Zombie,
        _ => ProcessState::Unknown,
    }
}

/// CPU time since start over wall-clock lifetime
fn cumulative_load(process: &Process) -> f64 {
    let lifetime_ms = process.run_time().saturating_mul(1000);
    if lifetime_ms == 0 {
        return 0.0;
    }
    (process.accumulated_cpu_time() as f64 / lifetime_ms as f64).clamp(0.0, 1.0)
}

fn describe(process: &Process, users: &Users) -> ProcessDescriptor {
    let command_line = process
        .cmd()
        .iter()
        .map(|arg| arg.to_string_lossy())
        .collect::<Vec<_>>()
        .join(" ");

    ProcessDescriptor {
        pid: process.pid().as_u32(),
        name: process.name().to_string_lossy().into_owned(),
        path: process.exe().map(|p| p.display().to_string()),
        command_line,
        owner: process
            .user_id()
            .and_then(|uid| users.get_user_by_id(uid))
            .map(|user| user.name().to_string()),
        state: map_state(process.status()),
        cpu_load_cumulative: cumulative_load(process),
        resident_memory_bytes: process.memory(),
        virtual_memory_bytes: process.virtual_memory(),
        thread_count: process.tasks().map(|tasks| tasks.len() as u32),
        start_time: DateTime::<Utc>::from_timestamp(process.start_time() as i64, 0)
            .unwrap_or_default(),
        uptime_secs: process.run_time(),
    }
}

/// Parse the aggregate `cpu` line of /proc/stat
fn parse_proc_stat(content: &str) -> Result<CpuTicks, QueryError> {
    let line = content
        .lines()
        .find(|line| line.starts_with("cpu "))
        .ok_or_else(|| QueryError::Parse("no aggregate cpu line in /proc/stat".to_string()))?;

    let fields = line
        .split_whitespace()
        .skip(1)
        .map(|field| {
            field
                .parse::<u64>()
                .map_err(|e| QueryError::Parse(format!("bad /proc/stat field {:?}: {}", field, e)))
        })
        .collect::<Result<Vec<u64>, QueryError>>()?;

    if fields.len() < 4 {
        return Err(QueryError::Parse(format!(
            "expected at least 4 cpu fields, got {}",
            fields.len()
        )));
    }

    let field = |i: usize| fields.get(i).copied().unwrap_or(0);
    Ok(CpuTicks {
        user: field(0),
        nice: field(1),
        system: field(2),
        idle: field(3),
        iowait: field(4),
        irq: field(5),
        softirq: field(6),
        steal: field(7),
    })
}

/// Link speed in bits per second from sysfs; 0 when unknown
#[cfg(target_os = "linux")]
async fn link_speed_bps(interface: &str) -> u64 {
    let path = format!("/sys/class/net/{}/speed", interface);
    match tokio::fs::read_to_string(&path).await {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .ok()
            .filter(|mbps| *mbps > 0)
            .map(|mbps| mbps as u64 * 1_000_000)
            .unwrap_or(0),
        Err(_) => 0,
    }
}

#[cfg(not(target_os = "linux"))]
async fn link_speed_bps(_interface: &str) -> u64 {
    0
}

#[async_trait]
impl HostQuery for SysinfoHostQuery {
    async fn processes(&self) -> Result<Vec<ProcessDescriptor>, QueryError> {
        let users = self.refresh_users();
        let mut sys = self.system();
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        let processes: Vec<ProcessDescriptor> = sys
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .map(|p| describe(p, &users))
            .collect();

        debug!(count = processes.len(), "Process table read");
        Ok(processes)
    }

    async fn process(&self, pid: u32) -> Result<Option<ProcessDescriptor>, QueryError> {
        let target = Pid::from_u32(pid);
        let users = self.refresh_users();
        let mut sys = self.system();
        // Full refresh so tasks carry their thread kind; a thread id is not a process
        sys.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::everything(),
        );

        Ok(sys
            .process(target)
            .filter(|p| p.thread_kind().is_none())
            .map(|p| describe(p, &users)))
    }

    async fn cpu_ticks(&self) -> Result<CpuTicks, QueryError> {
        if cfg!(target_os = "linux") {
            let content = tokio::fs::read_to_string("/proc/stat")
                .await
                .map_err(|e| QueryError::Io(format!("/proc/stat: {}", e)))?;
            parse_proc_stat(&content)
        } else {
            Ok(self.synthesize_ticks())
        }
    }

    async fn cpu_identity(&self) -> Result<CpuIdentity, QueryError> {
        let sys = self.system();
        let cpus = sys.cpus();
        if cpus.is_empty() {
            return Err(QueryError::Unsupported("no CPUs reported".to_string()));
        }

        Ok(CpuIdentity {
            model: cpus[0].brand().trim().to_string(),
            logical_cores: cpus.len(),
        })
    }

    async fn memory(&self) -> Result<MemoryInfo, QueryError> {
        let mut sys = self.system();
        sys.refresh_memory();

        let total_bytes = sys.total_memory();
        if total_bytes == 0 {
            return Err(QueryError::Unsupported("total memory not reported".to_string()));
        }

        Ok(MemoryInfo {
            total_bytes,
            available_bytes: sys.available_memory().min(total_bytes),
        })
    }

    async fn disks(&self) -> Result<Vec<DiskStat>, QueryError> {
        let disks = Disks::new_with_refreshed_list();

        Ok(disks
            .list()
            .iter()
            .map(|disk| {
                let usage = disk.usage();
                DiskStat {
                    name: disk.name().to_string_lossy().into_owned(),
                    model: format!("{:?} ({})", disk.kind(), disk.file_system().to_string_lossy()),
                    size_bytes: disk.total_space(),
                    reads: usage.total_read_bytes,
                    writes: usage.total_written_bytes,
                }
            })
            .collect())
    }

    async fn network_interfaces(&self) -> Result<Vec<NetworkStat>, QueryError> {
        let networks = Networks::new_with_refreshed_list();

        let mut names: Vec<&String> = networks.list().keys().collect();
        names.sort();

        let mut interfaces = Vec::with_capacity(names.len());
        for name in names {
            let Some(data) = networks.list().get(name) else {
                continue;
            };

            let mac = data.mac_address();
            let display_name = if mac.is_unspecified() {
                name.clone()
            } else {
                format!("{} ({})", name, mac)
            };

            interfaces.push(NetworkStat {
                name: name.clone(),
                display_name,
                addresses: data
                    .ip_networks()
                    .iter()
                    .map(|net| format!("{}/{}", net.addr, net.prefix))
                    .collect(),
                bytes_received: data.total_received(),
                bytes_sent: data.total_transmitted(),
                speed_bps: link_speed_bps(name).await,
            });
        }

        Ok(interfaces)
    }

    async fn system_info(&self) -> Result<SystemInfo, QueryError> {
        let mut sys = self.system();
        sys.refresh_processes_specifics(ProcessesToUpdate::All, true, ProcessRefreshKind::nothing());
        let process_count = sys
            .processes()
            .values()
            .filter(|p| p.thread_kind().is_none())
            .count();

        Ok(SystemInfo {
            os_name: System::name(),
            os_version: System::os_version(),
            kernel_version: System::kernel_version(),
            host_name: System::host_name(),
            uptime_secs: System::uptime(),
            process_count,
        })
    }
}
