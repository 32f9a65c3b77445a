// Process descriptors and kill outcomes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::metrics::round2;

/// Lifecycle state of an OS process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessState {
    Running,
    Sleeping,
    Stopped,
    Zombie,
    Unknown,
}

/// Point-in-time view of a single OS process
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessDescriptor {
    pub pid: u32,
    pub name: String,
    pub path: Option<String>,
    pub command_line: String,
    pub owner: Option<String>,
    pub state: ProcessState,
    /// CPU time consumed since start divided by wall-clock lifetime, in [0, 1]
    pub cpu_load_cumulative: f64,
    pub resident_memory_bytes: u64,
    pub virtual_memory_bytes: u64,
    pub thread_count: Option<u32>,
    pub start_time: DateTime<Utc>,
    pub uptime_secs: u64,
}

impl ProcessDescriptor {
    /// Cumulative CPU load as a percentage rounded to 2 decimals
    pub fn cpu_percent(&self) -> f64 {
        round2(self.cpu_load_cumulative * 100.0)
    }
}

/// Why a kill request did not succeed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillErrorKind {
    NotFound,
    PermissionDenied,
    InvalidPid,
    Failed,
}

/// Outcome of a kill request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KillOutcome {
    pub pid: u32,
    pub process_name: Option<String>,
    pub success: bool,
    pub message: String,
    pub error: Option<KillErrorKind>,
}

impl KillOutcome {
    pub const TERMINATED: &'static str = "process terminated";
    pub const NOT_FOUND: &'static str = "process not found";
    pub const PERMISSION_DENIED: &'static str = "insufficient permission to terminate process";

    pub fn terminated(pid: u32, process_name: Option<String>) -> Self {
        Self {
            pid,
            process_name,
            success: true,
            message: Self::TERMINATED.to_string(),
            error: None,
        }
    }

    pub fn rejected(
        pid: u32,
        process_name: Option<String>,
        kind: KillErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            pid,
            process_name,
            success: false,
            message: message.into(),
            error: Some(kind),
        }
    }
}
