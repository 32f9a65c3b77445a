//! RPC Request/Response Types
//!
//! Defines the JSON-RPC method parameters and results. Every request type
//! implements `Default` so methods may be called without params.

use hostctl_core::domain::{
    AlertRecord, AuditEntry, MetricsSnapshot, ProcessDescriptor, SystemInfo, ThresholdConfig,
};
use serde::{Deserialize, Serialize};

/// Caller role, asserted by the client
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Technician,
    #[default]
    Client,
}

impl Role {
    /// Whether this role may run commands, kill processes or change state
    pub fn can_operate(self) -> bool {
        matches!(self, Role::Admin | Role::Technician)
    }
}

/// command.execute.v1 - Run a command
///
/// `argv` is passed through unchanged; otherwise `command` is split on
/// whitespace.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecuteCommandRequest {
    pub command: Option<String>,
    pub argv: Option<Vec<String>>,
    pub timeout_ms: Option<u64>,
    pub actor: String,
    pub role: Role,
}

/// process.list.v1 - Top processes by cumulative CPU
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ListProcessesRequest {
    pub limit: usize,
}

impl Default for ListProcessesRequest {
    fn default() -> Self {
        Self {
            limit: hostctl_core::application::constants::DEFAULT_PROCESS_LIST_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessListResponse {
    pub count: usize,
    pub processes: Vec<ProcessDescriptor>,
}

impl From<Vec<ProcessDescriptor>> for ProcessListResponse {
    fn from(processes: Vec<ProcessDescriptor>) -> Self {
        Self {
            count: processes.len(),
            processes,
        }
    }
}

/// process.details.v1 - Single process
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProcessDetailsRequest {
    pub pid: u32,
}

/// process.kill.v1 - Forcefully terminate a process
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct KillProcessRequest {
    pub pid: u32,
    pub actor: String,
    pub role: Role,
}

/// process.search.v1 - Name substring search
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchProcessesRequest {
    pub term: String,
}

/// audit.list.v1 - Recent audit entries, newest first
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AuditListRequest {
    pub limit: usize,
}

impl Default for AuditListRequest {
    fn default() -> Self {
        Self {
            limit: hostctl_core::application::constants::DEFAULT_AUDIT_LIST_LIMIT,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuditListResponse {
    pub entries: Vec<AuditEntry>,
}

/// audit.clear.v1, alerts.clear.v1 - Drop retained history
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ClearRequest {
    pub actor: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub cleared: usize,
}

/// Methods taking no parameters
#[derive(Debug, Default, Deserialize)]
pub struct EmptyRequest {}

/// metrics.dashboard.v1 - Everything a status page needs in one call
#[derive(Debug, Clone, Serialize)]
pub struct DashboardResponse {
    pub metrics: MetricsSnapshot,
    pub top_processes: Vec<ProcessDescriptor>,
    pub alerts: Vec<AlertRecord>,
    pub system_info: SystemInfo,
}

/// alerts.evaluate.v1 - Evaluate a caller snapshot, or the latest one
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EvaluateAlertsRequest {
    pub snapshot: Option<MetricsSnapshot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertListResponse {
    pub alerts: Vec<AlertRecord>,
}

/// alerts.thresholds.set.v1 - Partial threshold update
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SetThresholdsRequest {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub disk: Option<f64>,
    pub actor: String,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct ThresholdsResponse {
    pub thresholds: ThresholdConfig,
}
