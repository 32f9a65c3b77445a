// Domain Layer - Pure data types and invariants

pub mod alert;
pub mod audit;
pub mod bounded_log;
pub mod command;
pub mod metrics;
pub mod process;

// Re-exports
pub use alert::{AlertKind, AlertRecord, Severity, ThresholdConfig, ThresholdUpdate};
pub use audit::AuditEntry;
pub use bounded_log::BoundedLog;
pub use command::{split_command_line, CommandResult, FailureKind};
pub use metrics::{percent, round2, DiskStat, MetricsSnapshot, NetworkStat, SystemInfo};
pub use process::{KillErrorKind, KillOutcome, ProcessDescriptor, ProcessState};
