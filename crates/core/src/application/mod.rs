// Application Layer - Services exposed to the request layer

pub mod alerts;
pub mod audit_log;
pub mod constants;
pub mod executor;
pub mod poller;
pub mod registry;
pub mod sampler;

// Re-exports
pub use alerts::AlertEvaluator;
pub use audit_log::AuditLog;
pub use executor::CommandExecutor;
pub use poller::{MetricsPoller, SnapshotCache};
pub use registry::ProcessRegistry;
pub use sampler::MetricsSampler;
pub use crate::port::shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
