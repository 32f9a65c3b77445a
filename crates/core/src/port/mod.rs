// Port Layer - Interfaces for external dependencies

pub mod command_runner;
pub mod host_query;
pub mod process_terminator;
pub mod shutdown;
pub mod time_provider;

// Re-exports
pub use command_runner::{CommandRunner, ExecutionError, RunOutput};
pub use host_query::{CpuIdentity, CpuTicks, HostQuery, MemoryInfo, QueryError};
pub use process_terminator::{ProcessTerminator, TerminateError};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
pub use time_provider::TimeProvider;
