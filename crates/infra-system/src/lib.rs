// Hostctl Infrastructure - OS Adapters
// Implements: HostQuery, CommandRunner, ProcessTerminator

pub mod host_query_impl;
pub mod subprocess_runner;
pub mod terminator;

pub use host_query_impl::SysinfoHostQuery;
pub use subprocess_runner::SubprocessRunner;
pub use terminator::platform_terminator;
