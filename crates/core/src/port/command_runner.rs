// Command Runner Port
// Abstraction for spawning an external process and collecting its output

use super::shutdown::ShutdownToken;
use crate::domain::FailureKind;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Raw output of a process that exited before its deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutput {
    /// `None` when the process was ended by a signal
    pub exit_code: Option<i32>,
    /// stdout and stderr interleaved in arrival order
    pub output: String,
    pub truncated: bool,
}

/// Execution errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("failed to start process: {0}")]
    SpawnFailed(String),

    #[error("execution timeout")]
    Timeout { budget_ms: u64 },

    #[error("interrupted while waiting for process")]
    Interrupted,

    #[error("I/O error while waiting for process: {0}")]
    Io(String),
}

impl ExecutionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExecutionError::SpawnFailed(_) => FailureKind::Spawn,
            ExecutionError::Timeout { .. } => FailureKind::Timeout,
            ExecutionError::Interrupted => FailureKind::Interrupted,
            ExecutionError::Io(_) => FailureKind::Io,
        }
    }
}

/// Command Runner trait
///
/// Implementations:
/// - SubprocessRunner: spawns a child process with a concurrent output drain
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `argv` and wait at most `timeout` for it to exit
    ///
    /// # Errors
    /// - ExecutionError::SpawnFailed if the process cannot be started
    /// - ExecutionError::Timeout if it outlives `timeout` (it is killed)
    /// - ExecutionError::Interrupted if `cancel` fires first (it is left running)
    async fn run(
        &self,
        argv: &[String],
        timeout: Duration,
        cancel: Option<ShutdownToken>,
    ) -> Result<RunOutput, ExecutionError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Scripted runner returning a fixed outcome and recording every argv
    pub struct MockCommandRunner {
        outcome: Result<RunOutput, ExecutionError>,
        calls: Arc<Mutex<Vec<Vec<String>>>>,
    }

    impl MockCommandRunner {
        pub fn new(outcome: Result<RunOutput, ExecutionError>) -> Self {
            Self {
                outcome,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn exiting(exit_code: i32, output: impl Into<String>) -> Self {
            Self::new(Ok(RunOutput {
                exit_code: Some(exit_code),
                output: output.into(),
                truncated: false,
            }))
        }

        pub fn failing(error: ExecutionError) -> Self {
            Self::new(Err(error))
        }

        pub fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CommandRunner for MockCommandRunner {
        async fn run(
            &self,
            argv: &[String],
            _timeout: Duration,
            _cancel: Option<ShutdownToken>,
        ) -> Result<RunOutput, ExecutionError> {
            self.calls.lock().unwrap().push(argv.to_vec());
            self.outcome.clone()
        }
    }
}
