// Process termination port
// One implementation per host OS family, selected once at startup

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TerminateError {
    #[error("process {0} not found")]
    NotFound(u32),

    #[error("insufficient permission to terminate process {0}")]
    PermissionDenied(u32),

    #[error("termination failed: {0}")]
    Failed(String),
}

/// Forceful termination primitive
#[async_trait]
pub trait ProcessTerminator: Send + Sync {
    /// Short mechanism name for logs (e.g. "sigkill", "taskkill")
    fn mechanism(&self) -> &'static str;

    /// Forcefully terminate `pid`
    ///
    /// # Errors
    /// - TerminateError::NotFound if the process no longer exists
    /// - TerminateError::PermissionDenied if the OS refuses
    async fn terminate(&self, pid: u32) -> Result<(), TerminateError>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Terminator that records requested pids and returns a fixed result
    pub struct MockTerminator {
        result: Result<(), TerminateError>,
        requested: Mutex<Vec<u32>>,
    }

    impl MockTerminator {
        pub fn new(result: Result<(), TerminateError>) -> Self {
            Self {
                result,
                requested: Mutex::new(Vec::new()),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(Ok(()))
        }

        pub fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ProcessTerminator for MockTerminator {
        fn mechanism(&self) -> &'static str {
            "mock"
        }

        async fn terminate(&self, pid: u32) -> Result<(), TerminateError> {
            self.requested.lock().unwrap().push(pid);
            self.result.clone()
        }
    }
}
