// Process terminators, one per OS family
use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use hostctl_core::port::{ProcessTerminator, TerminateError};

/// Terminator for the host this binary was built for
pub fn platform_terminator() -> Arc<dyn ProcessTerminator> {
    #[cfg(unix)]
    {
        Arc::new(SignalTerminator)
    }

    #[cfg(not(unix))]
    {
        Arc::new(TaskkillTerminator)
    }
}

/// POSIX: SIGKILL via kill(2)
#[cfg(unix)]
pub struct SignalTerminator;

#[cfg(unix)]
#[async_trait]
impl ProcessTerminator for SignalTerminator {
    fn mechanism(&self) -> &'static str {
        "sigkill"
    }

    async fn terminate(&self, pid: u32) -> Result<(), TerminateError> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // Non-positive values address process groups, never a single process
        let raw = i32::try_from(pid)
            .ok()
            .filter(|raw| *raw > 0)
            .ok_or_else(|| TerminateError::Failed(format!("pid {} is not a valid target", pid)))?;

        info!(pid = pid, "Sending SIGKILL");
        match kill(Pid::from_raw(raw), Signal::SIGKILL) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => Err(TerminateError::NotFound(pid)),
            Err(Errno::EPERM) => Err(TerminateError::PermissionDenied(pid)),
            Err(e) => Err(TerminateError::Failed(e.to_string())),
        }
    }
}

/// Windows: `taskkill /F /PID <pid>`
#[cfg(not(unix))]
pub struct TaskkillTerminator;

#[cfg(not(unix))]
#[async_trait]
impl ProcessTerminator for TaskkillTerminator {
    fn mechanism(&self) -> &'static str {
        "taskkill"
    }

    async fn terminate(&self, pid: u32) -> Result<(), TerminateError> {
        info!(pid = pid, "Running taskkill");
        let output = tokio::process::Command::new("taskkill")
            .args(["/F", "/PID", &pid.to_string()])
            .output()
            .await
            .map_err(|e| TerminateError::Failed(e.to_string()))?;

        if output.status.success() {
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).to_lowercase();
        if stderr.contains("not found") {
            Err(TerminateError::NotFound(pid))
        } else if stderr.contains("access is denied") {
            Err(TerminateError::PermissionDenied(pid))
        } else {
            Err(TerminateError::Failed(format!("taskkill failed: {}", stderr.trim())))
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::process::ExitStatusExt;

    #[tokio::test]
    async fn test_sigkill_terminates_child() {
        let mut child = tokio::process::Command::new("sleep")
            .arg("30")
            .spawn()
            .unwrap();
        let pid = child.id().unwrap();

        platform_terminator().terminate(pid).await.unwrap();

        let status = child.wait().await.unwrap();
        assert_eq!(status.signal(), Some(9));
    }

    #[tokio::test]
    async fn test_missing_pid_is_not_found() {
        let pid = i32::MAX as u32;
        let result = SignalTerminator.terminate(pid).await;
        assert_eq!(result, Err(TerminateError::NotFound(pid)));
    }

    #[tokio::test]
    async fn test_group_addressing_pid_is_refused() {
        let result = SignalTerminator.terminate(u32::MAX).await;
        assert!(matches!(result, Err(TerminateError::Failed(_))));
    }
}
