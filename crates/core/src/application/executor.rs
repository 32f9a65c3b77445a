// Command Executor - runs one external command per call and audits it

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::constants::DEFAULT_COMMAND_TIMEOUT;
use super::{AuditLog, ShutdownToken};
use crate::domain::{split_command_line, CommandResult, FailureKind};
use crate::port::{CommandRunner, TimeProvider};

/// Command executor
///
/// Every call produces exactly one audit entry, whatever the outcome.
/// Concurrent calls share nothing but the audit log.
pub struct CommandExecutor {
    runner: Arc<dyn CommandRunner>,
    audit: Arc<AuditLog>,
    time_provider: Arc<dyn TimeProvider>,
    default_timeout: Duration,
    cancel: Option<ShutdownToken>,
}

impl CommandExecutor {
    /// Create a new executor
    ///
    /// # Arguments
    /// * `runner` - Process spawning backend
    /// * `audit` - Shared audit log receiving one entry per call
    /// * `time_provider` - Clock used for `started_at`
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        audit: Arc<AuditLog>,
        time_provider: Arc<dyn TimeProvider>,
    ) -> Self {
        Self {
            runner,
            audit,
            time_provider,
            default_timeout: DEFAULT_COMMAND_TIMEOUT,
            cancel: None,
        }
    }

    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Stop waiting on in-flight commands when `token` fires
    pub fn with_cancel_token(mut self, token: ShutdownToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Split `command_line` on whitespace and execute it
    pub async fn execute_line(
        &self,
        command_line: &str,
        actor: &str,
        timeout: Option<Duration>,
    ) -> CommandResult {
        let argv = split_command_line(command_line);
        self.execute(&argv, actor, timeout).await
    }

    /// Execute `argv` on behalf of `actor`
    ///
    /// Never fails: spawn errors, timeouts and interruptions are reported
    /// inside the returned `CommandResult`.
    pub async fn execute(
        &self,
        argv: &[String],
        actor: &str,
        timeout: Option<Duration>,
    ) -> CommandResult {
        let command = argv.join(" ");
        let timeout = timeout.unwrap_or(self.default_timeout);
        let started_at = self.time_provider.now();
        let clock = Instant::now();

        let result = if argv.is_empty() {
            CommandResult::failed(&command, FailureKind::Spawn, "empty command", started_at, 0)
        } else {
            info!(
                actor = %actor,
                command = %command,
                timeout_ms = timeout.as_millis() as u64,
                "Executing command"
            );

            let outcome = self.runner.run(argv, timeout, self.cancel.clone()).await;
            let duration_ms = clock.elapsed().as_millis() as u64;

            match outcome {
                Ok(run) => CommandResult::completed(
                    &command,
                    run.exit_code,
                    run.output,
                    run.truncated,
                    started_at,
                    duration_ms,
                ),
                Err(e) => CommandResult::failed(
                    &command,
                    e.kind(),
                    e.to_string(),
                    started_at,
                    duration_ms,
                ),
            }
        };

        if result.success {
            info!(
                command = %command,
                exit_code = ?result.exit_code,
                duration_ms = result.duration_ms,
                "Command completed"
            );
        } else {
            warn!(
                command = %command,
                exit_code = ?result.exit_code,
                failure = ?result.failure,
                error = ?result.error,
                duration_ms = result.duration_ms,
                "Command did not succeed"
            );
        }

        let detail = match (&result.failure, &result.error) {
            (Some(_), Some(error)) => error.clone(),
            _ => result.output.clone(),
        };
        self.audit.record(actor, &command, result.success, detail);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::port::command_runner::mocks::MockCommandRunner;
    use crate::port::time_provider::SystemTimeProvider;
    use crate::port::ExecutionError;

    fn executor(runner: MockCommandRunner) -> (CommandExecutor, Arc<AuditLog>, Arc<MockCommandRunner>) {
        let time: Arc<dyn TimeProvider> = Arc::new(SystemTimeProvider);
        let audit = Arc::new(AuditLog::new(time.clone()));
        let runner = Arc::new(runner);
        let executor = CommandExecutor::new(runner.clone(), audit.clone(), time);
        (executor, audit, runner)
    }

    #[tokio::test]
    async fn test_completed_command_is_audited() {
        let (executor, audit, _) = executor(MockCommandRunner::exiting(0, "hello\n"));

        let result = executor.execute_line("echo hello", "alice", None).await;

        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.output.contains("hello"));

        let entry = &audit.recent(1)[0];
        assert_eq!(entry.actor, "alice");
        assert_eq!(entry.action, "echo hello");
        assert!(entry.success);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_unsuccessful() {
        let (executor, audit, _) = executor(MockCommandRunner::exiting(2, ""));

        let result = executor.execute_line("ls /missing", "alice", None).await;

        assert!(!result.success);
        assert_eq!(result.exit_code, Some(2));
        assert!(result.failure.is_none());
        assert!(!audit.recent(1)[0].success);
    }

    #[tokio::test]
    async fn test_timeout_reports_no_exit_code() {
        let (executor, audit, _) =
            executor(MockCommandRunner::failing(ExecutionError::Timeout { budget_ms: 1000 }));

        let result = executor
            .execute_line("sleep 60", "bob", Some(Duration::from_secs(1)))
            .await;

        assert!(!result.success);
        assert!(result.exit_code.is_none());
        assert_eq!(result.failure, Some(FailureKind::Timeout));
        assert!(result.error.unwrap().contains("timeout"));
        assert_eq!(audit.len(), 1);
        assert!(audit.recent(1)[0].detail.contains("timeout"));
    }

    #[tokio::test]
    async fn test_spawn_failure_is_distinct_from_timeout() {
        let (executor, audit, _) = executor(MockCommandRunner::failing(
            ExecutionError::SpawnFailed("No such file or directory".to_string()),
        ));

        let result = executor.execute_line("nonexistent-binary", "alice", None).await;

        assert_eq!(result.failure, Some(FailureKind::Spawn));
        assert!(result.error.unwrap().contains("failed to start"));
        assert_eq!(audit.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_command_is_rejected_without_spawning() {
        let (executor, audit, runner) = executor(MockCommandRunner::exiting(0, "x"));

        let result = executor.execute_line("   ", "", None).await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::Spawn));
        assert!(runner.calls().is_empty());

        let entry = &audit.recent(1)[0];
        assert_eq!(entry.actor, "system");
        assert!(!entry.success);
    }

    #[tokio::test]
    async fn test_argv_passed_through_unsplit() {
        let (executor, _, runner) = executor(MockCommandRunner::exiting(0, "a b"));
        let argv = vec!["echo".to_string(), "a b".to_string()];

        executor.execute(&argv, "alice", None).await;

        assert_eq!(runner.calls(), vec![argv]);
    }
}
