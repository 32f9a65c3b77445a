// Command execution results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Output reported for a command that exited without writing anything
pub const NO_OUTPUT_PLACEHOLDER: &str = "command completed with no output";

/// Why a command produced no exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The executable could not be started
    Spawn,
    /// Started, but exceeded its wall-clock budget and was killed
    Timeout,
    /// The caller stopped waiting; the child was left running
    Interrupted,
    /// Waiting on the child failed at the OS level
    Io,
}

/// Structured outcome of a single command execution
///
/// `exit_code` is present iff the process exited on its own before the
/// timeout, and `success` is true iff that exit code is zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    pub command: String,
    pub exit_code: Option<i32>,
    pub output: String,
    pub output_truncated: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub success: bool,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
}

impl CommandResult {
    /// Build the result for a process that exited before its deadline
    ///
    /// A `None` exit code means the child was ended by a signal it did not
    /// catch; that is reported as unsuccessful.
    pub fn completed(
        command: impl Into<String>,
        exit_code: Option<i32>,
        output: String,
        output_truncated: bool,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        let output = if output.is_empty() {
            NO_OUTPUT_PLACEHOLDER.to_string()
        } else {
            output
        };

        let error = match exit_code {
            Some(_) => None,
            None => Some("process terminated by signal".to_string()),
        };

        Self {
            command: command.into(),
            exit_code,
            output,
            output_truncated,
            started_at,
            duration_ms,
            success: exit_code == Some(0),
            error,
            failure: None,
        }
    }

    /// Build the result for a run that never produced an exit code
    pub fn failed(
        command: impl Into<String>,
        kind: FailureKind,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
        duration_ms: u64,
    ) -> Self {
        Self {
            command: command.into(),
            exit_code: None,
            output: String::new(),
            output_truncated: false,
            started_at,
            duration_ms,
            success: false,
            error: Some(error.into()),
            failure: Some(kind),
        }
    }
}

/// Split a command line on whitespace into an argument vector
///
/// No quoting or escaping is understood: `echo "a b"` yields three
/// arguments. Callers needing exact arguments should pass argv directly.
pub fn split_command_line(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_string).collect()
}
