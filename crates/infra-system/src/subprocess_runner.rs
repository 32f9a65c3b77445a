// Subprocess runner implementation
// reason: tokio::process so the wait, the drain and the deadline share one runtime
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use hostctl_core::application::constants::{MAX_OUTPUT_BYTES, OUTPUT_DRAIN_GRACE};
use hostctl_core::port::{CommandRunner, ExecutionError, RunOutput, ShutdownToken};

const READ_CHUNK_BYTES: usize = 8 * 1024;

/// Captured output shared by the two pipe readers
struct OutputBuffer {
    data: Vec<u8>,
    limit: usize,
    truncated: bool,
}

impl OutputBuffer {
    fn new(limit: usize) -> Self {
        Self {
            data: Vec::new(),
            limit,
            truncated: false,
        }
    }

    /// Keep what fits under the limit; the rest is dropped
    fn append(&mut self, chunk: &[u8]) {
        let room = self.limit.saturating_sub(self.data.len());
        if chunk.len() > room {
            self.data.extend_from_slice(&chunk[..room]);
            self.truncated = true;
        } else {
            self.data.extend_from_slice(chunk);
        }
    }

    fn take(&mut self) -> (String, bool) {
        let data = std::mem::take(&mut self.data);
        (String::from_utf8_lossy(&data).into_owned(), self.truncated)
    }
}

type SharedBuffer = Arc<Mutex<OutputBuffer>>;

/// Subprocess runner
///
/// stdout and stderr are read concurrently into one buffer, so the captured
/// text interleaves both streams in arrival order. Reading continues past
/// the capture limit so a chatty child never blocks on a full pipe.
pub struct SubprocessRunner {
    max_output_bytes: usize,
}

impl SubprocessRunner {
    pub fn new() -> Self {
        Self {
            max_output_bytes: MAX_OUTPUT_BYTES,
        }
    }

    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }
}

impl Default for SubprocessRunner {
    fn default() -> Self {
        Self::new()
    }
}

async fn pump<R: AsyncRead + Unpin>(mut reader: R, buffer: SharedBuffer) {
    let mut chunk = vec![0u8; READ_CHUNK_BYTES];
    loop {
        match reader.read(&mut chunk).await {
            Ok(0) => break,
            Ok(n) => buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .append(&chunk[..n]),
            Err(e) => {
                debug!(error = %e, "Output pipe read failed");
                break;
            }
        }
    }
}

/// Drain both pipes to EOF
fn spawn_drain<O, E>(stdout: Option<O>, stderr: Option<E>, buffer: SharedBuffer) -> JoinHandle<()>
where
    O: AsyncRead + Unpin + Send + 'static,
    E: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let out = async {
            if let Some(stdout) = stdout {
                pump(stdout, buffer.clone()).await;
            }
        };
        let err = async {
            if let Some(stderr) = stderr {
                pump(stderr, buffer.clone()).await;
            }
        };
        tokio::join!(out, err);
    })
}

async fn cancelled(token: Option<ShutdownToken>) {
    match token {
        Some(mut token) => token.wait().await,
        None => std::future::pending::<()>().await,
    }
}

#[async_trait]
impl CommandRunner for SubprocessRunner {
    async fn run(
        &self,
        argv: &[String],
        timeout: Duration,
        cancel: Option<ShutdownToken>,
    ) -> Result<RunOutput, ExecutionError> {
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| ExecutionError::SpawnFailed("empty command".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false)
            .spawn()
            .map_err(|e| ExecutionError::SpawnFailed(e.to_string()))?;

        let pid = child.id();
        debug!(pid = ?pid, program = %program, "Subprocess spawned");

        let buffer: SharedBuffer = Arc::new(Mutex::new(OutputBuffer::new(self.max_output_bytes)));
        let mut drain = spawn_drain(child.stdout.take(), child.stderr.take(), buffer.clone());

        tokio::select! {
            status = child.wait() => {
                let status = match status {
                    Ok(status) => status,
                    Err(e) => {
                        drain.abort();
                        return Err(ExecutionError::Io(e.to_string()));
                    }
                };

                // Grandchildren may hold the pipes open past our child's exit
                if tokio::time::timeout(OUTPUT_DRAIN_GRACE, &mut drain).await.is_err() {
                    warn!(pid = ?pid, "Output drain did not finish within grace period");
                    drain.abort();
                }

                let (output, truncated) = buffer
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .take();

                Ok(RunOutput {
                    exit_code: status.code(),
                    output,
                    truncated,
                })
            }
            _ = tokio::time::sleep(timeout) => {
                let budget_ms = timeout.as_millis() as u64;
                info!(pid = ?pid, budget_ms = budget_ms, "Command exceeded its budget, killing");

                // kill() also reaps the child
                if let Err(e) = child.kill().await {
                    warn!(pid = ?pid, error = %e, "Failed to kill timed-out command");
                }
                drain.abort();

                Err(ExecutionError::Timeout { budget_ms })
            }
            _ = cancelled(cancel) => {
                // The child keeps running; the drain stays attached until EOF
                info!(pid = ?pid, "Stopped waiting on command");
                Err(ExecutionError::Interrupted)
            }
        }
    }
}
