// Process Registry - listing, lookup, search and forced termination

use std::sync::Arc;
use tracing::{info, warn};

use super::constants::SEARCH_RESULT_LIMIT;
use super::AuditLog;
use crate::domain::{KillErrorKind, KillOutcome, ProcessDescriptor, SystemInfo};
use crate::error::Result;
use crate::port::{HostQuery, ProcessTerminator, TerminateError};

/// Process registry
///
/// Reads come straight from the host on every call; nothing is cached.
pub struct ProcessRegistry {
    host: Arc<dyn HostQuery>,
    terminator: Arc<dyn ProcessTerminator>,
    audit: Arc<AuditLog>,
    own_pid: u32,
}

impl ProcessRegistry {
    pub fn new(
        host: Arc<dyn HostQuery>,
        terminator: Arc<dyn ProcessTerminator>,
        audit: Arc<AuditLog>,
    ) -> Self {
        Self {
            host,
            terminator,
            audit,
            own_pid: std::process::id(),
        }
    }

    /// Top `limit` processes by cumulative CPU load, highest first
    ///
    /// # Errors
    /// Returns AppError::Query if the process table cannot be read
    pub async fn list(&self, limit: usize) -> Result<Vec<ProcessDescriptor>> {
        let mut processes = self.host.processes().await?;
        processes.sort_by(|a, b| b.cpu_load_cumulative.total_cmp(&a.cpu_load_cumulative));
        processes.truncate(limit);
        Ok(processes)
    }

    /// Look up a single process; `None` when it does not exist
    pub async fn get_by_pid(&self, pid: u32) -> Result<Option<ProcessDescriptor>> {
        Ok(self.host.process(pid).await?)
    }

    /// Case-insensitive substring match on process name, ordered by pid
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<ProcessDescriptor>> {
        let needle = term.to_lowercase();
        let mut matches: Vec<ProcessDescriptor> = self
            .host
            .processes()
            .await?
            .into_iter()
            .filter(|p| p.name.to_lowercase().contains(&needle))
            .collect();

        matches.sort_by_key(|p| p.pid);
        matches.truncate(SEARCH_RESULT_LIMIT);
        Ok(matches)
    }

    pub async fn system_info(&self) -> Result<SystemInfo> {
        Ok(self.host.system_info().await?)
    }

    /// Forcefully terminate `pid` on behalf of `actor`
    ///
    /// Never fails: every refusal is reported in the outcome, and every
    /// call is audited as `KILL_PROCESS <pid> (<name>)`.
    pub async fn kill(&self, pid: u32, actor: &str) -> KillOutcome {
        let outcome = self.try_kill(pid).await;

        let name = outcome.process_name.as_deref().unwrap_or("unknown");
        let action = format!("KILL_PROCESS {} ({})", pid, name);
        self.audit
            .record(actor, action, outcome.success, outcome.message.clone());

        if outcome.success {
            info!(
                pid = pid,
                name = %name,
                actor = %actor,
                mechanism = self.terminator.mechanism(),
                "Process terminated"
            );
        } else {
            warn!(
                pid = pid,
                actor = %actor,
                error = ?outcome.error,
                message = %outcome.message,
                "Kill request refused"
            );
        }

        outcome
    }

    async fn try_kill(&self, pid: u32) -> KillOutcome {
        if pid == 0 || pid == self.own_pid {
            return KillOutcome::rejected(
                pid,
                None,
                KillErrorKind::InvalidPid,
                format!("refusing to terminate pid {}", pid),
            );
        }

        let process = match self.host.process(pid).await {
            Ok(Some(process)) => process,
            Ok(None) => {
                return KillOutcome::rejected(
                    pid,
                    None,
                    KillErrorKind::NotFound,
                    KillOutcome::NOT_FOUND,
                )
            }
            Err(e) => {
                return KillOutcome::rejected(
                    pid,
                    None,
                    KillErrorKind::Failed,
                    format!("failed to look up process: {}", e),
                )
            }
        };

        let name = Some(process.name);
        match self.terminator.terminate(pid).await {
            Ok(()) => KillOutcome::terminated(pid, name),
            Err(TerminateError::NotFound(_)) => {
                KillOutcome::rejected(pid, name, KillErrorKind::NotFound, KillOutcome::NOT_FOUND)
            }
            Err(TerminateError::PermissionDenied(_)) => KillOutcome::rejected(
                pid,
                name,
                KillErrorKind::PermissionDenied,
                KillOutcome::PERMISSION_DENIED,
            ),
            Err(TerminateError::Failed(reason)) => KillOutcome::rejected(
                pid,
                name,
                KillErrorKind::Failed,
                format!("failed to terminate process: {}", reason),
            ),
        }
    }
}
