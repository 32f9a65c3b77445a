// Audit Log - bounded record of command and kill actions

use std::sync::Arc;
use tracing::{debug, info};

use super::constants::{AUDIT_DETAIL_MAX_BYTES, AUDIT_LOG_CAPACITY};
use crate::domain::audit::truncate_detail;
use crate::domain::{AuditEntry, BoundedLog};
use crate::port::TimeProvider;

/// Process-wide audit trail, in memory only
pub struct AuditLog {
    entries: BoundedLog<AuditEntry>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AuditLog {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::with_capacity(AUDIT_LOG_CAPACITY, time_provider)
    }

    pub fn with_capacity(capacity: usize, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            entries: BoundedLog::new(capacity),
            time_provider,
        }
    }

    /// Append one entry and return a copy of it
    pub fn record(
        &self,
        actor: &str,
        action: impl Into<String>,
        success: bool,
        detail: impl Into<String>,
    ) -> AuditEntry {
        let entry = AuditEntry::new(
            actor,
            action,
            success,
            truncate_detail(detail.into(), AUDIT_DETAIL_MAX_BYTES),
            self.time_provider.now(),
        );

        debug!(
            actor = %entry.actor,
            action = %entry.action,
            success = entry.success,
            "Audit entry recorded"
        );

        self.entries.push(entry.clone());
        entry
    }

    /// Up to `limit` entries, most recent first
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        self.entries.recent(limit)
    }

    /// All retained entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.snapshot()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) -> usize {
        let dropped = self.entries.clear();
        info!(dropped = dropped, "Audit log cleared");
        dropped
    }
}
