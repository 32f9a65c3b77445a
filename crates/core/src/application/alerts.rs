// Alert Evaluator - threshold checks against a metrics snapshot

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

use super::constants::ALERT_HISTORY_CAPACITY;
use crate::domain::{
    AlertKind, AlertRecord, BoundedLog, MetricsSnapshot, Severity, ThresholdConfig,
    ThresholdUpdate,
};
use crate::port::TimeProvider;

/// Alert evaluator
///
/// Only CPU and memory are compared. The disk threshold is stored and
/// reported but no disk usage figure exists to compare it against.
///
/// History holds one entry per alert per observation: re-evaluating a
/// snapshot with the same `sampled_at` returns its alerts without
/// recording them again.
pub struct AlertEvaluator {
    thresholds: RwLock<ThresholdConfig>,
    history: BoundedLog<AlertRecord>,
    last_recorded: Mutex<Option<DateTime<Utc>>>,
    time_provider: Arc<dyn TimeProvider>,
}

impl AlertEvaluator {
    pub fn new(time_provider: Arc<dyn TimeProvider>) -> Self {
        Self::with_thresholds(ThresholdConfig::default(), time_provider)
    }

    pub fn with_thresholds(thresholds: ThresholdConfig, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            thresholds: RwLock::new(thresholds),
            history: BoundedLog::new(ALERT_HISTORY_CAPACITY),
            last_recorded: Mutex::new(None),
            time_provider,
        }
    }

    /// Compare `snapshot` against the current thresholds
    ///
    /// Returns the alerts raised by this call (possibly none). They are
    /// appended to the history unless this snapshot was already evaluated.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Vec<AlertRecord> {
        let thresholds = self.thresholds();
        let now = self.time_provider.now();
        let mut raised = Vec::new();

        if snapshot.cpu_usage_percent > thresholds.cpu {
            raised.push(AlertRecord {
                kind: AlertKind::Cpu,
                severity: Severity::High,
                message: format!("High CPU usage: {}%", snapshot.cpu_usage_percent),
                value: snapshot.cpu_usage_percent,
                timestamp: now,
            });
        }

        if snapshot.memory_usage_percent > thresholds.memory {
            raised.push(AlertRecord {
                kind: AlertKind::Memory,
                severity: Severity::High,
                message: format!("High memory usage: {}%", snapshot.memory_usage_percent),
                value: snapshot.memory_usage_percent,
                timestamp: now,
            });
        }

        if !self.first_evaluation(snapshot.sampled_at) {
            debug!(
                sampled_at = %snapshot.sampled_at,
                count = raised.len(),
                "Snapshot already evaluated, history unchanged"
            );
            return raised;
        }

        for alert in &raised {
            warn!(
                kind = ?alert.kind,
                value = alert.value,
                message = %alert.message,
                "Alert raised"
            );
            self.history.push(alert.clone());
        }

        raised
    }

    /// Marks `sampled_at` as recorded; false if it already was
    fn first_evaluation(&self, sampled_at: DateTime<Utc>) -> bool {
        let mut last = self
            .last_recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *last == Some(sampled_at) {
            return false;
        }
        *last = Some(sampled_at);
        true
    }

    pub fn thresholds(&self) -> ThresholdConfig {
        *self
            .thresholds
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a partial update and return the resulting configuration
    pub fn set_thresholds(&self, update: ThresholdUpdate) -> ThresholdConfig {
        let mut thresholds = self
            .thresholds
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        thresholds.apply(update);

        info!(
            cpu = thresholds.cpu,
            memory = thresholds.memory,
            disk = thresholds.disk,
            "Alert thresholds updated"
        );

        *thresholds
    }

    pub fn set_cpu_threshold(&self, value: f64) {
        self.set_thresholds(ThresholdUpdate {
            cpu: Some(value),
            ..Default::default()
        });
    }

    pub fn set_memory_threshold(&self, value: f64) {
        self.set_thresholds(ThresholdUpdate {
            memory: Some(value),
            ..Default::default()
        });
    }

    pub fn set_disk_threshold(&self, value: f64) {
        self.set_thresholds(ThresholdUpdate {
            disk: Some(value),
            ..Default::default()
        });
    }

    /// Retained alerts, oldest first
    pub fn history(&self) -> Vec<AlertRecord> {
        self.history.snapshot()
    }

    pub fn clear_history(&self) -> usize {
        let dropped = self.history.clear();
        info!(dropped = dropped, "Alert history cleared");
        dropped
    }
}
