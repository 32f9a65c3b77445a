// Threshold alerts

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlertKind {
    Cpu,
    Memory,
    Disk,
}

/// Every threshold breach is raised as HIGH
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    pub kind: AlertKind,
    pub severity: Severity,
    pub message: String,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

/// Alerting thresholds in percent; no range is enforced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub cpu: f64,
    pub memory: f64,
    pub disk: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu: 80.0,
            memory: 85.0,
            disk: 90.0,
        }
    }
}

/// Partial threshold update; absent fields keep their current value
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdUpdate {
    pub cpu: Option<f64>,
    pub memory: Option<f64>,
    pub disk: Option<f64>,
}

impl ThresholdConfig {
    pub fn apply(&mut self, update: ThresholdUpdate) {
        if let Some(cpu) = update.cpu {
            self.cpu = cpu;
        }
        if let Some(memory) = update.memory {
            self.memory = memory;
        }
        if let Some(disk) = update.disk {
            self.disk = disk;
        }
    }
}
