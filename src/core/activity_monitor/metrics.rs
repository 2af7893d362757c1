use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result};

/// One hardware utilization reading, produced fresh on every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HardwareMetrics {
    /// GPU utilization (0-100), `None` when GPU telemetry is unavailable
    pub gpu_utilization: Option<f32>,
    /// CPU utilization (0-100)
    pub cpu_utilization: f32,
    pub timestamp: DateTime<Utc>,
}

impl HardwareMetrics {
    /// Create a reading stamped with the current time
    pub fn new(gpu_utilization: Option<f32>, cpu_utilization: f32) -> Self {
        Self::at(gpu_utilization, cpu_utilization, Utc::now())
    }

    pub fn at(gpu_utilization: Option<f32>, cpu_utilization: f32, timestamp: DateTime<Utc>) -> Self {
        Self {
            gpu_utilization,
            cpu_utilization,
            timestamp,
        }
    }

    /// GPU utilization when present, CPU utilization otherwise.
    pub fn effective_utilization(&self) -> f32 {
        self.gpu_utilization.unwrap_or(self.cpu_utilization)
    }

    /// True when the reading carries no GPU value and the CPU stands in for it.
    pub fn using_fallback(&self) -> bool {
        self.gpu_utilization.is_none()
    }

    /// Short label for the signal behind `effective_utilization`
    pub fn source_label(&self) -> &'static str {
        if self.using_fallback() {
            "CPU"
        } else {
            "GPU"
        }
    }

    /// Reject readings the state machine cannot reason about (NaN, out of range).
    pub fn validate(&self) -> Result<()> {
        check_percentage("cpu_utilization", self.cpu_utilization)?;
        if let Some(gpu) = self.gpu_utilization {
            check_percentage("gpu_utilization", gpu)?;
        }
        Ok(())
    }
}

fn check_percentage(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ReminderError::metric_collection(format!(
            "{} out of range: {}",
            field, value
        )))
    }
}
