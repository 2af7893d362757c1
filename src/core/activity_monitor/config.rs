use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ReminderError, Result};

/// Upper bound for the hold and pause windows (one day)
pub const MAX_WINDOW_SECONDS: u64 = 24 * 60 * 60;

/// Upper bound for the sampling interval (one minute)
pub const MAX_SAMPLE_INTERVAL_MS: u64 = 60_000;

/// Thresholds and timings driving the activity state machine.
///
/// Percentages are 0-100, durations are strictly positive and bounded, and
/// `inactive_threshold` must stay below `active_threshold`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub active_threshold: f32,
    pub inactive_threshold: f32,
    pub inactive_hold_seconds: u64,
    pub sample_interval_ms: u64,
    pub paused_threshold: f32,
    pub paused_stable_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            active_threshold: 80.0,
            inactive_threshold: 35.0,
            inactive_hold_seconds: 10,
            sample_interval_ms: 1000,
            paused_threshold: 60.0,
            paused_stable_seconds: 10,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<()> {
        check_percentage("active_threshold", self.active_threshold)?;
        check_percentage("inactive_threshold", self.inactive_threshold)?;
        check_percentage("paused_threshold", self.paused_threshold)?;

        if self.inactive_threshold >= self.active_threshold {
            return Err(ReminderError::config(format!(
                "inactive_threshold ({}) must be lower than active_threshold ({})",
                self.inactive_threshold, self.active_threshold
            )));
        }

        check_duration(
            "inactive_hold_seconds",
            self.inactive_hold_seconds,
            MAX_WINDOW_SECONDS,
        )?;
        check_duration(
            "sample_interval_ms",
            self.sample_interval_ms,
            MAX_SAMPLE_INTERVAL_MS,
        )?;
        check_duration(
            "paused_stable_seconds",
            self.paused_stable_seconds,
            MAX_WINDOW_SECONDS,
        )?;

        Ok(())
    }

    pub fn sample_interval(&self) -> Duration {
        Duration::from_millis(self.sample_interval_ms)
    }

    pub fn inactive_hold(&self) -> chrono::Duration {
        saturating_seconds(self.inactive_hold_seconds)
    }

    pub fn paused_stable_window(&self) -> chrono::Duration {
        saturating_seconds(self.paused_stable_seconds)
    }
}

/// Unvalidated values clamp to the largest representable delta
fn saturating_seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}

fn check_percentage(field: &str, value: f32) -> Result<()> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(ReminderError::config(format!(
            "{} must be between 0 and 100 (got {})",
            field, value
        )))
    }
}

fn check_duration(field: &str, value: u64, max: u64) -> Result<()> {
    if value == 0 {
        return Err(ReminderError::config(format!("{} must be positive", field)));
    }
    if value > max {
        return Err(ReminderError::config(format!(
            "{} must be at most {} (got {})",
            field, max, value
        )));
    }
    Ok(())
}
