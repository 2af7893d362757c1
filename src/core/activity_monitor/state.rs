use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::events::EventKind;
use super::metrics::HardwareMetrics;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    #[default]
    Stopped,
    Running,
}

/// Activity classification of the monitored workload. Exactly one is held at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityState {
    #[default]
    Idle,
    Active,
    Paused,
    SuspectInactive,
    Inactive,
}

impl ActivityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityState::Idle => "IDLE",
            ActivityState::Active => "ACTIVE",
            ActivityState::Paused => "PAUSED",
            ActivityState::SuspectInactive => "SUSPECT_INACTIVE",
            ActivityState::Inactive => "INACTIVE",
        }
    }
}

impl fmt::Display for ActivityState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The part of the monitor state owned by the state machine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivityTracking {
    pub activity_state: ActivityState,
    pub suspect_inactive_since: Option<DateTime<Utc>>,
    pub paused_stable_since: Option<DateTime<Utc>>,
    /// Last lifecycle event fired; used to debounce `GAME_ENDED`
    pub last_event_emitted: Option<EventKind>,
}

/// Full copy of the controller's state, as returned by `get_hardware_state()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSnapshot {
    pub run_status: RunStatus,
    pub activity_state: ActivityState,
    pub current_metrics: Option<HardwareMetrics>,
    pub suspect_inactive_since: Option<DateTime<Utc>>,
    pub paused_stable_since: Option<DateTime<Utc>>,
    pub last_event_emitted: Option<EventKind>,
    /// Where the last reading came from (`NVIDIA_SMI`, `CPU_FALLBACK`, ...)
    pub telemetry_source: String,
}

/// Compact status view for simple consumers (tray icons, status lines).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitorSummary {
    pub run_status: RunStatus,
    /// Session label while running and ACTIVE, `None` otherwise
    pub active_label: Option<String>,
    pub suspect_inactive_since: Option<DateTime<Utc>>,
}
