//! Activity state machine.
//!
//! Pure decision logic: given the current tracking state, the GPU history and
//! one fresh reading, decide the next state and whether a lifecycle event fires.
//! Time comes exclusively from the reading's timestamp.

use chrono::{DateTime, Utc};

use super::config::MonitorConfig;
use super::events::{ActivityEvent, EventKind, EventMetrics};
use super::history::GpuHistory;
use super::metrics::HardwareMetrics;
use super::state::{ActivityState, ActivityTracking};

/// State machine plus the GPU history it reads for pause detection.
#[derive(Debug, Clone, Default)]
pub struct ActivityMachine {
    tracking: ActivityTracking,
    history: GpuHistory,
}

impl ActivityMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back to IDLE with no timers, no debounce marker and an empty history.
    pub fn reset(&mut self) {
        self.tracking = ActivityTracking::default();
        self.history.clear();
    }

    pub fn state(&self) -> ActivityState {
        self.tracking.activity_state
    }

    pub fn tracking(&self) -> &ActivityTracking {
        &self.tracking
    }

    pub fn history(&self) -> &GpuHistory {
        &self.history
    }

    /// Feed one reading through the machine.
    ///
    /// Real GPU values are recorded in the history before the transition is
    /// evaluated. Returns the lifecycle event fired by this reading, if any.
    pub fn observe(
        &mut self,
        metrics: &HardwareMetrics,
        config: &MonitorConfig,
        session_label: &str,
    ) -> Option<ActivityEvent> {
        if let Some(gpu) = metrics.gpu_utilization {
            self.history.push(metrics.timestamp, gpu);
        }
        transition(&mut self.tracking, &self.history, metrics, config, session_label)
    }
}

/// Apply one reading to `tracking`. Rows are checked in order and the first
/// matching one wins.
pub fn transition(
    tracking: &mut ActivityTracking,
    history: &GpuHistory,
    metrics: &HardwareMetrics,
    config: &MonitorConfig,
    session_label: &str,
) -> Option<ActivityEvent> {
    let now = metrics.timestamp;
    let utilization = metrics.effective_utilization();
    let reaches_active = utilization >= config.active_threshold;
    let reaches_inactive = utilization <= config.inactive_threshold;

    match tracking.activity_state {
        ActivityState::Idle => {
            if reaches_active {
                tracking.activity_state = ActivityState::Active;
                tracking.suspect_inactive_since = None;
                tracking.paused_stable_since = None;
                return Some(started(tracking, metrics, config, session_label));
            }
        }

        ActivityState::Active => {
            if reaches_inactive {
                tracking.activity_state = ActivityState::SuspectInactive;
                tracking.paused_stable_since = None;
                tracking.suspect_inactive_since.get_or_insert(now);
            } else if let Some(since) = stable_since(history, metrics, config) {
                tracking.activity_state = ActivityState::Paused;
                tracking.paused_stable_since.get_or_insert(since);
                tracking.suspect_inactive_since = None;
                log::info!(
                    "Session paused: GPU stable at {:.1}% around {}%",
                    utilization,
                    config.paused_threshold
                );
            } else if reaches_active {
                tracking.suspect_inactive_since = None;
                tracking.paused_stable_since = None;
            }
        }

        ActivityState::Paused => {
            if reaches_active {
                tracking.activity_state = ActivityState::Active;
                tracking.paused_stable_since = None;
                tracking.suspect_inactive_since = None;
                log::info!("Session resumed: utilization back to {:.1}%", utilization);
            } else if reaches_inactive {
                tracking.activity_state = ActivityState::SuspectInactive;
                tracking.paused_stable_since = None;
                tracking.suspect_inactive_since.get_or_insert(now);
            } else if !metrics.using_fallback() && stable_since(history, metrics, config).is_none()
            {
                tracking.activity_state = ActivityState::Active;
                tracking.paused_stable_since = None;
                log::info!("Session resumed: GPU usage left the paused band");
            }
        }

        ActivityState::SuspectInactive => {
            if reaches_active {
                tracking.activity_state = ActivityState::Active;
                tracking.suspect_inactive_since = None;
                tracking.paused_stable_since = None;
            } else if reaches_inactive {
                let since = *tracking.suspect_inactive_since.get_or_insert(now);
                if hold_elapsed(since, now, config) {
                    tracking.activity_state = ActivityState::Inactive;
                    tracking.suspect_inactive_since = None;
                    if tracking.last_event_emitted != Some(EventKind::GameEnded) {
                        return Some(ended(tracking, metrics, config, session_label));
                    }
                }
            }
        }

        ActivityState::Inactive => {
            if reaches_active {
                tracking.activity_state = ActivityState::Active;
                tracking.suspect_inactive_since = None;
                tracking.paused_stable_since = None;
                tracking.last_event_emitted = None;
                return Some(started(tracking, metrics, config, session_label));
            }
        }
    }

    None
}

/// Stability test; never passes for fallback (CPU-only) readings.
fn stable_since(
    history: &GpuHistory,
    metrics: &HardwareMetrics,
    config: &MonitorConfig,
) -> Option<DateTime<Utc>> {
    if metrics.using_fallback() {
        return None;
    }
    history.stable_since(
        config.paused_threshold,
        config.paused_stable_window(),
        metrics.timestamp,
    )
}

fn hold_elapsed(since: DateTime<Utc>, now: DateTime<Utc>, config: &MonitorConfig) -> bool {
    now.signed_duration_since(since) >= config.inactive_hold()
}

fn started(
    tracking: &mut ActivityTracking,
    metrics: &HardwareMetrics,
    config: &MonitorConfig,
    session_label: &str,
) -> ActivityEvent {
    tracking.last_event_emitted = Some(EventKind::GameStarted);
    let reason = format!(
        "{} {:.1}% >= {}%",
        metrics.source_label(),
        metrics.effective_utilization(),
        config.active_threshold
    );
    build_event(EventKind::GameStarted, metrics, session_label, reason)
}

fn ended(
    tracking: &mut ActivityTracking,
    metrics: &HardwareMetrics,
    config: &MonitorConfig,
    session_label: &str,
) -> ActivityEvent {
    tracking.last_event_emitted = Some(EventKind::GameEnded);
    let reason = format!(
        "{} {:.1}% <= {}% for {}s",
        metrics.source_label(),
        metrics.effective_utilization(),
        config.inactive_threshold,
        config.inactive_hold_seconds
    );
    build_event(EventKind::GameEnded, metrics, session_label, reason)
}

fn build_event(
    kind: EventKind,
    metrics: &HardwareMetrics,
    session_label: &str,
    reason: String,
) -> ActivityEvent {
    ActivityEvent {
        kind,
        session_label: session_label.to_string(),
        at: metrics.timestamp,
        reason,
        metrics: EventMetrics {
            gpu: metrics.gpu_utilization,
            cpu: metrics.cpu_utilization,
        },
    }
}
