//! Lifecycle events and the subscriber interface.
//!
//! Events are delivered on the monitor's worker thread. Consumers running a
//! single-threaded event loop must marshal them back onto their own thread.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    GameStarted,
    GameEnded,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::GameStarted => f.write_str("GAME_STARTED"),
            EventKind::GameEnded => f.write_str("GAME_ENDED"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventMetrics {
    pub gpu: Option<f32>,
    pub cpu: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub session_label: String,
    pub at: DateTime<Utc>,
    /// Human-readable explanation, e.g. `GPU 91.0% >= 80%`
    pub reason: String,
    pub metrics: EventMetrics,
}

/// Everything the monitor publishes to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorMessage {
    Event(ActivityEvent),
    Error(String),
}

/// Receives monitor output. Called outside the state lock, so implementations
/// may call back into the controller.
pub trait MonitorListener: Send + Sync {
    fn handle(&self, message: &MonitorMessage);
}

impl<F> MonitorListener for F
where
    F: Fn(&MonitorMessage) + Send + Sync,
{
    fn handle(&self, message: &MonitorMessage) {
        self(message)
    }
}
