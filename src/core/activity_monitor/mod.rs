//! Hardware-utilization based activity monitoring.
//!
//! Classifies a compute-heavy workload as active, paused or ended from
//! periodic GPU/CPU utilization samples, and emits `GAME_STARTED` /
//! `GAME_ENDED` lifecycle events.

mod config;
mod controller;
mod detector;
mod events;
mod history;
mod machine;
mod metrics;
mod sampler;
mod state;

pub use config::MonitorConfig;
pub use controller::{MonitorController, DEFAULT_SESSION_LABEL, TICK_FAILURE_BACKOFF};
pub use detector::{ActivityDetector, HardwareDetector, CPU_FALLBACK_SOURCE, GPU_RETRY_INTERVAL};
pub use events::{ActivityEvent, EventKind, EventMetrics, MonitorListener, MonitorMessage};
pub use history::{GpuHistory, GpuSample, GPU_HISTORY_CAPACITY, MIN_STABLE_SAMPLES, STABILITY_TOLERANCE};
pub use machine::{transition, ActivityMachine};
pub use metrics::HardwareMetrics;
pub use sampler::{CpuSampler, GpuSampler};
pub use state::{ActivityState, ActivityTracking, MonitorSnapshot, MonitorSummary, RunStatus};
