//! Monitor controller: owns the polling worker and the single state lock.
//!
//! Per tick the worker snapshots config and machine state under the lock,
//! samples the detector without holding it, runs the state machine on the
//! copy, commits the result under the lock and only then publishes events.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tokio::sync::broadcast;

use super::config::MonitorConfig;
use super::detector::{ActivityDetector, CPU_FALLBACK_SOURCE};
use super::events::{MonitorListener, MonitorMessage};
use super::machine::ActivityMachine;
use super::metrics::HardwareMetrics;
use super::state::{ActivityState, MonitorSnapshot, MonitorSummary, RunStatus};
use crate::error::{ReminderError, Result};

/// Label attached to every lifecycle event
pub const DEFAULT_SESSION_LABEL: &str = "Gaming Session";

/// Pause after a failed tick before the next one
pub const TICK_FAILURE_BACKOFF: Duration = Duration::from_secs(1);

const EVENT_CHANNEL_CAPACITY: usize = 64;
const WORKER_THREAD_NAME: &str = "activity-monitor";

struct Inner {
    config: MonitorConfig,
    run_status: RunStatus,
    machine: ActivityMachine,
    current_metrics: Option<HardwareMetrics>,
    telemetry_source: String,
    /// Bumped by every start/stop; a worker only commits while its generation is current
    generation: u64,
}

impl Inner {
    fn reset(&mut self) {
        self.machine.reset();
        self.current_metrics = None;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation && self.run_status == RunStatus::Running
    }
}

struct Shared {
    state: Mutex<Inner>,
    wake: Condvar,
    detector: Mutex<Box<dyn ActivityDetector>>,
    listeners: Mutex<Vec<Arc<dyn MonitorListener>>>,
    events_tx: broadcast::Sender<MonitorMessage>,
    session_label: String,
}

/// Runs the activity state machine against live hardware readings on a
/// dedicated worker thread.
///
/// `start`/`stop` are expected to be called from a single controlling thread.
/// Snapshot reads and config updates are safe from anywhere, including from
/// inside a listener.
pub struct MonitorController {
    shared: Arc<Shared>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl MonitorController {
    pub fn new(config: MonitorConfig, detector: Box<dyn ActivityDetector>) -> Result<Self> {
        Self::with_session_label(config, detector, DEFAULT_SESSION_LABEL)
    }

    pub fn with_session_label(
        config: MonitorConfig,
        detector: Box<dyn ActivityDetector>,
        session_label: impl Into<String>,
    ) -> Result<Self> {
        config.validate()?;

        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let shared = Shared {
            state: Mutex::new(Inner {
                config,
                run_status: RunStatus::Stopped,
                machine: ActivityMachine::new(),
                current_metrics: None,
                telemetry_source: CPU_FALLBACK_SOURCE.to_string(),
                generation: 0,
            }),
            wake: Condvar::new(),
            detector: Mutex::new(detector),
            listeners: Mutex::new(Vec::new()),
            events_tx,
            session_label: session_label.into(),
        };

        Ok(Self {
            shared: Arc::new(shared),
            worker: Mutex::new(None),
        })
    }

    /// Register a listener for events and errors.
    pub fn add_listener(&self, listener: Arc<dyn MonitorListener>) {
        self.shared.listeners.lock().push(listener);
    }

    /// Channel-based alternative to listeners. Slow receivers lose the oldest
    /// messages rather than blocking the worker.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorMessage> {
        self.shared.events_tx.subscribe()
    }

    /// Start polling. Does nothing if already running.
    pub fn start(&self) -> Result<()> {
        let generation = {
            let mut inner = self.shared.state.lock();
            if inner.run_status == RunStatus::Running {
                return Ok(());
            }
            inner.reset();
            inner.run_status = RunStatus::Running;
            inner.generation += 1;
            inner.generation
        };

        let shared = Arc::clone(&self.shared);
        let spawned = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || run_worker(shared, generation));

        match spawned {
            Ok(handle) => {
                // A previous worker may still be unwinding; its generation is stale
                // so it exits on its own.
                *self.worker.lock() = Some(handle);
                log::info!("Activity monitor started");
                Ok(())
            }
            Err(e) => {
                let mut inner = self.shared.state.lock();
                inner.run_status = RunStatus::Stopped;
                inner.generation += 1;
                Err(ReminderError::monitor(format!(
                    "Failed to spawn monitor worker: {}",
                    e
                )))
            }
        }
    }

    /// Request the worker to exit. Readers observe STOPPED/IDLE immediately; an
    /// in-flight probe call is not aborted but its result is discarded.
    pub fn stop(&self) {
        {
            let mut inner = self.shared.state.lock();
            if inner.run_status == RunStatus::Stopped {
                return;
            }
            inner.run_status = RunStatus::Stopped;
            inner.generation += 1;
            inner.reset();
        }
        self.shared.wake.notify_all();
        log::info!("Activity monitor stopped");
    }

    /// Stop and wait for the worker thread to finish.
    pub fn shutdown(self) {
        self.stop();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                log::error!("Activity monitor worker panicked");
            }
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.lock().run_status == RunStatus::Running
    }

    /// Replace the configuration. Invalid configs are rejected and the current
    /// one stays in effect. The worker picks the new one up on its next tick,
    /// and a pending sleep is shortened to the new interval.
    pub fn update_config(&self, config: MonitorConfig) -> Result<()> {
        config.validate()?;
        self.shared.state.lock().config = config;
        // A sleeping worker re-derives its deadline from the new interval
        self.shared.wake.notify_all();
        log::debug!("Monitor configuration updated");
        Ok(())
    }

    pub fn config(&self) -> MonitorConfig {
        self.shared.state.lock().config.clone()
    }

    /// Compact status view.
    pub fn get_state(&self) -> MonitorSummary {
        let inner = self.shared.state.lock();
        let tracking = inner.machine.tracking();
        let active = inner.run_status == RunStatus::Running
            && tracking.activity_state == ActivityState::Active;

        MonitorSummary {
            run_status: inner.run_status,
            active_label: active.then(|| self.shared.session_label.clone()),
            suspect_inactive_since: tracking.suspect_inactive_since,
        }
    }

    /// Full copy of the monitor state.
    pub fn get_hardware_state(&self) -> MonitorSnapshot {
        let inner = self.shared.state.lock();
        let tracking = inner.machine.tracking();

        MonitorSnapshot {
            run_status: inner.run_status,
            activity_state: tracking.activity_state,
            current_metrics: inner.current_metrics,
            suspect_inactive_since: tracking.suspect_inactive_since,
            paused_stable_since: tracking.paused_stable_since,
            last_event_emitted: tracking.last_event_emitted,
            telemetry_source: inner.telemetry_source.clone(),
        }
    }
}

impl Drop for MonitorController {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.worker.lock().take() {
            if handle.join().is_err() {
                log::error!("Activity monitor worker panicked");
            }
        }
    }
}

fn run_worker(shared: Arc<Shared>, generation: u64) {
    log::debug!("Activity monitor worker {} running", generation);

    loop {
        if !shared.state.lock().is_current(generation) {
            break;
        }

        let backoff = match panic::catch_unwind(AssertUnwindSafe(|| shared.tick(generation))) {
            Ok(Ok(())) => None,
            Ok(Err(e)) => {
                log::error!("Monitor tick failed: {}", e);
                shared.publish(MonitorMessage::Error(e.to_string()));
                Some(TICK_FAILURE_BACKOFF)
            }
            Err(payload) => {
                let message = format!("Monitor tick panicked: {}", panic_message(payload.as_ref()));
                log::error!("{}", message);
                shared.publish(MonitorMessage::Error(message));
                Some(TICK_FAILURE_BACKOFF)
            }
        };

        if !shared.sleep(generation, backoff) {
            break;
        }
    }

    log::debug!("Activity monitor worker {} exited", generation);
}

impl Shared {
    /// One polling step.
    fn tick(&self, generation: u64) -> Result<()> {
        let (config, mut machine) = {
            let inner = self.state.lock();
            (inner.config.clone(), inner.machine.clone())
        };

        // The probe may block up to its own timeout; the state lock is not held.
        let (metrics, telemetry_source) = {
            let mut detector = self.detector.lock();
            let metrics = detector.sample()?;
            (metrics, detector.telemetry_source())
        };
        metrics.validate()?;

        if metrics.using_fallback() {
            log::debug!(
                "Using CPU utilization {:.1}% (GPU unavailable)",
                metrics.cpu_utilization
            );
        }

        let previous = machine.state();
        let event = machine.observe(&metrics, &config, &self.session_label);
        let next = machine.state();

        {
            let mut inner = self.state.lock();
            if !inner.is_current(generation) {
                return Ok(());
            }
            inner.machine = machine;
            inner.current_metrics = Some(metrics);
            inner.telemetry_source = telemetry_source;
        }

        if previous != next {
            log::info!(
                "Activity {} -> {} ({} {:.1}%)",
                previous,
                next,
                metrics.source_label(),
                metrics.effective_utilization()
            );
        }

        if let Some(event) = event {
            log::info!("{}: {}", event.kind, event.reason);
            self.publish(MonitorMessage::Event(event));
        }

        Ok(())
    }

    fn publish(&self, message: MonitorMessage) {
        let listeners: Vec<Arc<dyn MonitorListener>> = self.listeners.lock().clone();
        for listener in listeners {
            let delivered = panic::catch_unwind(AssertUnwindSafe(|| listener.handle(&message)));
            if let Err(payload) = delivered {
                log::error!(
                    "Monitor listener panicked: {}",
                    panic_message(payload.as_ref())
                );
            }
        }
        // No receivers is fine
        let _ = self.events_tx.send(message);
    }

    /// Interruptible sleep. Without a backoff the pause is the configured
    /// sample interval, re-read on every wake-up so a config update applies
    /// to the sleep in progress. Returns false once this worker's generation
    /// is over.
    fn sleep(&self, generation: u64, backoff: Option<Duration>) -> bool {
        let started = Instant::now();
        let mut inner = self.state.lock();
        while inner.is_current(generation) {
            let pause = backoff.unwrap_or_else(|| inner.config.sample_interval());
            let deadline = started + pause;
            if Instant::now() >= deadline {
                break;
            }
            self.wake.wait_until(&mut inner, deadline);
        }
        inner.is_current(generation)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
