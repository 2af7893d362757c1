use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use gamer_reminder::core::activity_monitor::{
    ActivityDetector, ActivityState, EventKind, HardwareMetrics, MonitorMessage, RunStatus,
    DEFAULT_SESSION_LABEL,
};
use gamer_reminder::{MonitorConfig, MonitorController, ReminderError, Result};
use parking_lot::Mutex;

use super::common::{fast_config, wait_for, Reading, ScriptedDetector};

fn recording_controller(
    config: MonitorConfig,
    script: Vec<Reading>,
) -> (MonitorController, Arc<Mutex<Vec<MonitorMessage>>>) {
    let detector = ScriptedDetector::new(script);
    let controller = MonitorController::new(config, Box::new(detector)).unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    controller.add_listener(Arc::new(move |message: &MonitorMessage| {
        sink.lock().push(message.clone());
    }));

    (controller, received)
}

fn events_of(messages: &[MonitorMessage], kind: EventKind) -> usize {
    messages
        .iter()
        .filter(|m| matches!(m, MonitorMessage::Event(e) if e.kind == kind))
        .count()
}

#[test]
fn test_start_and_stop_are_idempotent() {
    let (controller, _) = recording_controller(fast_config(), vec![Reading::Gpu(10.0)]);

    assert!(!controller.is_running());
    controller.stop();
    assert!(!controller.is_running());

    controller.start().unwrap();
    controller.start().unwrap();
    assert!(controller.is_running());

    controller.stop();
    controller.stop();
    assert!(!controller.is_running());
    assert_eq!(controller.get_state().run_status, RunStatus::Stopped);
}

#[test]
fn test_game_started_reaches_listener_and_subscriber() {
    let (controller, received) = recording_controller(fast_config(), vec![Reading::Gpu(91.0)]);
    let mut rx = controller.subscribe();

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 1));

    let deadline = Instant::now() + Duration::from_secs(5);
    let message = loop {
        match rx.try_recv() {
            Ok(message) => break message,
            Err(_) if Instant::now() < deadline => std::thread::sleep(Duration::from_millis(5)),
            Err(e) => panic!("no broadcast message: {:?}", e),
        }
    };
    match message {
        MonitorMessage::Event(event) => {
            assert_eq!(event.kind, EventKind::GameStarted);
            assert_eq!(event.session_label, DEFAULT_SESSION_LABEL);
            assert_eq!(event.metrics.gpu, Some(91.0));
            assert!(event.reason.starts_with("GPU 91.0%"));
        }
        other => panic!("unexpected message: {:?}", other),
    }

    let summary = controller.get_state();
    assert_eq!(summary.run_status, RunStatus::Running);
    assert_eq!(summary.active_label.as_deref(), Some(DEFAULT_SESSION_LABEL));

    controller.shutdown();
}

#[test]
fn test_full_session_emits_one_start_and_one_end() {
    let (controller, received) = recording_controller(
        fast_config(),
        vec![Reading::Gpu(90.0), Reading::Gpu(85.0), Reading::Gpu(20.0)],
    );

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameEnded) == 1));

    // Low readings keep coming; no second end event
    std::thread::sleep(Duration::from_millis(100));
    let messages = received.lock().clone();
    assert_eq!(events_of(&messages, EventKind::GameStarted), 1);
    assert_eq!(events_of(&messages, EventKind::GameEnded), 1);

    let snapshot = controller.get_hardware_state();
    assert_eq!(snapshot.last_event_emitted, Some(EventKind::GameEnded));
    assert_ne!(snapshot.activity_state, ActivityState::Active);

    controller.shutdown();
}

#[test]
fn test_stop_resets_state_immediately() {
    let (controller, received) = recording_controller(fast_config(), vec![Reading::Gpu(95.0)]);

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 1));
    assert_eq!(
        controller.get_hardware_state().activity_state,
        ActivityState::Active
    );

    controller.stop();

    let snapshot = controller.get_hardware_state();
    assert_eq!(snapshot.run_status, RunStatus::Stopped);
    assert_eq!(snapshot.activity_state, ActivityState::Idle);
    assert!(snapshot.current_metrics.is_none());
    assert!(snapshot.suspect_inactive_since.is_none());
    assert!(snapshot.paused_stable_since.is_none());
    assert!(snapshot.last_event_emitted.is_none());
    assert!(controller.get_state().active_label.is_none());
}

#[test]
fn test_restart_begins_a_fresh_session() {
    let (controller, received) = recording_controller(fast_config(), vec![Reading::Gpu(95.0)]);

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 1));
    controller.stop();

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 2));

    controller.shutdown();
}

#[test]
fn test_update_config_applies_on_next_tick() {
    let (controller, received) = recording_controller(fast_config(), vec![Reading::Gpu(70.0)]);

    controller.start().unwrap();
    assert!(wait_for(|| controller.get_hardware_state().current_metrics.is_some()));
    std::thread::sleep(Duration::from_millis(50));
    assert_eq!(events_of(&received.lock(), EventKind::GameStarted), 0);

    let lowered = MonitorConfig {
        active_threshold: 65.0,
        ..fast_config()
    };
    controller.update_config(lowered.clone()).unwrap();
    assert_eq!(controller.config(), lowered);

    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 1));
    controller.shutdown();
}

#[test]
fn test_invalid_config_is_rejected() {
    let inverted = MonitorConfig {
        active_threshold: 30.0,
        inactive_threshold: 50.0,
        ..MonitorConfig::default()
    };

    let detector = ScriptedDetector::new(Vec::new());
    assert!(MonitorController::new(inverted.clone(), Box::new(detector)).is_err());

    let (controller, _) = recording_controller(fast_config(), Vec::new());
    assert!(controller.update_config(inverted).is_err());
    assert_eq!(controller.config(), fast_config());

    let zero_interval = MonitorConfig {
        sample_interval_ms: 0,
        ..MonitorConfig::default()
    };
    assert!(controller.update_config(zero_interval).is_err());
}

#[test]
fn test_tick_failure_is_reported_and_loop_continues() {
    let (controller, received) =
        recording_controller(fast_config(), vec![Reading::Fail, Reading::Gpu(88.0)]);

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 1));

    let messages = received.lock().clone();
    assert!(matches!(
        &messages[0],
        MonitorMessage::Error(error) if error.contains("sensor offline")
    ));
    assert!(controller.is_running());

    controller.shutdown();
}

#[test]
fn test_detector_panic_does_not_kill_worker() {
    let (controller, received) =
        recording_controller(fast_config(), vec![Reading::Panic, Reading::Gpu(88.0)]);

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 1));

    let messages = received.lock().clone();
    assert!(matches!(
        &messages[0],
        MonitorMessage::Error(error) if error.contains("panicked")
    ));

    controller.shutdown();
}

#[test]
fn test_listener_may_query_controller() {
    let detector = ScriptedDetector::new(vec![Reading::Gpu(99.0)]);
    let controller = Arc::new(MonitorController::new(fast_config(), Box::new(detector)).unwrap());

    let seen_state = Arc::new(Mutex::new(None));
    let sink = seen_state.clone();
    let weak = Arc::downgrade(&controller);
    controller.add_listener(Arc::new(move |_: &MonitorMessage| {
        let state = weak
            .upgrade()
            .map(|controller| controller.get_hardware_state().activity_state);
        *sink.lock() = state;
    }));

    controller.start().unwrap();
    assert!(wait_for(|| seen_state.lock().is_some()));
    assert_eq!(*seen_state.lock(), Some(ActivityState::Active));

    controller.stop();
}

#[test]
fn test_panicking_listener_does_not_stop_worker() {
    let detector = ScriptedDetector::new(vec![Reading::Gpu(95.0)]);
    let controller = MonitorController::new(fast_config(), Box::new(detector)).unwrap();

    controller.add_listener(Arc::new(|_: &MonitorMessage| panic!("listener bug")));
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    controller.add_listener(Arc::new(move |message: &MonitorMessage| {
        sink.lock().push(message.clone());
    }));

    controller.start().unwrap();
    assert!(wait_for(|| events_of(&received.lock(), EventKind::GameStarted) == 1));

    let first = controller
        .get_hardware_state()
        .current_metrics
        .map(|m| m.timestamp);
    assert!(first.is_some());
    assert!(wait_for(|| {
        controller
            .get_hardware_state()
            .current_metrics
            .map(|m| m.timestamp)
            > first
    }));

    // The failing listener is logged, not reported back through itself
    assert!(received
        .lock()
        .iter()
        .all(|m| !matches!(m, MonitorMessage::Error(_))));

    controller.shutdown();
}

#[test]
fn test_update_config_wakes_a_long_sleep() {
    let slow = MonitorConfig {
        sample_interval_ms: 60_000,
        ..MonitorConfig::default()
    };
    let (controller, _) = recording_controller(slow, vec![Reading::Gpu(40.0)]);

    controller.start().unwrap();
    assert!(wait_for(|| controller.get_hardware_state().current_metrics.is_some()));
    let first = controller
        .get_hardware_state()
        .current_metrics
        .map(|m| m.timestamp);

    controller.update_config(fast_config()).unwrap();
    assert!(wait_for(|| {
        controller
            .get_hardware_state()
            .current_metrics
            .map(|m| m.timestamp)
            > first
    }));

    controller.shutdown();
}

#[test]
fn test_oversized_durations_are_rejected_at_update() {
    let (controller, _) = recording_controller(fast_config(), Vec::new());

    let huge_hold = MonitorConfig {
        inactive_hold_seconds: 10_000_000_000_000_000,
        paused_stable_seconds: 10_000_000_000_000_000,
        ..fast_config()
    };
    assert!(matches!(
        controller.update_config(huge_hold),
        Err(ReminderError::Config(_))
    ));

    let endless = MonitorConfig {
        sample_interval_ms: u64::MAX,
        ..fast_config()
    };
    assert!(controller.update_config(endless).is_err());
    assert_eq!(controller.config(), fast_config());
}

/// Detector that signals when a sample starts and then waits for permission
/// to return it.
struct GatedDetector {
    entered: mpsc::Sender<()>,
    release: mpsc::Receiver<()>,
}

impl ActivityDetector for GatedDetector {
    fn sample(&mut self) -> Result<HardwareMetrics> {
        let _ = self.entered.send(());
        self.release
            .recv()
            .map_err(|_| ReminderError::metric_collection("gate closed"))?;
        Ok(HardwareMetrics::new(Some(97.0), 10.0))
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[test]
fn test_sample_finishing_after_stop_is_discarded() {
    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    let detector = GatedDetector {
        entered: entered_tx,
        release: release_rx,
    };

    let controller = MonitorController::new(fast_config(), Box::new(detector)).unwrap();
    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    controller.add_listener(Arc::new(move |message: &MonitorMessage| {
        sink.lock().push(message.clone());
    }));

    controller.start().unwrap();
    entered_rx.recv_timeout(Duration::from_secs(5)).unwrap();

    controller.stop();
    release_tx.send(()).unwrap();
    std::thread::sleep(Duration::from_millis(100));

    let snapshot = controller.get_hardware_state();
    assert_eq!(snapshot.run_status, RunStatus::Stopped);
    assert_eq!(snapshot.activity_state, ActivityState::Idle);
    assert!(snapshot.current_metrics.is_none());
    assert!(snapshot.last_event_emitted.is_none());
    assert!(received.lock().is_empty());

    controller.shutdown();
}
