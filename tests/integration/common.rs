use std::collections::VecDeque;
use std::time::{Duration, Instant};

use chrono::{DateTime, TimeZone, Utc};
use gamer_reminder::core::activity_monitor::{ActivityDetector, HardwareMetrics};
use gamer_reminder::{MonitorConfig, ReminderError, Result};

pub enum Reading {
    Gpu(f32),
    Fail,
    Panic,
}

/// Detector fed from a fixed script. Every reading advances a fake clock by
/// one second so hold windows elapse without real waiting. When the script
/// runs dry the last value repeats.
pub struct ScriptedDetector {
    script: VecDeque<Reading>,
    last: f32,
    clock: DateTime<Utc>,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Reading>) -> Self {
        Self {
            script: VecDeque::from(script),
            last: 0.0,
            clock: Utc.with_ymd_and_hms(2024, 1, 1, 20, 0, 0).unwrap(),
        }
    }
}

impl ActivityDetector for ScriptedDetector {
    fn sample(&mut self) -> Result<HardwareMetrics> {
        self.clock += chrono::Duration::seconds(1);

        match self.script.pop_front() {
            Some(Reading::Gpu(value)) => self.last = value,
            Some(Reading::Fail) => return Err(ReminderError::metric_collection("sensor offline")),
            Some(Reading::Panic) => panic!("detector bug"),
            None => {}
        }

        Ok(HardwareMetrics::at(Some(self.last), 5.0, self.clock))
    }

    fn is_available(&self) -> bool {
        true
    }
}

pub fn fast_config() -> MonitorConfig {
    MonitorConfig {
        sample_interval_ms: 5,
        ..MonitorConfig::default()
    }
}

/// Poll `condition` until it holds or a few seconds pass.
pub fn wait_for(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}
