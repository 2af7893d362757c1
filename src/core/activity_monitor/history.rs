use std::collections::VecDeque;

use chrono::{DateTime, Utc};

/// Number of GPU samples retained for pause detection
pub const GPU_HISTORY_CAPACITY: usize = 20;

/// Maximum distance from the paused threshold, and maximum standard deviation,
/// for a window to count as stable (percentage points)
pub const STABILITY_TOLERANCE: f32 = 5.0;

/// Minimum in-window samples before a window can be called stable
pub const MIN_STABLE_SAMPLES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpuSample {
    pub at: DateTime<Utc>,
    pub utilization: f32,
}

/// Bounded FIFO of real (non-fallback) GPU readings
#[derive(Debug, Clone)]
pub struct GpuHistory {
    capacity: usize,
    samples: VecDeque<GpuSample>,
}

impl GpuHistory {
    pub fn new() -> Self {
        Self::with_capacity(GPU_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            samples: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, at: DateTime<Utc>, utilization: f32) {
        if self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(GpuSample { at, utilization });
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GpuSample> {
        self.samples.iter()
    }

    /// Checks whether GPU usage inside the trailing `window` (ending at `now`)
    /// has settled around `threshold`.
    ///
    /// Stable means at least [`MIN_STABLE_SAMPLES`] in-window samples, every one
    /// within [`STABILITY_TOLERANCE`] of `threshold`, and a sample standard
    /// deviation no larger than [`STABILITY_TOLERANCE`]. Returns the timestamp of
    /// the earliest in-window sample when stable.
    pub fn stable_since(
        &self,
        threshold: f32,
        window: chrono::Duration,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        if self.samples.len() < MIN_STABLE_SAMPLES {
            return None;
        }

        let window_start = now
            .checked_sub_signed(window)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);

        let in_window: Vec<&GpuSample> = self
            .samples
            .iter()
            .filter(|s| s.at >= window_start && s.at <= now)
            .collect();

        if in_window.len() < MIN_STABLE_SAMPLES {
            return None;
        }

        let low = threshold - STABILITY_TOLERANCE;
        let high = threshold + STABILITY_TOLERANCE;
        if !in_window
            .iter()
            .all(|s| s.utilization >= low && s.utilization <= high)
        {
            return None;
        }

        let values: Vec<f32> = in_window.iter().map(|s| s.utilization).collect();
        if sample_std_dev(&values) > STABILITY_TOLERANCE {
            return None;
        }

        in_window.first().map(|s| s.at)
    }
}

impl Default for GpuHistory {
    fn default() -> Self {
        Self::new()
    }
}

/// Sample (n - 1) standard deviation; zero for fewer than two values.
fn sample_std_dev(values: &[f32]) -> f32 {
    if values.len() < 2 {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0);
    variance.sqrt() as f32
}
