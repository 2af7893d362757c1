//! Detector: composes a GPU and a CPU sampler into one reading per tick.
//!
//! GPU availability is a runtime state, not a fixed capability. Any GPU
//! failure flips the detector into CPU fallback and arms a retry cooldown;
//! once it elapses the GPU sampler is probed again.

use std::panic::{self, AssertUnwindSafe};
use std::time::{Duration, Instant};

use super::metrics::HardwareMetrics;
use super::sampler::{CpuSampler, GpuSampler};
use crate::error::Result;

/// Delay before a GPU sampler marked unavailable is tried again
pub const GPU_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Telemetry source reported while running on CPU only
pub const CPU_FALLBACK_SOURCE: &str = "CPU_FALLBACK";

/// Produces unified hardware readings for the monitor.
pub trait ActivityDetector: Send {
    fn sample(&mut self) -> Result<HardwareMetrics>;

    /// Whether GPU telemetry is currently being delivered
    fn is_available(&self) -> bool;

    fn telemetry_source(&self) -> String {
        if self.is_available() {
            "GPU".to_string()
        } else {
            CPU_FALLBACK_SOURCE.to_string()
        }
    }
}

pub struct HardwareDetector {
    gpu: Option<Box<dyn GpuSampler>>,
    cpu: Box<dyn CpuSampler>,
    gpu_available: bool,
    last_gpu_failure: Option<Instant>,
    retry_interval: Duration,
}

impl HardwareDetector {
    pub fn new(gpu: Option<Box<dyn GpuSampler>>, cpu: Box<dyn CpuSampler>) -> Self {
        match &gpu {
            Some(sampler) => log::info!(
                "GPU sampler {} attached (availability checked at runtime)",
                sampler.name()
            ),
            None => log::warn!("No GPU sampler available, using CPU-only mode"),
        }

        Self {
            gpu,
            cpu,
            gpu_available: false,
            last_gpu_failure: None,
            retry_interval: GPU_RETRY_INTERVAL,
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    fn should_try_gpu(&self) -> bool {
        if self.gpu.is_none() {
            return false;
        }
        if self.gpu_available {
            return true;
        }
        self.last_gpu_failure
            .map_or(true, |failed_at| failed_at.elapsed() >= self.retry_interval)
    }

    fn sample_gpu(&mut self) -> Option<f32> {
        let sampler = self.gpu.as_mut()?;
        let name = sampler.name();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| sampler.sample()));
        let value = match outcome {
            Ok(Ok(Some(value))) if value.is_finite() => Some(value.clamp(0.0, 100.0)),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                log::debug!("GPU sampler {} failed: {}", name, e);
                None
            }
            Err(_) => {
                log::debug!("GPU sampler {} panicked", name);
                None
            }
        };

        let was_available = self.gpu_available;
        self.gpu_available = value.is_some();

        if self.gpu_available {
            self.last_gpu_failure = None;
        } else {
            self.last_gpu_failure = Some(Instant::now());
        }

        if was_available != self.gpu_available {
            if self.gpu_available {
                log::info!("GPU telemetry: AVAILABLE via {} (leaving CPU fallback)", name);
            } else {
                log::info!("GPU telemetry: UNAVAILABLE (switching to CPU fallback)");
            }
        }

        value
    }
}

impl ActivityDetector for HardwareDetector {
    fn sample(&mut self) -> Result<HardwareMetrics> {
        let cpu_utilization = self.cpu.sample()?.clamp(0.0, 100.0);

        let gpu_utilization = if self.should_try_gpu() {
            self.sample_gpu()
        } else {
            None
        };

        Ok(HardwareMetrics::new(gpu_utilization, cpu_utilization))
    }

    fn is_available(&self) -> bool {
        self.gpu_available
    }

    fn telemetry_source(&self) -> String {
        match &self.gpu {
            Some(sampler) if self.gpu_available => sampler.name().to_string(),
            _ => CPU_FALLBACK_SOURCE.to_string(),
        }
    }
}
