//! GPU-specific platform code.
//!
//! Provides GPU utilization sampling through several interchangeable
//! backends: NVML (optional `nvml` feature), the `nvidia-smi` probe, and
//! platform performance counters (DRM sysfs on Linux, PDH on Windows).

pub mod counters;
pub mod drm;
mod nvidia_smi;
#[cfg(feature = "nvml")]
mod nvml;
#[cfg(windows)]
pub mod pdh;

pub use counters::{aggregate, CounterReading, CounterSampler, CounterSource};
pub use drm::DrmBusySource;
pub use nvidia_smi::{parse_utilization_output, NvidiaSmiSampler, MIN_PROBE_SPACING, PROBE_TIMEOUT};
#[cfg(feature = "nvml")]
pub use nvml::NvmlSampler;

use crate::core::activity_monitor::GpuSampler;

/// Telemetry source name of the counter-based sampler
pub const COUNTERS_SOURCE: &str = "GPU_COUNTERS";

/// Pick the best available GPU sampler
///
/// Tries each backend in order of preference:
/// 1. NVML (when built with the `nvml` feature)
/// 2. nvidia-smi on PATH
/// 3. Platform counters
///
/// A backend is only chosen when it reports itself available. Returns `None`
/// when nothing is usable; the detector then runs CPU-only.
pub fn default_gpu_sampler() -> Option<Box<dyn GpuSampler>> {
    #[cfg(feature = "nvml")]
    {
        match NvmlSampler::new() {
            Ok(sampler) => {
                if let Some(sampler) = usable(Box::new(sampler)) {
                    return Some(sampler);
                }
            }
            Err(e) => log::debug!("{}", e),
        }
    }

    if let Some(sampler) = NvidiaSmiSampler::detect() {
        if sampler.check() {
            log::info!("NVIDIA GPU sampler initialized (nvidia-smi available)");
        } else {
            log::debug!("nvidia-smi found but not responding; will keep retrying");
        }
        if let Some(sampler) = usable(Box::new(sampler)) {
            return Some(sampler);
        }
    }

    platform_counter_sampler().and_then(usable)
}

fn usable(sampler: Box<dyn GpuSampler>) -> Option<Box<dyn GpuSampler>> {
    if sampler.is_available() {
        log::debug!("Selected GPU sampler {}", sampler.name());
        Some(sampler)
    } else {
        log::debug!("GPU sampler {} reports unavailable, skipping", sampler.name());
        None
    }
}

#[cfg(target_os = "linux")]
fn platform_counter_sampler() -> Option<Box<dyn GpuSampler>> {
    Some(Box::new(CounterSampler::new(
        DrmBusySource::new(),
        COUNTERS_SOURCE,
    )))
}

#[cfg(windows)]
fn platform_counter_sampler() -> Option<Box<dyn GpuSampler>> {
    match pdh::PdhSource::open() {
        Ok(source) => Some(Box::new(
            CounterSampler::new(source, COUNTERS_SOURCE).with_preferred(pdh::ENGINE_3D_MARKER),
        )),
        Err(e) => {
            log::warn!("GPU performance counters unavailable: {}", e);
            None
        }
    }
}

#[cfg(not(any(target_os = "linux", windows)))]
fn platform_counter_sampler() -> Option<Box<dyn GpuSampler>> {
    None
}
