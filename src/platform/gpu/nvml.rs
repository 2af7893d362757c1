use nvml_wrapper::Nvml;
use once_cell::sync::Lazy;

use crate::core::activity_monitor::GpuSampler;
use crate::error::{ReminderError, Result};

/// NVML must be initialized once per process
static NVML: Lazy<Option<Nvml>> = Lazy::new(|| match Nvml::init() {
    Ok(nvml) => Some(nvml),
    Err(e) => {
        log::debug!("Failed to init NVML: {}", e);
        None
    }
});

/// NVIDIA GPU sampler using NVML
///
/// NVML is the library behind nvidia-smi; reading it directly avoids spawning
/// a process per sample. Reports the busiest device.
pub struct NvmlSampler {
    nvml: &'static Nvml,
    device_count: u32,
}

impl NvmlSampler {
    /// Verify NVML is loaded and at least one device is present
    pub fn new() -> Result<Self> {
        let nvml = NVML.as_ref().ok_or_else(|| {
            ReminderError::gpu_not_available(
                "NVML not available (NVIDIA driver not installed or incompatible)",
            )
        })?;

        let device_count = nvml.device_count().map_err(|e| {
            ReminderError::gpu_not_available(format!("Failed to get device count: {}", e))
        })?;

        if device_count == 0 {
            return Err(ReminderError::gpu_not_available("NVML reports no devices"));
        }

        Ok(Self { nvml, device_count })
    }
}

impl GpuSampler for NvmlSampler {
    fn name(&self) -> &'static str {
        "NVML"
    }

    fn sample(&mut self) -> Result<Option<f32>> {
        let mut busiest: Option<u32> = None;

        for index in 0..self.device_count {
            let device = match self.nvml.device_by_index(index) {
                Ok(device) => device,
                Err(e) => {
                    log::debug!("NVML device {} unavailable: {}", index, e);
                    continue;
                }
            };

            match device.utilization_rates() {
                Ok(rates) if rates.gpu <= 100 => {
                    busiest = Some(busiest.map_or(rates.gpu, |b| b.max(rates.gpu)));
                }
                Ok(rates) => log::debug!("NVML device {} out-of-range value: {}", index, rates.gpu),
                Err(e) => {
                    return Err(ReminderError::metric_collection(format!(
                        "Failed to read utilization of GPU {}: {}",
                        index, e
                    )))
                }
            }
        }

        Ok(busiest.map(|u| u as f32))
    }

    fn is_available(&self) -> bool {
        self.nvml.device_by_index(0).is_ok()
    }
}
