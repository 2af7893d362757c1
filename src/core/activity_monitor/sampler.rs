use crate::error::Result;

/// A source of a single aggregated GPU utilization value.
///
/// Implementations live in the platform layer (nvidia-smi, NVML, performance
/// counters). `Ok(None)` means "no usable value right now" and is treated the
/// same as an error by the detector.
pub trait GpuSampler: Send {
    /// Stable identifier reported as the telemetry source, e.g. `NVIDIA_SMI`
    fn name(&self) -> &'static str;

    /// Current GPU utilization (0-100)
    fn sample(&mut self) -> Result<Option<f32>>;

    /// Cheap check whether the backing interface looks usable at all
    fn is_available(&self) -> bool;
}

/// Synchronous whole-system CPU utilization reader.
pub trait CpuSampler: Send {
    /// Current CPU utilization (0-100)
    fn sample(&mut self) -> Result<f32>;
}
