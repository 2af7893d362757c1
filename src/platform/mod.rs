// Platform-specific code module

pub mod cpu;
pub mod gpu;

// Re-exports for cleaner imports
pub use cpu::SysinfoCpuSampler;
pub use gpu::{default_gpu_sampler, NvidiaSmiSampler};

use crate::core::activity_monitor::HardwareDetector;

/// Detector wired to the best GPU sampler on this machine plus sysinfo CPU.
pub fn default_detector() -> HardwareDetector {
    HardwareDetector::new(default_gpu_sampler(), Box::new(SysinfoCpuSampler::new()))
}
