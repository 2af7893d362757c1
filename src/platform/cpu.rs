//! CPU utilization via sysinfo.

use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::core::activity_monitor::CpuSampler;
use crate::error::Result;

/// Whole-system CPU usage reader.
///
/// sysinfo computes usage as a delta between two refreshes, so the first
/// call primes the counters and waits `MINIMUM_CPU_UPDATE_INTERVAL`.
pub struct SysinfoCpuSampler {
    system: System,
    primed: bool,
}

impl SysinfoCpuSampler {
    pub fn new() -> Self {
        let refresh_kind =
            RefreshKind::nothing().with_cpu(CpuRefreshKind::nothing().with_cpu_usage());

        Self {
            system: System::new_with_specifics(refresh_kind),
            primed: false,
        }
    }
}

impl Default for SysinfoCpuSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuSampler for SysinfoCpuSampler {
    fn sample(&mut self) -> Result<f32> {
        if !self.primed {
            self.system.refresh_cpu_usage();
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            self.primed = true;
        }

        self.system.refresh_cpu_usage();
        Ok(self.system.global_cpu_usage().clamp(0.0, 100.0))
    }
}
