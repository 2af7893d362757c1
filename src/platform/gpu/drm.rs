//! Linux DRM busy counters (`/sys/class/drm/cardN/device/gpu_busy_percent`).
//!
//! Exposed by amdgpu and some other kernel drivers; one instance per card.

use std::fs;
use std::path::PathBuf;

use super::counters::{CounterReading, CounterSource};
use crate::error::{ReminderError, Result};

const DRM_ROOT: &str = "/sys/class/drm";
const BUSY_FILE: &str = "gpu_busy_percent";

pub struct DrmBusySource {
    root: PathBuf,
}

impl DrmBusySource {
    pub fn new() -> Self {
        Self::with_root(DRM_ROOT)
    }

    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// True when at least one card exposes a busy counter
    pub fn has_counters(&self) -> bool {
        self.card_counters().map(|c| !c.is_empty()).unwrap_or(false)
    }

    fn card_counters(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut counters = Vec::new();

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();

            // cardN only; cardN-DP-1 style entries are connectors
            if !name.starts_with("card") || name.contains('-') {
                continue;
            }

            let counter = entry.path().join("device").join(BUSY_FILE);
            if counter.is_file() {
                counters.push((name, counter));
            }
        }

        counters.sort();
        Ok(counters)
    }
}

impl Default for DrmBusySource {
    fn default() -> Self {
        Self::new()
    }
}

impl CounterSource for DrmBusySource {
    fn collect(&mut self) -> Result<Vec<CounterReading>> {
        let counters = self.card_counters()?;
        if counters.is_empty() {
            return Err(ReminderError::gpu_not_available(format!(
                "no {} counters under {}",
                BUSY_FILE,
                self.root.display()
            )));
        }

        let readings = counters
            .into_iter()
            .map(|(card, path)| {
                let value = fs::read_to_string(&path)
                    .ok()
                    .and_then(|raw| raw.trim().parse::<f64>().ok());
                CounterReading::new(card, value)
            })
            .collect();

        Ok(readings)
    }

    fn is_available(&self) -> bool {
        self.has_counters()
    }
}
