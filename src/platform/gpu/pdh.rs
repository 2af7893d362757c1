//! Windows PDH counters: `\GPU Engine(*)\Utilization Percentage`.
//!
//! Engine instances come and go with processes, so the wildcard is expanded
//! again every [`RESOLVE_INTERVAL`]. Re-expansion is incremental: counters
//! that survive keep their previous collection as baseline, so every read
//! spans a full sampling interval.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use windows_sys::Win32::System::Performance::{
    PdhAddEnglishCounterW, PdhCloseQuery, PdhCollectQueryData, PdhExpandWildCardPathW,
    PdhGetFormattedCounterValue, PdhOpenQueryW, PdhRemoveCounter, PDH_FMT_COUNTERVALUE,
    PDH_FMT_DOUBLE, PDH_HCOUNTER, PDH_HQUERY,
};

use super::counters::{CounterReading, CounterSource};
use crate::error::{ReminderError, Result};

const ENGINE_WILDCARD: &str = r"\GPU Engine(*)\Utilization Percentage";

/// Marker of the engines that matter for games
pub const ENGINE_3D_MARKER: &str = "engtype_3D";

pub const RESOLVE_INTERVAL: Duration = Duration::from_secs(10);

const ERROR_SUCCESS: u32 = 0;
const PDH_MORE_DATA: u32 = 0x800007D2;
const PDH_CSTATUS_VALID_DATA: u32 = 0;
const PDH_CSTATUS_NEW_DATA: u32 = 1;
const EXPAND_ATTEMPTS: usize = 3;

struct EngineCounter {
    path: String,
    instance: String,
    handle: PDH_HCOUNTER,
}

pub struct PdhSource {
    query: PDH_HQUERY,
    counters: Vec<EngineCounter>,
    resolved_at: Option<Instant>,
}

// PDH query and counter handles are not tied to the thread that created them.
unsafe impl Send for PdhSource {}

impl PdhSource {
    /// Open the query, resolve the engine counters and take the first
    /// baseline collection.
    pub fn open() -> Result<Self> {
        let mut query: PDH_HQUERY = unsafe { std::mem::zeroed() };
        let status = unsafe { PdhOpenQueryW(std::ptr::null(), 0, &mut query) };
        check(status as u32, "PdhOpenQueryW")?;

        let mut source = Self {
            query,
            counters: Vec::new(),
            resolved_at: None,
        };
        source.resolve()?;

        // Rate counters need a baseline collection before the first read
        let status = unsafe { PdhCollectQueryData(source.query) };
        check(status as u32, "PdhCollectQueryData")?;

        Ok(source)
    }

    /// Bring the counter set in line with the current engine instances.
    ///
    /// Only vanished instances are removed and only new ones added. New
    /// counters have no baseline yet and report no data until the next read.
    fn resolve(&mut self) -> Result<()> {
        let paths = expand_wildcard(ENGINE_WILDCARD)?;
        let current: HashSet<&str> = paths.iter().map(String::as_str).collect();

        let (kept, vanished): (Vec<EngineCounter>, Vec<EngineCounter>) = self
            .counters
            .drain(..)
            .partition(|c| current.contains(c.path.as_str()));

        for counter in vanished {
            unsafe {
                PdhRemoveCounter(counter.handle);
            }
        }

        let known: HashSet<String> = kept.iter().map(|c| c.path.clone()).collect();
        self.counters = kept;

        let mut added = 0;
        for path in paths.iter().filter(|p| !known.contains(p.as_str())) {
            let wide = to_wide(path);
            let mut handle: PDH_HCOUNTER = unsafe { std::mem::zeroed() };
            let status = unsafe { PdhAddEnglishCounterW(self.query, wide.as_ptr(), 0, &mut handle) };
            if status as u32 == ERROR_SUCCESS {
                self.counters.push(EngineCounter {
                    instance: instance_name(path),
                    path: path.clone(),
                    handle,
                });
                added += 1;
            } else {
                log::debug!("Skipping GPU counter {} ({:#x})", path, status as u32);
            }
        }

        self.resolved_at = Some(Instant::now());

        if self.counters.is_empty() {
            return Err(ReminderError::gpu_not_available("no GPU Engine counters"));
        }

        log::debug!(
            "Resolved {} GPU Engine counters ({} new)",
            self.counters.len(),
            added
        );
        Ok(())
    }

    fn needs_resolve(&self) -> bool {
        self.counters.is_empty()
            || self
                .resolved_at
                .map_or(true, |at| at.elapsed() >= RESOLVE_INTERVAL)
    }
}

impl CounterSource for PdhSource {
    fn collect(&mut self) -> Result<Vec<CounterReading>> {
        if self.needs_resolve() {
            self.resolve()?;
        }

        let status = unsafe { PdhCollectQueryData(self.query) };
        check(status as u32, "PdhCollectQueryData")?;

        let readings = self
            .counters
            .iter()
            .map(|counter| {
                let mut value: PDH_FMT_COUNTERVALUE = unsafe { std::mem::zeroed() };
                let status = unsafe {
                    PdhGetFormattedCounterValue(
                        counter.handle,
                        PDH_FMT_DOUBLE,
                        std::ptr::null_mut(),
                        &mut value,
                    )
                };

                // Idle engines and counters added this round have no data
                let valid = status as u32 == ERROR_SUCCESS
                    && (value.CStatus == PDH_CSTATUS_VALID_DATA
                        || value.CStatus == PDH_CSTATUS_NEW_DATA);
                let reading = if valid {
                    Some(unsafe { value.Anonymous.doubleValue })
                } else {
                    None
                };

                CounterReading::new(counter.instance.clone(), reading)
            })
            .collect();

        Ok(readings)
    }
}

impl Drop for PdhSource {
    fn drop(&mut self) {
        unsafe {
            PdhCloseQuery(self.query);
        }
    }
}

fn expand_wildcard(wildcard: &str) -> Result<Vec<String>> {
    let wide = to_wide(wildcard);
    let mut length: u32 = 0;

    let status = unsafe {
        PdhExpandWildCardPathW(
            std::ptr::null(),
            wide.as_ptr(),
            std::ptr::null_mut(),
            &mut length,
            0,
        )
    };
    if status as u32 != PDH_MORE_DATA {
        check(status as u32, "PdhExpandWildCardPathW")?;
        return Ok(Vec::new());
    }

    for _ in 0..EXPAND_ATTEMPTS {
        let mut buffer = vec![0u16; length as usize + 1];
        length = buffer.len() as u32;

        let status = unsafe {
            PdhExpandWildCardPathW(
                std::ptr::null(),
                wide.as_ptr(),
                buffer.as_mut_ptr(),
                &mut length,
                0,
            )
        };

        match status as u32 {
            ERROR_SUCCESS => return Ok(parse_multi_sz(&buffer)),
            PDH_MORE_DATA => continue,
            other => check(other, "PdhExpandWildCardPathW")?,
        }
    }

    Err(ReminderError::gpu_not_available(
        "GPU Engine instance list kept growing during expansion",
    ))
}

fn check(status: u32, call: &str) -> Result<()> {
    if status == ERROR_SUCCESS {
        Ok(())
    } else {
        Err(ReminderError::gpu_not_available(format!(
            "PDH {} failed ({:#x})",
            call, status
        )))
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Split a double-NUL terminated UTF-16 list
fn parse_multi_sz(buffer: &[u16]) -> Vec<String> {
    buffer
        .split(|&c| c == 0)
        .take_while(|s| !s.is_empty())
        .map(String::from_utf16_lossy)
        .collect()
}

/// `\GPU Engine(pid_1_engtype_3D)\Utilization Percentage` -> `pid_1_engtype_3D`
fn instance_name(path: &str) -> String {
    match (path.find('('), path.rfind(')')) {
        (Some(open), Some(close)) if close > open => path[open + 1..close].to_string(),
        _ => path.to_string(),
    }
}
