//! GPU utilization through the `nvidia-smi` command line tool.
//!
//! Runs `nvidia-smi --query-gpu=utilization.gpu --format=csv,noheader,nounits`,
//! which prints one integer per GPU. The busiest GPU wins.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

use crate::core::activity_monitor::GpuSampler;
use crate::error::{ReminderError, Result};

/// Hard limit for one probe invocation
pub const PROBE_TIMEOUT: Duration = Duration::from_millis(500);

/// Minimum spacing between two probe invocations
pub const MIN_PROBE_SPACING: Duration = Duration::from_secs(1);

const CHECK_TIMEOUT: Duration = Duration::from_secs(1);
const QUERY_ARGS: [&str; 2] = ["--query-gpu=utilization.gpu", "--format=csv,noheader,nounits"];
const POLL_STEP: Duration = Duration::from_millis(5);

pub struct NvidiaSmiSampler {
    program: PathBuf,
    timeout: Duration,
    min_spacing: Duration,
    last_probe: Option<Instant>,
}

impl NvidiaSmiSampler {
    /// Use `nvidia-smi` from PATH, falling back to the bare name
    pub fn new() -> Self {
        let program = which::which("nvidia-smi").unwrap_or_else(|_| PathBuf::from("nvidia-smi"));
        log::debug!("Using nvidia-smi at {:?}", program);
        Self::with_program(program)
    }

    /// Only returns a sampler when `nvidia-smi` is on PATH
    pub fn detect() -> Option<Self> {
        which::which("nvidia-smi").ok().map(Self::with_program)
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: PROBE_TIMEOUT,
            min_spacing: MIN_PROBE_SPACING,
            last_probe: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_min_spacing(mut self, min_spacing: Duration) -> Self {
        self.min_spacing = min_spacing;
        self
    }

    /// Lightweight `nvidia-smi -L` run; true when it lists GPUs successfully.
    pub fn check(&self) -> bool {
        match run_with_timeout(&self.program, &["-L"], CHECK_TIMEOUT) {
            Ok((status, _)) => status.success(),
            Err(e) => {
                log::debug!("nvidia-smi check failed: {}", e);
                false
            }
        }
    }

    fn query(&self) -> Result<Option<f32>> {
        let (status, stdout) = run_with_timeout(&self.program, &QUERY_ARGS, self.timeout)?;

        if !status.success() {
            log::debug!("nvidia-smi returned non-zero exit status: {}", status);
            return Ok(None);
        }

        let value = parse_utilization_output(&stdout);
        if value.is_none() {
            log::debug!("nvidia-smi returned no valid utilization values");
        }
        Ok(value)
    }
}

impl Default for NvidiaSmiSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl GpuSampler for NvidiaSmiSampler {
    fn name(&self) -> &'static str {
        "NVIDIA_SMI"
    }

    fn sample(&mut self) -> Result<Option<f32>> {
        let now = Instant::now();
        if let Some(last) = self.last_probe {
            if now.duration_since(last) < self.min_spacing {
                return Ok(None);
            }
        }
        self.last_probe = Some(now);

        match self.query() {
            Ok(value) => Ok(value),
            Err(e) => {
                log::debug!("nvidia-smi query failed: {}", e);
                Ok(None)
            }
        }
    }

    fn is_available(&self) -> bool {
        self.program.is_file() || which::which(&self.program).is_ok()
    }
}

/// Parse probe output: one number per line, maximum of the valid ones.
///
/// Blank and non-numeric lines are skipped, values outside 0-100 are dropped.
/// Returns `None` when nothing valid remains.
pub fn parse_utilization_output(output: &str) -> Option<f32> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| match line.parse::<f32>() {
            Ok(value) if value.is_finite() && (0.0..=100.0).contains(&value) => Some(value),
            Ok(value) => {
                log::debug!("nvidia-smi returned out-of-range value: {}", value);
                None
            }
            Err(_) => {
                log::debug!("nvidia-smi returned non-numeric value: {}", line);
                None
            }
        })
        .fold(None, |max: Option<f32>, value| {
            Some(max.map_or(value, |m| m.max(value)))
        })
}

/// Spawn `program`, kill it if it outlives `timeout`, return status and stdout.
fn run_with_timeout(program: &Path, args: &[&str], timeout: Duration) -> Result<(ExitStatus, String)> {
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null());

    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(0x08000000); // CREATE_NO_WINDOW
    }

    let mut child = command.spawn()?;
    let start = Instant::now();

    let status = loop {
        match child.try_wait()? {
            Some(status) => break status,
            None => {
                if start.elapsed() >= timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(ReminderError::metric_collection(format!(
                        "{} timed out after {:?}",
                        program.display(),
                        timeout
                    )));
                }
                std::thread::sleep(POLL_STEP);
            }
        }
    };

    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_string(&mut stdout)?;
    }

    Ok((status, stdout))
}
