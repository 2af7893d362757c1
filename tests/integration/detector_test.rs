use std::fs;
use std::time::Duration;

use gamer_reminder::core::activity_monitor::{
    ActivityDetector, CpuSampler, GpuSampler, HardwareDetector, CPU_FALLBACK_SOURCE,
};
use gamer_reminder::platform::gpu::{CounterSampler, DrmBusySource, NvidiaSmiSampler};
use gamer_reminder::Result;
use tempfile::TempDir;

struct FixedCpu(f32);

impl CpuSampler for FixedCpu {
    fn sample(&mut self) -> Result<f32> {
        Ok(self.0)
    }
}

#[test]
fn test_missing_probe_falls_back_to_cpu() {
    let sampler = NvidiaSmiSampler::with_program("/definitely/not/here/nvidia-smi")
        .with_min_spacing(Duration::ZERO);
    let mut detector = HardwareDetector::new(Some(Box::new(sampler)), Box::new(FixedCpu(42.5)))
        .with_retry_interval(Duration::ZERO);

    for _ in 0..3 {
        let metrics = detector.sample().unwrap();
        assert_eq!(metrics.gpu_utilization, None);
        assert_eq!(metrics.effective_utilization(), 42.5);
        assert!(metrics.using_fallback());
        assert!(!detector.is_available());
        assert_eq!(detector.telemetry_source(), CPU_FALLBACK_SOURCE);
    }
}

#[test]
fn test_cpu_only_detector() {
    let mut detector = HardwareDetector::new(None, Box::new(FixedCpu(130.0)));

    let metrics = detector.sample().unwrap();
    assert_eq!(metrics.gpu_utilization, None);
    assert_eq!(metrics.cpu_utilization, 100.0);
    assert_eq!(metrics.source_label(), "CPU");
}

fn fake_drm(cards: &[(&str, &str)]) -> TempDir {
    let root = TempDir::new().unwrap();
    for (card, busy) in cards {
        let device = root.path().join(card).join("device");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("gpu_busy_percent"), busy).unwrap();
    }
    root
}

#[test]
fn test_drm_counters_drive_detector() {
    let root = fake_drm(&[("card0", "12\n"), ("card1", "77\n")]);
    fs::create_dir_all(root.path().join("card1-DP-1")).unwrap();

    let source = DrmBusySource::with_root(root.path());
    assert!(source.has_counters());

    let sampler = CounterSampler::new(source, "GPU_COUNTERS");
    let mut detector = HardwareDetector::new(Some(Box::new(sampler)), Box::new(FixedCpu(3.0)));

    let metrics = detector.sample().unwrap();
    assert_eq!(metrics.gpu_utilization, Some(77.0));
    assert!(detector.is_available());
    assert_eq!(detector.telemetry_source(), "GPU_COUNTERS");

    // Card disappears: CPU takes over until the retry cooldown elapses
    fs::remove_dir_all(root.path().join("card0")).unwrap();
    fs::remove_dir_all(root.path().join("card1")).unwrap();

    let metrics = detector.sample().unwrap();
    assert_eq!(metrics.gpu_utilization, None);
    assert_eq!(metrics.effective_utilization(), 3.0);
    assert_eq!(detector.telemetry_source(), CPU_FALLBACK_SOURCE);
}

#[test]
fn test_empty_drm_root_has_no_counters() {
    let root = fake_drm(&[]);
    assert!(!DrmBusySource::with_root(root.path()).has_counters());

    let sampler = CounterSampler::new(DrmBusySource::with_root(root.path()), "GPU_COUNTERS");
    assert!(!sampler.is_available());

    let busy = fake_drm(&[("card0", "5\n")]);
    let sampler = CounterSampler::new(DrmBusySource::with_root(busy.path()), "GPU_COUNTERS");
    assert!(sampler.is_available());
}
