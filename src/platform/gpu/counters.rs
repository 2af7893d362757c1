//! GPU utilization from platform performance counters.
//!
//! A [`CounterSource`] enumerates per-instance utilization counters (one per
//! GPU engine or card). [`CounterSampler`] narrows them to the instances that
//! matter for graphics-heavy workloads and reports the busiest one.

use crate::core::activity_monitor::GpuSampler;
use crate::error::Result;

/// One counter instance read during a collection pass
#[derive(Debug, Clone, PartialEq)]
pub struct CounterReading {
    pub instance: String,
    /// `None` when the instance reported no data (inactive engine)
    pub value: Option<f64>,
}

impl CounterReading {
    pub fn new(instance: impl Into<String>, value: Option<f64>) -> Self {
        Self {
            instance: instance.into(),
            value,
        }
    }
}

/// Backend that resolves and reads a family of utilization counters.
pub trait CounterSource: Send {
    /// Read every known instance. An `Err` means enumeration or the query
    /// itself failed.
    fn collect(&mut self) -> Result<Vec<CounterReading>>;

    /// Whether any counter instance exists right now
    fn is_available(&self) -> bool {
        true
    }
}

pub struct CounterSampler<S: CounterSource> {
    source: S,
    /// Instances whose name contains this marker are preferred
    preferred: Option<String>,
    name: &'static str,
}

impl<S: CounterSource> CounterSampler<S> {
    pub fn new(source: S, name: &'static str) -> Self {
        Self {
            source,
            preferred: None,
            name,
        }
    }

    pub fn with_preferred(mut self, marker: impl Into<String>) -> Self {
        self.preferred = Some(marker.into());
        self
    }
}

impl<S: CounterSource> GpuSampler for CounterSampler<S> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn sample(&mut self) -> Result<Option<f32>> {
        let readings = match self.source.collect() {
            Ok(readings) => readings,
            Err(e) => {
                log::warn!("GPU counter query failed: {}", e);
                return Ok(None);
            }
        };

        Ok(aggregate(&readings, self.preferred.as_deref()))
    }

    fn is_available(&self) -> bool {
        self.source.is_available()
    }
}

/// Maximum over the preferred subset (or every instance if that subset is
/// empty), each value clamped to 0-100. Instances without data are ignored.
pub fn aggregate(readings: &[CounterReading], preferred: Option<&str>) -> Option<f32> {
    let preferred_set: Vec<&CounterReading> = match preferred {
        Some(marker) => readings
            .iter()
            .filter(|r| r.instance.contains(marker))
            .collect(),
        None => Vec::new(),
    };

    let selected: Vec<&CounterReading> = if preferred_set.is_empty() {
        readings.iter().collect()
    } else {
        preferred_set
    };

    selected
        .iter()
        .filter_map(|r| r.value)
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, 100.0) as f32)
        .fold(None, |max: Option<f32>, value| {
            Some(max.map_or(value, |m| m.max(value)))
        })
}
