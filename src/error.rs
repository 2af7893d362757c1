use std::io;
use thiserror::Error;

/// Custom error type for the gamer-reminder library
#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("GPU not available: {0}")]
    GpuNotAvailable(String),

    #[error("Metric collection failed: {0}")]
    MetricCollection(String),

    #[error("Monitor error: {0}")]
    Monitor(String),
}

/// Result type alias for the gamer-reminder library
pub type Result<T> = std::result::Result<T, ReminderError>;

impl ReminderError {
    /// Create a config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        ReminderError::Config(msg.into())
    }

    pub fn gpu_not_available<S: Into<String>>(msg: S) -> Self {
        ReminderError::GpuNotAvailable(msg.into())
    }

    pub fn metric_collection<S: Into<String>>(msg: S) -> Self {
        ReminderError::MetricCollection(msg.into())
    }

    pub fn monitor<S: Into<String>>(msg: S) -> Self {
        ReminderError::Monitor(msg.into())
    }
}
