// Gamer Reminder Library - Public API

// Re-export error types
pub mod error;
pub use error::{ReminderError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod platform;

// Re-export commonly used types
pub use crate::core::activity_monitor::{
    ActivityEvent, ActivityState, EventKind, HardwareMetrics, MonitorMessage, MonitorSnapshot,
};
pub use crate::core::{AppConfig, MonitorConfig, MonitorController};

// Initialize logging
pub fn init_logging() {
    init_logging_with(log::LevelFilter::Info);
}

/// Initialize logging with an explicit default level. `RUST_LOG` still wins.
pub fn init_logging_with(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}
