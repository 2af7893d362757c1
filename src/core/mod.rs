// Core business logic module

pub mod activity_monitor;
pub mod config;
pub mod reminders;

// Re-export commonly used items
pub use activity_monitor::{MonitorConfig, MonitorController};
pub use config::{AppConfig, ReminderMessage};
pub use reminders::{build_reminder_payload, NotificationPayload, Notifier};
