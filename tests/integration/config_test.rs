use std::fs;

use gamer_reminder::core::config::ReminderMessage;
use gamer_reminder::{AppConfig, MonitorConfig};
use tempfile::TempDir;

#[test]
fn test_load_missing_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config, AppConfig::default());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let mut config = AppConfig::default();
    config.set_value("inactive_hold_seconds", "45").unwrap();
    config.set_value("sound_enabled", "false").unwrap();
    config.add_reminder("Rest your eyes");
    config.save_to(&path).unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.to_monitor_config().inactive_hold_seconds, 45);
    assert_eq!(loaded.reminders.len(), 3);
}

#[test]
fn test_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "active_threshold": 70, "reminders": [{ "id": "r9", "text": "Walk" }] }"#,
    )
    .unwrap();

    let config = AppConfig::load_from(&path).unwrap();
    assert_eq!(config.monitor.active_threshold, 70.0);
    assert_eq!(config.monitor.inactive_threshold, 35.0);
    assert_eq!(config.reminders, vec![ReminderMessage::new("r9", "Walk")]);
    assert!(config.sound_enabled);
}

#[test]
fn test_corrupt_or_empty_file_returns_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");

    fs::write(&path, "{ not json").unwrap();
    assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());

    fs::write(&path, "   \n").unwrap();
    assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());
}

#[test]
fn test_reset_to_defaults() {
    let mut config = AppConfig::default();
    config.reminders.clear();
    config.set_value("paused_threshold", "50").unwrap();

    config.reset_to_defaults();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.to_monitor_config(), MonitorConfig::default());
}
