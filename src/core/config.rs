use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::activity_monitor::MonitorConfig;

/// A single reminder shown when a session ends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub id: String,
    pub text: String,
}

impl ReminderMessage {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// Persisted application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub reminders: Vec<ReminderMessage>,
    pub sound_enabled: bool,
    /// Monitor thresholds, stored inline at the top level of the file
    #[serde(flatten)]
    pub monitor: MonitorConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            reminders: vec![
                ReminderMessage::new("r1", "Drink water"),
                ReminderMessage::new("r2", "Stretch for 2 minutes"),
            ],
            sound_enabled: true,
            monitor: MonitorConfig::default(),
        }
    }
}

/// Keys accepted by [`AppConfig::set_value`]
pub const SETTABLE_KEYS: &[&str] = &[
    "active_threshold",
    "inactive_threshold",
    "inactive_hold_seconds",
    "sample_interval_ms",
    "paused_threshold",
    "paused_stable_seconds",
    "sound_enabled",
];

impl AppConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load from an explicit path. Missing, empty or unparsable files yield defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(AppConfig::default());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if data.trim().is_empty() {
            return Ok(AppConfig::default());
        }

        let config = serde_json::from_str(&data).unwrap_or_else(|e| {
            // Format changes between versions should not lock the user out
            log::warn!("Ignoring unreadable config {:?}: {}", path, e);
            AppConfig::default()
        });

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data = serde_json::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, data)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("gamer-reminder").join("config.json"))
    }

    pub fn to_monitor_config(&self) -> MonitorConfig {
        self.monitor.clone()
    }

    /// Append a reminder with a freshly generated id.
    pub fn add_reminder(&mut self, text: impl Into<String>) -> &ReminderMessage {
        let mut seed = chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default() as u64;
        let mut id = format!("r_{:010x}", seed & 0xff_ffff_ffff);
        while self.reminders.iter().any(|r| r.id == id) {
            seed = seed.wrapping_add(1);
            id = format!("r_{:010x}", seed & 0xff_ffff_ffff);
        }

        self.reminders.push(ReminderMessage::new(id, text));
        &self.reminders[self.reminders.len() - 1]
    }

    /// Remove a reminder by id. Returns false if no reminder had that id.
    pub fn remove_reminder(&mut self, id: &str) -> bool {
        let before = self.reminders.len();
        self.reminders.retain(|r| r.id != id);
        self.reminders.len() != before
    }

    /// Set one setting from its textual form. The resulting monitor
    /// configuration must be valid or nothing changes.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let mut monitor = self.monitor.clone();

        match key {
            "active_threshold" => monitor.active_threshold = parse(key, value)?,
            "inactive_threshold" => monitor.inactive_threshold = parse(key, value)?,
            "inactive_hold_seconds" => monitor.inactive_hold_seconds = parse(key, value)?,
            "sample_interval_ms" => monitor.sample_interval_ms = parse(key, value)?,
            "paused_threshold" => monitor.paused_threshold = parse(key, value)?,
            "paused_stable_seconds" => monitor.paused_stable_seconds = parse(key, value)?,
            "sound_enabled" => {
                self.sound_enabled = parse(key, value)?;
                return Ok(());
            }
            _ => bail!(
                "Unknown setting '{}'. Valid keys: {}",
                key,
                SETTABLE_KEYS.join(", ")
            ),
        }

        monitor.validate()?;
        self.monitor = monitor;
        Ok(())
    }

    pub fn reset_to_defaults(&mut self) {
        *self = AppConfig::default();
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("Invalid value '{}' for {}: {}", value, key, e))
}
