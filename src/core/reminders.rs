//! Reminder notification payloads.
//!
//! Delivery (toast, sound) is left to a [`Notifier`] implementation supplied
//! by the presentation layer.

use serde::{Deserialize, Serialize};

use super::config::ReminderMessage;
use crate::error::Result;

pub const NOTIFICATION_TITLE: &str = "Gamer Reminder";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
}

/// Delivers a pre-built notification to the user.
pub trait Notifier {
    fn notify(&self, payload: &NotificationPayload) -> Result<()>;
}

/// Build the "session ended" notification listing every configured reminder.
pub fn build_reminder_payload(
    reminders: &[ReminderMessage],
    session_label: &str,
) -> NotificationPayload {
    let mut lines = vec![format!("Session ended: {}", session_label), String::new()];

    if reminders.is_empty() {
        lines.push("No reminders configured.".to_string());
    } else {
        lines.extend(reminders.iter().map(|r| format!("• {}", r.text)));
    }

    NotificationPayload {
        title: NOTIFICATION_TITLE.to_string(),
        body: lines.join("\n"),
    }
}
