//! Notification system for the console.

use chrono::{DateTime, Local, Utc};

/// Most recent notifications kept on screen.
pub const MAX_NOTIFICATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationAction {
    Retry,
    Dismiss,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub action: Option<NotificationAction>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(level: NotificationLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            action: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_action(mut self, action: NotificationAction) -> Self {
        self.action = Some(action);
        self
    }

    /// Footer line: local time, level, message and the key hint.
    pub fn summary(&self) -> String {
        let label = match self.level {
            NotificationLevel::Info => "INFO",
            NotificationLevel::Warning => "WARN",
            NotificationLevel::Error => "ERROR",
        };
        let hint = match self.action {
            Some(NotificationAction::Retry) => " (r retry, Esc dismiss)",
            Some(NotificationAction::Dismiss) => " (Esc dismiss)",
            None => "",
        };
        format!(
            "[{}] {}: {}{}",
            self.created_at.with_timezone(&Local).format("%H:%M:%S"),
            label,
            self.message,
            hint
        )
    }
}
