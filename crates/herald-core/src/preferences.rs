//! Per-user notification preferences.
//!
//! Preferences are owned by the backend and consumed here as an immutable
//! snapshot at schedule/send time. The wire shape is camelCase JSON served
//! by `GET /preferences`. When that endpoint is unreachable the library
//! falls back to [`NotificationPreferences::default`].

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A delivery channel for a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Browser,
    Push,
    Email,
}

/// Deadline reminder settings: which intervals before a due date fire,
/// and through which channels.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeadlineReminderPrefs {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Minutes before the due date, e.g. `[1440, 120, 30]`.
    #[serde(default = "default_intervals")]
    pub intervals: Vec<i64>,
    #[serde(default = "default_channels", rename = "types")]
    pub channels: Vec<Channel>,
    #[serde(default = "default_true")]
    pub sound: bool,
    #[serde(default = "default_true")]
    pub vibrate: bool,
}

/// A daily window during which no notifications are delivered.
///
/// `start`/`end` are zero-padded `HH:MM` wall-clock strings. When
/// `start > end` the window wraps midnight (e.g. `22:00`-`08:00`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietHours {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_quiet_start")]
    pub start: String,
    #[serde(default = "default_quiet_end")]
    pub end: String,
}

/// Per-user notification preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    #[serde(default)]
    pub deadline_reminders: DeadlineReminderPrefs,
    #[serde(default = "default_true")]
    pub daily_digest: bool,
    #[serde(default = "default_true")]
    pub weekly_review: bool,
    #[serde(default)]
    pub quiet_hours: QuietHours,
}

// Default functions
fn default_true() -> bool {
    true
}
fn default_intervals() -> Vec<i64> {
    vec![1440, 120, 30]
}
fn default_channels() -> Vec<Channel> {
    vec![Channel::Browser, Channel::Push]
}
fn default_quiet_start() -> String {
    "22:00".to_string()
}
fn default_quiet_end() -> String {
    "08:00".to_string()
}

impl Default for DeadlineReminderPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            intervals: default_intervals(),
            channels: default_channels(),
            sound: true,
            vibrate: true,
        }
    }
}

impl Default for QuietHours {
    fn default() -> Self {
        Self {
            enabled: false,
            start: default_quiet_start(),
            end: default_quiet_end(),
        }
    }
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            deadline_reminders: DeadlineReminderPrefs::default(),
            daily_digest: true,
            weekly_review: true,
            quiet_hours: QuietHours::default(),
        }
    }
}

impl QuietHours {
    /// Whether `now` falls inside the window. Always false when disabled.
    ///
    /// Comparison is lexicographic on zero-padded `HH:MM`, which orders the
    /// same as time-of-day. Membership in a wrapping window is
    /// `now >= start || now <= end`; in a non-wrapping window it is the
    /// inclusive bounded range.
    pub fn contains(&self, now: NaiveTime) -> bool {
        if !self.enabled {
            return false;
        }
        let now = now.format("%H:%M").to_string();
        let now = now.as_str();
        if self.start.as_str() <= self.end.as_str() {
            now >= self.start.as_str() && now <= self.end.as_str()
        } else {
            now >= self.start.as_str() || now <= self.end.as_str()
        }
    }

    /// Parse the window's end as a time of day.
    pub fn end_time(&self) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(&self.end, "%H:%M").ok()
    }

    /// Check that both bounds are zero-padded `HH:MM`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for value in [&self.start, &self.end] {
            if NaiveTime::parse_from_str(value, "%H:%M").is_err() {
                return Err(ValidationError::InvalidTimeOfDay(value.clone()));
            }
        }
        Ok(())
    }
}
