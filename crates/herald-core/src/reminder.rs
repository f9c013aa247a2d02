//! Reminder and task models.
//!
//! A [`ScheduledReminder`] is a planned notification. The in-memory copy
//! lives only as long as its timer; the durable copy lives behind the
//! reminder persistence endpoint and is reloaded at startup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::preferences::Channel;

/// Sentinel task id for daily digest reminders.
pub const DIGEST_TASK_ID: &str = "digest";
/// Sentinel task id for weekly review reminders.
pub const REVIEW_TASK_ID: &str = "review";

/// What a reminder is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    Deadline,
    Overdue,
    DailyDigest,
    WeeklyReview,
}

/// Lifecycle state of a reminder.
///
/// `Pending -> Sent` when the delivery attempt loop completes;
/// `Pending -> Cancelled` when the owning task is deleted or its due date
/// changes. There is no failed state: delivery is attempted once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Sent,
    Cancelled,
}

/// The minimal task shape the scheduler consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
}

/// A planned notification.
///
/// Wire dates are ISO-8601; field names match the backend's camelCase
/// contract (`notificationTypes` carries the channel list).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub id: String,
    pub task_id: String,
    /// Denormalized at schedule time, never re-fetched.
    pub task_title: String,
    pub due_date: DateTime<Utc>,
    pub reminder_date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub status: ReminderStatus,
    #[serde(rename = "notificationTypes")]
    pub channels: Vec<Channel>,
}

impl ScheduledReminder {
    /// A deadline reminder firing `interval_min` minutes before the due date.
    ///
    /// Ids compose task id and offset so that one timer exists per
    /// (task, interval) pair and all of a task's reminders share a prefix.
    pub fn deadline(task: &Task, due: DateTime<Utc>, interval_min: i64, channels: Vec<Channel>) -> Self {
        Self {
            id: format!("{}-{}", task.id, interval_min),
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            due_date: due,
            reminder_date: due - chrono::Duration::minutes(interval_min),
            kind: ReminderKind::Deadline,
            status: ReminderStatus::Pending,
            channels,
        }
    }

    /// An overdue reminder firing `grace_min` minutes after the due date.
    pub fn overdue(task: &Task, due: DateTime<Utc>, grace_min: i64, channels: Vec<Channel>) -> Self {
        Self {
            id: format!("{}-overdue", task.id),
            task_id: task.id.clone(),
            task_title: task.title.clone(),
            due_date: due,
            reminder_date: due + chrono::Duration::minutes(grace_min),
            kind: ReminderKind::Overdue,
            status: ReminderStatus::Pending,
            channels,
        }
    }

    /// A daily digest reminder at a fixed wall-clock time.
    pub fn daily_digest(at: DateTime<Utc>, channels: Vec<Channel>) -> Self {
        Self {
            id: format!("{}-{}", DIGEST_TASK_ID, uuid::Uuid::new_v4()),
            task_id: DIGEST_TASK_ID.to_string(),
            task_title: "Daily Digest".to_string(),
            due_date: at,
            reminder_date: at,
            kind: ReminderKind::DailyDigest,
            status: ReminderStatus::Pending,
            channels,
        }
    }

    /// A weekly review reminder at a fixed wall-clock time.
    pub fn weekly_review(at: DateTime<Utc>, channels: Vec<Channel>) -> Self {
        Self {
            id: format!("{}-{}", REVIEW_TASK_ID, uuid::Uuid::new_v4()),
            task_id: REVIEW_TASK_ID.to_string(),
            task_title: "Weekly Review".to_string(),
            due_date: at,
            reminder_date: at,
            kind: ReminderKind::WeeklyReview,
            status: ReminderStatus::Pending,
            channels,
        }
    }

    /// Fixed notification template for this reminder's kind.
    ///
    /// Returns `(title, body)`.
    pub fn notification_text(&self, now: DateTime<Utc>) -> (String, String) {
        match self.kind {
            ReminderKind::Deadline => (
                "Task Due Soon".to_string(),
                format!(
                    "\"{}\" is due in {}",
                    self.task_title,
                    time_until_text(now, self.due_date)
                ),
            ),
            ReminderKind::Overdue => (
                "Task Overdue".to_string(),
                format!("\"{}\" is past its due date", self.task_title),
            ),
            ReminderKind::DailyDigest => (
                "Daily Digest".to_string(),
                "Here is your daily task summary".to_string(),
            ),
            ReminderKind::WeeklyReview => (
                "Weekly Review".to_string(),
                "Time to review your week".to_string(),
            ),
        }
    }

    /// Payload attached to push deliveries so the client can deep-link.
    pub fn push_data(&self) -> serde_json::Value {
        serde_json::json!({
            "taskId": self.task_id,
            "taskTitle": self.task_title,
            "dueDate": self.due_date,
            "reminderType": self.kind,
        })
    }
}

/// Human text for the span between `from` and `due`, bucketed into
/// minutes (< 1 hour), hours (< 1 day), or days, pluralized.
pub fn time_until_text(from: DateTime<Utc>, due: DateTime<Utc>) -> String {
    let minutes = (due - from).num_minutes().max(0);
    if minutes < 60 {
        plural(minutes, "minute")
    } else if minutes < 1440 {
        plural(minutes / 60, "hour")
    } else {
        plural(minutes / 1440, "day")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}
