//! Reminder scheduling engine.
//!
//! Turns "a task has a due date and the user has preferences" into timed
//! delivery events. Timers are in-process and ephemeral: every scheduled
//! reminder is also persisted through the backend, and
//! [`ReminderScheduler::load_pending_reminders`] rebuilds the timer map at
//! startup. That reload pass is the whole crash-recovery protocol.
//!
//! ## Reminder lifecycle
//!
//! ```text
//! pending --(timer fires)--------------> sent
//! pending --(cancelled by caller)------> cancelled
//! pending --(fires inside quiet hours)-> pending   (new timer at window end)
//! ```
//!
//! There is no failed state. Delivery errors are logged per channel and the
//! reminder is marked sent after the attempt loop regardless.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::notify::{NotificationManager, NotificationOptions};
use crate::preferences::{Channel, QuietHours};
use crate::reminder::{ReminderStatus, ScheduledReminder, Task};

/// Fixed schedule knobs. Defaults: overdue nudge 15 minutes after the
/// deadline, digest at 08:00, review Sunday 19:00.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Minutes past the due date before the overdue reminder fires.
    pub overdue_grace_min: i64,
    /// Local hour (0-23) of the daily digest.
    pub daily_digest_hour: u32,
    /// Weekday of the weekly review, 0 = Monday .. 6 = Sunday.
    pub weekly_review_weekday: u8,
    /// Local hour (0-23) of the weekly review.
    pub weekly_review_hour: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            overdue_grace_min: 15,
            daily_digest_hour: 8,
            weekly_review_weekday: 6,
            weekly_review_hour: 19,
        }
    }
}

/// Process-wide reminder scheduler.
///
/// Cheap to clone; clones share one timer map. Constructed once at the
/// composition root and handed to callers by reference.
#[derive(Clone)]
pub struct ReminderScheduler {
    inner: Arc<SchedulerInner>,
}

struct SchedulerInner {
    api: Arc<ApiClient>,
    notifier: Arc<NotificationManager>,
    config: SchedulerConfig,
    /// Invariant: at most one live timer per reminder id. Installing a
    /// timer for an id aborts the previous handle first.
    timers: Mutex<HashMap<String, JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn new(api: Arc<ApiClient>, notifier: Arc<NotificationManager>) -> Self {
        Self::with_config(api, notifier, SchedulerConfig::default())
    }

    pub fn with_config(
        api: Arc<ApiClient>,
        notifier: Arc<NotificationManager>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                api,
                notifier,
                config,
                timers: Mutex::new(HashMap::new()),
            }),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Number of live in-memory timers.
    pub fn pending_timer_count(&self) -> usize {
        self.inner.timers().len()
    }

    /// Whether a live timer exists for `reminder_id`.
    pub fn has_pending_timer(&self, reminder_id: &str) -> bool {
        self.inner.timers().contains_key(reminder_id)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Schedule every configured reminder for `task`.
    ///
    /// No-op when the task has no due date, is completed, or deadline
    /// reminders are disabled. Intervals whose fire time is already past
    /// are dropped, not fired late; the overdue nudge is scheduled
    /// unconditionally as long as its fire time is still future.
    pub async fn schedule_task_reminders(&self, task: &Task) {
        let Some(due) = task.due_date else {
            debug!(task = %task.id, "no due date, nothing to schedule");
            return;
        };
        if task.completed {
            debug!(task = %task.id, "task completed, nothing to schedule");
            return;
        }

        let prefs = self.inner.notifier.get_preferences().await;
        if !prefs.deadline_reminders.enabled {
            debug!(task = %task.id, "deadline reminders disabled");
            return;
        }

        let now = Utc::now();
        let channels = prefs.deadline_reminders.channels.clone();
        for &interval in &prefs.deadline_reminders.intervals {
            let reminder = ScheduledReminder::deadline(task, due, interval, channels.clone());
            if reminder.reminder_date <= now {
                debug!(task = %task.id, interval, "interval already past, dropping");
                continue;
            }
            Arc::clone(&self.inner).schedule(reminder, true).await;
        }

        let overdue =
            ScheduledReminder::overdue(task, due, self.inner.config.overdue_grace_min, channels);
        if overdue.reminder_date > now {
            Arc::clone(&self.inner).schedule(overdue, true).await;
        }
    }

    /// Register a single reminder.
    ///
    /// Fires immediately when its fire time has already passed (this is
    /// what makes the startup reload deliver reminders that came due while
    /// the process was down); otherwise installs a timer, replacing any
    /// existing timer for the same id, and persists the reminder for crash
    /// recovery.
    pub async fn schedule_reminder(&self, reminder: ScheduledReminder) {
        Arc::clone(&self.inner).schedule(reminder, true).await;
    }

    /// Cancel every in-memory timer belonging to `task_id` and issue one
    /// best-effort delete against the store without blocking on it.
    pub fn cancel_task_reminders(&self, task_id: &str) {
        let prefix = format!("{task_id}-");
        let mut cancelled = 0usize;
        {
            let mut timers = self.inner.timers();
            timers.retain(|id, handle| {
                if id.starts_with(&prefix) {
                    handle.abort();
                    cancelled += 1;
                    false
                } else {
                    true
                }
            });
        }
        debug!(task_id, cancelled, "cancelled task reminders");

        let api = Arc::clone(&self.inner.api);
        let task_id = task_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = api.delete_reminder(&task_id).await {
                warn!(task_id, error = %e, "reminder delete failed");
            }
        });
    }

    /// Cancel then re-schedule, e.g. after a due-date change.
    pub async fn reschedule_task_reminders(&self, task: &Task) {
        self.cancel_task_reminders(&task.id);
        self.schedule_task_reminders(task).await;
    }

    /// Schedule the next daily digest, rolling to tomorrow when today's
    /// slot has already passed. No-op when the digest is disabled.
    pub async fn schedule_daily_digest(&self) {
        let prefs = self.inner.notifier.get_preferences().await;
        if !prefs.daily_digest {
            return;
        }
        let Some(next) = next_daily_occurrence(&Local::now(), self.inner.config.daily_digest_hour)
        else {
            warn!(hour = self.inner.config.daily_digest_hour, "invalid digest hour");
            return;
        };
        let reminder = ScheduledReminder::daily_digest(
            next.with_timezone(&Utc),
            prefs.deadline_reminders.channels.clone(),
        );
        Arc::clone(&self.inner).schedule(reminder, true).await;
    }

    /// Schedule the next weekly review, rolling a week forward when this
    /// week's slot has already passed. No-op when the review is disabled.
    pub async fn schedule_weekly_review(&self) {
        let prefs = self.inner.notifier.get_preferences().await;
        if !prefs.weekly_review {
            return;
        }
        let Some(next) = next_weekly_occurrence(
            &Local::now(),
            self.inner.config.weekly_review_weekday,
            self.inner.config.weekly_review_hour,
        ) else {
            warn!(
                weekday = self.inner.config.weekly_review_weekday,
                hour = self.inner.config.weekly_review_hour,
                "invalid review slot"
            );
            return;
        };
        let reminder = ScheduledReminder::weekly_review(
            next.with_timezone(&Utc),
            prefs.deadline_reminders.channels.clone(),
        );
        Arc::clone(&self.inner).schedule(reminder, true).await;
    }

    /// Startup reconciliation: re-register a timer for every reminder the
    /// store still holds as pending. Wire dates re-parse through serde.
    /// The store already owns these rows, so this path does not re-persist.
    pub async fn load_pending_reminders(&self) {
        match self.inner.api.list_reminders().await {
            Ok(reminders) => {
                let mut count = 0usize;
                for reminder in reminders {
                    if reminder.status == ReminderStatus::Pending {
                        count += 1;
                        Arc::clone(&self.inner).schedule(reminder, false).await;
                    }
                }
                info!(count, "reloaded pending reminders");
            }
            Err(e) => warn!(error = %e, "pending reminder reload failed"),
        }
    }

    /// Abort every live timer. Used on daemon shutdown.
    pub fn shutdown(&self) {
        let mut timers = self.inner.timers();
        for (_, handle) in timers.drain() {
            handle.abort();
        }
    }
}

impl SchedulerInner {
    fn timers(&self) -> MutexGuard<'_, HashMap<String, JoinHandle<()>>> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Immediate-or-timer entry point. `persist` is false on the startup
    /// reload path, where the store already holds the row.
    async fn schedule(self: Arc<Self>, reminder: ScheduledReminder, persist: bool) {
        if reminder.reminder_date <= Utc::now() {
            self.send(reminder).await;
            return;
        }
        Arc::clone(&self).install_timer(reminder.clone());
        if persist {
            if let Err(e) = self.api.create_reminder(&reminder).await {
                warn!(reminder = %reminder.id, error = %e, "reminder persist failed");
            }
        }
    }

    /// Install the in-memory timer for a future reminder, aborting any
    /// prior timer for the same id first. The map guard is held from the
    /// abort through the insert, so two timers can never coexist for one
    /// id and the spawned task (whose first step is removing its own map
    /// entry) cannot run until its handle has been recorded.
    fn install_timer(self: Arc<Self>, reminder: ScheduledReminder) {
        let delay = (reminder.reminder_date - Utc::now())
            .to_std()
            .unwrap_or_default();
        let id = reminder.id.clone();

        let mut timers = self.timers();
        if let Some(old) = timers.remove(&id) {
            old.abort();
        }
        let inner = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            inner.send(reminder).await;
        });
        timers.insert(id, handle);
    }

    /// Deliver one reminder through its configured channels.
    async fn send(self: Arc<Self>, mut reminder: ScheduledReminder) {
        self.timers().remove(&reminder.id);

        // Quiet hours are checked against *current* preferences, not the
        // snapshot taken at schedule time.
        let prefs = self.notifier.get_preferences().await;
        if prefs.quiet_hours.enabled && prefs.quiet_hours.contains(Local::now().time()) {
            if let Some(resume) = quiet_hours_resume_at(&prefs.quiet_hours, &Local::now()) {
                debug!(
                    reminder = %reminder.id,
                    resume = %resume,
                    "inside quiet hours, deferring"
                );
                reminder.reminder_date = resume.with_timezone(&Utc);
                Arc::clone(&self).install_timer(reminder);
                return;
            }
            warn!(
                reminder = %reminder.id,
                end = %prefs.quiet_hours.end,
                "unparseable quiet hours end, delivering anyway"
            );
        }

        let (title, body) = reminder.notification_text(Utc::now());
        for channel in &reminder.channels {
            match channel {
                Channel::Browser => {
                    self.notifier.show_notification(
                        &title,
                        &NotificationOptions {
                            body: body.clone(),
                            sound: prefs.deadline_reminders.sound,
                            vibrate: prefs.deadline_reminders.vibrate,
                        },
                    );
                }
                Channel::Push => {
                    if let Err(e) = self.api.send_push(&title, &body, reminder.push_data()).await
                    {
                        warn!(reminder = %reminder.id, error = %e, "push delivery failed");
                    }
                }
                Channel::Email => {
                    if let Err(e) = self.api.send_email(&title, &body, &reminder).await {
                        warn!(reminder = %reminder.id, error = %e, "email delivery failed");
                    }
                }
            }
        }

        // Attempted once, done: marked sent even when individual channels
        // failed above.
        if let Err(e) = self
            .api
            .update_reminder_status(&reminder.id, ReminderStatus::Sent)
            .await
        {
            warn!(reminder = %reminder.id, error = %e, "status update failed");
        }
    }
}

/// Next wall-clock occurrence of `hour:00`, rolling one day forward when
/// today's slot has already passed.
pub(crate) fn next_daily_occurrence<Tz: TimeZone>(
    now: &DateTime<Tz>,
    hour: u32,
) -> Option<DateTime<Tz>> {
    let mut candidate = now.date_naive().and_hms_opt(hour, 0, 0)?;
    if candidate <= now.naive_local() {
        candidate += chrono::Duration::days(1);
    }
    candidate.and_local_timezone(now.timezone()).earliest()
}

/// Next occurrence of `weekday hour:00` (weekday 0 = Monday), rolling one
/// week forward when this week's slot has already passed.
pub(crate) fn next_weekly_occurrence<Tz: TimeZone>(
    now: &DateTime<Tz>,
    weekday: u8,
    hour: u32,
) -> Option<DateTime<Tz>> {
    let days_ahead =
        (i64::from(weekday) - i64::from(now.weekday().num_days_from_monday() as u8)).rem_euclid(7);
    let mut candidate =
        (now.date_naive() + chrono::Duration::days(days_ahead)).and_hms_opt(hour, 0, 0)?;
    if candidate <= now.naive_local() {
        candidate += chrono::Duration::days(7);
    }
    candidate.and_local_timezone(now.timezone()).earliest()
}

/// First instant after `now` at which the quiet window ends: today's end
/// time, or tomorrow's when today's has already passed.
fn quiet_hours_resume_at<Tz: TimeZone>(
    quiet: &QuietHours,
    now: &DateTime<Tz>,
) -> Option<DateTime<Tz>> {
    let end = quiet.end_time()?;
    let mut candidate = now.date_naive().and_time(end);
    if candidate <= now.naive_local() {
        candidate += chrono::Duration::days(1);
    }
    candidate.and_local_timezone(now.timezone()).earliest()
}
