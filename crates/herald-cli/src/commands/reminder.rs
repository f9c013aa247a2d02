//! Reminder subcommand.
//!
//! Scheduling here persists reminders through the backend; the daemon
//! picks them up from there, so timers created by a one-shot CLI
//! invocation do not need to outlive the process.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use clap::Subcommand;

use herald_core::{
    ConsoleSurface, HeraldConfig, NotificationManager, ReminderScheduler, ReminderStatus, Task,
};

use super::{api_client, runtime, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// Schedule deadline reminders for a task
    Schedule {
        /// Task id
        task_id: String,
        /// Task title, used in notification text
        title: String,
        /// Due date, RFC 3339 (e.g. 2026-09-01T17:00:00Z)
        due: DateTime<Utc>,
    },
    /// Cancel all reminders for a task
    Cancel {
        /// Task id
        task_id: String,
    },
    /// List reminders held by the backend
    List {
        /// Only show pending reminders
        #[arg(long)]
        pending: bool,
    },
}

pub fn run(action: ReminderAction) -> CliResult {
    runtime()?.block_on(run_action(action))
}

async fn run_action(action: ReminderAction) -> CliResult {
    let config = HeraldConfig::load_or_default();
    let api = api_client(&config, None);

    match action {
        ReminderAction::Schedule {
            task_id,
            title,
            due,
        } => {
            let notifier = Arc::new(NotificationManager::new(
                Arc::new(ConsoleSurface::new()),
                Arc::clone(&api),
                config.push.server_key.clone(),
            ));
            let scheduler =
                ReminderScheduler::with_config(api, notifier, config.scheduler_config());
            let task = Task {
                id: task_id,
                title,
                due_date: Some(due),
                completed: false,
            };
            scheduler.schedule_task_reminders(&task).await;
            println!("scheduled {} reminders", scheduler.pending_timer_count());
        }
        ReminderAction::Cancel { task_id } => {
            api.delete_reminder(&task_id).await?;
            println!("cancelled reminders for {task_id}");
        }
        ReminderAction::List { pending } => {
            let mut reminders = api.list_reminders().await?;
            if pending {
                reminders.retain(|r| r.status == ReminderStatus::Pending);
            }
            let json = serde_json::to_string_pretty(&reminders)?;
            println!("{json}");
        }
    }
    Ok(())
}
