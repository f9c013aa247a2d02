//! Daemon subcommand.
//!
//! Owns the scheduler for the life of the process: rebuilds timers from
//! the backend at startup, keeps the digest and review slots scheduled,
//! and tears every timer down on Ctrl-C.

use std::sync::Arc;

use clap::Args;
use tracing::info;

use herald_core::{ConsoleSurface, HeraldConfig, NotificationManager, ReminderScheduler};

use super::{api_client, runtime, CliResult};

#[derive(Args)]
pub struct RunArgs {
    /// Override the backend API base URL
    #[arg(long)]
    pub api_url: Option<String>,
}

pub fn run(args: RunArgs) -> CliResult {
    runtime()?.block_on(run_daemon(args))
}

async fn run_daemon(args: RunArgs) -> CliResult {
    let config = HeraldConfig::load_or_default();
    let api = api_client(&config, args.api_url);

    let notifier = Arc::new(NotificationManager::new(
        Arc::new(ConsoleSurface::new()),
        Arc::clone(&api),
        config.push.server_key.clone(),
    ));
    notifier.setup_push_notifications().await;

    let scheduler = ReminderScheduler::with_config(api, notifier, config.scheduler_config());
    scheduler.load_pending_reminders().await;
    scheduler.schedule_daily_digest().await;
    scheduler.schedule_weekly_review().await;

    info!(
        timers = scheduler.pending_timer_count(),
        "herald daemon running, press Ctrl-C to stop"
    );
    tokio::signal::ctrl_c().await?;

    scheduler.shutdown();
    info!("herald daemon stopped");
    Ok(())
}
