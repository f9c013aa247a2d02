//! Notification preference subcommand.
//!
//! Preferences live in the backend, not in local config; every action
//! here is a read-modify-write over the preferences endpoint.

use clap::Subcommand;

use herald_core::{HeraldConfig, QuietHours};

use super::{api_client, runtime, CliResult};

#[derive(Subcommand)]
pub enum PrefsAction {
    /// Show current notification preferences
    Show,
    /// Replace the deadline reminder intervals (minutes before due)
    Intervals {
        /// Intervals in minutes, e.g. 1440 120 30
        #[arg(required = true)]
        minutes: Vec<i64>,
    },
    /// Enable quiet hours for a daily window
    Quiet {
        /// Window start, HH:MM
        start: String,
        /// Window end, HH:MM (may wrap past midnight)
        end: String,
    },
    /// Disable quiet hours
    QuietOff,
    /// Enable or disable a feature (deadline, digest, review)
    Set {
        /// Feature name
        feature: String,
        /// true or false
        enabled: bool,
    },
}

pub fn run(action: PrefsAction) -> CliResult {
    runtime()?.block_on(run_action(action))
}

async fn run_action(action: PrefsAction) -> CliResult {
    let config = HeraldConfig::load_or_default();
    let api = api_client(&config, None);

    match action {
        PrefsAction::Show => {
            let prefs = api.get_preferences().await?;
            let json = serde_json::to_string_pretty(&prefs)?;
            println!("{json}");
        }
        PrefsAction::Intervals { minutes } => {
            let mut prefs = api.get_preferences().await?;
            prefs.deadline_reminders.intervals = minutes;
            api.put_preferences(&prefs).await?;
            println!("ok");
        }
        PrefsAction::Quiet { start, end } => {
            let quiet = QuietHours {
                enabled: true,
                start,
                end,
            };
            quiet.validate()?;
            let mut prefs = api.get_preferences().await?;
            prefs.quiet_hours = quiet;
            api.put_preferences(&prefs).await?;
            println!("ok");
        }
        PrefsAction::QuietOff => {
            let mut prefs = api.get_preferences().await?;
            prefs.quiet_hours.enabled = false;
            api.put_preferences(&prefs).await?;
            println!("ok");
        }
        PrefsAction::Set { feature, enabled } => {
            let mut prefs = api.get_preferences().await?;
            match feature.as_str() {
                "deadline" => prefs.deadline_reminders.enabled = enabled,
                "digest" => prefs.daily_digest = enabled,
                "review" => prefs.weekly_review = enabled,
                other => {
                    return Err(format!(
                        "unknown feature: {other}. Valid features: deadline, digest, review"
                    )
                    .into());
                }
            }
            api.put_preferences(&prefs).await?;
            println!("ok");
        }
    }
    Ok(())
}
