use std::time::Duration;

use clap::Args;
use serde_json::json;

use nightshift_core::{BedtimeChecker, BedtimeDeps, Config, HttpProbe, LogNotifier, SystemClock};

use crate::common::{open_db, print_json, CliResult};

#[derive(Args)]
pub struct CheckArgs {
    /// After a positive check, keep firing escalating reminders while
    /// still connected and inside the window
    #[arg(long)]
    pub remind: bool,
    /// Deadline for the reminder loop, in minutes
    #[arg(long, default_value = "60")]
    pub deadline_min: u64,
}

pub async fn run(args: CheckArgs) -> CliResult {
    let config = Config::load_or_default();
    let db = open_db()?;
    let clock = SystemClock;
    let probe = HttpProbe::from_config(&config)?;
    let notifier = LogNotifier;
    let checker = BedtimeChecker::new(
        &db,
        BedtimeDeps {
            clock: &clock,
            probe: &probe,
            notifier: &notifier,
        },
        config.notifications.clone(),
    );

    let bedtime = checker.run_once().await;

    let mut reminders_fired = 0;
    if bedtime && args.remind {
        reminders_fired = checker
            .run_reminder_loop(
                Duration::from_secs(config.bedtime.reminder_cadence_min * 60),
                Duration::from_secs(args.deadline_min * 60),
            )
            .await;
    }

    print_json(&json!({
        "bedtime": bedtime,
        "reminders_fired": reminders_fired,
    }))
}
