use clap::Subcommand;
use nightshift_core::{BlockerService, NullBridge, SystemClock};

use crate::common::{open_db, print_json, CliResult};

#[derive(Subcommand)]
pub enum SnoozeAction {
    /// Suspend one schedule's shield for a while
    Start {
        /// Schedule id
        id: String,
        #[arg(long, default_value = "30")]
        minutes: u32,
    },
    /// End the break early and re-arm the schedule
    End,
    /// Show the countdown (re-read from the store)
    Status,
}

pub async fn run(action: SnoozeAction) -> CliResult {
    let db = open_db()?;
    let bridge = NullBridge;
    let clock = SystemClock;
    let service = BlockerService::new(&db, &bridge, &clock);

    match action {
        SnoozeAction::Start { id, minutes } => {
            let state = service.snooze(&id, minutes).await?;
            print_json(&state)?;
        }
        SnoozeAction::End => match service.end_snooze().await? {
            Some(state) => print_json(&state)?,
            None => println!("no snooze active"),
        },
        SnoozeAction::Status => {
            // Clears an expired countdown before reporting, the same way
            // the app does on foreground.
            service.tick_snooze().await?;
            match service.snooze_status()? {
                Some(status) => print_json(&status)?,
                None => println!("no snooze active"),
            }
        }
    }

    Ok(())
}
