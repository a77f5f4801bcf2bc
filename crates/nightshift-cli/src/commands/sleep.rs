use clap::Subcommand;
use nightshift_core::window::{parse_day, parse_day_set};
use nightshift_core::{SleepStore, TimeOfDay};

use crate::common::{open_db, print_json, CliResult};

#[derive(Subcommand)]
pub enum SleepAction {
    /// Print the sleep settings as JSON
    Show,
    /// Set bed and wake times, for one day or for all days
    Set {
        /// Bed time, HH:MM
        #[arg(long)]
        bed: String,
        /// Wake time, HH:MM
        #[arg(long)]
        wake: String,
        /// Day name; omit to set every day
        #[arg(long)]
        day: Option<String>,
    },
    /// Turn bedtime checking on
    Enable,
    /// Turn bedtime checking off
    Disable,
    /// Select which days the sleep window applies to
    Days {
        /// Comma-separated day names
        days: String,
    },
}

pub fn run(action: SleepAction) -> CliResult {
    let db = open_db()?;
    let store = SleepStore::new(&db);
    let mut settings = store.load()?;

    match action {
        SleepAction::Show => {
            print_json(&settings)?;
            return Ok(());
        }
        SleepAction::Set { bed, wake, day } => {
            let bed = bed.parse::<TimeOfDay>()?;
            let wake = wake.parse::<TimeOfDay>()?;
            match day {
                Some(day) => settings.set_times(parse_day(&day)?, bed, wake),
                None => settings.set_all_times(bed, wake),
            }
        }
        SleepAction::Enable => settings.enabled = true,
        SleepAction::Disable => settings.enabled = false,
        SleepAction::Days { days } => settings.enabled_days = parse_day_set(&days)?,
    }

    store.save(&settings)?;
    print_json(&settings)
}
