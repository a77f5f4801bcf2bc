use chrono::{NaiveDate, Utc};
use clap::{Subcommand, ValueEnum};
use nightshift_core::{AdherenceStatus, StreakCalculator, StreakStore};

use crate::common::{open_db, print_json, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum NightOutcome {
    OnTime,
    Late,
    Missed,
}

impl From<NightOutcome> for AdherenceStatus {
    fn from(outcome: NightOutcome) -> Self {
        match outcome {
            NightOutcome::OnTime => AdherenceStatus::OnTime,
            NightOutcome::Late => AdherenceStatus::Late,
            NightOutcome::Missed => AdherenceStatus::Missed,
        }
    }
}

#[derive(Subcommand)]
pub enum StreakAction {
    /// Print the current streak
    Show,
    /// Fold one night's outcome into the streak
    Record {
        #[arg(value_enum)]
        outcome: NightOutcome,
        /// Night date, YYYY-MM-DD (defaults to today); the same date is
        /// never counted twice
        #[arg(long)]
        date: Option<String>,
    },
}

pub fn run(action: StreakAction) -> CliResult {
    let db = open_db()?;
    let store = StreakStore::new(&db);

    match action {
        StreakAction::Show => {
            print_json(&store.load()?)?;
        }
        StreakAction::Record { outcome, date } => {
            let date = match date {
                Some(raw) => raw.parse::<NaiveDate>()?,
                None => Utc::now().date_naive(),
            };
            let state = StreakCalculator::new().apply(store.load()?, outcome.into(), date);
            store.save(&state)?;
            print_json(&state)?;
        }
    }

    Ok(())
}
