use chrono::{NaiveDate, Utc};
use clap::Subcommand;
use nightshift_core::storage::NightRow;
use nightshift_core::AdherenceAnalyzer;

use crate::common::{open_db, print_json, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Bedtime adherence report across all recorded nights
    Report,
    /// Record a night event (the bedtime checker records alerts on its
    /// own; this marks the timestamps by hand)
    Record {
        /// Night date, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
        /// Mark the bedtime alert as fired now
        #[arg(long)]
        alerted: bool,
        /// Mark the device as gone quiet now
        #[arg(long)]
        quiet: bool,
    },
}

pub fn run(action: StatsAction) -> CliResult {
    let db = open_db()?;

    match action {
        StatsAction::Report => {
            let nights = db.list_nights()?;
            let report = AdherenceAnalyzer::new().analyze(&nights);
            print_json(&report)?;
        }
        StatsAction::Record {
            date,
            alerted,
            quiet,
        } => {
            if !alerted && !quiet {
                return Err("nothing to record: pass --alerted and/or --quiet".into());
            }
            let date = match date {
                Some(raw) => raw.parse::<NaiveDate>()?,
                None => Utc::now().date_naive(),
            };
            let now = Utc::now();
            let night = NightRow {
                date,
                alerted_at: alerted.then_some(now),
                quiet_at: quiet.then_some(now),
            };
            db.upsert_night(&night)?;
            let nights = db.list_nights()?;
            let recorded = nights.iter().find(|n| n.date == date);
            print_json(&serde_json::json!({
                "date": date.to_string(),
                "alerted_at": recorded.and_then(|n| n.alerted_at).map(|t| t.to_rfc3339()),
                "quiet_at": recorded.and_then(|n| n.quiet_at).map(|t| t.to_rfc3339()),
            }))?;
        }
    }

    Ok(())
}
