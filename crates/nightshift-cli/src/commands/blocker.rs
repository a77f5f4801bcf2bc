use clap::Subcommand;
use nightshift_core::window::parse_day_set;
use nightshift_core::{
    detect_overlaps, BlockSchedule, BlockerService, NullBridge, ScheduleStore, SystemClock,
    TimeOfDay,
};

use crate::common::{open_db, print_json, CliResult};

#[derive(Subcommand)]
pub enum BlockerAction {
    /// List all schedules as JSON
    List,
    /// Create and arm a new schedule
    Add {
        /// Display name
        name: String,
        /// Window start, HH:MM
        #[arg(long)]
        start: String,
        /// Window end, HH:MM
        #[arg(long)]
        end: String,
        /// Comma-separated day names
        #[arg(long, default_value = "mon,tue,wed,thu,fri,sat,sun")]
        days: String,
        /// App identifier to block (repeatable)
        #[arg(long = "app")]
        apps: Vec<String>,
        /// Category identifier to block (repeatable)
        #[arg(long = "category")]
        categories: Vec<String>,
        /// Web domain to block (repeatable)
        #[arg(long = "domain")]
        domains: Vec<String>,
    },
    /// Edit an existing schedule (tears down, rebuilds, re-arms)
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        /// Window start, HH:MM
        #[arg(long)]
        start: Option<String>,
        /// Window end, HH:MM
        #[arg(long)]
        end: Option<String>,
        /// Comma-separated day names
        #[arg(long)]
        days: Option<String>,
    },
    /// Delete a schedule
    Remove { id: String },
    /// Take a break for today: deactivate until resumed
    Pause { id: String },
    /// Re-activate a paused schedule
    Resume { id: String },
    /// Re-evaluate all schedules against "now"
    Poll,
    /// Report overlapping active schedules
    Overlaps,
}

pub async fn run(action: BlockerAction) -> CliResult {
    let db = open_db()?;
    let bridge = NullBridge;
    let clock = SystemClock;
    let service = BlockerService::new(&db, &bridge, &clock);

    match action {
        BlockerAction::List => {
            let schedules = ScheduleStore::new(&db).list()?;
            print_json(&schedules)?;
        }
        BlockerAction::Add {
            name,
            start,
            end,
            days,
            apps,
            categories,
            domains,
        } => {
            let mut schedule = BlockSchedule::new(
                name,
                start.parse::<TimeOfDay>()?,
                end.parse::<TimeOfDay>()?,
                parse_day_set(&days)?,
            );
            schedule.blocked_apps = apps;
            schedule.blocked_categories = categories;
            schedule.blocked_web_domains = domains;

            let outcome = service.save_schedule(schedule).await?;
            for warning in &outcome.overlaps {
                eprintln!(
                    "warning: overlaps schedule {} on {} ({} min)",
                    warning.first_id, warning.day, warning.overlap_min
                );
            }
            print_json(&outcome)?;
        }
        BlockerAction::Edit {
            id,
            name,
            start,
            end,
            days,
        } => {
            let mut schedule = ScheduleStore::new(&db)
                .find(&id)?
                .ok_or_else(|| format!("no schedule with id '{id}'"))?;
            if let Some(name) = name {
                schedule.name = name;
            }
            if let Some(start) = start {
                schedule.start_time = start.parse::<TimeOfDay>()?;
            }
            if let Some(end) = end {
                schedule.end_time = end.parse::<TimeOfDay>()?;
            }
            if let Some(days) = days {
                schedule.days = parse_day_set(&days)?;
            }
            let outcome = service.save_schedule(schedule).await?;
            print_json(&outcome)?;
        }
        BlockerAction::Remove { id } => {
            let removed = service.delete_schedule(&id).await?;
            print_json(&removed)?;
        }
        BlockerAction::Pause { id } => {
            let schedule = service.pause_schedule(&id).await?;
            print_json(&schedule)?;
        }
        BlockerAction::Resume { id } => {
            let schedule = service.resume_schedule(&id).await?;
            print_json(&schedule)?;
        }
        BlockerAction::Poll => {
            let applied = service.poll().await;
            print_json(&applied)?;
        }
        BlockerAction::Overlaps => {
            let warnings = detect_overlaps(&ScheduleStore::new(&db).list()?);
            print_json(&warnings)?;
        }
    }

    Ok(())
}
