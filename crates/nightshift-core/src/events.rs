use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Every state change in the system produces an Event.
/// Events are appended to the database journal; the CLI prints them as
/// JSON so callers can follow what a command actually did.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    ScheduleSaved {
        schedule_id: String,
        name: String,
        /// True when the save replaced an existing record.
        replaced: bool,
        at: DateTime<Utc>,
    },
    ScheduleDeleted {
        schedule_id: String,
        at: DateTime<Utc>,
    },
    SchedulePaused {
        schedule_id: String,
        at: DateTime<Utc>,
    },
    ScheduleResumed {
        schedule_id: String,
        at: DateTime<Utc>,
    },
    ShieldsApplied {
        schedule_id: String,
        ends_at: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    ShieldsRemoved {
        at: DateTime<Utc>,
    },
    SnoozeStarted {
        schedule_id: String,
        until: DateTime<Utc>,
        at: DateTime<Utc>,
    },
    SnoozeEnded {
        schedule_id: String,
        /// False when the snooze expired on its own.
        manual: bool,
        at: DateTime<Utc>,
    },
    BedtimeDetected {
        at: DateTime<Utc>,
    },
    ReminderFired {
        /// Escalation level, 0-3.
        level: u8,
        at: DateTime<Utc>,
    },
}

impl Event {
    /// Timestamp of the event, whichever variant it is.
    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Event::ScheduleSaved { at, .. }
            | Event::ScheduleDeleted { at, .. }
            | Event::SchedulePaused { at, .. }
            | Event::ScheduleResumed { at, .. }
            | Event::ShieldsApplied { at, .. }
            | Event::ShieldsRemoved { at }
            | Event::SnoozeStarted { at, .. }
            | Event::SnoozeEnded { at, .. }
            | Event::BedtimeDetected { at }
            | Event::ReminderFired { at, .. } => *at,
        }
    }
}
