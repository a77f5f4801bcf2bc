//! Blocker schedules.
//!
//! A schedule ("blocker") is a user-defined time window plus the opaque
//! app/category/domain lists the native picker filled in. All schedules
//! persist as one JSON document in a versioned envelope; version 0 is
//! the bare legacy array, lifted on first read.

mod store;

pub use store::ScheduleStore;

use chrono::{DateTime, Utc, Weekday};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::window::{day_name, DaySet, TimeOfDay, TimeWindow, ALL_WEEKDAYS};

/// KV key holding the schedule envelope.
pub const SCHEDULES_KEY: &str = "app_block_schedules";

/// Current envelope version.
pub const SCHEDULES_SCHEMA_VERSION: u32 = 1;

/// One user-defined blocker.
///
/// Field aliases accept the legacy camelCase document written by older
/// builds, so the v0 migration is a pure re-shaping pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSchedule {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(alias = "startTime")]
    pub start_time: TimeOfDay,
    #[serde(alias = "endTime")]
    pub end_time: TimeOfDay,
    #[serde(alias = "daysOfWeek", default)]
    pub days: DaySet,
    #[serde(alias = "isActive", default = "default_active")]
    pub is_active: bool,
    #[serde(alias = "blockedApps", default)]
    pub blocked_apps: Vec<String>,
    #[serde(alias = "blockedCategories", default)]
    pub blocked_categories: Vec<String>,
    #[serde(alias = "blockedWebDomains", default)]
    pub blocked_web_domains: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl BlockSchedule {
    /// Create a new schedule with a fresh id.
    pub fn new(name: impl Into<String>, start: TimeOfDay, end: TimeOfDay, days: DaySet) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            start_time: start,
            end_time: end,
            days,
            is_active: true,
            blocked_apps: Vec::new(),
            blocked_categories: Vec::new(),
            blocked_web_domains: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// The configured time-of-day window.
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.start_time, self.end_time)
    }

    /// Whether this schedule should be shielding at the given moment.
    pub fn is_current(&self, day: Weekday, time: TimeOfDay) -> bool {
        self.is_active && self.days.contains(day) && self.window().contains(time)
    }
}

// ── Versioned envelope ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    schedules: Vec<BlockSchedule>,
}

/// Encode schedules into the current envelope.
pub(crate) fn encode_schedules(schedules: &[BlockSchedule]) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope {
        version: SCHEDULES_SCHEMA_VERSION,
        schedules: schedules.to_vec(),
    })
}

/// Decode a persisted document, migrating the legacy bare array if
/// necessary. Returns the schedules and whether a migration happened
/// (callers write the lifted form back).
pub(crate) fn decode_schedules(raw: &str) -> Result<(Vec<BlockSchedule>, bool), StorageError> {
    if let Ok(envelope) = serde_json::from_str::<Envelope>(raw) {
        if envelope.version > SCHEDULES_SCHEMA_VERSION {
            return Err(StorageError::Corrupt {
                key: SCHEDULES_KEY.to_string(),
                message: format!(
                    "unsupported schedule schema version {} (this build reads up to {})",
                    envelope.version, SCHEDULES_SCHEMA_VERSION
                ),
            });
        }
        return Ok((envelope.schedules, false));
    }

    // Version 0: a bare JSON array, days indexed Sunday-first.
    let items: Vec<serde_json::Value> =
        serde_json::from_str(raw).map_err(|e| StorageError::Corrupt {
            key: SCHEDULES_KEY.to_string(),
            message: e.to_string(),
        })?;

    let mut schedules: Vec<BlockSchedule> = Vec::with_capacity(items.len());
    for item in items {
        let mut schedule: BlockSchedule = match serde_json::from_value(item) {
            Ok(s) => s,
            Err(e) => {
                warn!("dropping unreadable legacy schedule: {e}");
                continue;
            }
        };
        if schedule.id.is_empty() {
            warn!("dropping legacy schedule without id");
            continue;
        }
        if schedules.iter().any(|s: &BlockSchedule| s.id == schedule.id) {
            warn!("dropping legacy schedule with duplicate id {}", schedule.id);
            continue;
        }
        // The legacy editor wrote day arrays Sunday-first.
        schedule.days = DaySet::from_sunday_first(schedule.days.as_array());
        schedules.push(schedule);
    }

    Ok((schedules, true))
}

// ── Overlap detection ────────────────────────────────────────────────

/// Two active schedules whose windows overlap on a shared day.
///
/// The intended invariant is that at most one schedule drives the shield
/// at any instant; apply stays per-schedule, but overlaps are surfaced
/// as warnings so the user can untangle them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapWarning {
    pub first_id: String,
    pub second_id: String,
    /// Day name, Monday-first ordering.
    pub day: String,
    pub overlap_min: u16,
}

/// Non-wrapping minute segments of a window within one day.
fn segments(window: TimeWindow) -> Vec<(u16, u16)> {
    if window.crosses_midnight() {
        vec![
            (window.start.minutes(), crate::window::MINUTES_PER_DAY - 1),
            (0, window.end.minutes()),
        ]
    } else {
        vec![(window.start.minutes(), window.end.minutes())]
    }
}

/// Inclusive minute overlap between two windows on the same day.
fn window_overlap_min(a: TimeWindow, b: TimeWindow) -> u16 {
    let mut total: u16 = 0;
    for (s1, e1) in segments(a) {
        for (s2, e2) in segments(b) {
            let start = s1.max(s2);
            let end = e1.min(e2);
            if start <= end {
                total += end - start + 1;
            }
        }
    }
    total
}

/// Find every pair of active schedules with overlapping windows on a
/// shared enabled day.
pub fn detect_overlaps(schedules: &[BlockSchedule]) -> Vec<OverlapWarning> {
    let mut warnings = Vec::new();
    for (i, a) in schedules.iter().enumerate() {
        if !a.is_active {
            continue;
        }
        for b in schedules.iter().skip(i + 1) {
            if !b.is_active {
                continue;
            }
            for day in ALL_WEEKDAYS {
                if !(a.days.contains(day) && b.days.contains(day)) {
                    continue;
                }
                let overlap = window_overlap_min(a.window(), b.window());
                if overlap > 0 {
                    warnings.push(OverlapWarning {
                        first_id: a.id.clone(),
                        second_id: b.id.clone(),
                        day: day_name(day).to_string(),
                        overlap_min: overlap,
                    });
                }
            }
        }
    }
    warnings
}
