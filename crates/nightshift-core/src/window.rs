//! Time-of-day window evaluation.
//!
//! The single implementation of the "is `now` inside the configured
//! window" question, shared by the bedtime checker and the blocker
//! poller. Windows are wall-clock times of day; a window whose end is
//! earlier than its start crosses midnight.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Local, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Minutes in a day; all `TimeOfDay` values are below this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A wall-clock time of day, stored as minutes since midnight.
///
/// Serializes as the integer minute count. Deserializes from either the
/// integer form or a legacy `"HH:MM"` string, so records written by
/// older builds decode without a separate fixup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(into = "u16")]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub const MIDNIGHT: TimeOfDay = TimeOfDay(0);

    /// Build from minutes since midnight.
    pub fn from_minutes(minutes: u16) -> Result<Self, ValidationError> {
        if minutes < MINUTES_PER_DAY {
            Ok(Self(minutes))
        } else {
            Err(ValidationError::InvalidTimeOfDay(u32::from(minutes)))
        }
    }

    /// Build from hour and minute components.
    pub fn from_hm(hour: u16, minute: u16) -> Result<Self, ValidationError> {
        if hour >= 24 || minute >= 60 {
            return Err(ValidationError::InvalidTimeOfDay(
                u32::from(hour) * 60 + u32::from(minute),
            ));
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    pub fn to_naive_time(self) -> NaiveTime {
        // Components are in range by construction.
        NaiveTime::from_hms_opt(u32::from(self.hour()), u32::from(self.minute()), 0)
            .unwrap_or(NaiveTime::MIN)
    }
}

impl From<TimeOfDay> for u16 {
    fn from(t: TimeOfDay) -> u16 {
        t.0
    }
}

impl From<NaiveTime> for TimeOfDay {
    fn from(t: NaiveTime) -> Self {
        Self((t.hour() * 60 + t.minute()) as u16)
    }
}

impl FromStr for TimeOfDay {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidTimeString(s.to_string());
        let (h, m) = s.split_once(':').ok_or_else(invalid)?;
        let hour: u16 = h.trim().parse().map_err(|_| invalid())?;
        let minute: u16 = m.trim().parse().map_err(|_| invalid())?;
        Self::from_hm(hour, minute).map_err(|_| invalid())
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Minutes(u16),
            Clock(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Minutes(m) => TimeOfDay::from_minutes(m).map_err(serde::de::Error::custom),
            Raw::Clock(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

/// A time-of-day window, possibly crossing midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeWindow {
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { start, end }
    }

    /// Whether this window wraps past midnight.
    pub fn crosses_midnight(&self) -> bool {
        self.end < self.start
    }

    /// Whether `current` falls inside the window (both ends inclusive).
    ///
    /// `start == end` is a zero-length window containing exactly that
    /// minute; it falls out of the non-wrapping branch rather than being
    /// special-cased.
    pub fn contains(&self, current: TimeOfDay) -> bool {
        let (start, end, cur) = (self.start.0, self.end.0, current.0);
        if end < start {
            cur >= start || cur <= end
        } else {
            cur >= start && cur <= end
        }
    }

    /// Window length in minutes (0 for the degenerate `start == end`).
    pub fn duration_min(&self) -> u16 {
        (self.end.0 + MINUTES_PER_DAY - self.start.0) % MINUTES_PER_DAY
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// A days-of-week selection, indexed Monday = 0.
///
/// Every consumer converts through `Weekday::num_days_from_monday`, so
/// no second index convention can creep in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaySet([bool; 7]);

impl DaySet {
    pub const ALL: DaySet = DaySet([true; 7]);
    pub const NONE: DaySet = DaySet([false; 7]);
    pub const WEEKDAYS: DaySet = DaySet([true, true, true, true, true, false, false]);

    pub fn new(days: [bool; 7]) -> Self {
        Self(days)
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0[day.num_days_from_monday() as usize]
    }

    pub fn set(&mut self, day: Weekday, enabled: bool) {
        self.0[day.num_days_from_monday() as usize] = enabled;
    }

    pub fn is_empty(&self) -> bool {
        !self.0.iter().any(|&d| d)
    }

    pub fn days(&self) -> Vec<Weekday> {
        ALL_WEEKDAYS
            .iter()
            .copied()
            .filter(|d| self.contains(*d))
            .collect()
    }

    pub fn as_array(&self) -> [bool; 7] {
        self.0
    }

    /// Rotate a legacy Sunday-first array into Monday-first order.
    pub fn from_sunday_first(days: [bool; 7]) -> Self {
        Self([
            days[1], days[2], days[3], days[4], days[5], days[6], days[0],
        ])
    }
}

impl Default for DaySet {
    fn default() -> Self {
        Self::ALL
    }
}

/// Monday-first weekday order, matching `DaySet` indexing.
pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Parse a day name ("mon", "monday", ...) into a `Weekday`.
pub fn parse_day(name: &str) -> Result<Weekday, ValidationError> {
    match name.trim().to_ascii_lowercase().as_str() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        other => Err(ValidationError::UnknownDay(other.to_string())),
    }
}

/// Lowercase full name of a weekday.
pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// Parse a comma-separated day list ("mon,wed,fri") into a `DaySet`.
pub fn parse_day_set(list: &str) -> Result<DaySet, ValidationError> {
    let mut set = DaySet::NONE;
    for part in list.split(',').filter(|p| !p.trim().is_empty()) {
        set.set(parse_day(part)?, true);
    }
    Ok(set)
}

/// Split a local timestamp into the (weekday, time-of-day) pair the
/// evaluators consume.
pub fn wall_clock(now: &DateTime<Local>) -> (Weekday, TimeOfDay) {
    let tod = TimeOfDay((now.hour() * 60 + now.minute()) as u16);
    (now.weekday(), tod)
}
