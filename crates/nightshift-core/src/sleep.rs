//! Sleep-time settings.
//!
//! A single record of per-day bed/wake pairs, read by the bedtime
//! checker. Deliberately independent of the blocker schedules -- the
//! two are parallel concepts sharing only the window evaluator.

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, StorageError};
use crate::storage::Database;
use crate::window::{DaySet, TimeOfDay, TimeWindow};
use chrono::Weekday;

/// KV key holding the sleep settings envelope.
pub const SLEEP_SETTINGS_KEY: &str = "sleep_settings";

/// Current envelope version.
pub const SLEEP_SCHEMA_VERSION: u32 = 1;

/// One day's bed and wake times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySleepTimes {
    #[serde(alias = "bedTime")]
    pub bed: TimeOfDay,
    #[serde(alias = "wakeTime")]
    pub wake: TimeOfDay,
}

impl DaySleepTimes {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.bed, self.wake)
    }
}

fn default_times() -> [DaySleepTimes; 7] {
    let bed = TimeOfDay::from_hm(22, 0).unwrap_or(TimeOfDay::MIDNIGHT);
    let wake = TimeOfDay::from_hm(7, 0).unwrap_or(TimeOfDay::MIDNIGHT);
    [DaySleepTimes { bed, wake }; 7]
}

/// The singular sleep-time settings record.
///
/// `times` and `enabled_days` are indexed Monday-first, like every
/// `DaySet` in this crate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SleepSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(alias = "perDay", default = "default_times")]
    pub times: [DaySleepTimes; 7],
    #[serde(alias = "enabledDays", default)]
    pub enabled_days: DaySet,
}

impl Default for SleepSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            times: default_times(),
            enabled_days: DaySet::ALL,
        }
    }
}

impl SleepSettings {
    pub fn is_day_enabled(&self, day: Weekday) -> bool {
        self.enabled_days.contains(day)
    }

    /// The sleep window configured for the given day.
    pub fn window_for(&self, day: Weekday) -> TimeWindow {
        self.times[day.num_days_from_monday() as usize].window()
    }

    pub fn set_times(&mut self, day: Weekday, bed: TimeOfDay, wake: TimeOfDay) {
        self.times[day.num_days_from_monday() as usize] = DaySleepTimes { bed, wake };
    }

    pub fn set_all_times(&mut self, bed: TimeOfDay, wake: TimeOfDay) {
        self.times = [DaySleepTimes { bed, wake }; 7];
    }
}

// ── Versioned envelope ───────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    version: u32,
    settings: SleepSettings,
}

fn encode(settings: &SleepSettings) -> Result<String, serde_json::Error> {
    serde_json::to_string(&Envelope {
        version: SLEEP_SCHEMA_VERSION,
        settings: settings.clone(),
    })
}

fn decode(raw: &str) -> Result<(SleepSettings, bool), StorageError> {
    if let Ok(envelope) = serde_json::from_str::<Envelope>(raw) {
        if envelope.version > SLEEP_SCHEMA_VERSION {
            return Err(StorageError::Corrupt {
                key: SLEEP_SETTINGS_KEY.to_string(),
                message: format!(
                    "unsupported sleep settings version {} (this build reads up to {})",
                    envelope.version, SLEEP_SCHEMA_VERSION
                ),
            });
        }
        return Ok((envelope.settings, false));
    }

    // Version 0: the bare record, day arrays Sunday-first.
    let mut settings: SleepSettings =
        serde_json::from_str(raw).map_err(|e| StorageError::Corrupt {
            key: SLEEP_SETTINGS_KEY.to_string(),
            message: e.to_string(),
        })?;
    settings.enabled_days = DaySet::from_sunday_first(settings.enabled_days.as_array());
    let t = settings.times;
    settings.times = [t[1], t[2], t[3], t[4], t[5], t[6], t[0]];
    Ok((settings, true))
}

/// Reads and writes the settings envelope under [`SLEEP_SETTINGS_KEY`].
pub struct SleepStore<'a> {
    db: &'a Database,
}

impl<'a> SleepStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Load settings, defaulting when absent. A legacy document is
    /// migrated and written back before returning.
    pub fn load(&self) -> Result<SleepSettings, CoreError> {
        let Some(raw) = self.db.kv_get(SLEEP_SETTINGS_KEY)? else {
            return Ok(SleepSettings::default());
        };
        let (settings, migrated) = decode(&raw)?;
        if migrated {
            info!("migrated legacy sleep settings document");
            self.save(&settings)?;
        }
        Ok(settings)
    }

    pub fn save(&self, settings: &SleepSettings) -> Result<(), CoreError> {
        let raw = encode(settings)?;
        self.db.kv_set(SLEEP_SETTINGS_KEY, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tod(s: &str) -> TimeOfDay {
        s.parse().unwrap()
    }

    #[test]
    fn defaults_are_disabled_with_ten_to_seven() {
        let settings = SleepSettings::default();
        assert!(!settings.enabled);
        let window = settings.window_for(Weekday::Wed);
        assert_eq!(window.start, tod("22:00"));
        assert_eq!(window.end, tod("07:00"));
        assert!(settings.is_day_enabled(Weekday::Sun));
    }

    #[test]
    fn per_day_times_override() {
        let mut settings = SleepSettings::default();
        settings.set_times(Weekday::Fri, tod("23:30"), tod("08:00"));
        assert_eq!(settings.window_for(Weekday::Fri).start, tod("23:30"));
        assert_eq!(settings.window_for(Weekday::Thu).start, tod("22:00"));
    }

    #[test]
    fn store_roundtrip() {
        let db = Database::open_memory().unwrap();
        let store = SleepStore::new(&db);

        assert_eq!(store.load().unwrap(), SleepSettings::default());

        let mut settings = SleepSettings::default();
        settings.enabled = true;
        settings.set_all_times(tod("23:00"), tod("06:45"));
        store.save(&settings).unwrap();

        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn legacy_document_is_rotated_and_written_back() {
        let db = Database::open_memory().unwrap();
        // Sunday-first: only index 0 (Sunday) enabled; Sunday has the
        // late window.
        let legacy = r#"{
            "enabled": true,
            "enabledDays": [true, false, false, false, false, false, false],
            "perDay": [
                {"bedTime": "23:59", "wakeTime": "08:00"},
                {"bedTime": "22:00", "wakeTime": "07:00"},
                {"bedTime": "22:00", "wakeTime": "07:00"},
                {"bedTime": "22:00", "wakeTime": "07:00"},
                {"bedTime": "22:00", "wakeTime": "07:00"},
                {"bedTime": "22:00", "wakeTime": "07:00"},
                {"bedTime": "22:00", "wakeTime": "07:00"}
            ]
        }"#;
        db.kv_set(SLEEP_SETTINGS_KEY, legacy).unwrap();

        let store = SleepStore::new(&db);
        let settings = store.load().unwrap();
        assert!(settings.is_day_enabled(Weekday::Sun));
        assert!(!settings.is_day_enabled(Weekday::Mon));
        assert_eq!(settings.window_for(Weekday::Sun).start, tod("23:59"));
        assert_eq!(settings.window_for(Weekday::Mon).start, tod("22:00"));

        let raw = db.kv_get(SLEEP_SETTINGS_KEY).unwrap().unwrap();
        assert!(raw.contains("\"version\":1"));
    }

    #[test]
    fn future_version_is_rejected() {
        let db = Database::open_memory().unwrap();
        db.kv_set(SLEEP_SETTINGS_KEY, r#"{"version": 9, "settings": {}}"#)
            .unwrap();
        assert!(SleepStore::new(&db).load().is_err());
    }
}
