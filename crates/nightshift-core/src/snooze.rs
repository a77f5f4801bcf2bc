//! Snooze override state.
//!
//! A snooze is a time-boxed suspension of one schedule's shield. The
//! original product spread this across three loose keys
//! (`appBlockDisabledUntil`, `snoozeEndTime`, `snoozedScheduleId`);
//! here it is one record so the pieces cannot drift apart. Countdown
//! consumers re-read the store on every query, so a process restart
//! mid-snooze changes nothing.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::storage::Database;

/// KV key holding the snooze record.
pub const SNOOZE_KEY: &str = "snooze_state";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnoozeState {
    pub schedule_id: String,
    pub started_at: DateTime<Utc>,
    pub until: DateTime<Utc>,
    /// Set when the user ended the break early.
    #[serde(default)]
    pub ended_manually: bool,
}

impl SnoozeState {
    /// Whether the override is still suppressing the shield.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        !self.ended_manually && now < self.until
    }

    /// Time left on the countdown (zero once expired or ended).
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        if self.is_live(now) {
            self.until - now
        } else {
            Duration::zero()
        }
    }
}

/// Reads and writes the snooze record under [`SNOOZE_KEY`].
pub struct SnoozeStore<'a> {
    db: &'a Database,
}

impl<'a> SnoozeStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn get(&self) -> Result<Option<SnoozeState>, CoreError> {
        let Some(raw) = self.db.kv_get(SNOOZE_KEY)? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    pub fn set(&self, state: &SnoozeState) -> Result<(), CoreError> {
        let raw = serde_json::to_string(state)?;
        self.db.kv_set(SNOOZE_KEY, &raw)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), CoreError> {
        self.db.kv_delete(SNOOZE_KEY)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(until_in_min: i64) -> SnoozeState {
        let now = Utc::now();
        SnoozeState {
            schedule_id: "s1".into(),
            started_at: now,
            until: now + Duration::minutes(until_in_min),
            ended_manually: false,
        }
    }

    #[test]
    fn live_until_expiry() {
        let s = state(30);
        let now = Utc::now();
        assert!(s.is_live(now));
        assert!(!s.is_live(s.until));
        assert!(!s.is_live(s.until + Duration::seconds(1)));
    }

    #[test]
    fn manual_end_kills_the_override() {
        let mut s = state(30);
        s.ended_manually = true;
        assert!(!s.is_live(Utc::now()));
        assert_eq!(s.remaining(Utc::now()), Duration::zero());
    }

    #[test]
    fn store_roundtrip() {
        let db = Database::open_memory().unwrap();
        let store = SnoozeStore::new(&db);
        assert!(store.get().unwrap().is_none());

        let s = state(15);
        store.set(&s).unwrap();
        assert_eq!(store.get().unwrap(), Some(s));

        store.clear().unwrap();
        assert!(store.get().unwrap().is_none());
    }
}
