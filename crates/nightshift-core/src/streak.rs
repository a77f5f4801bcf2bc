//! Sleep streak with weighted decay.
//!
//! Consecutive on-time nights grow the streak; a late night applies a
//! fractional decay and a missed night a heavier one, never dropping
//! below zero. Applying the same night twice is a no-op.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::stats::AdherenceStatus;
use crate::storage::Database;

/// KV key holding the streak record.
pub const STREAK_KEY: &str = "sleep_streak";

/// Configuration for streak growth and decay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StreakConfig {
    /// Fraction of the streak lost on a late night (0.0 to 1.0).
    pub late_decay: f64,
    /// Fraction lost on a missed night.
    pub missed_decay: f64,
    /// Streak ceiling.
    pub max_streak: u32,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            late_decay: 0.25,
            missed_decay: 0.75,
            max_streak: 365,
        }
    }
}

/// Persisted streak state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakState {
    pub current: u32,
    pub best: u32,
    /// Last night applied, guarding against double-counting.
    #[serde(default)]
    pub updated_on: Option<NaiveDate>,
}

/// Applies nightly outcomes to the streak.
#[derive(Debug, Clone, Default)]
pub struct StreakCalculator {
    config: StreakConfig,
}

impl StreakCalculator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreakConfig) -> Self {
        Self { config }
    }

    /// Fold one night's outcome into the state. Re-applying a date that
    /// was already counted returns the state unchanged.
    pub fn apply(&self, state: StreakState, status: AdherenceStatus, date: NaiveDate) -> StreakState {
        if state.updated_on == Some(date) {
            return state;
        }

        let current = match status {
            AdherenceStatus::OnTime => (state.current + 1).min(self.config.max_streak),
            AdherenceStatus::Late => decay(state.current, self.config.late_decay),
            AdherenceStatus::Missed => decay(state.current, self.config.missed_decay),
        };

        StreakState {
            current,
            best: state.best.max(current),
            updated_on: Some(date),
        }
    }
}

/// Decayed streak value, floored and never below zero.
fn decay(current: u32, factor: f64) -> u32 {
    (f64::from(current) * (1.0 - factor.clamp(0.0, 1.0))).floor() as u32
}

/// Reads and writes the streak record under [`STREAK_KEY`].
pub struct StreakStore<'a> {
    db: &'a Database,
}

impl<'a> StreakStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn load(&self) -> Result<StreakState, CoreError> {
        let Some(raw) = self.db.kv_get(STREAK_KEY)? else {
            return Ok(StreakState::default());
        };
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(&self, state: &StreakState) -> Result<(), CoreError> {
        let raw = serde_json::to_string(state)?;
        self.db.kv_set(STREAK_KEY, &raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    #[test]
    fn on_time_nights_grow_the_streak() {
        let calc = StreakCalculator::new();
        let mut state = StreakState::default();
        for d in 1..=5 {
            state = calc.apply(state, AdherenceStatus::OnTime, date(d));
        }
        assert_eq!(state.current, 5);
        assert_eq!(state.best, 5);
    }

    #[test]
    fn late_and_missed_nights_decay() {
        let calc = StreakCalculator::new();
        let mut state = StreakState {
            current: 20,
            best: 20,
            updated_on: None,
        };

        state = calc.apply(state, AdherenceStatus::Late, date(1));
        assert_eq!(state.current, 15); // 20 * 0.75
        assert_eq!(state.best, 20);

        state = calc.apply(state, AdherenceStatus::Missed, date(2));
        assert_eq!(state.current, 3); // 15 * 0.25, floored
    }

    #[test]
    fn decay_never_goes_negative() {
        let calc = StreakCalculator::new();
        let state = calc.apply(StreakState::default(), AdherenceStatus::Missed, date(1));
        assert_eq!(state.current, 0);
    }

    #[test]
    fn streak_caps_at_max() {
        let calc = StreakCalculator::with_config(StreakConfig {
            max_streak: 3,
            ..StreakConfig::default()
        });
        let mut state = StreakState::default();
        for d in 1..=5 {
            state = calc.apply(state, AdherenceStatus::OnTime, date(d));
        }
        assert_eq!(state.current, 3);
    }

    #[test]
    fn same_night_is_not_double_counted() {
        let calc = StreakCalculator::new();
        let state = calc.apply(StreakState::default(), AdherenceStatus::OnTime, date(1));
        let again = calc.apply(state, AdherenceStatus::OnTime, date(1));
        assert_eq!(again, state);
    }

    #[test]
    fn store_roundtrip() {
        let db = Database::open_memory().unwrap();
        let store = StreakStore::new(&db);
        assert_eq!(store.load().unwrap(), StreakState::default());

        let state = StreakState {
            current: 7,
            best: 12,
            updated_on: Some(date(8)),
        };
        store.save(&state).unwrap();
        assert_eq!(store.load().unwrap(), state);
    }
}
