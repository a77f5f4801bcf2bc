//! Schedule persistence over the key-value store.

use log::info;

use super::{decode_schedules, encode_schedules, BlockSchedule, SCHEDULES_KEY};
use crate::error::{CoreError, ValidationError};
use crate::storage::Database;

/// Reads and writes the schedule envelope under [`SCHEDULES_KEY`].
pub struct ScheduleStore<'a> {
    db: &'a Database,
}

impl<'a> ScheduleStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// All schedules. A legacy document is migrated and written back in
    /// the current envelope before returning.
    pub fn list(&self) -> Result<Vec<BlockSchedule>, CoreError> {
        let Some(raw) = self.db.kv_get(SCHEDULES_KEY)? else {
            return Ok(Vec::new());
        };
        let (schedules, migrated) = decode_schedules(&raw)?;
        if migrated {
            info!("migrated legacy schedule document ({} records)", schedules.len());
            self.save_all(&schedules)?;
        }
        Ok(schedules)
    }

    /// Persist the full schedule list.
    pub fn save_all(&self, schedules: &[BlockSchedule]) -> Result<(), CoreError> {
        let raw = encode_schedules(schedules)?;
        self.db.kv_set(SCHEDULES_KEY, &raw)?;
        Ok(())
    }

    /// Insert or replace by id. Returns true when an existing record was
    /// replaced (in place -- the list never grows on replace).
    pub fn upsert(&self, schedule: BlockSchedule) -> Result<bool, CoreError> {
        let mut schedules = self.list()?;
        let replaced = match schedules.iter().position(|s| s.id == schedule.id) {
            Some(index) => {
                schedules[index] = schedule;
                true
            }
            None => {
                schedules.push(schedule);
                false
            }
        };
        self.save_all(&schedules)?;
        Ok(replaced)
    }

    /// Remove exactly one schedule by id, leaving the rest untouched.
    ///
    /// # Errors
    /// Returns a validation error if the id is unknown.
    pub fn remove(&self, id: &str) -> Result<BlockSchedule, CoreError> {
        let mut schedules = self.list()?;
        let index = schedules
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::UnknownSchedule(id.to_string()))?;
        let removed = schedules.remove(index);
        self.save_all(&schedules)?;
        Ok(removed)
    }

    /// Flip a schedule's active flag in place.
    ///
    /// # Errors
    /// Returns a validation error if the id is unknown.
    pub fn set_active(&self, id: &str, active: bool) -> Result<BlockSchedule, CoreError> {
        let mut schedules = self.list()?;
        let schedule = schedules
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ValidationError::UnknownSchedule(id.to_string()))?;
        schedule.is_active = active;
        schedule.updated_at = chrono::Utc::now();
        let updated = schedule.clone();
        self.save_all(&schedules)?;
        Ok(updated)
    }

    /// Look up a schedule by id.
    pub fn find(&self, id: &str) -> Result<Option<BlockSchedule>, CoreError> {
        Ok(self.list()?.into_iter().find(|s| s.id == id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::{parse_day_set, TimeOfDay};

    fn store_with(db: &Database) -> ScheduleStore<'_> {
        ScheduleStore::new(db)
    }

    fn sample(name: &str) -> BlockSchedule {
        BlockSchedule::new(
            name,
            "22:00".parse::<TimeOfDay>().unwrap(),
            "06:30".parse::<TimeOfDay>().unwrap(),
            parse_day_set("mon,tue,wed,thu,fri").unwrap(),
        )
    }

    #[test]
    fn empty_store_lists_nothing() {
        let db = Database::open_memory().unwrap();
        assert!(store_with(&db).list().unwrap().is_empty());
    }

    #[test]
    fn upsert_replaces_never_duplicates() {
        let db = Database::open_memory().unwrap();
        let store = store_with(&db);

        let mut s = sample("Night");
        assert!(!store.upsert(s.clone()).unwrap());
        assert!(!store.upsert(sample("Other")).unwrap());
        assert_eq!(store.list().unwrap().len(), 2);

        s.name = "Renamed".into();
        assert!(store.upsert(s.clone()).unwrap());

        let schedules = store.list().unwrap();
        assert_eq!(schedules.len(), 2);
        // Replaced at the same index.
        assert_eq!(schedules[0].id, s.id);
        assert_eq!(schedules[0].name, "Renamed");
    }

    #[test]
    fn remove_deletes_exactly_one() {
        let db = Database::open_memory().unwrap();
        let store = store_with(&db);

        let a = sample("A");
        let b = sample("B");
        store.upsert(a.clone()).unwrap();
        store.upsert(b.clone()).unwrap();

        let removed = store.remove(&a.id).unwrap();
        assert_eq!(removed.id, a.id);

        let remaining = store.list().unwrap();
        assert_eq!(remaining.len(), 1);
        // The survivor is untouched.
        assert_eq!(remaining[0], b);

        assert!(store.remove(&a.id).is_err());
    }

    #[test]
    fn set_active_flips_in_place() {
        let db = Database::open_memory().unwrap();
        let store = store_with(&db);

        let s = sample("Night");
        store.upsert(s.clone()).unwrap();

        let paused = store.set_active(&s.id, false).unwrap();
        assert!(!paused.is_active);
        assert!(!store.find(&s.id).unwrap().unwrap().is_active);

        assert!(store.set_active("missing", false).is_err());
    }

    #[test]
    fn legacy_document_is_migrated_on_list() {
        let db = Database::open_memory().unwrap();
        db.kv_set(
            SCHEDULES_KEY,
            r#"[{"id": "a", "startTime": "22:00", "endTime": "06:30",
                 "daysOfWeek": [true, false, false, false, false, false, false]}]"#,
        )
        .unwrap();

        let store = store_with(&db);
        let schedules = store.list().unwrap();
        assert_eq!(schedules.len(), 1);

        // The lifted envelope was written back.
        let raw = db.kv_get(SCHEDULES_KEY).unwrap().unwrap();
        assert!(raw.contains("\"version\":1"));
    }
}
