//! SQLite-backed storage.
//!
//! Provides:
//! - a key-value store for the JSON documents (blocker schedules, sleep
//!   settings, snooze state, streak state)
//! - the event journal
//! - nightly adherence rows

use chrono::{DateTime, NaiveDate, Utc};
use log::warn;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations};
use crate::error::{CoreError, StorageError};
use crate::events::Event;

/// One night of bedtime adherence bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightRow {
    pub date: NaiveDate,
    /// When the bedtime alert fired, if it did.
    pub alerted_at: Option<DateTime<Utc>>,
    /// When the device went quiet, if it did.
    pub quiet_at: Option<DateTime<Utc>>,
}

/// Parse an RFC 3339 timestamp, warning and dropping the value on failure.
fn parse_datetime_lossy(raw: Option<String>) -> Option<DateTime<Utc>> {
    let raw = raw?;
    match DateTime::parse_from_rfc3339(&raw) {
        Ok(dt) => Some(dt.with_timezone(&Utc)),
        Err(e) => {
            warn!("dropping unparseable timestamp '{raw}': {e}");
            None
        }
    }
}

/// SQLite database at `~/.config/nightshift/nightshift.db`.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database, creating and migrating as needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::QueryFailed(e.to_string()))?;
        let path = dir.join("nightshift.db");
        let conn = Connection::open(&path)
            .map_err(|source| StorageError::OpenFailed { path, source })?;
        migrations::run(&conn).map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (tests, ephemeral runs).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn).map_err(|e| StorageError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // ── Key-value store ──────────────────────────────────────────────

    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Event journal ────────────────────────────────────────────────

    /// Append an event to the journal.
    ///
    /// # Errors
    /// Returns an error if serialization or the insert fails.
    pub fn append_event(&self, event: &Event) -> Result<(), CoreError> {
        let payload = serde_json::to_string(event)?;
        self.conn.execute(
            "INSERT INTO events (payload, at) VALUES (?1, ?2)",
            params![payload, event.at().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Most recent events, newest first. Unparseable rows are skipped
    /// with a warning rather than failing the whole read.
    pub fn recent_events(&self, limit: u32) -> Result<Vec<Event>, CoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT payload FROM events ORDER BY id DESC LIMIT ?1")?;
        let rows = stmt.query_map(params![limit], |row| row.get::<_, String>(0))?;

        let mut events = Vec::new();
        for row in rows {
            let payload = row.map_err(StorageError::from)?;
            match serde_json::from_str(&payload) {
                Ok(event) => events.push(event),
                Err(e) => warn!("skipping unparseable event row: {e}"),
            }
        }
        Ok(events)
    }

    // ── Nightly adherence rows ───────────────────────────────────────

    /// Insert or update one night's record.
    ///
    /// # Errors
    /// Returns an error if the upsert fails.
    pub fn upsert_night(&self, night: &NightRow) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT INTO nights (date, alerted_at, quiet_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(date) DO UPDATE SET
                 alerted_at = COALESCE(excluded.alerted_at, nights.alerted_at),
                 quiet_at   = COALESCE(excluded.quiet_at, nights.quiet_at)",
            params![
                night.date.to_string(),
                night.alerted_at.map(|t| t.to_rfc3339()),
                night.quiet_at.map(|t| t.to_rfc3339()),
            ],
        )?;
        Ok(())
    }

    /// All recorded nights, oldest first.
    pub fn list_nights(&self) -> Result<Vec<NightRow>, CoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT date, alerted_at, quiet_at FROM nights ORDER BY date")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, Option<String>>(2)?,
            ))
        })?;

        let mut nights = Vec::new();
        for row in rows {
            let (date, alerted_at, quiet_at) = row.map_err(StorageError::from)?;
            let date = match date.parse::<NaiveDate>() {
                Ok(d) => d,
                Err(e) => {
                    warn!("skipping night row with bad date '{date}': {e}");
                    continue;
                }
            };
            nights.push(NightRow {
                date,
                alerted_at: parse_datetime_lossy(alerted_at),
                quiet_at: parse_datetime_lossy(quiet_at),
            });
        }
        Ok(nights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_roundtrip() {
        let db = Database::open_memory().unwrap();
        assert_eq!(db.kv_get("missing").unwrap(), None);

        db.kv_set("k", "v1").unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v1"));

        db.kv_set("k", "v2").unwrap();
        assert_eq!(db.kv_get("k").unwrap().as_deref(), Some("v2"));

        db.kv_delete("k").unwrap();
        assert_eq!(db.kv_get("k").unwrap(), None);
    }

    #[test]
    fn event_journal_roundtrip() {
        let db = Database::open_memory().unwrap();
        db.append_event(&Event::ShieldsRemoved { at: Utc::now() })
            .unwrap();
        db.append_event(&Event::BedtimeDetected { at: Utc::now() })
            .unwrap();

        let events = db.recent_events(10).unwrap();
        assert_eq!(events.len(), 2);
        // Newest first.
        assert!(matches!(events[0], Event::BedtimeDetected { .. }));
    }

    #[test]
    fn night_upsert_merges_fields() {
        let db = Database::open_memory().unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let alerted = Utc::now();

        db.upsert_night(&NightRow {
            date,
            alerted_at: Some(alerted),
            quiet_at: None,
        })
        .unwrap();
        // Second write fills in quiet_at without clearing alerted_at.
        db.upsert_night(&NightRow {
            date,
            alerted_at: None,
            quiet_at: Some(alerted + chrono::Duration::minutes(20)),
        })
        .unwrap();

        let nights = db.list_nights().unwrap();
        assert_eq!(nights.len(), 1);
        assert!(nights[0].alerted_at.is_some());
        assert!(nights[0].quiet_at.is_some());
    }
}
