//! SQLite-backed session log and key-value state store.
//!
//! The session log is append-only from the scheduler's point of view:
//! entries are created when a study phase completes naturally, and only
//! explicit user commands edit comments or delete entries. The `kv`
//! table persists the serialized scheduler between CLI invocations.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::data_dir;
use crate::error::StorageError;
use crate::events::StudyInterval;

/// One completed study interval with a user annotation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Stable unique id, assigned on append.
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_secs: u64,
    pub set_number: u32,
    #[serde(default)]
    pub comment: String,
}

/// SQLite database owning the session log and the kv store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/studycycle/studycycle.db`,
    /// creating file and schema as needed.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let path = data_dir()?.join("studycycle.db");
        let conn = Connection::open(&path)
            .map_err(|source| StorageError::OpenFailed { path, source })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|source| StorageError::OpenFailed {
            path: ":memory:".into(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS log_entries (
                id            TEXT PRIMARY KEY,
                started_at    TEXT NOT NULL,
                ended_at      TEXT NOT NULL,
                duration_secs INTEGER NOT NULL,
                set_number    INTEGER NOT NULL,
                comment       TEXT NOT NULL DEFAULT ''
            );

            CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_log_entries_started_at
                ON log_entries(started_at);",
        )?;
        Ok(())
    }

    /// Append a completed study interval, assigning a fresh id.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn append(&self, interval: &StudyInterval) -> Result<LogEntry, StorageError> {
        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            started_at: interval.started_at,
            ended_at: interval.ended_at,
            duration_secs: interval.duration_secs,
            set_number: interval.set_number,
            comment: String::new(),
        };
        self.conn.execute(
            "INSERT INTO log_entries (id, started_at, ended_at, duration_secs, set_number, comment)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id,
                entry.started_at.to_rfc3339(),
                entry.ended_at.to_rfc3339(),
                entry.duration_secs,
                entry.set_number,
                entry.comment,
            ],
        )?;
        Ok(entry)
    }

    /// All entries, most recent first.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn list(&self) -> Result<Vec<LogEntry>, StorageError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, started_at, ended_at, duration_secs, set_number, comment
             FROM log_entries
             ORDER BY started_at DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(LogEntry {
                id: row.get(0)?,
                started_at: parse_timestamp(row, 1)?,
                ended_at: parse_timestamp(row, 2)?,
                duration_secs: row.get(3)?,
                set_number: row.get(4)?,
                comment: row.get(5)?,
            })
        })?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    /// Replace the comment on an entry. Unknown ids are a silent no-op.
    ///
    /// # Errors
    /// Returns an error only if the update itself fails.
    pub fn update_comment(&self, id: &str, comment: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "UPDATE log_entries SET comment = ?2 WHERE id = ?1",
            params![id, comment],
        )?;
        Ok(())
    }

    /// Delete an entry. Unknown ids are a silent no-op.
    ///
    /// # Errors
    /// Returns an error only if the delete itself fails.
    pub fn remove(&self, id: &str) -> Result<(), StorageError> {
        self.conn
            .execute("DELETE FROM log_entries WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Get a value from the kv store.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }
}

fn parse_timestamp(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn interval(set_number: u32, offset_secs: i64) -> StudyInterval {
        let start = Utc::now() + Duration::seconds(offset_secs);
        StudyInterval {
            started_at: start,
            ended_at: start + Duration::seconds(600),
            duration_secs: 600,
            set_number,
        }
    }

    #[test]
    fn append_assigns_unique_ids() {
        let db = Database::open_memory().unwrap();
        let a = db.append(&interval(1, 0)).unwrap();
        let b = db.append(&interval(2, 10)).unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.comment.is_empty());
    }

    #[test]
    fn list_is_most_recent_first() {
        let db = Database::open_memory().unwrap();
        db.append(&interval(1, 0)).unwrap();
        db.append(&interval(2, 100)).unwrap();
        db.append(&interval(3, 200)).unwrap();
        let entries = db.list().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].set_number, 3);
        assert_eq!(entries[2].set_number, 1);
        assert!(entries[0].started_at > entries[1].started_at);
    }

    #[test]
    fn update_comment_and_roundtrip() {
        let db = Database::open_memory().unwrap();
        let entry = db.append(&interval(1, 0)).unwrap();
        db.update_comment(&entry.id, "solid session").unwrap();
        let entries = db.list().unwrap();
        assert_eq!(entries[0].comment, "solid session");
        assert_eq!(entries[0].started_at, entry.started_at);
    }

    #[test]
    fn update_comment_unknown_id_is_noop() {
        let db = Database::open_memory().unwrap();
        db.append(&interval(1, 0)).unwrap();
        db.update_comment("missing", "whatever").unwrap();
        assert!(db.list().unwrap()[0].comment.is_empty());
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let db = Database::open_memory().unwrap();
        let entry = db.append(&interval(1, 0)).unwrap();
        db.remove("missing").unwrap();
        assert_eq!(db.list().unwrap().len(), 1);
        db.remove(&entry.id).unwrap();
        assert!(db.list().unwrap().is_empty());
    }

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("scheduler").unwrap().is_none());
        db.kv_set("scheduler", "{}").unwrap();
        assert_eq!(db.kv_get("scheduler").unwrap().unwrap(), "{}");
        db.kv_set("scheduler", "{\"phase\":\"idle\"}").unwrap();
        assert_eq!(
            db.kv_get("scheduler").unwrap().unwrap(),
            "{\"phase\":\"idle\"}"
        );
    }
}
