//! SQLite-based interval storage.
//!
//! Every completed focus interval becomes one row in `intervals`, keyed by
//! `(session_id, start_time)`. Rows are only ever inserted; nothing in the
//! production path updates or deletes them.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations, IntervalStore, StorageEnv};
use crate::error::{DatabaseError, ValidationError};

/// Start and end of one timed interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalSpan {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl IntervalSpan {
    pub fn new(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.end_time <= self.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: self.start_time,
                end: self.end_time,
            });
        }
        Ok(())
    }
}

/// A persisted focus interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntervalRecord {
    pub session_id: i64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl IntervalRecord {
    pub fn span(&self) -> IntervalSpan {
        IntervalSpan::new(self.start_time, self.end_time)
    }

    pub fn duration(&self) -> chrono::Duration {
        self.end_time - self.start_time
    }
}

/// Fixed-width so that text order is chronological order.
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

/// SQLite database holding completed intervals.
pub struct Database {
    conn: Connection,
    env: StorageEnv,
}

impl Database {
    /// Environment the file was chosen for; only `Test` can be torn down.
    pub fn env(&self) -> StorageEnv {
        self.env
    }

    /// Open the database in the data directory, picking the file from
    /// `POMODORO_ENV`.
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        let env = StorageEnv::from_env();
        let path = data_dir()?.join(env.file_name());
        Ok(Self::open_at(path, env)?)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<Path>, env: StorageEnv) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        Self::init(conn, env)
    }

    /// Open an in-memory database. Always treated as a test database.
    ///
    /// # Errors
    /// Returns an error if migration fails.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        Self::init(conn, StorageEnv::Test)
    }

    fn init(conn: Connection, env: StorageEnv) -> Result<Self, DatabaseError> {
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn, env })
    }

    /// Drop the interval table. Only honoured for test databases; a no-op
    /// everywhere else.
    ///
    /// # Errors
    /// Returns an error if the drop fails.
    pub fn teardown(&self) -> Result<(), DatabaseError> {
        if self.env() != StorageEnv::Test {
            return Ok(());
        }
        self.conn.execute_batch(
            "DROP TABLE IF EXISTS intervals;
             DELETE FROM schema_version;",
        )?;
        Ok(())
    }

    /// Every session id with at least one stored interval, ascending.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn session_ids(&self) -> Result<Vec<i64>, DatabaseError> {
        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT session_id FROM intervals ORDER BY session_id")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// The session whose most recent interval started last.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub fn latest_session_id(&self) -> Result<Option<i64>, DatabaseError> {
        let result = self.conn.query_row(
            "SELECT session_id FROM intervals ORDER BY start_time DESC LIMIT 1",
            [],
            |row| row.get::<_, i64>(0),
        );
        match result {
            Ok(id) => Ok(Some(id)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl IntervalStore for Database {
    fn allocate_session_id(&self) -> Result<i64, DatabaseError> {
        let next: Option<i64> = self.conn.query_row(
            "SELECT MIN(session_id) + 1
             FROM intervals
             WHERE session_id >= 1
               AND session_id + 1 NOT IN (SELECT DISTINCT session_id FROM intervals)",
            [],
            |row| row.get(0),
        )?;
        Ok(next.unwrap_or(1))
    }

    fn append(&self, session_id: i64, span: &IntervalSpan) -> Result<(), DatabaseError> {
        span.validate()?;
        self.conn.execute(
            "INSERT INTO intervals (session_id, start_time, end_time)
             VALUES (?1, ?2, ?3)",
            params![
                session_id,
                format_timestamp(&span.start_time),
                format_timestamp(&span.end_time),
            ],
        )?;
        Ok(())
    }

    fn list_by_session(&self, session_id: i64) -> Result<Vec<IntervalRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT session_id, start_time, end_time
             FROM intervals
             WHERE session_id = ?1
             ORDER BY start_time",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            let start: String = row.get(1)?;
            let end: String = row.get(2)?;
            Ok(IntervalRecord {
                session_id: row.get(0)?,
                start_time: parse_timestamp(1, &start)?,
                end_time: parse_timestamp(2, &end)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
