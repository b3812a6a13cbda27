mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, NotificationsConfig, ScheduleConfig};
pub use database::{Database, IntervalRecord, IntervalSpan};

use std::path::PathBuf;

use crate::error::DatabaseError;

/// Persistence of completed focus intervals, grouped by session id.
///
/// Every call goes straight to durable storage; nothing is cached between
/// calls.
pub trait IntervalStore {
    /// Id for a new session.
    ///
    /// `1` on an empty store; otherwise one past the smallest used id whose
    /// successor is free, so gaps left by missing sessions are filled first.
    fn allocate_session_id(&self) -> Result<i64, DatabaseError>;

    /// Durably store one completed interval under `session_id`.
    fn append(&self, session_id: i64, span: &IntervalSpan) -> Result<(), DatabaseError>;

    /// All intervals of `session_id` ordered by start time; empty when the id
    /// is unknown.
    fn list_by_session(&self, session_id: i64) -> Result<Vec<IntervalRecord>, DatabaseError>;
}

impl<T: IntervalStore + ?Sized> IntervalStore for &T {
    fn allocate_session_id(&self) -> Result<i64, DatabaseError> {
        (**self).allocate_session_id()
    }

    fn append(&self, session_id: i64, span: &IntervalSpan) -> Result<(), DatabaseError> {
        (**self).append(session_id, span)
    }

    fn list_by_session(&self, session_id: i64) -> Result<Vec<IntervalRecord>, DatabaseError> {
        (**self).list_by_session(session_id)
    }
}

/// Which database file the process works against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageEnv {
    Production,
    Development,
    Test,
}

impl StorageEnv {
    /// Read `POMODORO_ENV`. Unset means production; unknown values fall back
    /// to the test database.
    pub fn from_env() -> Self {
        match std::env::var("POMODORO_ENV") {
            Ok(value) => Self::parse(&value),
            Err(_) => StorageEnv::Production,
        }
    }

    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "production" | "prod" => StorageEnv::Production,
            "dev" | "development" => StorageEnv::Development,
            _ => StorageEnv::Test,
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            StorageEnv::Production => "pomodoro.db",
            StorageEnv::Development => "dev.db",
            StorageEnv::Test => "test.db",
        }
    }
}

/// Returns `$POMODORO_DATA_DIR`, or `~/.config/pomodoro/` when unset.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("POMODORO_DATA_DIR") {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("pomodoro"),
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
