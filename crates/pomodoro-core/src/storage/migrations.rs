//! Database schema migrations.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub(crate) fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: the `intervals` table.
///
/// One row per completed focus interval. `(session_id, start_time)` is the
/// identity of a row; timestamps are fixed-width RFC 3339 UTC text so that
/// ordering by the column orders chronologically.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS intervals (
            session_id  INTEGER NOT NULL,
            start_time  TEXT NOT NULL,
            end_time    TEXT NOT NULL,
            PRIMARY KEY (session_id, start_time)
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: import rows from the legacy `pomodoro` table.
///
/// Older databases stored `pomodoro_id`, `start_datetime` and `end_datetime`
/// with second precision (`YYYY-MM-DD HH:MM:SS`). Rows are copied into
/// `intervals` with the timestamps rewritten into the current format; the
/// legacy table is left in place.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    let has_legacy: bool = tx.query_row(
        "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'pomodoro')",
        [],
        |row| row.get(0),
    )?;

    if has_legacy {
        let imported = tx.execute(
            "INSERT OR IGNORE INTO intervals (session_id, start_time, end_time)
             SELECT pomodoro_id,
                    strftime('%Y-%m-%dT%H:%M:%S.000000Z', start_datetime),
                    strftime('%Y-%m-%dT%H:%M:%S.000000Z', end_datetime)
             FROM pomodoro
             WHERE strftime('%s', start_datetime) IS NOT NULL
               AND strftime('%s', end_datetime) IS NOT NULL",
            [],
        )?;
        tracing::info!(imported, "imported legacy pomodoro rows");
    }

    set_schema_version(&tx, 2)?;
    tx.commit()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrate_from_scratch() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();

        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM intervals", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn test_migrate_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }

    #[test]
    fn test_legacy_rows_are_imported() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE pomodoro (
                pomodoro_id INTEGER NOT NULL,
                start_datetime DATE NOT NULL,
                end_datetime DATE NOT NULL,
                PRIMARY KEY (pomodoro_id, start_datetime)
            );
            INSERT INTO pomodoro VALUES (1, '2023-01-01 12:00:00', '2023-01-01 12:25:00');
            INSERT INTO pomodoro VALUES (1, '2023-01-01 12:30:00', '2023-01-01 12:55:00');
            INSERT INTO pomodoro VALUES (3, 'garbage', 'garbage');",
        )
        .unwrap();

        migrate(&conn).unwrap();

        let mut stmt = conn
            .prepare("SELECT session_id, start_time, end_time FROM intervals ORDER BY start_time")
            .unwrap();
        let rows: Vec<(i64, String, String)> = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0, 1);
        assert_eq!(rows[0].1, "2023-01-01T12:00:00.000000Z");
        assert_eq!(rows[0].2, "2023-01-01T12:25:00.000000Z");
    }

    #[test]
    fn test_incremental_migration() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), 1);

        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), SCHEMA_VERSION);
    }
}
