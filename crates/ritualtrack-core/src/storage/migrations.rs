//! Database schema migrations for ritualtrack.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use indoc::indoc;
use rusqlite::{Connection, Result as SqliteResult};
use tracing::{info, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn)?;

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    if current_version < SCHEMA_VERSION {
        info!(from = current_version, to = SCHEMA_VERSION, "database schema migrated");
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

/// Current schema version, 0 for a fresh database.
///
/// # Errors
/// Returns an error if `schema_version` exists but cannot be read.
pub fn get_schema_version(conn: &Connection) -> SqliteResult<i32> {
    match conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    }) {
        Ok(version) => Ok(version),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => {
            warn!(error = %e, "failed to read schema_version");
            Err(e)
        }
    }
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Migration v1: profiles, weight history and daily task checks.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(indoc! {"
        CREATE TABLE IF NOT EXISTS profiles (
            owner_id        TEXT PRIMARY KEY,
            name            TEXT NOT NULL DEFAULT '',
            start_date      TEXT NOT NULL,
            initial_weight  REAL,
            current_weight  REAL,
            streak          INTEGER NOT NULL DEFAULT 0,
            last_check_in   TEXT
        );

        CREATE TABLE IF NOT EXISTS weight_history (
            owner_id  TEXT NOT NULL,
            date      TEXT NOT NULL,
            weight    REAL NOT NULL,
            PRIMARY KEY (owner_id, date)
        );

        CREATE TABLE IF NOT EXISTS task_checks (
            owner_id    TEXT NOT NULL,
            task_id     TEXT NOT NULL,
            check_date  TEXT NOT NULL,
            completed   INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (owner_id, task_id, check_date)
        );

        CREATE INDEX IF NOT EXISTS idx_task_checks_owner_date
            ON task_checks(owner_id, check_date);
    "})?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: ritual completion date on profiles.
///
/// Profiles that already checked in get their last check-in date as the
/// ritual date.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(indoc! {"
        ALTER TABLE profiles ADD COLUMN ritual_completed_on TEXT;
        UPDATE profiles SET ritual_completed_on = last_check_in
            WHERE last_check_in IS NOT NULL;
    "})?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn v2_backfills_ritual_date() {
        let conn = Connection::open_in_memory().unwrap();
        create_schema_version_table(&conn).unwrap();
        migrate_v1(&conn).unwrap();
        conn.execute(
            "INSERT INTO profiles (owner_id, start_date, streak, last_check_in)
             VALUES ('a', '2024-01-01', 3, '2024-01-03')",
            [],
        )
        .unwrap();

        migrate(&conn).unwrap();
        let ritual: Option<String> = conn
            .query_row(
                "SELECT ritual_completed_on FROM profiles WHERE owner_id = 'a'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(ritual.as_deref(), Some("2024-01-03"));
    }

    #[test]
    fn unreadable_version_is_reported_not_remigrated() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute_batch(
            "DROP TABLE schema_version;
             CREATE TABLE schema_version (version TEXT);
             INSERT INTO schema_version (version) VALUES ('two');",
        )
        .unwrap();

        let err = migrate(&conn).unwrap_err();
        assert!(
            matches!(err, rusqlite::Error::InvalidColumnType(..)),
            "unexpected error: {err}"
        );
    }
}
