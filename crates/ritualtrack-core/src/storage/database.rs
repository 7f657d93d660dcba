//! SQLite-backed record store.
//!
//! Provides persistent storage for:
//! - Owner profiles (name, start date, weights, streak)
//! - Weight history, one row per owner and date
//! - Daily task checks, one row per owner, task and date

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::Value;
use rusqlite::{params, Connection, OptionalExtension};

use super::{data_dir, migrations};
use crate::error::StoreError;
use crate::identity::OwnerId;
use crate::progress::{Profile, ProfileField, RecordBackend, TaskState, WeightEntry};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// File name of the database inside the data directory.
pub const DATABASE_FILE: &str = "ritualtrack.db";

/// SQLite database for progress records.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `<data_dir>/ritualtrack.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, crate::error::CoreError> {
        let path = data_dir()?.join(DATABASE_FILE);
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    ///
    /// # Errors
    /// Returns an error if the schema cannot be created.
    pub fn open_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), StoreError> {
        migrations::migrate(&self.conn).map_err(|e| StoreError::MigrationFailed(e.to_string()))
    }
}

fn date_to_sql(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn date_from_sql(idx: usize, text: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(text, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn opt_date_from_sql(idx: usize, text: Option<String>) -> rusqlite::Result<Option<NaiveDate>> {
    text.map(|t| date_from_sql(idx, &t)).transpose()
}

fn opt_date_value(date: Option<NaiveDate>) -> Value {
    date.map_or(Value::Null, |d| Value::Text(date_to_sql(d)))
}

fn opt_real_value(value: Option<f64>) -> Value {
    value.map_or(Value::Null, Value::Real)
}

/// Column and value written for a single profile field.
fn field_column(field: &ProfileField) -> (&'static str, Value) {
    match field {
        ProfileField::Name(name) => ("name", Value::Text(name.clone())),
        ProfileField::StartDate(date) => ("start_date", Value::Text(date_to_sql(*date))),
        ProfileField::InitialWeight(w) => ("initial_weight", opt_real_value(*w)),
        ProfileField::CurrentWeight(w) => ("current_weight", opt_real_value(*w)),
        ProfileField::Streak(s) => ("streak", Value::Integer(i64::from(*s))),
        ProfileField::LastCheckIn(d) => ("last_check_in", opt_date_value(*d)),
        ProfileField::RitualCompletedOn(d) => ("ritual_completed_on", opt_date_value(*d)),
    }
}

fn apply_fields(conn: &Connection, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
    for field in fields {
        let (column, value) = field_column(field);
        let changed = conn.execute(
            &format!("UPDATE profiles SET {column} = ?1 WHERE owner_id = ?2"),
            params![value, owner.as_str()],
        )?;
        if changed == 0 {
            return Err(StoreError::QueryFailed(format!("no profile for owner {owner}")));
        }
    }
    Ok(())
}

fn delete_checks(conn: &Connection, owner: &OwnerId, date: NaiveDate) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM task_checks WHERE owner_id = ?1 AND check_date = ?2",
        params![owner.as_str(), date_to_sql(date)],
    )?;
    Ok(())
}

fn upsert_weight_row(conn: &Connection, owner: &OwnerId, entry: &WeightEntry) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO weight_history (owner_id, date, weight) VALUES (?1, ?2, ?3)
         ON CONFLICT(owner_id, date) DO UPDATE SET weight = excluded.weight",
        params![owner.as_str(), date_to_sql(entry.date), entry.weight],
    )?;
    Ok(())
}

fn delete_history(conn: &Connection, owner: &OwnerId) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM weight_history WHERE owner_id = ?1",
        params![owner.as_str()],
    )?;
    conn.execute(
        "DELETE FROM task_checks WHERE owner_id = ?1",
        params![owner.as_str()],
    )?;
    Ok(())
}

impl RecordBackend for Database {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn fetch_profile(&self, owner: &OwnerId) -> Result<Option<Profile>, StoreError> {
        let profile = self
            .conn
            .query_row(
                "SELECT name, start_date, initial_weight, current_weight, streak,
                        last_check_in, ritual_completed_on
                 FROM profiles WHERE owner_id = ?1",
                params![owner.as_str()],
                |row| {
                    let start: String = row.get(1)?;
                    Ok(Profile {
                        name: row.get(0)?,
                        start_date: date_from_sql(1, &start)?,
                        initial_weight: row.get(2)?,
                        current_weight: row.get(3)?,
                        streak: row.get(4)?,
                        last_check_in: opt_date_from_sql(5, row.get(5)?)?,
                        ritual_completed_on: opt_date_from_sql(6, row.get(6)?)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn insert_profile(&self, owner: &OwnerId, profile: &Profile) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO profiles (owner_id, name, start_date, initial_weight, current_weight,
                                   streak, last_check_in, ritual_completed_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                owner.as_str(),
                profile.name,
                date_to_sql(profile.start_date),
                profile.initial_weight,
                profile.current_weight,
                profile.streak,
                opt_date_value(profile.last_check_in),
                opt_date_value(profile.ritual_completed_on),
            ],
        )?;
        Ok(())
    }

    fn update_profile(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        apply_fields(&tx, owner, fields)?;
        tx.commit()?;
        Ok(())
    }

    fn weight_history(&self, owner: &OwnerId) -> Result<Vec<WeightEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT date, weight FROM weight_history
             WHERE owner_id = ?1
             ORDER BY date ASC",
        )?;
        let rows = stmt.query_map(params![owner.as_str()], |row| {
            let date: String = row.get(0)?;
            Ok(WeightEntry {
                date: date_from_sql(0, &date)?,
                weight: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn upsert_weight(&self, owner: &OwnerId, entry: &WeightEntry) -> Result<(), StoreError> {
        upsert_weight_row(&self.conn, owner, entry)
    }

    fn task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<Vec<TaskState>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT task_id, completed FROM task_checks
             WHERE owner_id = ?1 AND check_date = ?2",
        )?;
        let rows = stmt.query_map(params![owner.as_str(), date_to_sql(date)], |row| {
            Ok(TaskState {
                task_id: row.get(0)?,
                completed: row.get(1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn upsert_task_state(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        state: &TaskState,
    ) -> Result<(), StoreError> {
        self.conn.execute(
            "INSERT INTO task_checks (owner_id, task_id, check_date, completed)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(owner_id, task_id, check_date) DO UPDATE SET completed = excluded.completed",
            params![owner.as_str(), state.task_id, date_to_sql(date), state.completed],
        )?;
        Ok(())
    }

    fn delete_task_states(&self, owner: &OwnerId, date: NaiveDate) -> Result<(), StoreError> {
        delete_checks(&self.conn, owner, date)
    }

    fn clear_history(&self, owner: &OwnerId) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        delete_history(&tx, owner)?;
        tx.commit()?;
        Ok(())
    }

    fn check_in(
        &self,
        owner: &OwnerId,
        date: NaiveDate,
        fields: &[ProfileField],
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        apply_fields(&tx, owner, fields)?;
        delete_checks(&tx, owner, date)?;
        tx.commit()?;
        Ok(())
    }

    fn reset(&self, owner: &OwnerId, fields: &[ProfileField]) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        apply_fields(&tx, owner, fields)?;
        delete_history(&tx, owner)?;
        tx.commit()?;
        Ok(())
    }

    fn record_weight(
        &self,
        owner: &OwnerId,
        field: &ProfileField,
        entry: Option<&WeightEntry>,
    ) -> Result<(), StoreError> {
        let tx = self.conn.unchecked_transaction()?;
        apply_fields(&tx, owner, std::slice::from_ref(field))?;
        if let Some(entry) = entry {
            upsert_weight_row(&tx, owner, entry)?;
        }
        tx.commit()?;
        Ok(())
    }
}
