//! Database repository layer
//!
//! Query and lifecycle operations for habits and their log entries. The
//! statistics engine never touches this layer directly; request handlers
//! fetch a snapshot here and hand it to the engine.
//!
//! Timestamps are stored as RFC 3339 TEXT. Corrupt stored values (an
//! unknown habit kind or cadence unit, a multiple below 1, an unparseable
//! timestamp) fail the read loudly instead of being patched over, since
//! they would silently poison every derived statistic.

use crate::error::{Error, Result};
use crate::types::*;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;
use uuid::Uuid;

/// Database handle with a single pooled connection
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // Enable foreign keys and WAL mode for better concurrency
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        super::schema::run_migrations(&conn)
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap()
    }

    // ============================================
    // Habit lifecycle
    // ============================================

    /// Create a habit, minting its id.
    pub fn create_habit(
        &self,
        user_id: &str,
        name: &str,
        kind: HabitKind,
        cadence: Cadence,
        started_at: DateTime<Utc>,
    ) -> Result<Habit> {
        let habit = Habit {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            kind,
            cadence,
            started_at,
            is_active: true,
            created_at: Utc::now(),
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            r#"
            INSERT INTO habits (id, user_id, name, kind, cadence_unit, cadence_multiple,
                                started_at, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                habit.id,
                habit.user_id,
                habit.name,
                habit.kind.as_str(),
                habit.cadence.unit.as_str(),
                habit.cadence.multiple,
                habit.started_at.to_rfc3339(),
                habit.is_active,
                habit.created_at.to_rfc3339(),
            ],
        )?;

        tracing::info!(habit_id = habit.id, user_id, "Created habit");
        Ok(habit)
    }

    /// Update a habit's mutable fields (name, kind, cadence, active flag)
    pub fn update_habit(&self, habit: &Habit) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            r#"
            UPDATE habits
            SET name = ?2, kind = ?3, cadence_unit = ?4, cadence_multiple = ?5,
                is_active = ?6
            WHERE id = ?1
            "#,
            params![
                habit.id,
                habit.name,
                habit.kind.as_str(),
                habit.cadence.unit.as_str(),
                habit.cadence.multiple,
                habit.is_active,
            ],
        )?;
        if updated == 0 {
            return Err(Error::HabitNotFound(habit.id.clone()));
        }
        Ok(())
    }

    /// Activate or archive a habit
    pub fn set_habit_active(&self, habit_id: &str, is_active: bool) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let updated = conn.execute(
            "UPDATE habits SET is_active = ?2 WHERE id = ?1",
            params![habit_id, is_active],
        )?;
        if updated == 0 {
            return Err(Error::HabitNotFound(habit_id.to_string()));
        }
        Ok(())
    }

    /// Get a habit by id
    pub fn get_habit(&self, habit_id: &str) -> Result<Option<Habit>> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT * FROM habits WHERE id = ?",
            [habit_id],
            Self::row_to_habit,
        )
        .optional()
        .map_err(Error::from)
    }

    // ============================================
    // Snapshot reads (consumed by the stats engine)
    // ============================================

    /// Fetch a habit together with its full entry history, ordered by
    /// occurrence time.
    pub fn get_habit_with_entries(&self, habit_id: &str) -> Result<HabitWithEntries> {
        let habit = self
            .get_habit(habit_id)?
            .ok_or_else(|| Error::HabitNotFound(habit_id.to_string()))?;
        let entries = self.entries_for(habit_id)?;
        Ok(HabitWithEntries { habit, entries })
    }

    /// Fetch all active habits for a user, each with its full entry
    /// history.
    pub fn list_active_habits(&self, user_id: &str) -> Result<Vec<HabitWithEntries>> {
        let habits = {
            let conn = self.conn.lock().unwrap();
            let mut stmt = conn.prepare(
                "SELECT * FROM habits WHERE user_id = ? AND is_active = 1 ORDER BY created_at",
            )?;
            let rows = stmt.query_map([user_id], Self::row_to_habit)?;
            rows.collect::<rusqlite::Result<Vec<Habit>>>()?
        };

        habits
            .into_iter()
            .map(|habit| {
                let entries = self.entries_for(&habit.id)?;
                Ok(HabitWithEntries { habit, entries })
            })
            .collect()
    }

    fn entries_for(&self, habit_id: &str) -> Result<Vec<LogEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT * FROM entries WHERE habit_id = ? ORDER BY occurred_at",
        )?;
        let rows = stmt.query_map([habit_id], Self::row_to_entry)?;
        rows.collect::<rusqlite::Result<Vec<LogEntry>>>()
            .map_err(Error::from)
    }

    // ============================================
    // Entry lifecycle
    // ============================================

    /// Record a done or skipped action against a habit, minting the
    /// entry id.
    pub fn log_entry(
        &self,
        habit_id: &str,
        action: EntryAction,
        occurred_at: DateTime<Utc>,
    ) -> Result<LogEntry> {
        let entry = LogEntry {
            id: Uuid::new_v4().to_string(),
            habit_id: habit_id.to_string(),
            action,
            occurred_at,
        };

        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO entries (id, habit_id, action, occurred_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.id,
                entry.habit_id,
                entry.action.as_str(),
                entry.occurred_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(
            entry_id = entry.id,
            habit_id,
            action = %action,
            "Logged entry"
        );
        Ok(entry)
    }

    /// Delete an entry. Entries are never mutated, only removed.
    /// Returns false when no such entry existed.
    pub fn delete_entry(&self, entry_id: &str) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let deleted = conn.execute("DELETE FROM entries WHERE id = ?", [entry_id])?;
        Ok(deleted > 0)
    }

    // ============================================
    // Row mapping
    // ============================================

    fn row_to_habit(row: &Row) -> rusqlite::Result<Habit> {
        let kind: String = row.get("kind")?;
        let cadence_unit: String = row.get("cadence_unit")?;
        let cadence_multiple: i64 = row.get("cadence_multiple")?;
        let started_at: String = row.get("started_at")?;
        let created_at: String = row.get("created_at")?;

        if cadence_multiple < 1 {
            return Err(stored_value_error(
                "cadence_multiple",
                &cadence_multiple.to_string(),
            ));
        }

        Ok(Habit {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            name: row.get("name")?,
            kind: parse_stored("kind", &kind)?,
            cadence: Cadence {
                unit: parse_stored("cadence_unit", &cadence_unit)?,
                multiple: cadence_multiple as u32,
            },
            started_at: parse_timestamp("started_at", &started_at)?,
            is_active: row.get("is_active")?,
            created_at: parse_timestamp("created_at", &created_at)?,
        })
    }

    fn row_to_entry(row: &Row) -> rusqlite::Result<LogEntry> {
        let action: String = row.get("action")?;
        let occurred_at: String = row.get("occurred_at")?;

        Ok(LogEntry {
            id: row.get("id")?,
            habit_id: row.get("habit_id")?,
            action: parse_stored("action", &action)?,
            occurred_at: parse_timestamp("occurred_at", &occurred_at)?,
        })
    }
}

/// Parse an enum column, turning an unknown value into a loud conversion
/// failure.
fn parse_stored<T>(column: &str, value: &str) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| stored_value_error(column, &format!("{} ({})", value, e)))
}

fn parse_timestamp(column: &str, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| stored_value_error(column, &format!("{} ({})", value, e)))
}

fn stored_value_error(column: &str, detail: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        format!("invalid stored {}: {}", column, detail).into(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        db.migrate().unwrap();
        db
    }

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_habit_round_trip() {
        let db = test_db();
        let created = db
            .create_habit(
                "u1",
                "morning run",
                HabitKind::Normal,
                Cadence::new(CadenceUnit::Days, 1),
                ts("2025-02-03T00:00:00Z"),
            )
            .unwrap();

        let fetched = db.get_habit(&created.id).unwrap().unwrap();
        assert_eq!(fetched.name, "morning run");
        assert_eq!(fetched.kind, HabitKind::Normal);
        assert_eq!(fetched.cadence, Cadence::new(CadenceUnit::Days, 1));
        assert_eq!(fetched.started_at, ts("2025-02-03T00:00:00Z"));
        assert!(fetched.is_active);
    }

    #[test]
    fn test_missing_habit() {
        let db = test_db();
        assert!(db.get_habit("nope").unwrap().is_none());
        assert!(matches!(
            db.get_habit_with_entries("nope"),
            Err(Error::HabitNotFound(_))
        ));
        assert!(matches!(
            db.set_habit_active("nope", false),
            Err(Error::HabitNotFound(_))
        ));
    }

    #[test]
    fn test_entries_ordered_and_attached() {
        let db = test_db();
        let habit = db
            .create_habit(
                "u1",
                "journal",
                HabitKind::Normal,
                Cadence::new(CadenceUnit::Days, 1),
                ts("2025-02-03T00:00:00Z"),
            )
            .unwrap();

        db.log_entry(&habit.id, EntryAction::Done, ts("2025-02-05T09:00:00Z"))
            .unwrap();
        db.log_entry(&habit.id, EntryAction::Skipped, ts("2025-02-04T09:00:00Z"))
            .unwrap();

        let snapshot = db.get_habit_with_entries(&habit.id).unwrap();
        assert_eq!(snapshot.entries.len(), 2);
        assert_eq!(snapshot.entries[0].action, EntryAction::Skipped);
        assert_eq!(snapshot.entries[1].action, EntryAction::Done);
    }

    #[test]
    fn test_list_active_habits_filters() {
        let db = test_db();
        let keep = db
            .create_habit(
                "u1",
                "keep",
                HabitKind::Normal,
                Cadence::new(CadenceUnit::Days, 1),
                ts("2025-02-03T00:00:00Z"),
            )
            .unwrap();
        let archive = db
            .create_habit(
                "u1",
                "archive",
                HabitKind::Normal,
                Cadence::new(CadenceUnit::Days, 1),
                ts("2025-02-03T00:00:00Z"),
            )
            .unwrap();
        db.create_habit(
            "u2",
            "other user",
            HabitKind::Normal,
            Cadence::new(CadenceUnit::Days, 1),
            ts("2025-02-03T00:00:00Z"),
        )
        .unwrap();

        db.set_habit_active(&archive.id, false).unwrap();

        let active = db.list_active_habits("u1").unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].habit.id, keep.id);
    }

    #[test]
    fn test_update_habit() {
        let db = test_db();
        let mut habit = db
            .create_habit(
                "u1",
                "read",
                HabitKind::Normal,
                Cadence::new(CadenceUnit::Days, 1),
                ts("2025-02-03T00:00:00Z"),
            )
            .unwrap();

        habit.name = "read fiction".to_string();
        habit.cadence = Cadence::new(CadenceUnit::Weeks, 2);
        db.update_habit(&habit).unwrap();

        let fetched = db.get_habit(&habit.id).unwrap().unwrap();
        assert_eq!(fetched.name, "read fiction");
        assert_eq!(fetched.cadence, Cadence::new(CadenceUnit::Weeks, 2));
    }

    #[test]
    fn test_delete_entry() {
        let db = test_db();
        let habit = db
            .create_habit(
                "u1",
                "stretch",
                HabitKind::Normal,
                Cadence::new(CadenceUnit::Days, 1),
                ts("2025-02-03T00:00:00Z"),
            )
            .unwrap();
        let entry = db
            .log_entry(&habit.id, EntryAction::Done, ts("2025-02-05T09:00:00Z"))
            .unwrap();

        assert!(db.delete_entry(&entry.id).unwrap());
        assert!(!db.delete_entry(&entry.id).unwrap());
        assert!(db
            .get_habit_with_entries(&habit.id)
            .unwrap()
            .entries
            .is_empty());
    }

    #[test]
    fn test_corrupt_cadence_unit_fails_loudly() {
        let db = test_db();
        db.connection()
            .execute(
                "INSERT INTO habits (id, user_id, name, kind, cadence_unit, cadence_multiple,
                                     started_at, is_active, created_at)
                 VALUES ('h1', 'u1', 'bad', 'normal', 'fortnights', 1,
                         '2025-01-01T00:00:00Z', 1, '2025-01-01T00:00:00Z')",
                [],
            )
            .unwrap();

        let result = db.get_habit("h1");
        assert!(matches!(result, Err(Error::Database(_))));
        let message = result.unwrap_err().to_string();
        assert!(message.contains("cadence_unit"), "got: {}", message);
    }
}
