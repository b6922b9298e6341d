//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: Initial schema
    r#"
    CREATE TABLE IF NOT EXISTS habits (
        id               TEXT PRIMARY KEY,
        user_id          TEXT NOT NULL,
        name             TEXT NOT NULL,
        kind             TEXT NOT NULL,
        cadence_unit     TEXT NOT NULL,
        cadence_multiple INTEGER NOT NULL CHECK (cadence_multiple >= 1),
        started_at       DATETIME NOT NULL,
        is_active        INTEGER NOT NULL DEFAULT 1,
        created_at       DATETIME NOT NULL
    );

    CREATE TABLE IF NOT EXISTS entries (
        id               TEXT PRIMARY KEY,
        habit_id         TEXT NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
        action           TEXT NOT NULL,
        occurred_at      DATETIME NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_entries_habit_time
        ON entries(habit_id, occurred_at);
    "#,
    // Version 2: Covering index for the per-user active-habit listing
    r#"
    CREATE INDEX IF NOT EXISTS idx_habits_user_active
        ON habits(user_id, is_active);
    "#,
];

/// Run any pending migrations on this connection
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.execute(&format!("PRAGMA user_version = {}", version), [])?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let version = get_schema_version(&conn).unwrap();
        assert_eq!(version, SCHEMA_VERSION);
    }

    #[test]
    fn test_tables_created() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        for table in ["habits", "entries"] {
            let exists: i32 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?",
                    [table],
                    |r| r.get(0),
                )
                .unwrap();
            assert_eq!(exists, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn test_cadence_multiple_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO habits (id, user_id, name, kind, cadence_unit, cadence_multiple,
                                 started_at, is_active, created_at)
             VALUES ('h1', 'u1', 'bad', 'normal', 'days', 0,
                     '2025-01-01T00:00:00Z', 1, '2025-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err(), "cadence_multiple = 0 should be rejected");
    }
}
