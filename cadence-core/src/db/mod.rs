//! Database storage layer
//!
//! SQLite-backed storage for habits and log entries. The statistics
//! engine consumes read-only snapshots fetched here; all mutation goes
//! through this layer.

mod repo;
mod schema;

pub use repo::Database;
pub use schema::{get_schema_version, run_migrations, SCHEMA_VERSION};
