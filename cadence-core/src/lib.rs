//! # cadence-core
//!
//! Core library for cadence - a personal habit tracker.
//!
//! This library provides:
//! - Domain types for habits and their log entries
//! - Database storage layer with SQLite
//! - The statistics engine: period resolution, streaks, aggregate reports
//! - Configuration management
//! - Logging infrastructure
//!
//! ## Architecture
//!
//! The statistics engine is a set of pure functions over in-memory
//! snapshots: callers fetch a habit (or all of a user's active habits)
//! with its entries from the storage layer, then hand the snapshot and an
//! explicit reference instant to the engine. The engine performs no I/O
//! and never reads the wall clock.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cadence_core::{build_report, Config, Database};
//!
//! let config = Config::load().expect("failed to load config");
//! let db = Database::open(&config.database_path()).expect("failed to open database");
//! db.migrate().expect("failed to run migrations");
//!
//! let habits = db.list_active_habits("some-user").expect("failed to fetch habits");
//! let report = build_report(&habits, chrono::Utc::now());
//! println!("today: {:.0}%", report.daily_stats.today_completion_rate * 100.0);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use db::Database;
pub use error::{Error, Result};
pub use stats::{
    build_report, current_streak, habit_stats, resolve_period, HabitStats, ResolvedPeriod,
    StatsReport,
};
pub use types::*;

// Public modules
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod logging;
pub mod stats;
pub mod types;
