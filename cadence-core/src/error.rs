//! Error types for cadence-core

use thiserror::Error;

/// Main error type for the cadence-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    ///
    /// Corrupt stored values (an unknown habit kind or cadence unit, an
    /// unparseable timestamp) surface here as conversion failures from the
    /// row mappers. They indicate invalid data upstream and are meant to
    /// abort the computation, not to be recovered from.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Habit not found
    #[error("habit not found: {0}")]
    HabitNotFound(String),
}

/// Result type alias for cadence-core
pub type Result<T> = std::result::Result<T, Error>;
