//! Core domain types for cadence
//!
//! These types are the snapshot shape the statistics engine consumes:
//! habits with their cadence definition and the log entries recorded
//! against them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Habit** | A recurring behavior a person tracks (positive or to-be-avoided) |
//! | **Cadence** | How often the habit must be satisfied: once per `multiple` units |
//! | **Period** | One bounded interval of the cadence timeline, anchored at the habit start |
//! | **LogEntry** | A single recorded action against a habit (done or skipped) |
//! | **Skip** | An explicit marker that excuses a period from success/failure counting |
//!
//! A `Normal` habit succeeds when the tracked action occurs in a period.
//! An `Avoidance` habit succeeds when it does NOT occur; recording a done
//! action against an avoidance habit marks the period as failed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Habit kind
// ============================================

/// Polarity of a habit: does a recorded action mean success or failure?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HabitKind {
    /// Requires a done action in a period to succeed
    Normal,
    /// Succeeds by the absence of a done action in a period
    Avoidance,
}

impl HabitKind {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            HabitKind::Normal => "normal",
            HabitKind::Avoidance => "avoidance",
        }
    }
}

impl std::fmt::Display for HabitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HabitKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(HabitKind::Normal),
            "avoidance" => Ok(HabitKind::Avoidance),
            _ => Err(format!("unknown habit kind: {}", s)),
        }
    }
}

// ============================================
// Cadence
// ============================================

/// Calendar unit a cadence repeats over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CadenceUnit {
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

impl CadenceUnit {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            CadenceUnit::Hours => "hours",
            CadenceUnit::Days => "days",
            CadenceUnit::Weeks => "weeks",
            CadenceUnit::Months => "months",
            CadenceUnit::Years => "years",
        }
    }
}

impl std::fmt::Display for CadenceUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CadenceUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hours" => Ok(CadenceUnit::Hours),
            "days" => Ok(CadenceUnit::Days),
            "weeks" => Ok(CadenceUnit::Weeks),
            "months" => Ok(CadenceUnit::Months),
            "years" => Ok(CadenceUnit::Years),
            _ => Err(format!("unknown cadence unit: {}", s)),
        }
    }
}

/// How often a habit must be satisfied: once per `multiple` units.
///
/// `multiple` is always >= 1; the storage layer rejects anything else when
/// reading records back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    pub unit: CadenceUnit,
    pub multiple: u32,
}

impl Cadence {
    pub fn new(unit: CadenceUnit, multiple: u32) -> Self {
        Self { unit, multiple }
    }

    /// Human-friendly label, e.g. "daily" or "every 2 weeks".
    pub fn label(&self) -> String {
        match (self.unit, self.multiple) {
            (CadenceUnit::Days, 1) => "daily".to_string(),
            (CadenceUnit::Weeks, 1) => "weekly".to_string(),
            (CadenceUnit::Months, 1) => "monthly".to_string(),
            (CadenceUnit::Years, 1) => "yearly".to_string(),
            (unit, 1) => format!("every {}", unit.as_str().trim_end_matches('s')),
            (unit, n) => format!("every {} {}", n, unit),
        }
    }
}

impl std::fmt::Display for Cadence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ============================================
// Habit
// ============================================

/// A recurring behavior tracked by a user.
///
/// The cadence and start instant are immutable as far as the statistics
/// engine is concerned; the storage layer owns all mutation (rename,
/// cadence edits, archiving).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Habit {
    /// Unique identifier
    pub id: String,
    /// Owning user
    pub user_id: String,
    /// Display name, irrelevant to computation
    pub name: String,
    /// Polarity: normal or avoidance
    pub kind: HabitKind,
    /// How often the habit must be satisfied
    pub cadence: Cadence,
    /// First instant the habit is active; periods before this are undefined
    pub started_at: DateTime<Utc>,
    /// Inactive habits are excluded from aggregation at the storage level
    pub is_active: bool,
    /// When the record was created
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// The habit's start date at day granularity (UTC). All period
    /// boundaries are anchored here.
    pub fn starts_on(&self) -> NaiveDate {
        self.started_at.date_naive()
    }
}

// ============================================
// Log entries
// ============================================

/// What a log entry records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryAction {
    /// The tracked behavior occurred
    Done,
    /// The period is explicitly excused
    Skipped,
}

impl EntryAction {
    /// Returns the identifier used in database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryAction::Done => "done",
            EntryAction::Skipped => "skipped",
        }
    }
}

impl std::fmt::Display for EntryAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for EntryAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "done" => Ok(EntryAction::Done),
            "skipped" => Ok(EntryAction::Skipped),
            _ => Err(format!("unknown entry action: {}", s)),
        }
    }
}

/// A single recorded action against a habit.
///
/// Entries are created when a user logs an action and only ever deleted,
/// never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique identifier
    pub id: String,
    /// Habit this entry belongs to
    pub habit_id: String,
    /// Done or skipped
    pub action: EntryAction,
    /// Timestamp of the real-world action
    pub occurred_at: DateTime<Utc>,
}

impl LogEntry {
    /// The entry's date at day granularity (UTC), which is what attributes
    /// it to a period.
    pub fn occurred_on(&self) -> NaiveDate {
        self.occurred_at.date_naive()
    }
}

// ============================================
// Snapshots
// ============================================

/// A habit together with its full entry history, as fetched from storage.
///
/// This is the read-shape the statistics engine consumes; it is fetched
/// once per request and never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HabitWithEntries {
    pub habit: Habit,
    pub entries: Vec<LogEntry>,
}

impl HabitWithEntries {
    /// Lifetime count of done entries.
    pub fn total_completed(&self) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.action == EntryAction::Done)
            .count() as u32
    }

    /// Lifetime count of skipped entries.
    pub fn total_skipped(&self) -> u32 {
        self.entries
            .iter()
            .filter(|e| e.action == EntryAction::Skipped)
            .count() as u32
    }
}
