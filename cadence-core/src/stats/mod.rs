//! Statistics engine for cadence
//!
//! Pure functions over habit snapshots; no I/O and no wall-clock reads.
//! Every entry point takes the reference instant explicitly, so results
//! are deterministic and testable without mocking time.
//!
//! - [`period`] resolves the bounded calendar period a reference instant
//!   falls into and classifies it (completed / skipped / neither).
//! - [`streak`] walks backward period-by-period for the current streak.
//! - [`report`] aggregates calendar windows into the statistics report
//!   served to clients.
//!
//! The period resolver is the single source of truth for "was this habit
//! satisfied in this period"; the other two build on it.

pub mod period;
pub mod report;
pub mod streak;

pub use period::{resolve_on, resolve_period, ResolvedPeriod};
pub use report::{
    build_report, habit_stats, rate_change, DailyStats, HabitStats, OverallStats, StatsReport,
    StreakLeader, StreakSummary, WindowTally,
};
pub use streak::current_streak;
