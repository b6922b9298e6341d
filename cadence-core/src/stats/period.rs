//! Period resolution
//!
//! A habit's cadence tiles the timeline from its start date into
//! half-open, non-overlapping periods. This module computes the period a
//! given reference instant falls into and classifies it as completed,
//! skipped, or neither, based on the habit's log entries.
//!
//! All boundaries are anchored at the habit's start date and computed at
//! day granularity in UTC. Month and year arithmetic always adds whole
//! months from the anchor, clamping the day-of-month (Jan 31 + 1 month =
//! Feb 28, or Feb 29 in leap years); because every block start is derived
//! from the anchor rather than from the previous block, Jan 31 + 2 months
//! is Mar 31, not Mar 28.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use serde::Serialize;

use crate::types::{CadenceUnit, EntryAction, Habit, HabitKind, LogEntry};

/// One resolved period of a habit's cadence timeline.
///
/// `starts_on`/`ends_on` are a half-open day range: an entry dated
/// `ends_on` belongs to the next period. A zero-length range (both equal)
/// means the reference date predates the habit; callers must not tally
/// such periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedPeriod {
    /// First day of the period (inclusive)
    pub starts_on: NaiveDate,
    /// Day after the last day of the period (exclusive)
    pub ends_on: NaiveDate,
    /// Satisfied under the habit's polarity rule, and not skipped
    pub completed: bool,
    /// At least one skipped entry falls in the period
    pub skipped: bool,
    /// The cadence multiple, informational only
    pub required_count: u32,
    /// Done entries counted in the period
    pub actual_count: u32,
}

impl ResolvedPeriod {
    /// True when the reference date predates the habit's start.
    pub fn is_empty(&self) -> bool {
        self.starts_on == self.ends_on
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.starts_on && day < self.ends_on
    }
}

/// Resolve the period containing `reference` and classify it from the
/// habit's entries.
pub fn resolve_period(
    habit: &Habit,
    entries: &[LogEntry],
    reference: DateTime<Utc>,
) -> ResolvedPeriod {
    resolve_on(habit, entries, reference.date_naive())
}

/// Day-granularity variant of [`resolve_period`]; the aggregator walks
/// calendar days directly.
pub fn resolve_on(habit: &Habit, entries: &[LogEntry], on: NaiveDate) -> ResolvedPeriod {
    let start = habit.starts_on();
    if on < start {
        // The habit did not exist yet: a zero-length sentinel at the start.
        return ResolvedPeriod {
            starts_on: start,
            ends_on: start,
            completed: false,
            skipped: false,
            required_count: habit.cadence.multiple,
            actual_count: 0,
        };
    }
    resolve_block(habit, entries, block_index(habit, on))
}

/// Resolve the period with the given block index (0 = the period starting
/// at the habit's start date). Used by the streak walk to step backward
/// without re-deriving boundaries from dates.
pub(crate) fn resolve_block(habit: &Habit, entries: &[LogEntry], index: u64) -> ResolvedPeriod {
    let (starts_on, ends_on) = block_bounds(habit, index);

    let mut actual_count = 0u32;
    let mut skipped = false;
    for entry in entries {
        let on = entry.occurred_on();
        if on < starts_on || on >= ends_on {
            continue;
        }
        match entry.action {
            EntryAction::Done => actual_count += 1,
            EntryAction::Skipped => skipped = true,
        }
    }

    // A skip dominates: the period is excused no matter what else is in it.
    let satisfied = match habit.kind {
        HabitKind::Normal => actual_count > 0,
        HabitKind::Avoidance => actual_count == 0,
    };

    ResolvedPeriod {
        starts_on,
        ends_on,
        completed: !skipped && satisfied,
        skipped,
        required_count: habit.cadence.multiple,
        actual_count,
    }
}

/// Index of the period block containing `on`, which must be on or after
/// the habit's start date.
pub(crate) fn block_index(habit: &Habit, on: NaiveDate) -> u64 {
    let start = habit.starts_on();
    let multiple = i64::from(habit.cadence.multiple.max(1));
    let elapsed_days = (on - start).num_days();

    match habit.cadence.unit {
        // Hour cadences are resolved at day granularity: the period is the
        // containing calendar day.
        CadenceUnit::Hours => elapsed_days as u64,
        CadenceUnit::Days => (elapsed_days / multiple) as u64,
        CadenceUnit::Weeks => (elapsed_days / (7 * multiple)) as u64,
        CadenceUnit::Months => {
            u64::from(full_months_between(start, on) / habit.cadence.multiple.max(1))
        }
        CadenceUnit::Years => {
            u64::from(full_months_between(start, on) / (12 * habit.cadence.multiple.max(1)))
        }
    }
}

/// Half-open day bounds of the period with the given block index.
pub(crate) fn block_bounds(habit: &Habit, index: u64) -> (NaiveDate, NaiveDate) {
    let start = habit.starts_on();
    let multiple = habit.cadence.multiple.max(1);

    match habit.cadence.unit {
        CadenceUnit::Hours => {
            let from = start + Duration::days(index as i64);
            (from, from + Duration::days(1))
        }
        CadenceUnit::Days => {
            let span = i64::from(multiple);
            let from = start + Duration::days(index as i64 * span);
            (from, from + Duration::days(span))
        }
        CadenceUnit::Weeks => {
            let span = 7 * i64::from(multiple);
            let from = start + Duration::days(index as i64 * span);
            (from, from + Duration::days(span))
        }
        CadenceUnit::Months => {
            let span = multiple;
            (
                add_months(start, index as u32 * span),
                add_months(start, (index as u32 + 1) * span),
            )
        }
        CadenceUnit::Years => {
            let span = 12 * multiple;
            (
                add_months(start, index as u32 * span),
                add_months(start, (index as u32 + 1) * span),
            )
        }
    }
}

/// Anchored month addition with day-of-month clamping.
fn add_months(anchor: NaiveDate, months: u32) -> NaiveDate {
    anchor
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Number of whole (clamped) months elapsed from `start` to `on`.
fn full_months_between(start: NaiveDate, on: NaiveDate) -> u32 {
    let mut months =
        (on.year() - start.year()) * 12 + on.month() as i32 - start.month() as i32;
    if months > 0 && add_months(start, months as u32) > on {
        months -= 1;
    }
    months.max(0) as u32
}
