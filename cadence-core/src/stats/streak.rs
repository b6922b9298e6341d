//! Streak calculation
//!
//! The current streak is the number of consecutive qualifying periods
//! ending at the reference period. The walk starts at the period holding
//! the most recent done entry and steps backward one period at a time
//! until a period fails to qualify.
//!
//! The reference period itself gets one period of grace: if the latest
//! done entry sits in the immediately preceding period, the streak is
//! still alive, since the current period is open and not yet a miss. Only
//! once a full period has closed without a done entry does the streak
//! read 0.

use chrono::{DateTime, Utc};

use crate::stats::period::{block_bounds, block_index, resolve_block};
use crate::types::{EntryAction, Habit, LogEntry};

/// Count of consecutive qualifying periods ending at (and including) the
/// period holding the most recent done entry, evaluated at `reference`.
pub fn current_streak(habit: &Habit, entries: &[LogEntry], reference: DateTime<Utc>) -> u32 {
    let on = reference.date_naive();
    if on < habit.starts_on() {
        return 0;
    }

    let last_done = entries
        .iter()
        .filter(|e| e.action == EntryAction::Done)
        .map(|e| e.occurred_on())
        .max();
    let Some(last_done) = last_done else {
        return 0;
    };

    let current = block_index(habit, on);
    let (current_start, _) = block_bounds(habit, current);

    let anchor = if last_done >= current_start {
        current
    } else if current > 0 && last_done >= block_bounds(habit, current - 1).0 {
        // The open current period has no done entry yet; the streak ending
        // in the previous period still stands.
        current - 1
    } else {
        return 0;
    };

    let mut streak = 1u32;
    let mut index = anchor;
    while index > 0 {
        index -= 1;
        let period = resolve_block(habit, entries, index);
        if !period.completed {
            break;
        }
        streak += 1;
    }

    streak
}
