//! Aggregate statistics report
//!
//! Builds the statistics report for a user's active habits at a reference
//! instant: completion rates for the day/week/month/year windows with
//! period-over-period deltas, skip counts, the leading streak, and
//! lifetime totals.
//!
//! Day, week, and month windows are tallied by walking every calendar day
//! in the window and resolving each habit's period for that day. Year
//! windows are tallied by sampling once per calendar month-end instead of
//! per day. "This"-windows run from the calendar boundary to the
//! reference day inclusive; "last"-windows cover the full previous
//! calendar range. Weeks start on Monday.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::stats::period::{resolve_on, resolve_period, ResolvedPeriod};
use crate::stats::streak::current_streak;
use crate::types::HabitWithEntries;

// ============================================
// Report types (JSON boundary shape)
// ============================================

/// Window-level completion rates, deltas, and skip counts.
///
/// A rate change is `None` when the previous window's rate was 0 (the
/// "no prior data" case). It is never NaN or infinite.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub today_completion_rate: f64,
    pub weekly_completion_rate: f64,
    pub monthly_completion_rate: f64,
    pub yearly_completion_rate: f64,
    pub day_completion_rate_change: Option<f64>,
    pub week_completion_rate_change: Option<f64>,
    pub month_completion_rate_change: Option<f64>,
    pub year_completion_rate_change: Option<f64>,
    pub skipped_day: u32,
    pub skipped_week: u32,
    pub skipped_month: u32,
    pub skipped_year: u32,
}

/// The habit leading a streak ranking.
///
/// The wire field is `days` whatever the habit's cadence unit; it counts
/// periods.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakLeader {
    pub habit_name: String,
    pub days: u32,
}

/// Streak rankings across all habits.
///
/// No historical maximum is persisted, so `longest_streak` carries the
/// same leader as `current_streak`. `None` when there are no habits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakSummary {
    pub longest_streak: Option<StreakLeader>,
    pub current_streak: Option<StreakLeader>,
}

/// Lifetime totals across all habits.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallStats {
    pub total_completed_count: u64,
    pub all_habits_count: u32,
}

/// The full statistics report for one user at one reference instant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsReport {
    pub daily_stats: DailyStats,
    pub streaks: StreakSummary,
    pub overall_stats: OverallStats,
}

/// Detail statistics for a single habit.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitStats {
    pub total_completed_count: u32,
    pub total_skipped_count: u32,
    pub current_streak: u32,
    pub period: ResolvedPeriod,
}

// ============================================
// Window accumulation
// ============================================

/// Running tally for one calendar window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WindowTally {
    pub completed: u32,
    pub skipped: u32,
    pub total: u32,
}

impl WindowTally {
    fn record(&mut self, period: &ResolvedPeriod) {
        self.total += 1;
        if period.skipped {
            self.skipped += 1;
        }
        if period.completed {
            self.completed += 1;
        }
    }

    /// Completed share of non-skipped samples; 0 when nothing counted.
    pub fn completion_rate(&self) -> f64 {
        let denominator = self.total - self.skipped;
        if denominator == 0 {
            0.0
        } else {
            f64::from(self.completed) / f64::from(denominator)
        }
    }
}

/// Relative change between two rates, or `None` when there is no previous
/// rate to compare against.
pub fn rate_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous)
    }
}

/// Inclusive day range of one calendar window.
#[derive(Debug, Clone, Copy)]
struct Window {
    first: NaiveDate,
    last: NaiveDate,
}

impl Window {
    fn today(on: NaiveDate) -> Self {
        Self { first: on, last: on }
    }

    fn yesterday(on: NaiveDate) -> Self {
        let day = on - Duration::days(1);
        Self { first: day, last: day }
    }

    fn this_week(on: NaiveDate) -> Self {
        Self {
            first: week_start(on),
            last: on,
        }
    }

    fn last_week(on: NaiveDate) -> Self {
        let start = week_start(on) - Duration::days(7);
        Self {
            first: start,
            last: start + Duration::days(6),
        }
    }

    fn this_month(on: NaiveDate) -> Self {
        Self {
            first: month_start(on),
            last: on,
        }
    }

    fn last_month(on: NaiveDate) -> Self {
        let end = month_start(on) - Duration::days(1);
        Self {
            first: month_start(end),
            last: end,
        }
    }

    fn this_year(on: NaiveDate) -> Self {
        Self {
            first: year_start(on),
            last: on,
        }
    }

    fn last_year(on: NaiveDate) -> Self {
        Self {
            first: NaiveDate::from_ymd_opt(on.year() - 1, 1, 1).unwrap(),
            last: year_start(on) - Duration::days(1),
        }
    }
}

fn week_start(on: NaiveDate) -> NaiveDate {
    on - Duration::days(i64::from(on.weekday().num_days_from_monday()))
}

fn month_start(on: NaiveDate) -> NaiveDate {
    on.with_day(1).unwrap()
}

fn year_start(on: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(on.year(), 1, 1).unwrap()
}

fn month_end(on: NaiveDate) -> NaiveDate {
    let (year, month) = if on.month() == 12 {
        (on.year() + 1, 1)
    } else {
        (on.year(), on.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap() - Duration::days(1)
}

/// Tally every calendar day in the window, for every habit already
/// started by that day.
fn tally_days(habits: &[HabitWithEntries], window: Window) -> WindowTally {
    let mut tally = WindowTally::default();
    for h in habits {
        let mut day = window.first.max(h.habit.starts_on());
        while day <= window.last {
            tally.record(&resolve_on(&h.habit, &h.entries, day));
            day += Duration::days(1);
        }
    }
    tally
}

/// Tally one sample per calendar month-end in the window. Year windows
/// use this coarser sampling instead of a day walk.
fn tally_month_ends(habits: &[HabitWithEntries], window: Window) -> WindowTally {
    let mut tally = WindowTally::default();
    for h in habits {
        let mut sample = month_end(window.first);
        while sample <= window.last {
            if sample >= h.habit.starts_on() {
                tally.record(&resolve_on(&h.habit, &h.entries, sample));
            }
            sample = month_end(sample + Duration::days(1));
        }
    }
    tally
}

// ============================================
// Report assembly
// ============================================

/// Build the statistics report for a set of habit snapshots at the given
/// reference instant.
pub fn build_report(habits: &[HabitWithEntries], reference: DateTime<Utc>) -> StatsReport {
    let on = reference.date_naive();

    let today = tally_days(habits, Window::today(on));
    let yesterday = tally_days(habits, Window::yesterday(on));
    let this_week = tally_days(habits, Window::this_week(on));
    let last_week = tally_days(habits, Window::last_week(on));
    let this_month = tally_days(habits, Window::this_month(on));
    let last_month = tally_days(habits, Window::last_month(on));
    let this_year = tally_month_ends(habits, Window::this_year(on));
    let last_year = tally_month_ends(habits, Window::last_year(on));

    let today_rate = today.completion_rate();
    let week_rate = this_week.completion_rate();
    let month_rate = this_month.completion_rate();
    let year_rate = this_year.completion_rate();

    let leader = habits
        .iter()
        .map(|h| (h, current_streak(&h.habit, &h.entries, reference)))
        .max_by_key(|(_, streak)| *streak)
        .map(|(h, streak)| StreakLeader {
            habit_name: h.habit.name.clone(),
            days: streak,
        });

    let total_completed_count: u64 = habits
        .iter()
        .map(|h| u64::from(h.total_completed()))
        .sum();

    tracing::debug!(
        habits = habits.len(),
        reference = %on,
        today_rate,
        "Built stats report"
    );

    StatsReport {
        daily_stats: DailyStats {
            today_completion_rate: today_rate,
            weekly_completion_rate: week_rate,
            monthly_completion_rate: month_rate,
            yearly_completion_rate: year_rate,
            day_completion_rate_change: rate_change(today_rate, yesterday.completion_rate()),
            week_completion_rate_change: rate_change(week_rate, last_week.completion_rate()),
            month_completion_rate_change: rate_change(month_rate, last_month.completion_rate()),
            year_completion_rate_change: rate_change(year_rate, last_year.completion_rate()),
            skipped_day: today.skipped,
            skipped_week: this_week.skipped,
            skipped_month: this_month.skipped,
            skipped_year: this_year.skipped,
        },
        streaks: StreakSummary {
            longest_streak: leader.clone(),
            current_streak: leader,
        },
        overall_stats: OverallStats {
            total_completed_count,
            all_habits_count: habits.len() as u32,
        },
    }
}

/// Detail statistics for one habit: lifetime totals, current streak, and
/// the state of the period containing `reference`.
pub fn habit_stats(snapshot: &HabitWithEntries, reference: DateTime<Utc>) -> HabitStats {
    HabitStats {
        total_completed_count: snapshot.total_completed(),
        total_skipped_count: snapshot.total_skipped(),
        current_streak: current_streak(&snapshot.habit, &snapshot.entries, reference),
        period: resolve_period(&snapshot.habit, &snapshot.entries, reference),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Cadence, CadenceUnit, EntryAction, Habit, HabitKind, LogEntry};

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn snapshot(
        name: &str,
        kind: HabitKind,
        unit: CadenceUnit,
        starts: &str,
        entries: Vec<(EntryAction, &str)>,
    ) -> HabitWithEntries {
        let habit = Habit {
            id: format!("h-{}", name),
            user_id: "u1".to_string(),
            name: name.to_string(),
            kind,
            cadence: Cadence::new(unit, 1),
            started_at: ts(starts),
            is_active: true,
            created_at: ts(starts),
        };
        let entries = entries
            .into_iter()
            .enumerate()
            .map(|(i, (action, at))| LogEntry {
                id: format!("e-{}-{}", name, i),
                habit_id: habit.id.clone(),
                action,
                occurred_at: ts(at),
            })
            .collect();
        HabitWithEntries { habit, entries }
    }

    #[test]
    fn test_empty_report_is_all_zero() {
        let report = build_report(&[], ts("2025-02-10T12:00:00Z"));
        assert_eq!(report.daily_stats.today_completion_rate, 0.0);
        assert!(report.daily_stats.day_completion_rate_change.is_none());
        assert!(report.streaks.current_streak.is_none());
        assert!(report.streaks.longest_streak.is_none());
        assert_eq!(report.overall_stats.all_habits_count, 0);
        assert_eq!(report.overall_stats.total_completed_count, 0);
    }

    #[test]
    fn test_single_habit_done_today() {
        let habits = vec![snapshot(
            "water",
            HabitKind::Normal,
            CadenceUnit::Days,
            "2025-02-03T00:00:00Z",
            vec![
                (EntryAction::Done, "2025-02-09T08:00:00Z"),
                (EntryAction::Done, "2025-02-10T08:00:00Z"),
            ],
        )];
        // Feb 10 2025 is a Monday.
        let report = build_report(&habits, ts("2025-02-10T12:00:00Z"));

        assert_eq!(report.daily_stats.today_completion_rate, 1.0);
        // This week is just Monday so far.
        assert_eq!(report.daily_stats.weekly_completion_rate, 1.0);
        assert_eq!(report.overall_stats.total_completed_count, 2);
        let leader = report.streaks.current_streak.unwrap();
        assert_eq!(leader.habit_name, "water");
        assert_eq!(leader.days, 2);
    }

    #[test]
    fn test_rate_change_against_yesterday() {
        // Done yesterday and today: both rates 1.0, change 0.
        let habits = vec![snapshot(
            "stretch",
            HabitKind::Normal,
            CadenceUnit::Days,
            "2025-02-03T00:00:00Z",
            vec![
                (EntryAction::Done, "2025-02-09T08:00:00Z"),
                (EntryAction::Done, "2025-02-10T08:00:00Z"),
            ],
        )];
        let report = build_report(&habits, ts("2025-02-10T12:00:00Z"));
        assert_eq!(report.daily_stats.day_completion_rate_change, Some(0.0));

        // Nothing done yesterday: no baseline, change undefined.
        let habits = vec![snapshot(
            "stretch",
            HabitKind::Normal,
            CadenceUnit::Days,
            "2025-02-03T00:00:00Z",
            vec![(EntryAction::Done, "2025-02-10T08:00:00Z")],
        )];
        let report = build_report(&habits, ts("2025-02-10T12:00:00Z"));
        assert!(report.daily_stats.day_completion_rate_change.is_none());
    }

    #[test]
    fn test_skipped_days_are_excused_from_rates() {
        // Mon-Wed window: done Mon, skipped Tue, nothing Wed.
        let habits = vec![snapshot(
            "run",
            HabitKind::Normal,
            CadenceUnit::Days,
            "2025-02-03T00:00:00Z",
            vec![
                (EntryAction::Done, "2025-02-10T08:00:00Z"),
                (EntryAction::Skipped, "2025-02-11T08:00:00Z"),
            ],
        )];
        let report = build_report(&habits, ts("2025-02-12T12:00:00Z"));

        // 3 sampled days, 1 skipped, 1 of the remaining 2 completed.
        assert_eq!(report.daily_stats.skipped_week, 1);
        assert_eq!(report.daily_stats.weekly_completion_rate, 0.5);
    }

    #[test]
    fn test_avoidance_habit_counts_clean_days() {
        let habits = vec![snapshot(
            "no-sugar",
            HabitKind::Avoidance,
            CadenceUnit::Days,
            "2025-02-03T00:00:00Z",
            vec![(EntryAction::Done, "2025-02-11T20:00:00Z")],
        )];
        // Wed Feb 12: week is Mon-Wed, Tue had the lapse.
        let report = build_report(&habits, ts("2025-02-12T12:00:00Z"));
        assert!((report.daily_stats.weekly_completion_rate - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(report.daily_stats.today_completion_rate, 1.0);
    }

    #[test]
    fn test_habit_not_started_is_not_counted() {
        let habits = vec![snapshot(
            "future",
            HabitKind::Normal,
            CadenceUnit::Days,
            "2025-06-01T00:00:00Z",
            vec![],
        )];
        let report = build_report(&habits, ts("2025-02-10T12:00:00Z"));
        assert_eq!(report.daily_stats.today_completion_rate, 0.0);
        assert_eq!(report.daily_stats.weekly_completion_rate, 0.0);
        assert_eq!(report.daily_stats.skipped_week, 0);
    }

    #[test]
    fn test_year_window_samples_month_ends() {
        // A daily habit done every day of January and February.
        let dates: Vec<String> = (1..=31)
            .map(|d| format!("2025-01-{:02}T08:00:00Z", d))
            .chain((1..=28).map(|d| format!("2025-02-{:02}T08:00:00Z", d)))
            .collect();
        let entries: Vec<(EntryAction, &str)> = dates
            .iter()
            .map(|at| (EntryAction::Done, at.as_str()))
            .collect();
        let habits = vec![snapshot(
            "journal",
            HabitKind::Normal,
            CadenceUnit::Days,
            "2025-01-01T00:00:00Z",
            entries,
        )];

        // Mid-March: samples are Jan 31 and Feb 28 only.
        let report = build_report(&habits, ts("2025-03-15T12:00:00Z"));
        assert_eq!(report.daily_stats.yearly_completion_rate, 1.0);
        assert!(report.daily_stats.year_completion_rate_change.is_none());
    }

    #[test]
    fn test_streak_leader_across_habits() {
        let habits = vec![
            snapshot(
                "short",
                HabitKind::Normal,
                CadenceUnit::Days,
                "2025-02-03T00:00:00Z",
                vec![(EntryAction::Done, "2025-02-10T08:00:00Z")],
            ),
            snapshot(
                "long",
                HabitKind::Normal,
                CadenceUnit::Days,
                "2025-02-03T00:00:00Z",
                vec![
                    (EntryAction::Done, "2025-02-08T08:00:00Z"),
                    (EntryAction::Done, "2025-02-09T08:00:00Z"),
                    (EntryAction::Done, "2025-02-10T08:00:00Z"),
                ],
            ),
        ];
        let report = build_report(&habits, ts("2025-02-10T12:00:00Z"));
        let current = report.streaks.current_streak.unwrap();
        assert_eq!(current.habit_name, "long");
        assert_eq!(current.days, 3);
        // No persisted maximum: longest mirrors current.
        let longest = report.streaks.longest_streak.unwrap();
        assert_eq!(longest.habit_name, "long");
        assert_eq!(longest.days, 3);
    }

    #[test]
    fn test_habit_stats_detail() {
        let snap = snapshot(
            "read",
            HabitKind::Normal,
            CadenceUnit::Days,
            "2025-02-03T00:00:00Z",
            vec![
                (EntryAction::Done, "2025-02-09T08:00:00Z"),
                (EntryAction::Done, "2025-02-10T08:00:00Z"),
                (EntryAction::Skipped, "2025-02-05T08:00:00Z"),
            ],
        );
        let stats = habit_stats(&snap, ts("2025-02-10T12:00:00Z"));
        assert_eq!(stats.total_completed_count, 2);
        assert_eq!(stats.total_skipped_count, 1);
        assert_eq!(stats.current_streak, 2);
        assert!(stats.period.completed);
    }

    #[test]
    fn test_window_tally_rate_guards_zero_denominator() {
        let tally = WindowTally {
            completed: 0,
            skipped: 3,
            total: 3,
        };
        assert_eq!(tally.completion_rate(), 0.0);
        assert_eq!(WindowTally::default().completion_rate(), 0.0);
    }

    #[test]
    fn test_rate_change_has_no_non_finite_values() {
        assert_eq!(rate_change(0.5, 0.0), None);
        assert_eq!(rate_change(0.0, 0.0), None);
        assert_eq!(rate_change(0.75, 0.5), Some(0.5));
        assert_eq!(rate_change(0.25, 0.5), Some(-0.5));
    }
}
