//! cadence-report - habit statistics CLI
//!
//! Renders the statistics report for a user's active habits, or a detail
//! view for a single habit, from the local cadence database.

use anyhow::{Context, Result};
use cadence_core::format::{format_day, format_rate, format_rate_change};
use cadence_core::stats::{habit_stats, HabitStats, StatsReport};
use cadence_core::{build_report, Config, Database, HabitWithEntries};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "cadence-report")]
#[command(about = "Cadence - your habit statistics")]
#[command(version)]
struct Args {
    /// User whose habits to report on
    #[arg(long, default_value = "default")]
    user: String,

    /// Reference date (format: YYYY-MM-DD, default: today)
    #[arg(long)]
    date: Option<String>,

    /// Show a single habit instead of the full report
    #[arg(long)]
    habit: Option<String>,

    /// Export format (json)
    #[arg(long)]
    export: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration and database
    let config = Config::load().context("failed to load configuration")?;
    let _log_guard = cadence_core::logging::init(&config.logging).ok();

    let db = Database::open(&config.database_path()).context("failed to open database")?;
    db.migrate().context("failed to run migrations")?;

    // Determine the reference instant
    let reference = match &args.date {
        Some(date_str) => {
            let date: NaiveDate = date_str
                .parse()
                .context("Invalid date format. Use YYYY-MM-DD (e.g., 2025-02-10)")?;
            date.and_hms_opt(12, 0, 0)
                .map(|dt| dt.and_utc())
                .context("Invalid reference date")?
        }
        None => Utc::now(),
    };

    if let Some(habit_id) = &args.habit {
        let snapshot = db
            .get_habit_with_entries(habit_id)
            .context("failed to load habit")?;
        let stats = habit_stats(&snapshot, reference);

        match args.export.as_deref() {
            Some("json") => println!("{}", serde_json::to_string_pretty(&stats)?),
            Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
            None => print_habit_detail(&snapshot, &stats),
        }
        return Ok(());
    }

    let habits = db
        .list_active_habits(&args.user)
        .context("failed to load habits")?;
    let report = build_report(&habits, reference);

    match args.export.as_deref() {
        Some("json") => println!("{}", serde_json::to_string_pretty(&report)?),
        Some(other) => anyhow::bail!("Unknown export format: {}. Use 'json'", other),
        None => print_report(&report, reference),
    }

    Ok(())
}

fn print_report(report: &StatsReport, reference: DateTime<Utc>) {
    let title = format!("HABITS ON {}", format_day(reference.date_naive()).to_uppercase());

    println!();
    println!("╭{}╮", "─".repeat(52));
    println!("│{:^52}│", title);
    println!("╰{}╯", "─".repeat(52));
    println!();

    if report.overall_stats.all_habits_count == 0 {
        println!("  No active habits yet.");
        println!();
        return;
    }

    let daily = &report.daily_stats;

    println!("COMPLETION");
    println!(
        "   Today:  {:>5}  ({} vs yesterday)",
        format_rate(daily.today_completion_rate),
        format_rate_change(daily.day_completion_rate_change)
    );
    println!(
        "   Week:   {:>5}  ({} vs last week)",
        format_rate(daily.weekly_completion_rate),
        format_rate_change(daily.week_completion_rate_change)
    );
    println!(
        "   Month:  {:>5}  ({} vs last month)",
        format_rate(daily.monthly_completion_rate),
        format_rate_change(daily.month_completion_rate_change)
    );
    println!(
        "   Year:   {:>5}  ({} vs last year)",
        format_rate(daily.yearly_completion_rate),
        format_rate_change(daily.year_completion_rate_change)
    );
    println!();

    println!("SKIPS");
    println!(
        "   Today: {}   Week: {}   Month: {}   Year: {}",
        daily.skipped_day, daily.skipped_week, daily.skipped_month, daily.skipped_year
    );
    println!();

    println!("STREAK");
    match &report.streaks.current_streak {
        Some(leader) => {
            println!(
                "   {} - {} period{}",
                leader.habit_name,
                leader.days,
                if leader.days == 1 { "" } else { "s" }
            );
        }
        None => println!("   No streaks yet."),
    }
    println!();

    println!("OVERALL");
    println!(
        "   {} completions across {} habit{}",
        report.overall_stats.total_completed_count,
        report.overall_stats.all_habits_count,
        if report.overall_stats.all_habits_count == 1 {
            ""
        } else {
            "s"
        }
    );
    println!();
}

fn print_habit_detail(snapshot: &HabitWithEntries, stats: &HabitStats) {
    let habit = &snapshot.habit;

    println!();
    println!("{} ({})", habit.name, habit.cadence);
    println!("{}", "─".repeat(52));

    let period = &stats.period;
    if period.is_empty() {
        println!("   Not started yet (starts {})", format_day(period.starts_on));
    } else {
        let status = if period.skipped {
            "skipped"
        } else if period.completed {
            "completed"
        } else {
            "open"
        };
        println!(
            "   Current period: {} to {} - {}",
            format_day(period.starts_on),
            format_day(period.ends_on),
            status
        );
        println!(
            "   Logged {} of {} this period",
            period.actual_count, period.required_count
        );
    }

    println!(
        "   Streak: {} period{}",
        stats.current_streak,
        if stats.current_streak == 1 { "" } else { "s" }
    );
    println!(
        "   Lifetime: {} done, {} skipped",
        stats.total_completed_count, stats.total_skipped_count
    );
    println!();
}
