//! CLI command implementations for streaks.
//!
//! Provides subcommand handlers for:
//! - `streaks add | edit | archive | delete` — habit management
//! - `streaks done | skip | undo` — log a day for a habit
//! - `streaks list` / `streaks show` — statistics as table, JSON, or CSV
//! - `streaks history` — a habit's entries
//! - `streaks activity` — the recent activity log
//! - `streaks config show|init|set|reset` — configuration management

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use colored::{ColoredString, Colorize};

use crate::activity::{ActivityEvent, ActivityLog};
use crate::config::{self, StreaksConfig};
use crate::stats::EventStatus;
use crate::store::{Entry, HabitPatch, HabitView, NewEntry, NewHabit, Store};
use crate::validation;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// The reference date for statistics: `--today` if given, else local today.
pub fn resolve_today(arg: Option<&str>) -> Result<NaiveDate> {
    match arg {
        Some(raw) => validation::date(raw).context("invalid --today"),
        None => Ok(Local::now().date_naive()),
    }
}

/// `--date` if given, else the reference date.
fn entry_date(date: Option<String>, today: NaiveDate) -> String {
    date.unwrap_or_else(|| today.format("%Y-%m-%d").to_string())
}

// ---------------------------------------------------------------------------
// streaks add | edit | archive | delete
// ---------------------------------------------------------------------------

/// Create a habit.
pub fn run_add(cfg: &StreaksConfig, new: NewHabit, today: NaiveDate) -> Result<()> {
    let mut store = Store::open_default(cfg)?;
    let habit = store.create_habit(new)?;
    println!(
        "{} Created habit {} {}",
        "✓".green().bold(),
        format!("#{}", habit.id).dimmed(),
        paint_name(&habit.name, &habit.color)
    );
    print_view_summary(&HabitView::build(&habit, today));
    Ok(())
}

/// Update a habit's static fields.
pub fn run_edit(cfg: &StreaksConfig, id: u64, patch: HabitPatch) -> Result<()> {
    if patch.is_empty() {
        anyhow::bail!("nothing to change. Pass --name, --description, --color, or --icon.");
    }
    let mut store = Store::open_default(cfg)?;
    let habit = store.update_habit(id, patch)?;
    println!(
        "{} Updated habit {} {}",
        "✓".green().bold(),
        format!("#{}", habit.id).dimmed(),
        paint_name(&habit.name, &habit.color)
    );
    Ok(())
}

/// Archive (soft-delete) a habit.
pub fn run_archive(cfg: &StreaksConfig, id: u64) -> Result<()> {
    let mut store = Store::open_default(cfg)?;
    let habit = store.archive_habit(id)?;
    println!(
        "{} Archived {} {}",
        "✓".green().bold(),
        format!("#{}", habit.id).dimmed(),
        habit.name
    );
    println!(
        "  {}",
        "Archived habits are hidden from `streaks list` unless --all is given.".dimmed()
    );
    Ok(())
}

/// Permanently delete a habit and its entries.
pub fn run_delete(cfg: &StreaksConfig, id: u64) -> Result<()> {
    let mut store = Store::open_default(cfg)?;
    let name = store.get_habit(id)?.name.clone();
    store.delete_habit(id)?;
    println!(
        "{} Deleted {} {}",
        "✓".green().bold(),
        format!("#{id}").dimmed(),
        name
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// streaks done | skip | undo
// ---------------------------------------------------------------------------

/// Mark a day completed.
pub fn run_done(
    cfg: &StreaksConfig,
    id: u64,
    date: Option<String>,
    note: Option<String>,
    today: NaiveDate,
) -> Result<()> {
    let new = NewEntry {
        date: entry_date(date, today),
        notes: note,
        reason: None,
    };
    mark(cfg, id, new, EventStatus::Completed, today)
}

/// Mark a day skipped.
pub fn run_skip(
    cfg: &StreaksConfig,
    id: u64,
    date: Option<String>,
    reason: Option<String>,
    note: Option<String>,
    today: NaiveDate,
) -> Result<()> {
    let new = NewEntry {
        date: entry_date(date, today),
        notes: note,
        reason,
    };
    mark(cfg, id, new, EventStatus::Skipped, today)
}

fn mark(
    cfg: &StreaksConfig,
    id: u64,
    new: NewEntry,
    status: EventStatus,
    today: NaiveDate,
) -> Result<()> {
    let mut store = Store::open_default(cfg)?;
    let entry = store.mark(id, new, status)?;
    let view = store.view(id, today)?;

    println!(
        "{} {} {} on {}",
        "✓".green().bold(),
        paint_name(&view.name, &view.color),
        colorize_status(status),
        entry.date
    );
    print_view_summary(&view);
    Ok(())
}

/// Remove the entry on a day.
pub fn run_undo(cfg: &StreaksConfig, id: u64, date: Option<String>, today: NaiveDate) -> Result<()> {
    let date = validation::date(&entry_date(date, today))?;
    let mut store = Store::open_default(cfg)?;
    store.remove_entry(id, date)?;
    let view = store.view(id, today)?;

    println!(
        "{} Removed entry for {} on {}",
        "✓".green().bold(),
        paint_name(&view.name, &view.color),
        date
    );
    print_view_summary(&view);
    Ok(())
}

fn print_view_summary(view: &HabitView) {
    println!(
        "  {} {}  {} {}  {} {:.1}%",
        "Streak:".bold(),
        view.stats.current_streak,
        "Best:".bold(),
        view.stats.longest_streak,
        "Rate:".bold(),
        view.stats.completion_rate,
    );
}

// ---------------------------------------------------------------------------
// streaks list
// ---------------------------------------------------------------------------

/// Show statistics for every habit.
pub fn run_list(
    cfg: &StreaksConfig,
    include_archived: bool,
    format: OutputFormat,
    today: NaiveDate,
) -> Result<()> {
    let store = Store::open_default(cfg)?;
    let views = store.views(include_archived, today);

    if views.is_empty() && format == OutputFormat::Table {
        println!(
            "{}",
            "No habits yet. Create one with `streaks add <name>`.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "habits": views });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_views_csv(&views),
        OutputFormat::Table => print_views_table(&views, today, cfg.display.bar_width),
    }

    Ok(())
}

fn print_views_table(views: &[HabitView], today: NaiveDate, bar_width: usize) {
    println!("{}", format!("Habits — {today}").bold().cyan());
    println!("{}", "=".repeat(62 + bar_width));
    println!(
        "  {:>4}  {:<24} {:>5} {:>7} {:>5}  {:<width$} {:>6}",
        "ID",
        "Habit",
        "Today",
        "Streak",
        "Best",
        "Completion",
        "",
        width = bar_width
    );
    println!("  {}", "-".repeat(60 + bar_width));

    for (i, view) in views.iter().enumerate() {
        let today_mark = if view.stats.completed_today {
            "✓".green().bold()
        } else {
            "·".dimmed()
        };
        let name = truncate(&view.name, 24);
        let name = if view.archived_at.is_some() {
            format!("{name:<24}").dimmed()
        } else {
            paint_name(&format!("{name:<24}"), &view.color)
        };
        let line = format!(
            "  {:>4}  {} {:>5} {:>7} {:>5}  {} {:>5.1}%",
            view.id,
            name,
            today_mark,
            view.stats.current_streak,
            view.stats.longest_streak,
            render_progress_bar(view.stats.completion_rate, bar_width),
            view.stats.completion_rate,
        );

        if i % 2 == 0 {
            println!("{line}");
        } else {
            println!("{}", line.dimmed());
        }
    }

    let done = views.iter().filter(|v| v.stats.completed_today).count();
    println!();
    println!(
        "  {} {}/{} done today",
        "Progress:".bold(),
        done,
        views.len()
    );
}

fn print_views_csv(views: &[HabitView]) {
    println!("id,name,color,current_streak,longest_streak,completion_rate,completed_today,archived");
    for v in views {
        println!(
            "{},{},{},{},{},{:.1},{},{}",
            v.id,
            csv_field(&v.name),
            v.color,
            v.stats.current_streak,
            v.stats.longest_streak,
            v.stats.completion_rate,
            v.stats.completed_today,
            v.archived_at.is_some(),
        );
    }
}

// ---------------------------------------------------------------------------
// streaks show
// ---------------------------------------------------------------------------

/// Number of days in the recent-activity strip of `streaks show`.
const RECENT_DAYS: i64 = 14;

/// Show one habit's statistics and its last two weeks.
pub fn run_show(cfg: &StreaksConfig, id: u64, format: OutputFormat, today: NaiveDate) -> Result<()> {
    let store = Store::open_default(cfg)?;
    let habit = store.get_habit(id)?;
    let view = HabitView::build(habit, today);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
        OutputFormat::Csv => print_views_csv(std::slice::from_ref(&view)),
        OutputFormat::Table => {
            println!("{}", paint_name(&view.name, &view.color).bold());
            println!("{}", "=".repeat(40));
            if let Some(description) = &view.description {
                println!("  {}", description.dimmed());
            }
            println!("  {} {}", "Created:       ".bold(), view.created_at.date());
            if let Some(archived) = view.archived_at {
                println!("  {} {}", "Archived:      ".bold(), archived.date());
            }
            println!(
                "  {} {}",
                "Current streak:".bold(),
                view.stats.current_streak
            );
            println!(
                "  {} {}",
                "Longest streak:".bold(),
                view.stats.longest_streak
            );
            println!(
                "  {} {:.1}%",
                "Completion:    ".bold(),
                view.stats.completion_rate
            );
            println!(
                "  {} {}",
                "Done today:    ".bold(),
                if view.stats.completed_today {
                    "yes".green()
                } else {
                    "no".yellow()
                }
            );
            println!();

            let strip: Vec<String> = (0..RECENT_DAYS)
                .rev()
                .filter_map(|back| today.checked_sub_days(chrono::Days::new(back as u64)))
                .map(|day| match habit.entry_on(day).map(|e| e.status) {
                    Some(EventStatus::Completed) => "■".green().to_string(),
                    Some(EventStatus::Skipped) => "□".yellow().to_string(),
                    None => "·".dimmed().to_string(),
                })
                .collect();
            println!(
                "  {} {}",
                format!("Last {RECENT_DAYS} days:").bold(),
                strip.join(" ")
            );
            println!(
                "  {}",
                "■ completed  □ skipped  · not logged".dimmed()
            );
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// streaks history
// ---------------------------------------------------------------------------

/// List a habit's entries, newest first.
pub fn run_history(cfg: &StreaksConfig, id: u64, format: OutputFormat) -> Result<()> {
    let store = Store::open_default(cfg)?;
    let habit = store.get_habit(id)?;
    let entries = store.entries(id)?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({ "completions": entries });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Csv => print_entries_csv(&entries),
        OutputFormat::Table => {
            if entries.is_empty() {
                println!(
                    "{}",
                    format!("No entries for {} yet. Log one with `streaks done {id}`.", habit.name)
                        .yellow()
                );
                return Ok(());
            }
            println!(
                "{}",
                format!("History — {}", habit.name).bold().cyan()
            );
            println!("{}", "=".repeat(50));
            println!("  {:<12} {:<10} Notes", "Date", "Status");
            println!("  {}", "-".repeat(48));
            for entry in &entries {
                println!(
                    "  {:<12} {:<19} {}",
                    entry.date.to_string(),
                    colorize_status(entry.status),
                    entry.notes.as_deref().unwrap_or("").dimmed()
                );
            }
        }
    }

    Ok(())
}

fn print_entries_csv(entries: &[&Entry]) {
    println!("date,status,notes");
    for e in entries {
        println!(
            "{},{},{}",
            e.date,
            e.status,
            csv_field(e.notes.as_deref().unwrap_or(""))
        );
    }
}

// ---------------------------------------------------------------------------
// streaks activity
// ---------------------------------------------------------------------------

/// Show the most recent activity log events.
pub fn run_activity(cfg: &StreaksConfig, limit: usize, format: OutputFormat) -> Result<()> {
    let Some(log) = ActivityLog::from_config(&cfg.logging) else {
        println!(
            "{}",
            "Activity logging is disabled ([logging] enabled = false).".yellow()
        );
        return Ok(());
    };
    let events = log.recent(limit);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&events)?),
        OutputFormat::Csv => print_activity_csv(&events),
        OutputFormat::Table => {
            if events.is_empty() {
                println!("{}", "No activity recorded yet.".yellow());
                return Ok(());
            }
            println!("{}", "Recent Activity".bold().cyan());
            println!("{}", "=".repeat(60));
            for event in &events {
                println!(
                    "  {:<20} {:<16} #{:<4} {} {}",
                    event.timestamp.get(..19).unwrap_or(event.timestamp.as_str()),
                    event.action.to_string(),
                    event.habit_id,
                    event.habit_name.as_deref().unwrap_or(""),
                    event
                        .date
                        .map(|d| d.to_string())
                        .unwrap_or_default()
                        .dimmed()
                );
            }
        }
    }

    Ok(())
}

fn print_activity_csv(events: &[ActivityEvent]) {
    println!("timestamp,action,habit_id,habit_name,date");
    for e in events {
        println!(
            "{},{},{},{},{}",
            e.timestamp,
            e.action,
            e.habit_id,
            csv_field(e.habit_name.as_deref().unwrap_or("")),
            e.date.map(|d| d.to_string()).unwrap_or_default(),
        );
    }
}

// ---------------------------------------------------------------------------
// streaks config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective streaks Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.streaks/config.toml", global_exists);
    print_source(".streaks.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "STREAKS_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.streaks/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

/// Render a completion bar for a 0–100 rate. Rates above 100 fill the bar.
fn render_progress_bar(rate: f64, width: usize) -> String {
    let filled = ((rate / 100.0) * width as f64).round().clamp(0.0, width as f64) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Quote a CSV field if it contains a delimiter, quote, or newline.
fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Parse `#RRGGBB` into RGB components.
fn hex_to_rgb(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// A habit name in its own color.
fn paint_name(name: &str, color: &str) -> ColoredString {
    match hex_to_rgb(color) {
        Some((r, g, b)) => name.truecolor(r, g, b),
        None => name.normal(),
    }
}

fn colorize_status(status: EventStatus) -> ColoredString {
    match status {
        EventStatus::Completed => status.as_str().green(),
        EventStatus::Skipped => status.as_str().yellow(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
