use anyhow::Result;
use clap::{Parser, Subcommand};

use streaks::cli::{self, OutputFormat};
use streaks::config;
use streaks::store::{HabitPatch, NewHabit};
use streaks::web;

#[derive(Debug, Parser)]
#[command(name = "streaks")]
#[command(about = "Track daily habits: streaks, skips, and completion rates")]
struct App {
    /// Reference date for statistics (YYYY-MM-DD, default: local today)
    #[arg(long, global = true)]
    today: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new habit
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// Hex color, e.g. #3B82F6
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        icon: Option<String>,
    },
    /// List habits with their current statistics
    List {
        /// Include archived habits
        #[arg(long)]
        all: bool,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show one habit: statistics and the last two weeks
    Show {
        id: u64,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Change a habit's name, description, color, or icon
    Edit {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        /// New description ("" clears it)
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        color: Option<String>,
        /// New icon ("" clears it)
        #[arg(long)]
        icon: Option<String>,
    },
    /// Archive a habit (hidden from `list` unless --all)
    Archive { id: u64 },
    /// Permanently delete a habit and its history
    Delete { id: u64 },
    /// Mark a day as completed
    Done {
        id: u64,
        /// Day to mark (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Mark a day as skipped (does not break the streak)
    Skip {
        id: u64,
        /// Day to mark (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Why the day was skipped
        #[arg(long)]
        reason: Option<String>,
        #[arg(long)]
        note: Option<String>,
    },
    /// Remove the entry for a day
    Undo {
        id: u64,
        /// Day to clear (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<String>,
    },
    /// List a habit's entries, newest first
    History {
        id: u64,
        /// Output format: table (default), json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Show recent changes from the activity log
    Activity {
        /// Number of events to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Serve the JSON API
    Web {
        /// Listen address (default: [web].addr from config)
        #[arg(long)]
        addr: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective merged configuration
    Show,
    /// Write a default config file to ~/.streaks/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `general.default_color "#3B82F6"`
    Set { key: String, value: String },
    /// Reset the config file to defaults
    Reset,
}

/// Map a CLI text flag to a patch field where an empty string clears it.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.is_empty() { None } else { Some(v) })
}

fn main() -> Result<()> {
    let app = App::parse();
    let cfg = config::load();

    if !cfg.display.color {
        colored::control::set_override(false);
    }

    let today = cli::resolve_today(app.today.as_deref())?;

    match app.command {
        Commands::Add {
            name,
            description,
            color,
            icon,
        } => {
            let new = NewHabit {
                name,
                description,
                color,
                icon,
            };
            cli::run_add(&cfg, new, today)
        }
        Commands::List { all, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_list(&cfg, all, fmt, today)
        }
        Commands::Show { id, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_show(&cfg, id, fmt, today)
        }
        Commands::Edit {
            id,
            name,
            description,
            color,
            icon,
        } => {
            let patch = HabitPatch {
                name,
                description: clearable(description),
                color,
                icon: clearable(icon),
            };
            cli::run_edit(&cfg, id, patch)
        }
        Commands::Archive { id } => cli::run_archive(&cfg, id),
        Commands::Delete { id } => cli::run_delete(&cfg, id),
        Commands::Done { id, date, note } => cli::run_done(&cfg, id, date, note, today),
        Commands::Skip {
            id,
            date,
            reason,
            note,
        } => cli::run_skip(&cfg, id, date, reason, note, today),
        Commands::Undo { id, date } => cli::run_undo(&cfg, id, date, today),
        Commands::History { id, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_history(&cfg, id, fmt)
        }
        Commands::Activity { limit, format } => {
            let fmt = OutputFormat::from_str_opt(Some(&format));
            cli::run_activity(&cfg, limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
        Commands::Web { addr } => {
            let addr = addr.unwrap_or_else(|| cfg.web.addr.clone());
            let ctx = web::WebContext::from_config(&cfg)?;
            web::serve(&addr, &ctx)
        }
    }
}
