mod cli;

use anyhow::Result;
use cadence::config::CadenceConfig;
use cadence::habit::Frequency;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use cli::habits::TodayFilter;

#[derive(Parser)]
#[command(name = "cadence", version, about = "Local-first habit tracker with streaks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a habit
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
        /// daily, weekly, or custom
        #[arg(long, default_value = "daily")]
        frequency: Frequency,
        /// Weekdays for a custom habit, e.g. monday,thursday
        #[arg(long, value_delimiter = ',')]
        days: Vec<String>,
    },
    /// Mark a habit done (or not done) for today or a given day
    Toggle {
        id: String,
        /// Day to toggle, YYYY-MM-DD (defaults to today)
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete a habit
    Delete { id: String },
    /// Show habits due today
    Today {
        #[arg(long, conflicts_with = "completed")]
        pending: bool,
        #[arg(long)]
        completed: bool,
    },
    /// List every habit
    List,
    /// Show success metrics and the current week
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Reload habits from the remote
    Pull,
    /// Recompute streaks whenever the day changes, until Ctrl-C
    Watch,
    /// Export all habits as JSON to stdout
    Export,
    /// Import habits from a JSON export
    Import { file: PathBuf },
    /// Check the local cache
    Doctor,
    /// Delete every locally cached habit
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = CadenceConfig::load()?;

    // Log to stderr so stdout stays clean for command output and exports.
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Add {
            name,
            description,
            frequency,
            days,
        } => cli::habits::add(&config, &name, description, frequency, days).await?,
        Command::Toggle { id, date } => cli::habits::toggle(&config, &id, date.as_deref()).await?,
        Command::Delete { id } => cli::habits::delete(&config, &id).await?,
        Command::Today { pending, completed } => {
            let filter = if pending {
                TodayFilter::Pending
            } else if completed {
                TodayFilter::Completed
            } else {
                TodayFilter::Due
            };
            cli::habits::today(&config, filter)?;
        }
        Command::List => cli::habits::list(&config)?,
        Command::Stats { json } => cli::stats::stats(&config, json)?,
        Command::Pull => cli::sync::pull(&config).await?,
        Command::Watch => cli::sync::watch(&config).await?,
        Command::Export => cli::export::export(&config)?,
        Command::Import { file } => cli::import::import(&config, &file).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
        Command::Reset => cli::reset::reset(&config)?,
    }

    Ok(())
}
