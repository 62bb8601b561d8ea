//! CLI argument parsing for habitual.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use habitual::Periodicity;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "hb",
    about = "Track habits and their streaks",
    version = env!("GIT_DESCRIBE"),
    after_help = "Logs are written to: ~/.local/share/habitual/logs/habitual.log"
)]
pub struct Cli {
    /// Path to the store directory (default: current directory)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a new store in the current directory
    Init,

    /// Create a new habit
    Create {
        /// Habit name
        name: String,

        /// Periodicity (daily, weekly, monthly)
        #[arg(short, long, default_value = "daily")]
        periodicity: Periodicity,
    },

    /// Rename a habit and change its periodicity (resets progress)
    Edit {
        /// Habit ID
        id: String,

        /// New name
        name: String,

        /// New periodicity (daily, weekly, monthly; default: unchanged)
        #[arg(short, long)]
        periodicity: Option<Periodicity>,
    },

    /// Delete a habit and its history
    Delete {
        /// Habit ID
        id: String,
    },

    /// Mark a habit as done for a day
    Complete {
        /// Habit ID
        id: String,

        /// Day to complete, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List habits with their streaks
    List {
        /// Filter by periodicity (daily, weekly, monthly)
        #[arg(short, long)]
        periodicity: Option<Periodicity>,
    },

    /// Show a habit, its streaks and task history
    Show {
        /// Habit ID
        id: String,
    },

    /// Show the habit with the longest current streak
    Longest,

    /// Rebuild the cache and reclaim database space
    Vacuum,
}
