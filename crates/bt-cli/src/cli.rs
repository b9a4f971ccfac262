//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Browser time tracker.
///
/// Attributes browsing time to pages from browser lifecycle signals and
/// hands the resulting log to a classifier.
#[derive(Debug, Parser)]
#[command(name = "bt", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply browser signals (JSON lines) from the host.
    Signal {
        /// Read signals from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show the open page and recorded history.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Summarize recorded time per page title.
    Report {
        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Send the history to the classification backend and clear what
        /// it accepted.
        #[arg(long, conflicts_with = "history")]
        classify: bool,

        /// List what the classification backend recorded most recently.
        #[arg(long)]
        history: bool,
    },

    /// Clear all local tracking data.
    Wipe {
        /// Also wipe the classification backend's stored logs.
        #[arg(long)]
        server: bool,
    },
}
