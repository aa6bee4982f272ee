//! CLI definitions for taskbeat.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// taskbeat CLI.
#[derive(Parser)]
#[command(name = "taskbeat")]
#[command(about = "Periodic job scheduler with an in-process worker pool")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true, env = "TASKBEAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (overrides the configured one)
    #[arg(short = 'l', long, global = true)]
    pub loglevel: Option<String>,

    /// Log file (overrides the configured one)
    #[arg(short = 'f', long, global = true)]
    pub logfile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the clock service until SIGTERM/SIGINT
    Beat {
        /// Detach from the terminal and run in the background
        #[arg(long)]
        detach: bool,

        /// PID file path
        #[arg(long)]
        pidfile: Option<PathBuf>,

        /// Schedule file path
        #[arg(short, long)]
        schedule: Option<PathBuf>,

        /// Tick interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,
    },

    /// Submit a job once
    Apply {
        /// Registered job name
        job: String,

        /// Positional arguments as a JSON array
        #[arg(long, default_value = "[]")]
        args: String,

        /// Delay execution by this many seconds
        #[arg(long)]
        countdown: Option<u64>,

        /// Run inline instead of on the worker pool
        #[arg(long)]
        eager: bool,
    },

    /// Print the persisted schedule
    Schedule {
        /// Schedule file path
        #[arg(short, long)]
        schedule: Option<PathBuf>,
    },
}
