//! Command-line argument parsing.

use std::path::PathBuf;

use clap::Parser;

/// Replays a staking scenario against the accounting core.
#[derive(Parser, Debug, Clone)]
#[command(name = "tidepool-sim")]
#[command(about = "Replay staking actions and oracle reports from a JSON scenario")]
#[command(version)]
pub struct Cli {
    /// Scenario file (JSON).
    pub scenario: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the final summary as JSON.
    #[arg(long)]
    pub json: bool,

    /// Log failed actions and continue instead of stopping.
    #[arg(long)]
    pub keep_going: bool,

    /// Write the final pool snapshot to this file.
    #[arg(long)]
    pub snapshot_out: Option<PathBuf>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
