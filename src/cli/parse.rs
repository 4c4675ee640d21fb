//! CLI parse: clap types for Sheetsmith. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetsmith")]
#[command(about = "Generate sprite sheets frame by frame with an image model")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Directory holding `config/` and the `.sheetsmith/` store
    #[arg(long, global = true, default_value = ".")]
    pub workspace: PathBuf,

    /// Read configuration from this file only
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug-level logs
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// No logs at all
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[arg(long, global = true, value_parser = ["trace", "debug", "info", "warn", "error", "off"])]
    pub log_level: Option<String>,

    #[arg(long, global = true, value_parser = ["json", "text"])]
    pub log_format: Option<String>,

    #[arg(long, global = true, value_parser = ["stdout", "stderr", "file"])]
    pub log_output: Option<String>,

    /// Destination when `--log-output file`
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate a sheet definition and store it as a draft sheet
    Import {
        /// Sheet definition file (.json or .toml)
        path: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check a sheet definition without storing it
    Validate {
        /// Sheet definition file (.json or .toml)
        path: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Generate frames for a stored sheet and wait for the run to finish
    Generate {
        /// Sheet id
        sheet_id: String,
        /// Frame ids to generate (default: every pending or failed frame)
        #[arg(long, value_delimiter = ',')]
        frames: Option<Vec<String>>,
        /// Scheduling priority (quality or speed)
        #[arg(long, default_value = "quality")]
        priority: String,
        /// Frames generated concurrently per batch (default depends on priority)
        #[arg(long)]
        batch_size: Option<usize>,
        /// World style file (.json or .toml) applied to every prompt
        #[arg(long)]
        world_style: Option<PathBuf>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show sheet status, progress and per-frame state
    Status {
        /// Sheet id
        sheet_id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List stored sheets
    List {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Fail frames left generating by an interrupted process and release their sheets
    Recover,
}
