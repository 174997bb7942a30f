//! CLI definitions and argument types.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Exit code for success.
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code for failure.
pub const EXIT_FAILURE: i32 = 1;

#[derive(Parser)]
#[command(name = "perfsnap")]
#[command(about = "Windows performance-data snapshot reader")]
#[command(version)]
pub struct Cli {
    /// Show metrics summary after execution
    #[arg(long, global = true)]
    pub metrics: bool,

    /// Enable verbose output (sets RUST_LOG=debug)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress output (only show errors)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub silent: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode one category of a snapshot file and print its raw values
    Decode {
        /// Snapshot file (raw or .zst)
        #[arg(value_name = "SNAPSHOT")]
        file: PathBuf,

        /// Object (category) id
        #[arg(short, long)]
        object: u32,

        /// Directory of captured snapshots used to resolve parent instances
        #[arg(long, value_name = "DIR")]
        source_dir: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Compute counter values from two snapshots of the same category
    Compute {
        /// Earlier snapshot file
        #[arg(value_name = "OLD")]
        old: PathBuf,

        /// Later snapshot file
        #[arg(value_name = "NEW")]
        new: PathBuf,

        /// Object (category) id
        #[arg(short, long)]
        object: u32,

        /// Only report instances whose name matches this regex
        #[arg(long, value_name = "REGEX")]
        filter: Option<String>,

        /// Factor applied to percentage formulas
        #[arg(long, default_value = "100")]
        percent: f64,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// List every category of a capture directory
    Categories {
        /// Capture directory (holds Global.bin and one file per object id)
        #[arg(value_name = "DIR")]
        dir: PathBuf,

        /// Counter name table, one id or name per line
        #[arg(long, value_name = "FILE")]
        names: PathBuf,

        /// Counter help table, same layout as --names
        #[arg(long, value_name = "FILE")]
        help: Option<PathBuf>,

        /// Number of parallel decode jobs (0 = auto)
        #[arg(short = 'j', long, default_value = "0")]
        jobs: usize,
    },
}

/// Output format for decode and compute.
#[derive(Clone, Copy, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Text,
    /// Tab-separated rows (for scripting)
    Raw,
}
