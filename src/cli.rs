use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Collapse noisy filesystem notifications into logical changes.
///
/// change-squash turns raw per-event notifications (renames, editor
/// temp-file saves, create-then-delete blips) into one added, modified,
/// removed or invalid-path entry per changed path.
#[derive(Parser, Debug)]
#[command(
    name = "change-squash",
    version,
    about,
    long_about = None,
    propagate_version = true,
)]
pub struct Cli {
    /// Log each stage's decisions to stderr (same as RUST_LOG=debug).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for change sets.
#[derive(Clone, Debug, ValueEnum, Default)]
pub enum OutputFormat {
    /// One `<action> <path>` line per changed path (default).
    #[default]
    Compact,
    /// One JSON object per batch with `modified`, `added`, `removed` and
    /// `invalid_file_path` lists.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Reconcile one recorded batch of raw changes against the live filesystem.
    ///
    /// The batch is a JSON array of raw change records, e.g.
    /// `[{"entry_kind":"file","root_dir":"/w","relative_path":"a.txt","change":"created"}]`.
    Reconcile {
        /// File holding the batch. Reads stdin when omitted or `-`.
        batch: Option<PathBuf>,

        /// Watched root whose change-squash.toml and .gitignore drive silencing.
        /// Without it only the built-in ignore rules apply.
        #[arg(long)]
        root: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },

    /// Watch a directory and print one change set per quiet period.
    ///
    /// Runs until interrupted with Ctrl-C.
    Watch {
        /// Directory to watch recursively.
        path: PathBuf,

        /// Override the quiet period (milliseconds) from change-squash.toml.
        #[arg(long)]
        wait_for_delay_ms: Option<u64>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Compact)]
        format: OutputFormat,
    },
}
