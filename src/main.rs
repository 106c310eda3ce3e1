mod change;
mod cli;
mod config;
mod error;
mod output;
mod reconcile;
mod silencer;
mod watcher;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use change::RawChange;
use cli::{Cli, Commands, OutputFormat};
use config::SquashConfig;
use reconcile::{LiveFilesystem, Reconciler, TracingDiagnostics};
use silencer::PathSilencer;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Reconcile {
            batch,
            root,
            format,
        } => reconcile_batch(batch, root, &format),
        Commands::Watch {
            path,
            wait_for_delay_ms,
            format,
        } => watch(&path, wait_for_delay_ms, &format).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn reconcile_batch(batch: Option<PathBuf>, root: Option<PathBuf>, format: &OutputFormat) -> Result<()> {
    let input = match batch {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read batch {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read batch from stdin")?;
            buf
        }
    };
    let changes: Vec<RawChange> =
        serde_json::from_str(&input).context("batch is not a JSON array of raw changes")?;

    let (config, silencer) = match root {
        Some(root) => {
            let config = SquashConfig::load(&root);
            let silencer = PathSilencer::new(&root, &config)?;
            (config, silencer)
        }
        None => {
            let config = SquashConfig {
                respect_gitignore: false,
                ..SquashConfig::default()
            };
            let silencer = PathSilencer::new(Path::new("."), &config)?;
            (config, silencer)
        }
    };

    let reconciler = Reconciler::new(
        &silencer,
        &LiveFilesystem,
        &TracingDiagnostics,
        config.encoding_policy(),
    );
    let squashed = reconciler.reconcile(changes);
    output::print_changes(&squashed, format)
}

async fn watch(path: &Path, wait_for_delay_ms: Option<u64>, format: &OutputFormat) -> Result<()> {
    let mut config = SquashConfig::load(path);
    if let Some(ms) = wait_for_delay_ms {
        config.wait_for_delay_ms = ms;
    }

    let silencer = PathSilencer::new(path, &config)?;
    let (_handle, mut batches) = watcher::start_watcher(path, &config)?;
    tracing::info!(root = %path.display(), "watching");

    let reconciler = Reconciler::new(
        &silencer,
        &LiveFilesystem,
        &TracingDiagnostics,
        config.encoding_policy(),
    );

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    // One batch at a time: grouping and squashing assume a closed batch.
    loop {
        tokio::select! {
            batch = batches.recv() => {
                let Some(batch) = batch else { break };
                let squashed = reconciler.reconcile(batch);
                if !squashed.is_empty() {
                    output::print_changes(&squashed, format)?;
                }
            }
            _ = &mut shutdown => break,
        }
    }

    Ok(())
}
