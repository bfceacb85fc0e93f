mod commands;
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::commands::download::DownloadArgs;

const MANIFEST_FILE: &str = "corpora.csv";

#[derive(Parser)]
#[command(name = "corpus-mirror")]
#[command(about = "Mirror versioned text corpora and prune them to a single language")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download corpora whose manifest version changed, then prune them
    Download {
        /// Mirror directory (one subdirectory per corpus)
        target: PathBuf,
        /// Directory for the metadata index cache; enables a full re-index
        #[arg(long)]
        cache: Option<PathBuf>,
        /// Manifest file (defaults to corpora.csv next to the executable)
        #[arg(long)]
        source: Option<PathBuf>,
        /// Re-download corpora that are already up to date
        #[arg(long)]
        force: bool,
        /// Language to keep when pruning (e.g. lat)
        #[arg(long)]
        language: Option<String>,
        /// Number of corpora to download at once
        #[arg(long)]
        jobs: Option<usize>,
    },
    /// Show which corpora are up to date
    Status {
        /// Manifest file (defaults to corpora.csv next to the executable)
        #[arg(long)]
        source: Option<PathBuf>,
    },
}

fn default_manifest_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("could not locate the running executable")?;
    let dir = exe
        .parent()
        .context("executable has no parent directory")?;
    Ok(dir.join(MANIFEST_FILE))
}

fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok()
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Download {
            target,
            cache,
            source,
            force,
            language,
            jobs,
        } => {
            let source = match source {
                Some(path) => path,
                None => default_manifest_path()?,
            };
            let app_config = config::load_config();

            let args = DownloadArgs {
                target,
                cache,
                source,
                force,
                language,
                jobs,
            };
            commands::download::run(args, &app_config, github_token()).await
        }
        Command::Status { source } => {
            let source = match source {
                Some(path) => path,
                None => default_manifest_path()?,
            };
            commands::status::run(&source)
        }
    }
}
