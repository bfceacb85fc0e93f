use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use corpus_mirror::{ManifestStore, SyncOptions, SyncOrchestrator};
use corpus_mirror_cache::IndexCacheStore;
use corpus_mirror_github::{ArchiveFormat, HttpArchiveFetcher};

use crate::commands::format::print_report;
use crate::config::AppConfig;

/// Options for one `download` invocation, after CLI parsing.
pub struct DownloadArgs {
    pub target: PathBuf,
    pub cache: Option<PathBuf>,
    pub source: PathBuf,
    pub force: bool,
    pub language: Option<String>,
    pub jobs: Option<usize>,
}

/// Sync the mirror against the manifest and print a per-corpus summary.
///
/// The manifest is always saved before failures are reported. Any corpus
/// ending in a failed state, or a failed cache re-index, makes the command
/// return an error.
pub async fn run(args: DownloadArgs, config: &AppConfig, token: Option<String>) -> Result<()> {
    let format = ArchiveFormat::parse(&config.archive_format)
        .with_context(|| format!("unknown archive format `{}`", config.archive_format))?;

    let fetcher = HttpArchiveFetcher::new(token, config.archive_host.clone())
        .with_format(format)
        .with_timeout(Duration::from_secs(config.timeout_secs))?;

    let mut options = SyncOptions::new(&args.target);
    options.force = args.force;
    options.keep_language = args.language.unwrap_or_else(|| config.keep_language.clone());
    options.concurrency = args.jobs.unwrap_or(config.concurrency).max(1);

    let mut orchestrator = SyncOrchestrator::new(&fetcher, options);
    if let Some(dir) = &args.cache {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create cache directory: {}", dir.display()))?;
        let store = IndexCacheStore::open(&dir.join("index.db"))
            .with_context(|| format!("failed to open index cache in {}", dir.display()))?;
        orchestrator = orchestrator.with_cache(Arc::new(store));
    }

    let store = ManifestStore::new(&args.source);
    let report = orchestrator
        .run(&store)
        .await
        .with_context(|| format!("sync with manifest {} failed", args.source.display()))?;

    print_report(&report);

    if report.has_failures() {
        anyhow::bail!(
            "{} of {} corpora failed to update",
            report.failed(),
            report.outcomes.len()
        );
    }
    if report.reindex_failed() {
        anyhow::bail!("manifest saved, but the cache re-index failed");
    }

    Ok(())
}
