use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;

use crate::fetch::{ArchiveFetcher, FetchError};
use crate::index::{IndexCache, IndexError, warm_cache};
use crate::manifest::{ManifestError, ManifestStore};
use crate::prune::{CorpusPruner, PruneError, PruneSummary};
use crate::record::Manifest;

/// Language kept when pruning unless configured otherwise.
pub const DEFAULT_KEEP_LANGUAGE: &str = "lat";

/// Errors that abort a whole synchronization run.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error("cannot prepare mirror directory {}: {reason}", path.display())]
    Mirror { path: PathBuf, reason: String },
}

/// Why a single corpus failed to update.
#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("prune failed: {0}")]
    Prune(#[from] PruneError),

    #[error("prune task did not complete: {0}")]
    Interrupted(String),
}

/// Terminal state of one manifest row after a run.
#[derive(Debug)]
pub enum CorpusOutcome {
    /// Already at the desired version; nothing was touched.
    Skipped { name: String, version: String },
    /// Fetched, pruned and committed.
    Updated {
        name: String,
        previous: String,
        version: String,
        path: PathBuf,
        summary: PruneSummary,
    },
    /// The row keeps its previous synced version and is retried next run.
    Failed {
        name: String,
        version: String,
        error: CorpusError,
    },
}

impl CorpusOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Skipped { name, .. } | Self::Updated { name, .. } | Self::Failed { name, .. } => {
                name
            }
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }

    pub fn is_updated(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// Result of a run whose manifest was saved.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// One outcome per manifest row, in manifest order.
    pub outcomes: Vec<CorpusOutcome>,
    /// Result of the bulk cache warm, if a cache was configured.
    pub reindex: Option<Result<usize, IndexError>>,
}

impl SyncReport {
    pub fn skipped(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn updated(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_updated()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    pub fn reindex_failed(&self) -> bool {
        matches!(self.reindex, Some(Err(_)))
    }
}

/// Settings for one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Root of the mirror; each corpus gets a subdirectory.
    pub target_dir: PathBuf,
    pub keep_language: String,
    /// Re-fetch rows that are already at their desired version.
    pub force: bool,
    /// Maximum number of corpora fetched at once.
    pub concurrency: usize,
}

impl SyncOptions {
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            keep_language: DEFAULT_KEEP_LANGUAGE.to_owned(),
            force: false,
            concurrency: 1,
        }
    }
}

/// Drives a run: decide, fetch, prune and commit each row, then save the
/// manifest once and optionally warm the index cache over the whole mirror.
pub struct SyncOrchestrator<'a> {
    fetcher: &'a dyn ArchiveFetcher,
    pruner: CorpusPruner,
    cache: Option<Arc<dyn IndexCache>>,
    options: SyncOptions,
}

impl<'a> SyncOrchestrator<'a> {
    pub fn new(fetcher: &'a dyn ArchiveFetcher, options: SyncOptions) -> Self {
        Self {
            fetcher,
            pruner: CorpusPruner::default(),
            cache: None,
            options,
        }
    }

    pub fn with_pruner(mut self, pruner: CorpusPruner) -> Self {
        self.pruner = pruner;
        self
    }

    /// Warm `cache` over the whole mirror after the manifest is saved.
    pub fn with_cache(mut self, cache: Arc<dyn IndexCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Load the manifest from `store`, sync every row and save it back.
    ///
    /// Per-corpus failures are reported in the returned outcomes; only
    /// manifest load/save problems fail the run. A cache warm failure is
    /// reported in [`SyncReport::reindex`] after the manifest is saved.
    pub async fn run(&self, store: &ManifestStore) -> Result<SyncReport, SyncError> {
        let mut manifest = store.load()?;

        std::fs::create_dir_all(&self.options.target_dir).map_err(|e| SyncError::Mirror {
            path: self.options.target_dir.clone(),
            reason: e.to_string(),
        })?;

        let outcomes = self.sync_manifest(&mut manifest).await;

        store.save(&manifest)?;

        let reindex = match &self.cache {
            Some(cache) => Some(self.warm(Arc::clone(cache)).await),
            None => None,
        };

        Ok(SyncReport { outcomes, reindex })
    }

    /// Sync every row of `manifest` in place.
    ///
    /// Rows are only mutated here, after all fetches have finished. Rows that
    /// share a mirror directory must not both be pending; the manifest loader
    /// rejects such manifests.
    pub async fn sync_manifest(&self, manifest: &mut Manifest) -> Vec<CorpusOutcome> {
        let mut outcomes: Vec<Option<CorpusOutcome>> = Vec::with_capacity(manifest.len());
        let mut pending = Vec::new();

        for (idx, record) in manifest.records.iter().enumerate() {
            if record.is_current() && !self.options.force {
                tracing::info!(
                    "{} stays on version {}",
                    record.name,
                    record.synced_version
                );
                outcomes.push(Some(CorpusOutcome::Skipped {
                    name: record.name.clone(),
                    version: record.synced_version.clone(),
                }));
            } else {
                tracing::info!(
                    "{}'s version is {}. Downloading {}",
                    record.name,
                    record.synced_version,
                    record.desired_version
                );
                outcomes.push(None);
                pending.push((idx, record.name.clone(), record.desired_version.clone()));
            }
        }

        let results: Vec<_> = futures::stream::iter(pending)
            .map(|(idx, name, version)| async move {
                let result = self.update_corpus(&name, &version).await;
                (idx, result)
            })
            .buffer_unordered(self.options.concurrency.max(1))
            .collect()
            .await;

        for (idx, result) in results {
            let record = &mut manifest.records[idx];

            let outcome = match result {
                Ok((path, summary)) => {
                    let previous = std::mem::replace(
                        &mut record.synced_version,
                        record.desired_version.clone(),
                    );
                    CorpusOutcome::Updated {
                        name: record.name.clone(),
                        previous,
                        version: record.desired_version.clone(),
                        path,
                        summary,
                    }
                }
                Err(error) => {
                    tracing::warn!(corpus = %record.name, "update failed: {error}");
                    CorpusOutcome::Failed {
                        name: record.name.clone(),
                        version: record.desired_version.clone(),
                        error,
                    }
                }
            };
            outcomes[idx] = Some(outcome);
        }

        outcomes.into_iter().flatten().collect()
    }

    async fn warm(&self, cache: Arc<dyn IndexCache>) -> Result<usize, IndexError> {
        tracing::info!("Parsing to cache");

        let indexer = self.pruner.indexer().clone();
        let root = self.options.target_dir.clone();
        let result =
            tokio::task::spawn_blocking(move || warm_cache(&indexer, &root, cache.as_ref()))
                .await
                .unwrap_or_else(|e| Err(IndexError::Interrupted(e.to_string())));

        if let Err(e) = &result {
            tracing::error!("cache warm failed: {e}");
        }
        result
    }

    async fn update_corpus(
        &self,
        name: &str,
        version: &str,
    ) -> Result<(PathBuf, PruneSummary), CorpusError> {
        let path = self
            .fetcher
            .fetch(name, version, &self.options.target_dir)
            .await?;

        tracing::info!(corpus = name, path = %path.display(), "Cleaning up the corpus");

        let pruner = self.pruner.clone();
        let keep_language = self.options.keep_language.clone();
        let root = path.clone();
        let summary = tokio::task::spawn_blocking(move || pruner.prune(&root, &keep_language))
            .await
            .map_err(|e| CorpusError::Interrupted(e.to_string()))??;

        Ok((path, summary))
    }
}
