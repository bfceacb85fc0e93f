use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::index::{IndexError, MetadataIndexer};
use crate::metadata::DocumentMetadata;

/// Errors that can occur pruning a corpus.
#[derive(Debug, thiserror::Error)]
pub enum PruneError {
    #[error("failed to delete {}: {reason}", path.display())]
    DeleteFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Counts from one prune pass.
///
/// Both counts come from the partition taken before any file is removed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneSummary {
    pub removed: usize,
    pub kept: usize,
}

/// Deletes every document not written in the retained language.
#[derive(Debug, Clone, Default)]
pub struct CorpusPruner {
    indexer: MetadataIndexer,
}

impl CorpusPruner {
    pub fn new(indexer: MetadataIndexer) -> Self {
        Self { indexer }
    }

    pub fn indexer(&self) -> &MetadataIndexer {
        &self.indexer
    }

    /// Remove documents under `root` whose declared language is not
    /// `keep_language`.
    ///
    /// Each file is counted once, however many texts declare it. A file
    /// declared in `keep_language` by any text is kept. Stops at the first
    /// failed removal. Files already removed stay removed.
    pub fn prune(&self, root: &Path, keep_language: &str) -> Result<PruneSummary, PruneError> {
        let (kept, other): (Vec<DocumentMetadata>, Vec<DocumentMetadata>) = self
            .indexer
            .index(root)?
            .partition(|doc| doc.is_in(keep_language));

        let kept: HashSet<PathBuf> = kept.into_iter().map(|doc| doc.path).collect();
        let mut seen = HashSet::new();
        let removed: Vec<DocumentMetadata> = other
            .into_iter()
            .filter(|doc| !kept.contains(&doc.path) && seen.insert(doc.path.clone()))
            .collect();

        for doc in &removed {
            match std::fs::remove_file(&doc.path) {
                Ok(()) => {
                    tracing::debug!(path = %doc.path.display(), language = %doc.language, "removed");
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    tracing::debug!(path = %doc.path.display(), "already gone");
                }
                Err(e) => {
                    return Err(PruneError::DeleteFailed {
                        path: doc.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let summary = PruneSummary {
            removed: removed.len(),
            kept: kept.len(),
        };

        tracing::info!(
            root = %root.display(),
            "Removed {} text(s) not in {keep_language}, kept {} text(s) in {keep_language}",
            summary.removed,
            summary.kept,
        );

        Ok(summary)
    }
}
