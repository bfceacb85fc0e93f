use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Errors that can occur fetching and extracting a corpus archive.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad archive: {0}")]
    BadArchive(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Retrieves a versioned corpus archive and extracts it into the mirror.
///
/// Implementations resolve the destination as
/// `target_dir / mirror_dir_name(corpus_name)` and replace whatever was
/// there: after a successful fetch the directory holds exactly the archive's
/// contents. A failed fetch is never retried here.
#[async_trait::async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Fetch `version` of `corpus_name` into `target_dir`, returning the path
    /// of the freshly extracted tree.
    async fn fetch(
        &self,
        corpus_name: &str,
        version: &str,
        target_dir: &Path,
    ) -> Result<PathBuf, FetchError>;
}

#[async_trait::async_trait]
impl<T: ArchiveFetcher + ?Sized> ArchiveFetcher for Arc<T> {
    async fn fetch(
        &self,
        corpus_name: &str,
        version: &str,
        target_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        (**self).fetch(corpus_name, version, target_dir).await
    }
}
