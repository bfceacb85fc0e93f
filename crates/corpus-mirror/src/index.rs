use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use crate::cts::CtsConvention;
use crate::metadata::{DocumentMetadata, MetadataConvention};

/// Errors that can occur indexing a directory tree.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("cannot scan {}: {reason}", path.display())]
    UnreadableTree { path: PathBuf, reason: String },

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("index task did not complete: {0}")]
    Interrupted(String),
}

/// Error reported by an [`IndexCache`] backend.
#[derive(Debug, thiserror::Error)]
#[error("index cache error: {0}")]
pub struct CacheError(pub String);

/// Persistent store of already-parsed metadata files.
///
/// Entries are keyed by metadata file path and carry an opaque stamp of the
/// file's size and modification time; a lookup with a different stamp is a
/// miss.
pub trait IndexCache: Send + Sync {
    fn lookup(&self, key: &str, stamp: &str) -> Result<Option<Vec<DocumentMetadata>>, CacheError>;

    fn store(&self, key: &str, stamp: &str, documents: &[DocumentMetadata])
    -> Result<(), CacheError>;

    /// Drop every entry.
    fn clear(&self) -> Result<(), CacheError>;
}

/// Builds the document index of an extracted tree.
#[derive(Clone)]
pub struct MetadataIndexer {
    convention: Arc<dyn MetadataConvention>,
}

impl Default for MetadataIndexer {
    fn default() -> Self {
        Self::new(Arc::new(CtsConvention))
    }
}

impl std::fmt::Debug for MetadataIndexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataIndexer")
            .field("convention", &self.convention.name())
            .finish()
    }
}

impl MetadataIndexer {
    pub fn new(convention: Arc<dyn MetadataConvention>) -> Self {
        Self { convention }
    }

    /// Lazily index every readable document under `root`.
    ///
    /// Fails only if `root` itself cannot be read. Unreadable entries and
    /// malformed metadata files are logged and skipped. Each call walks the
    /// tree again.
    pub fn index(&self, root: &Path) -> Result<Documents<'_>, IndexError> {
        self.documents(root, None)
    }

    /// Like [`index`](Self::index), reusing and filling `cache`.
    pub fn index_with_cache<'a>(
        &'a self,
        root: &Path,
        cache: &'a dyn IndexCache,
    ) -> Result<Documents<'a>, IndexError> {
        self.documents(root, Some(cache))
    }

    fn documents<'a>(
        &'a self,
        root: &Path,
        cache: Option<&'a dyn IndexCache>,
    ) -> Result<Documents<'a>, IndexError> {
        std::fs::read_dir(root).map_err(|e| IndexError::UnreadableTree {
            path: root.to_path_buf(),
            reason: e.to_string(),
        })?;

        Ok(Documents {
            convention: self.convention.as_ref(),
            cache,
            walker: walkdir::WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(is_visible as EntryFilter),
            pending: Vec::new().into_iter(),
        })
    }
}

type EntryFilter = fn(&walkdir::DirEntry) -> bool;

/// Iterator over the documents of one tree, produced by [`MetadataIndexer`].
pub struct Documents<'a> {
    convention: &'a dyn MetadataConvention,
    cache: Option<&'a dyn IndexCache>,
    walker: walkdir::FilterEntry<walkdir::IntoIter, EntryFilter>,
    pending: std::vec::IntoIter<DocumentMetadata>,
}

impl Documents<'_> {
    fn read_metadata_file(&self, path: &Path) -> Vec<DocumentMetadata> {
        let key = path.to_string_lossy();
        let stamp = self.cache.and_then(|_| file_stamp(path));

        if let (Some(cache), Some(stamp)) = (self.cache, stamp.as_deref()) {
            match cache.lookup(&key, stamp) {
                Ok(Some(documents)) => {
                    tracing::debug!(path = %path.display(), "metadata cache hit");
                    return documents;
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(path = %path.display(), "{e}"),
            }
        }

        let documents: Vec<DocumentMetadata> = match self.convention.read(path) {
            Ok(declared) => declared
                .iter()
                .map(|doc| DocumentMetadata::from_declared(doc.as_ref()))
                .collect(),
            Err(reason) => {
                tracing::warn!(
                    path = %path.display(),
                    convention = self.convention.name(),
                    "skipping unreadable metadata: {reason}"
                );
                return Vec::new();
            }
        };

        if let (Some(cache), Some(stamp)) = (self.cache, stamp.as_deref())
            && let Err(e) = cache.store(&key, stamp, &documents)
        {
            tracing::warn!(path = %path.display(), "{e}");
        }

        documents
    }
}

impl Iterator for Documents<'_> {
    type Item = DocumentMetadata;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(doc) = self.pending.next() {
                return Some(doc);
            }

            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("skipping unreadable entry: {e}");
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.convention.is_metadata_file(entry.path()) {
                continue;
            }

            self.pending = self.read_metadata_file(entry.path()).into_iter();
        }
    }
}

/// Clear `cache` and index the whole mirror into it.
///
/// Returns the number of documents indexed.
pub fn warm_cache(
    indexer: &MetadataIndexer,
    mirror_root: &Path,
    cache: &dyn IndexCache,
) -> Result<usize, IndexError> {
    tracing::info!(root = %mirror_root.display(), "clearing index cache");
    cache.clear()?;

    let count = indexer.index_with_cache(mirror_root, cache)?.count();

    tracing::info!(documents = count, "index cache warmed");
    Ok(count)
}

/// Dot-entries below the root (staging directories, VCS metadata) are not
/// part of any corpus.
fn is_visible(entry: &walkdir::DirEntry) -> bool {
    entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
}

fn file_stamp(path: &Path) -> Option<String> {
    let meta = std::fs::metadata(path).ok()?;
    let modified = meta
        .modified()
        .ok()?
        .duration_since(UNIX_EPOCH)
        .ok()?
        .as_nanos();
    Some(format!("{}-{modified}", meta.len()))
}
