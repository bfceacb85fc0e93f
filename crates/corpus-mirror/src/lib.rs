pub mod cts;
pub mod fetch;
pub mod index;
pub mod manifest;
pub mod metadata;
pub mod prune;
pub mod record;
pub mod sync;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use cts::{CtsConvention, CtsText, TextKind};
pub use fetch::{ArchiveFetcher, FetchError};
pub use index::{CacheError, Documents, IndexCache, IndexError, MetadataIndexer, warm_cache};
pub use manifest::{ManifestError, ManifestStore};
pub use metadata::{DeclaresLanguage, DocumentMetadata, MetadataConvention};
pub use prune::{CorpusPruner, PruneError, PruneSummary};
pub use record::{CorpusRecord, Manifest, mirror_dir_name};
pub use sync::{
    CorpusError, CorpusOutcome, DEFAULT_KEEP_LANGUAGE, SyncError, SyncOptions, SyncOrchestrator,
    SyncReport,
};
