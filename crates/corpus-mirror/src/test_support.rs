use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::fetch::{ArchiveFetcher, FetchError};
use crate::record::mirror_dir_name;

/// Writes the contents of a fake archive into a fresh corpus directory.
pub type Populate = Box<dyn Fn(&Path) + Send + Sync>;

/// What [`FakeFetcher`] does when asked for a corpus.
pub enum FakeArchive {
    /// Replace the corpus directory with whatever the closure writes.
    Extract(Populate),
    NetworkError,
    /// Claims success but returns a path that does not exist.
    VanishingTree,
}

impl FakeArchive {
    pub fn extract(populate: impl Fn(&Path) + Send + Sync + 'static) -> Self {
        Self::Extract(Box::new(populate))
    }
}

/// In-process fetcher for testing. Writes canned trees instead of
/// downloading and records every call. Unknown corpora fail with a network
/// error.
#[derive(Default)]
pub struct FakeFetcher {
    corpora: HashMap<String, FakeArchive>,
    calls: Mutex<Vec<(String, String)>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, corpus_name: &str, archive: FakeArchive) -> Self {
        self.corpora.insert(corpus_name.to_owned(), archive);
        self
    }

    /// `(corpus name, version)` pairs, in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ArchiveFetcher for FakeFetcher {
    async fn fetch(
        &self,
        corpus_name: &str,
        version: &str,
        target_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        self.calls
            .lock()
            .unwrap()
            .push((corpus_name.to_owned(), version.to_owned()));

        let dest = target_dir.join(mirror_dir_name(corpus_name));

        match self.corpora.get(corpus_name) {
            Some(FakeArchive::Extract(populate)) => {
                if dest.exists() {
                    std::fs::remove_dir_all(&dest).map_err(|e| FetchError::Io(e.to_string()))?;
                }
                std::fs::create_dir_all(&dest).map_err(|e| FetchError::Io(e.to_string()))?;
                populate(&dest);
                Ok(dest)
            }
            Some(FakeArchive::VanishingTree) => Ok(dest.join("gone")),
            Some(FakeArchive::NetworkError) | None => {
                Err(FetchError::Network("connection refused".into()))
            }
        }
    }
}
