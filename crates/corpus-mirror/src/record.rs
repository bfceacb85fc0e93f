use std::fmt;

/// One row of the manifest: a corpus, the version we want, and the version
/// currently mirrored on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorpusRecord {
    /// `owner/repo` style identifier.
    pub name: String,
    /// Tag or ref the mirror should be at.
    pub desired_version: String,
    /// Tag or ref last synced successfully. Empty if never synced.
    pub synced_version: String,
}

impl CorpusRecord {
    pub fn new(
        name: impl Into<String>,
        desired_version: impl Into<String>,
        synced_version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            desired_version: desired_version.into(),
            synced_version: synced_version.into(),
        }
    }

    /// Returns true when the mirrored version already matches the desired one.
    pub fn is_current(&self) -> bool {
        self.synced_version == self.desired_version
    }

    /// Name of this corpus's subdirectory inside the mirror.
    pub fn mirror_dir_name(&self) -> String {
        mirror_dir_name(&self.name)
    }
}

impl fmt::Display for CorpusRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let synced = if self.synced_version.is_empty() {
            "never synced"
        } else {
            self.synced_version.as_str()
        };
        write!(f, "{} ({} -> {})", self.name, synced, self.desired_version)
    }
}

/// Ordered set of corpus records. Order is preserved when the manifest is
/// rewritten.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub records: Vec<CorpusRecord>,
}

impl Manifest {
    pub fn new(records: Vec<CorpusRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&CorpusRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CorpusRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a Manifest {
    type Item = &'a CorpusRecord;
    type IntoIter = std::slice::Iter<'a, CorpusRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Directory name used for a corpus inside the mirror.
///
/// Path separators become underscores, so `org/textA` lands in `org_textA`.
/// Names differing only by separator vs underscore map to the same directory;
/// the manifest loader rejects such pairs.
pub fn mirror_dir_name(corpus_name: &str) -> String {
    corpus_name.replace('/', "_")
}
