use std::path::{Path, PathBuf};

/// A document found in an extracted corpus, with the language it declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    /// Identifier the corpus gives the document (e.g. a CTS URN).
    pub id: String,
    pub path: PathBuf,
    /// Short language code, e.g. `lat`.
    pub language: String,
}

impl DocumentMetadata {
    pub fn from_declared(doc: &dyn DeclaresLanguage) -> Self {
        Self {
            id: doc.id().to_owned(),
            path: doc.path().to_path_buf(),
            language: doc.language().to_owned(),
        }
    }

    pub fn is_in(&self, language: &str) -> bool {
        self.language == language
    }
}

/// Anything that declares which language it is written in.
pub trait DeclaresLanguage {
    fn id(&self) -> &str;
    fn path(&self) -> &Path;
    fn language(&self) -> &str;
}

/// A way corpora describe their own documents on disk.
///
/// A convention recognizes its metadata files while the tree is walked and
/// turns each one into the readable documents it declares. Documents whose
/// file is missing are not returned.
pub trait MetadataConvention: Send + Sync {
    /// Short name for log output.
    fn name(&self) -> &str;

    /// Returns true if `path` is a metadata file of this convention.
    fn is_metadata_file(&self, path: &Path) -> bool;

    /// Read the documents declared by one metadata file.
    fn read(&self, metadata_file: &Path) -> Result<Vec<Box<dyn DeclaresLanguage>>, String>;
}
