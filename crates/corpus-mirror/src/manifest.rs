use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::record::{CorpusRecord, Manifest};

const NAME_COLUMN: &str = "Name";
const VERSION_COLUMN: &str = "Version";
const CURRENT_COLUMN: &str = "Current";
const DELIMITER: u8 = b';';

/// Errors that can occur loading or saving the manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("manifest not found: {0}")]
    MissingFile(PathBuf),

    #[error("malformed manifest row at line {line}: {reason}")]
    MalformedRow { line: u64, reason: String },

    #[error("duplicate corpus name in manifest: {0}")]
    DuplicateName(String),

    #[error("corpora {first} and {second} would share the mirror directory {dir}")]
    DirectoryCollision {
        first: String,
        second: String,
        dir: String,
    },

    #[error("manifest I/O error: {0}")]
    Io(String),
}

/// Reads and rewrites the `Name;Version;Current` manifest table.
///
/// The table is always rewritten whole through a temporary file in the same
/// directory that is then renamed over the original, so a concurrent reader
/// sees either the old table or the new one.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    path: PathBuf,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load every row, rejecting duplicate names and names that sanitize to
    /// the same mirror directory.
    pub fn load(&self) -> Result<Manifest, ManifestError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ManifestError::MissingFile(self.path.clone()));
            }
            Err(e) => return Err(ManifestError::Io(format!("{}: {e}", self.path.display()))),
        };

        let manifest = parse(&bytes)?;
        check_unique(&manifest)?;
        Ok(manifest)
    }

    /// Write all rows, in order, whether or not they changed.
    pub fn save(&self, manifest: &Manifest) -> Result<(), ManifestError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| ManifestError::Io(format!("failed to create temp file: {e}")))?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(tmp);

        writer
            .write_record([NAME_COLUMN, VERSION_COLUMN, CURRENT_COLUMN])
            .map_err(|e| ManifestError::Io(e.to_string()))?;

        for record in &manifest.records {
            writer
                .write_record([
                    &record.name,
                    &record.desired_version,
                    &record.synced_version,
                ])
                .map_err(|e| ManifestError::Io(e.to_string()))?;
        }

        let mut tmp = writer
            .into_inner()
            .map_err(|e| ManifestError::Io(e.to_string()))?;
        tmp.flush().map_err(|e| ManifestError::Io(e.to_string()))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| ManifestError::Io(e.to_string()))?;

        tmp.persist(&self.path)
            .map_err(|e| ManifestError::Io(format!("{}: {}", self.path.display(), e.error)))?;

        tracing::debug!(
            path = %self.path.display(),
            rows = manifest.len(),
            "manifest saved"
        );
        Ok(())
    }
}

fn parse(bytes: &[u8]) -> Result<Manifest, ManifestError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(malformed)?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| ManifestError::MalformedRow {
                line: 1,
                reason: format!("missing `{name}` column in header"),
            })
    };
    let name_idx = column(NAME_COLUMN)?;
    let version_idx = column(VERSION_COLUMN)?;
    let current_idx = column(CURRENT_COLUMN)?;

    let mut records = Vec::new();

    for result in reader.records() {
        let row = result.map_err(malformed)?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);

        let field = |idx: usize| row.get(idx).unwrap_or("").to_owned();
        let record = CorpusRecord::new(field(name_idx), field(version_idx), field(current_idx));

        if record.name.is_empty() {
            return Err(ManifestError::MalformedRow {
                line,
                reason: "empty corpus name".into(),
            });
        }
        if record.desired_version.is_empty() {
            return Err(ManifestError::MalformedRow {
                line,
                reason: format!("no version given for {}", record.name),
            });
        }

        records.push(record);
    }

    Ok(Manifest::new(records))
}

fn malformed(e: csv::Error) -> ManifestError {
    ManifestError::MalformedRow {
        line: e.position().map(|p| p.line()).unwrap_or(0),
        reason: e.to_string(),
    }
}

fn check_unique(manifest: &Manifest) -> Result<(), ManifestError> {
    let mut dirs: HashMap<String, &str> = HashMap::with_capacity(manifest.len());

    for record in manifest {
        if let Some(first) = dirs.insert(record.mirror_dir_name(), &record.name) {
            if first == record.name {
                return Err(ManifestError::DuplicateName(record.name.clone()));
            }
            return Err(ManifestError::DirectoryCollision {
                first: first.to_owned(),
                second: record.name.clone(),
                dir: record.mirror_dir_name(),
            });
        }
    }

    Ok(())
}
