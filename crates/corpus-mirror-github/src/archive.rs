use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::time::Duration;

use corpus_mirror::{ArchiveFetcher, FetchError, mirror_dir_name};
use flate2::read::GzDecoder;

const DEFAULT_HOST: &str = "https://github.com";

/// Archive flavour requested from the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ArchiveFormat {
    #[default]
    Zip,
    TarGz,
}

impl ArchiveFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "zip" => Some(Self::Zip),
            "tar.gz" | "tgz" | "tarball" => Some(Self::TarGz),
            _ => None,
        }
    }
}

/// Downloads `{host}/{corpus}/archive/{version}.{ext}` and swaps the
/// extracted tree into the mirror.
///
/// The whole archive is buffered in memory before extraction. Extraction
/// happens in a staging directory next to the destination, and the old
/// corpus directory is only removed once the new tree is complete, so a
/// failed download or a corrupt archive leaves the previous mirror intact.
pub struct HttpArchiveFetcher {
    client: reqwest::Client,
    token: Option<String>,
    host: Option<String>,
    format: ArchiveFormat,
}

impl HttpArchiveFetcher {
    pub fn new(token: Option<String>, host: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            host,
            format: ArchiveFormat::default(),
        }
    }

    pub fn with_format(mut self, format: ArchiveFormat) -> Self {
        self.format = format;
        self
    }

    /// Replace the HTTP client with one that gives up after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, FetchError> {
        self.client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(self)
    }

    fn host(&self) -> &str {
        self.host
            .as_deref()
            .unwrap_or(DEFAULT_HOST)
            .trim_end_matches('/')
    }

    pub fn archive_url(&self, corpus_name: &str, version: &str) -> String {
        format!(
            "{}/{}/archive/{}.{}",
            self.host(),
            corpus_name,
            version,
            self.format.extension(),
        )
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let mut req = self.client.get(url).header("User-Agent", "corpus-mirror");

        if let Some(token) = &self.token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }

        let response = req
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("archive download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(FetchError::Network(format!(
                "archive download returned HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Network(format!("failed to read archive body: {e}")))?;

        Ok(bytes.to_vec())
    }
}

#[async_trait::async_trait]
impl ArchiveFetcher for HttpArchiveFetcher {
    async fn fetch(
        &self,
        corpus_name: &str,
        version: &str,
        target_dir: &Path,
    ) -> Result<PathBuf, FetchError> {
        let url = self.archive_url(corpus_name, version);
        tracing::info!(corpus = corpus_name, %url, "Starting download");

        let bytes = self.download(&url).await?;
        tracing::debug!(corpus = corpus_name, size = bytes.len(), "archive downloaded");

        let dest = target_dir.join(mirror_dir_name(corpus_name));
        let format = self.format;
        let target = target_dir.to_path_buf();
        let staged_dest = dest.clone();

        let files = tokio::task::spawn_blocking(move || {
            replace_with_archive(&bytes, format, &target, &staged_dest)
        })
        .await
        .map_err(|e| FetchError::Io(format!("extraction task did not complete: {e}")))??;

        tracing::info!(corpus = corpus_name, files, path = %dest.display(), "Done");
        Ok(dest)
    }
}

/// Extract `bytes` into a fresh staging directory under `target_dir`, then
/// move it to `dest`, deleting whatever `dest` held before.
fn replace_with_archive(
    bytes: &[u8],
    format: ArchiveFormat,
    target_dir: &Path,
    dest: &Path,
) -> Result<usize, FetchError> {
    std::fs::create_dir_all(target_dir).map_err(|e| io_error(target_dir, e))?;

    let staging = tempfile::Builder::new()
        .prefix(".staging-")
        .tempdir_in(target_dir)
        .map_err(|e| io_error(target_dir, e))?;

    let files = match format {
        ArchiveFormat::Zip => extract_zip(bytes, staging.path())?,
        ArchiveFormat::TarGz => extract_tar_gz(bytes, staging.path())?,
    };

    if dest.exists() {
        std::fs::remove_dir_all(dest).map_err(|e| io_error(dest, e))?;
    }
    std::fs::rename(staging.path(), dest).map_err(|e| io_error(dest, e))?;
    // The staged tree now lives at `dest`; nothing is left to clean up.
    let _ = staging.keep();

    Ok(files)
}

fn extract_zip(bytes: &[u8], dest: &Path) -> Result<usize, FetchError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| FetchError::BadArchive(format!("failed to read zip: {e}")))?;

    let mut files = 0;

    for idx in 0..archive.len() {
        let mut entry = archive
            .by_index(idx)
            .map_err(|e| FetchError::BadArchive(format!("failed to read zip entry: {e}")))?;

        let Some(relative) = entry.enclosed_name() else {
            return Err(FetchError::BadArchive(format!(
                "entry escapes the archive root: {}",
                entry.name()
            )));
        };
        let out = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&out).map_err(|e| io_error(&out, e))?;
            continue;
        }

        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }

        let mut file = std::fs::File::create(&out).map_err(|e| io_error(&out, e))?;
        std::io::copy(&mut entry, &mut file).map_err(|e| {
            FetchError::BadArchive(format!("failed to extract {}: {e}", out.display()))
        })?;
        files += 1;
    }

    Ok(files)
}

fn extract_tar_gz(bytes: &[u8], dest: &Path) -> Result<usize, FetchError> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));

    let entries = archive
        .entries()
        .map_err(|e| FetchError::BadArchive(format!("failed to read tar entries: {e}")))?;

    let mut files = 0;

    for entry_result in entries {
        let mut entry = entry_result
            .map_err(|e| FetchError::BadArchive(format!("failed to read tar entry: {e}")))?;

        let is_file = entry.header().entry_type() == tar::EntryType::Regular;

        // unpack_in refuses entries that would land outside `dest`
        let unpacked = entry
            .unpack_in(dest)
            .map_err(|e| FetchError::BadArchive(format!("failed to unpack tar entry: {e}")))?;

        if unpacked && is_file {
            files += 1;
        }
    }

    Ok(files)
}

fn io_error(path: &Path, e: std::io::Error) -> FetchError {
    FetchError::Io(format!("{}: {e}", path.display()))
}
