use std::path::PathBuf;

use corpus_mirror::DEFAULT_KEEP_LANGUAGE;
use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Archive host; `https://github.com` when unset.
    pub archive_host: Option<String>,
    /// `zip` or `tar.gz`.
    pub archive_format: String,
    pub keep_language: String,
    /// Corpora fetched at once. 1 keeps runs strictly sequential.
    pub concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            archive_host: None,
            archive_format: "zip".into(),
            keep_language: DEFAULT_KEEP_LANGUAGE.into(),
            concurrency: 1,
            timeout_secs: 300,
        }
    }
}

/// Config file path: `~/.config/corpus-mirror/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("corpus-mirror").join("config.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        match toml::from_str::<AppConfig>(&contents) {
            Ok(config) => return config,
            Err(e) => tracing::warn!(
                "failed to parse config at {}, using defaults: {e}",
                path.display()
            ),
        }
    }

    AppConfig::default()
}
