use std::path::Path;

use anyhow::{Context, Result};
use corpus_mirror::ManifestStore;

use crate::commands::format::print_status;

/// Print each manifest row and whether it needs a download.
pub fn run(source: &Path) -> Result<()> {
    let manifest = ManifestStore::new(source)
        .load()
        .with_context(|| format!("failed to read manifest {}", source.display()))?;

    print_status(&manifest);
    Ok(())
}
