use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use atelier_contracts::analysis::DesignVariant;
use atelier_contracts::media::DataUri;

/// Writes a variant's image to `<dir>/Architect-<id>.png`.
pub fn export_variant(variant: &DesignVariant, dir: &Path) -> Result<PathBuf> {
    let decoded = DataUri::parse(&variant.image_url)
        .with_context(|| format!("variant '{}' has no downloadable image", variant.id))?;
    fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(variant.download_file_name());
    fs::write(&path, decoded.bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}
