use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::defaults::default_catalog;
use crate::modes::Mode;

/// A pre-authored generation target (style or layout variant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StyleDescriptor {
    pub id: String,
    pub name: String,
    #[serde(rename = "prompt", alias = "promptTemplate", default)]
    pub prompt_template: String,
    #[serde(default)]
    pub description: String,
}

impl StyleDescriptor {
    /// Text shown next to a generated variant.
    pub fn display_description(&self) -> &str {
        if self.description.trim().is_empty() {
            self.prompt_template.as_str()
        } else {
            self.description.as_str()
        }
    }
}

/// Ordered style lists, one per mode.
#[derive(Debug, Clone)]
pub struct StyleCatalog {
    entries: IndexMap<Mode, Vec<StyleDescriptor>>,
}

impl Default for StyleCatalog {
    fn default() -> Self {
        Self::new(None)
    }
}

impl StyleCatalog {
    pub fn new(entries: Option<IndexMap<Mode, Vec<StyleDescriptor>>>) -> Self {
        Self {
            entries: entries.unwrap_or_else(default_catalog),
        }
    }

    /// Loads an override file keyed by mode wire name. Modes the file does
    /// not mention keep their built-in lists.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed reading catalog {}", path.display()))?;
        let overrides: IndexMap<Mode, Vec<StyleDescriptor>> = serde_json::from_str(&raw)
            .with_context(|| format!("invalid catalog JSON in {}", path.display()))?;
        let mut entries = default_catalog();
        for (mode, styles) in overrides {
            validate_styles(mode, &styles)?;
            entries.insert(mode, styles);
        }
        Ok(Self { entries })
    }

    pub fn for_mode(&self, mode: Mode) -> &[StyleDescriptor] {
        self.entries
            .get(&mode)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn find(&self, mode: Mode, id: &str) -> Option<&StyleDescriptor> {
        self.for_mode(mode).iter().find(|style| style.id == id)
    }

    pub fn ids(&self, mode: Mode) -> Vec<String> {
        self.for_mode(mode)
            .iter()
            .map(|style| style.id.clone())
            .collect()
    }
}

fn validate_styles(mode: Mode, styles: &[StyleDescriptor]) -> Result<()> {
    if styles.is_empty() {
        bail!("Catalog for {} has no styles.", mode.wire_name());
    }
    let mut seen = HashSet::new();
    for style in styles {
        let id = style.id.trim();
        if id.is_empty() {
            bail!("Catalog for {} has a style without an id.", mode.wire_name());
        }
        if !seen.insert(id.to_string()) {
            bail!(
                "Catalog for {} repeats style id '{id}'.",
                mode.wire_name()
            );
        }
    }
    Ok(())
}
