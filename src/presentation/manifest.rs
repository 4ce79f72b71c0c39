//! JSON manifests describing images to mount.

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::application::dto::{FetchPriority, ImageProps, ViewContext};
use crate::domain::entities::ImageSourceSet;
use crate::domain::errors::SourceSetError;

/// Manifest loading errors.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// File could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Content is not a manifest.
    #[error("invalid manifest json: {0}")]
    Json(#[from] serde_json::Error),
    /// An entry's source set is unusable.
    #[error("entry {index}: {source}")]
    InvalidEntry {
        /// Position in the manifest.
        index: usize,
        /// Validation failure.
        #[source]
        source: SourceSetError,
    },
    /// List without entries.
    #[error("manifest holds no images")]
    Empty,
}

/// One image of a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    /// Tiered URLs.
    pub sources: ImageSourceSet,
    /// Alternative text.
    #[serde(default)]
    pub alt: String,
    /// Escalate at mount.
    #[serde(default)]
    pub eager: bool,
    /// Fetch priority hint.
    #[serde(default)]
    pub fetch_priority: Option<FetchPriority>,
    /// Display context.
    #[serde(default)]
    pub context: ViewContext,
}

impl ManifestEntry {
    /// Converts the entry into mount properties.
    #[must_use]
    pub fn into_props(self) -> ImageProps {
        let mut props = ImageProps::new(self.sources, self.alt)
            .eager(self.eager)
            .with_context(self.context);
        props.fetch_priority = self.fetch_priority;
        props
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Manifest {
    Many(Vec<ManifestEntry>),
    One(ManifestEntry),
}

/// Parses a manifest holding either one entry or a list.
///
/// # Errors
///
/// Returns `ManifestError` on malformed JSON, an empty list, or an entry
/// without an original URL.
pub fn parse_manifest(content: &str) -> Result<Vec<ManifestEntry>, ManifestError> {
    let entries = match serde_json::from_str::<Manifest>(content)? {
        Manifest::Many(entries) => entries,
        Manifest::One(entry) => vec![entry],
    };
    if entries.is_empty() {
        return Err(ManifestError::Empty);
    }
    for (index, entry) in entries.iter().enumerate() {
        entry
            .sources
            .validate()
            .map_err(|source| ManifestError::InvalidEntry { index, source })?;
    }
    Ok(entries)
}

/// Reads and parses a manifest file.
///
/// # Errors
///
/// Returns `ManifestError` if the file cannot be read or parsed.
pub fn load_manifest(path: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let content = std::fs::read_to_string(path)?;
    parse_manifest(&content)
}
