//! Publishing finished artifacts to a public file store

use crate::error::ArtifactResult;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Key prefix for gene artifacts under the store root
const GENE_KEY_PREFIX: &str = "data/gene";

/// Destination for finished artifacts
pub trait Publisher {
    /// Upload a file and return its public URL
    fn publish(&self, path: &Path) -> ArtifactResult<String>;
}

/// Publishes into a mirrored directory tree (`<root>/data/gene/<file>`) that
/// is served at `base_url`
#[derive(Debug, Clone)]
pub struct DirectoryPublisher {
    root: PathBuf,
    base_url: String,
}

impl DirectoryPublisher {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    pub fn url_for(&self, file_name: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            GENE_KEY_PREFIX,
            file_name
        )
    }
}

impl Publisher for DirectoryPublisher {
    fn publish(&self, path: &Path) -> ArtifactResult<String> {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let destination = self.root.join(GENE_KEY_PREFIX);
        fs::create_dir_all(&destination)?;
        fs::copy(path, destination.join(&file_name))?;

        let url = self.url_for(&file_name);
        info!("Uploaded {}", url);
        Ok(url)
    }
}
