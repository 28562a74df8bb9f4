//! Runtime configuration loaded from YAML

use crate::error::ArtifactResult;
use crate::publish::DirectoryPublisher;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE: &str = "pgx.db";
pub const DEFAULT_ARCHIVE_PREFIX: &str = "pgx_information";

/// ```yaml
/// database: /var/lib/pgx/pgx.db
/// archive_prefix: pgx_information
/// publish:
///   directory: /srv/files
///   base_url: https://files.example.org
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtifactConfig {
    pub database: PathBuf,
    pub archive_prefix: String,
    pub publish: Option<PublishConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishConfig {
    pub directory: PathBuf,
    pub base_url: String,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            archive_prefix: DEFAULT_ARCHIVE_PREFIX.to_string(),
            publish: None,
        }
    }
}

impl ArtifactConfig {
    pub fn load(path: &Path) -> ArtifactResult<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> ArtifactResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn publisher(&self) -> Option<DirectoryPublisher> {
        self.publish
            .as_ref()
            .map(|p| DirectoryPublisher::new(&p.directory, &p.base_url))
    }
}
