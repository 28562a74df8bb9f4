//! Store to workbook export
//!
//! Each [`ArtifactExporter`] turns one entity family into one workbook per
//! entity key. [`ExportPipeline`] writes them, records provenance and hands
//! finished files to an optional [`Publisher`].

mod allele_definition;
mod archive;
mod frequency;
mod function_reference;
mod starter;

pub use allele_definition::{load_allele_definitions, AlleleDefinitionExporter};
pub use archive::ArtifactArchive;
pub use frequency::{load_frequencies, FrequencyExporter};
pub use function_reference::{load_function_references, FunctionReferenceExporter};
pub use starter::{starter_workbooks, StarterPack};

use crate::error::{ArtifactError, ArtifactResult};
use crate::excel::ExcelExporter;
use crate::publish::Publisher;
use crate::store::Store;
use crate::types::{FileType, ProvenanceAction, ProvenanceRecord};
use crate::workbook::Workbook;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub trait ArtifactExporter {
    fn file_type(&self) -> FileType;

    /// Entities with data to export, in output order
    fn entity_keys(&self, store: &Store) -> ArtifactResult<Vec<String>>;

    fn build(&self, store: &Store, entity_key: &str) -> ArtifactResult<Workbook>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub entity_key: String,
    pub path: PathBuf,
    /// Public URL when the file was published
    pub url: Option<String>,
}

pub struct ExportPipeline<'a> {
    store: &'a Store,
    publisher: Option<&'a dyn Publisher>,
}

impl<'a> ExportPipeline<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            publisher: None,
        }
    }

    pub fn with_publisher(mut self, publisher: &'a dyn Publisher) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Write one file per entity key into an existing `directory`
    pub fn export(
        &self,
        exporter: &dyn ArtifactExporter,
        directory: &Path,
    ) -> ArtifactResult<Vec<ExportedFile>> {
        if !directory.is_dir() {
            return Err(ArtifactError::DirectoryNotFound(directory.display().to_string()));
        }

        let keys = exporter.entity_keys(self.store)?;
        let mut exported = Vec::with_capacity(keys.len());
        for key in keys {
            let workbook = exporter.build(self.store, &key)?;
            let path = directory.join(workbook.name());
            ExcelExporter::new(&workbook).export(&path)?;
            info!("Wrote {}", path.display());

            self.store.record_file_history(&ProvenanceRecord {
                file_name: workbook.name().to_string(),
                file_type: exporter.file_type(),
                action: ProvenanceAction::Export,
                entity_keys: vec![key.clone()],
                url: None,
            })?;

            let url = self.publish(&path, exporter.file_type(), &key);
            exported.push(ExportedFile {
                entity_key: key,
                path,
                url,
            });
        }
        Ok(exported)
    }

    /// Upload failures are logged and never fail the export
    fn publish(&self, path: &Path, file_type: FileType, key: &str) -> Option<String> {
        let publisher = self.publisher?;
        let url = match publisher.publish(path) {
            Ok(url) => url,
            Err(e) => {
                warn!("Upload of {} failed: {}", path.display(), e);
                return None;
            }
        };

        let record = ProvenanceRecord {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            file_type,
            action: ProvenanceAction::Upload,
            entity_keys: vec![key.to_string()],
            url: Some(url.clone()),
        };
        if let Err(e) = self.store.record_file_history(&record) {
            error!("Error updating file record for {}: {}", record.file_name, e);
        }
        Some(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeneHeader;
    use std::cell::RefCell;
    use tempfile::TempDir;

    struct FailingPublisher {
        attempts: RefCell<usize>,
    }

    impl Publisher for FailingPublisher {
        fn publish(&self, _path: &Path) -> ArtifactResult<String> {
            *self.attempts.borrow_mut() += 1;
            Err(ArtifactError::Export("bucket unavailable".to_string()))
        }
    }

    fn store_with_definition() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store.upsert_gene(&GeneHeader::new("TPMT")).unwrap();
        store.insert_allele_definition("TPMT", "*1").unwrap();
        store
    }

    #[test]
    fn test_export_requires_existing_directory() {
        let store = store_with_definition();
        let dir = TempDir::new().unwrap();
        let err = ExportPipeline::new(&store)
            .export(&AlleleDefinitionExporter, &dir.path().join("missing"))
            .unwrap_err();
        assert!(matches!(err, ArtifactError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_publish_failure_does_not_fail_export() {
        let store = store_with_definition();
        let dir = TempDir::new().unwrap();
        let publisher = FailingPublisher {
            attempts: RefCell::new(0),
        };

        let exported = ExportPipeline::new(&store)
            .with_publisher(&publisher)
            .export(&AlleleDefinitionExporter, dir.path())
            .unwrap();

        assert_eq!(exported.len(), 1);
        assert_eq!(exported[0].url, None);
        assert_eq!(*publisher.attempts.borrow(), 1);

        let actions: Vec<ProvenanceAction> =
            store.file_history().unwrap().iter().map(|r| r.action).collect();
        assert_eq!(actions, vec![ProvenanceAction::Export]);
    }
}
