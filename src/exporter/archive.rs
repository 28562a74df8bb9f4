use super::{
    AlleleDefinitionExporter, ArtifactExporter, ExportPipeline, ExportedFile, FrequencyExporter,
    FunctionReferenceExporter,
};
use crate::error::{ArtifactError, ArtifactResult};
use chrono::{Local, NaiveDate};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// A dated snapshot of every gene artifact, written under
/// `<base>/<prefix>_<YYYY-MM-DD>/genes`
#[derive(Debug, Clone)]
pub struct ArtifactArchive {
    base: PathBuf,
    prefix: String,
    date: NaiveDate,
}

impl ArtifactArchive {
    pub fn new(base: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            prefix: prefix.into(),
            date: Local::now().date_naive(),
        }
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn gene_directory(&self) -> PathBuf {
        self.base
            .join(format!("{}_{}", self.prefix, self.date.format("%Y-%m-%d")))
            .join("genes")
    }

    /// Run every gene exporter into the archive directory
    pub fn write(&self, pipeline: &ExportPipeline) -> ArtifactResult<Vec<ExportedFile>> {
        if !self.base.is_dir() {
            return Err(ArtifactError::DirectoryNotFound(self.base.display().to_string()));
        }

        let directory = self.gene_directory();
        prepare_directory(&directory)?;

        let exporters: [&dyn ArtifactExporter; 3] = [
            &AlleleDefinitionExporter,
            &FunctionReferenceExporter,
            &FrequencyExporter,
        ];
        let mut written = Vec::new();
        for exporter in exporters {
            written.extend(pipeline.export(exporter, &directory)?);
        }
        Ok(written)
    }
}

fn prepare_directory(directory: &Path) -> ArtifactResult<()> {
    if directory.is_dir() {
        info!("Using existing directory {}", directory.display());
    } else {
        fs::create_dir_all(directory)?;
        info!("Created new directory {}", directory.display());
    }
    Ok(())
}
