//! Directory-driven batch import
//!
//! An import run replaces everything one importer owns: its fixed delete
//! statements run first, then every matching file in the directory is parsed
//! and written in file name order. The first failing file stops the run.
//!
//! Each file is parsed and validated completely before any of its rows are
//! written, and its writes share one transaction, so a file lands whole or
//! not at all. Files committed before a failure stay committed unless the
//! run is [`atomic`](ImportOptions::atomic).

mod allele_definition;
mod frequency;
mod function_reference;

pub use allele_definition::AlleleDefinitionImporter;
pub use frequency::FrequencyImporter;
pub use function_reference::FunctionReferenceImporter;

use crate::error::{ArtifactError, ArtifactResult};
use crate::excel::ExcelImporter;
use crate::store::Store;
use crate::types::{FileType, ProvenanceAction, ProvenanceRecord};
use crate::workbook::Workbook;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const EXCEL_EXTENSION: &str = ".xlsx";

/// Prefixes of editor lock files that sit next to open workbooks
const LOCK_FILE_PREFIXES: &[&str] = &["~$", ".~lock"];

/// One entity family's importer: which files it reads, which rows it owns,
/// and how a workbook becomes rows.
pub trait DirectoryImporter {
    /// Fully validated file content, ready to write
    type Parsed;

    fn file_type(&self) -> FileType;

    fn extension(&self) -> &'static str {
        EXCEL_EXTENSION
    }

    /// Statements that clear every row this importer owns. Run once per
    /// run, before the first file.
    fn delete_statements(&self) -> &'static [&'static str];

    /// Read and validate a workbook without touching the store
    fn parse(&self, workbook: &Workbook, file_name: &str) -> ArtifactResult<Self::Parsed>;

    /// Write one file's rows
    fn stage(&self, store: &Store, parsed: Self::Parsed) -> ArtifactResult<StagedFile>;
}

/// What staging one file wrote
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedFile {
    pub entity_keys: Vec<String>,
    pub rows: usize,
    /// Rows skipped because they referenced something unknown
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions {
    /// Run the delete phase and every file in one transaction
    pub atomic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedFile {
    pub file_name: String,
    pub staged: StagedFile,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub deleted_rows: usize,
    pub files: Vec<ImportedFile>,
}

impl ImportReport {
    pub fn total_rows(&self) -> usize {
        self.files.iter().map(|f| f.staged.rows).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.files.iter().map(|f| f.staged.skipped).sum()
    }
}

pub struct BatchImportPipeline<'a, I: DirectoryImporter> {
    store: &'a Store,
    importer: I,
    options: ImportOptions,
}

impl<'a, I: DirectoryImporter> BatchImportPipeline<'a, I> {
    pub fn new(store: &'a Store, importer: I) -> Self {
        Self {
            store,
            importer,
            options: ImportOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ImportOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the importer's tables with the contents of `directory`.
    ///
    /// On failure the error is [`ArtifactError::FileFailed`] naming the file,
    /// except for scanning and delete-phase errors which are returned as is.
    pub fn run(&self, directory: &Path) -> ArtifactResult<ImportReport> {
        let file_type = self.importer.file_type();
        let files = scan_directory(directory, self.importer.extension())?;
        debug!(
            "Scanned {}: {} {} file(s) for {}",
            directory.display(),
            files.len(),
            self.importer.extension(),
            file_type
        );

        let run_tx = if self.options.atomic {
            Some(self.store.connection().unchecked_transaction()?)
        } else {
            None
        };

        let deleted_rows = self.store.execute_all(self.importer.delete_statements())?;
        debug!("Delete phase for {} removed {} row(s)", file_type, deleted_rows);

        let mut report = ImportReport {
            deleted_rows,
            files: Vec::with_capacity(files.len()),
        };
        for path in &files {
            let file_name = file_name_of(path);
            let staged = self
                .import_file(path, &file_name)
                .map_err(|e| ArtifactError::FileFailed {
                    file: file_name.clone(),
                    source: Box::new(e),
                })?;
            report.files.push(ImportedFile { file_name, staged });
        }

        if let Some(tx) = run_tx {
            tx.commit()?;
        }
        info!(
            "Imported {} {} file(s), {} row(s)",
            report.files.len(),
            file_type,
            report.total_rows()
        );
        Ok(report)
    }

    fn import_file(&self, path: &Path, file_name: &str) -> ArtifactResult<StagedFile> {
        info!("Reading {}", path.display());
        let workbook = ExcelImporter::new(path).import()?;
        let parsed = self.importer.parse(&workbook, file_name)?;

        // Nested transactions are not allowed inside an atomic run
        let file_tx = if self.options.atomic {
            None
        } else {
            Some(self.store.connection().unchecked_transaction()?)
        };

        let staged = self.importer.stage(self.store, parsed)?;
        self.store.record_file_history(&ProvenanceRecord {
            file_name: file_name.to_string(),
            file_type: self.importer.file_type(),
            action: ProvenanceAction::Import,
            entity_keys: staged.entity_keys.clone(),
            url: None,
        })?;

        if let Some(tx) = file_tx {
            tx.commit()?;
        }
        Ok(staged)
    }
}

/// Files in `directory` with the given extension (case-insensitive), sorted
/// by name, excluding editor lock files
pub fn scan_directory(directory: &Path, extension: &str) -> ArtifactResult<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(ArtifactError::DirectoryNotFound(directory.display().to_string()));
    }

    let extension = extension.to_lowercase();
    let mut files = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let name = file_name_of(&path);
        let is_lock = LOCK_FILE_PREFIXES.iter().any(|p| name.starts_with(p));
        if !is_lock && name.to_lowercase().ends_with(&extension) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(ArtifactError::EmptyDirectory {
            directory: directory.display().to_string(),
            extension,
        });
    }
    files.sort();
    Ok(files)
}

/// Leading `_`-separated token of a file name, e.g. `CYP2D6` for
/// `CYP2D6_allele_definition_table.xlsx`
pub fn entity_key_from_file_name(file_name: &str) -> Option<String> {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name);
    stem.split('_')
        .next()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(String::from)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
