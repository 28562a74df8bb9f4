//! pgx-artifacts - spreadsheet artifacts for a pharmacogenomics knowledge base
//!
//! Converts between a relational store of allele data and the `.xlsx`
//! workbooks curators review offline.
//!
//! # Features
//!
//! - Sparse allele × variant matrix codec with per-gene column directories
//! - Haplotype-aware ordering (`*9` before `*10`)
//! - Notes, Change History and Methods sidecar sheets
//! - Population allele frequency tables with a required Methods sheet
//! - Directory batch import with delete-then-insert replacement per table family
//! - Export with file provenance, dated archives and publishing
//!
//! # Example
//!
//! ```no_run
//! use pgx_artifacts::exporter::{AlleleDefinitionExporter, ExportPipeline};
//! use pgx_artifacts::store::Store;
//! use std::path::Path;
//!
//! let store = Store::open(Path::new("pgx.db"))?;
//! store.init_schema()?;
//!
//! let written = ExportPipeline::new(&store)
//!     .export(&AlleleDefinitionExporter, Path::new("out"))?;
//! println!("Wrote {} files", written.len());
//! # Ok::<(), pgx_artifacts::error::ArtifactError>(())
//! ```

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod excel;
pub mod exporter;
pub mod importer;
pub mod ordering;
pub mod publish;
pub mod store;
pub mod types;
pub mod workbook;

// Re-export commonly used types
pub use error::{ArtifactError, ArtifactResult};
pub use types::{FileType, FunctionStatus, GeneHeader, Location};
pub use workbook::{Cell, Row, Sheet, Workbook};
