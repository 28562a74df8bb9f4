//! Placeholder artifacts for genes that have no curated data yet

use crate::codec::{encode_definitions, encode_function_references};
use crate::error::{ArtifactError, ArtifactResult};
use crate::excel::ExcelExporter;
use crate::store::Store;
use crate::types::{
    AlleleDefinition, GeneAlleleDefinitions, GeneFunctionReferences, GeneHeader, HistoryEntry,
    Location,
};
use crate::workbook::Workbook;
use chrono::{Local, NaiveDate};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const CREATED_NOTE: &str = "File created";

/// Starter files for a set of genes
pub struct StarterPack<'a> {
    store: &'a Store,
    genes: BTreeSet<String>,
    today: NaiveDate,
}

impl<'a> StarterPack<'a> {
    pub fn new<I, S>(store: &'a Store, genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            store,
            genes: genes
                .into_iter()
                .map(Into::into)
                .map(|g: String| g.trim().to_string())
                .filter(|g| !g.is_empty())
                .collect(),
            today: Local::now().date_naive(),
        }
    }

    /// Write the starter workbooks into an existing directory
    pub fn write(&self, directory: &Path) -> ArtifactResult<Vec<PathBuf>> {
        if !directory.is_dir() {
            return Err(ArtifactError::DirectoryNotFound(directory.display().to_string()));
        }
        if self.genes.is_empty() {
            warn!("Nothing to do");
            return Ok(Vec::new());
        }

        let mut written = Vec::new();
        for gene in &self.genes {
            if self.store.gene_exists(gene)? {
                warn!("{} already exists, starter files will not include possibly extant data", gene);
            }
            for workbook in starter_workbooks(gene, self.today)? {
                let path = directory.join(workbook.name());
                ExcelExporter::new(&workbook).export(&path)?;
                info!("Created starter file {}", path.display());
                written.push(path);
            }
        }
        Ok(written)
    }
}

/// Allele definition and functionality reference templates for one gene
pub fn starter_workbooks(gene: &str, today: NaiveDate) -> ArtifactResult<Vec<Workbook>> {
    let history = vec![HistoryEntry::new(today, CREATED_NOTE)];

    let definitions = GeneAlleleDefinitions {
        gene: GeneHeader {
            symbol: gene.to_string(),
            alleles_last_modified: Some(today),
            chromo_sequence_id: Some("NC_#######".to_string()),
            protein_sequence_id: Some("NP_#######".to_string()),
            gene_sequence_id: Some("NG_#######".to_string()),
            mrna_sequence_id: Some("NM_#######".to_string()),
        },
        locations: vec![Location {
            id: 1,
            name: "VARIANT HERE".to_string(),
            protein_location: Some("X###X".to_string()),
            chromosome_location: Some("g.#####".to_string()),
            gene_location: Some("g.#####".to_string()),
            dbsnp_id: Some("rs#####".to_string()),
        }],
        alleles: vec![AlleleDefinition {
            name: "ALLELE NAME HERE".to_string(),
            function_status: None,
            values: Vec::new(),
        }],
        notes: Vec::new(),
        history: history.clone(),
    };

    let references = GeneFunctionReferences {
        gene: gene.to_string(),
        history,
        ..Default::default()
    };

    Ok(vec![
        encode_definitions(&definitions)?,
        encode_function_references(&references)?,
    ])
}
