use super::ArtifactExporter;
use crate::codec::encode_definitions;
use crate::error::{ArtifactError, ArtifactResult};
use crate::store::Store;
use crate::types::{AlleleDefinition, FileType, GeneAlleleDefinitions};
use crate::workbook::Workbook;

/// One allele definition table per gene that has definitions
#[derive(Debug, Default, Clone, Copy)]
pub struct AlleleDefinitionExporter;

impl ArtifactExporter for AlleleDefinitionExporter {
    fn file_type(&self) -> FileType {
        FileType::AlleleDefinition
    }

    fn entity_keys(&self, store: &Store) -> ArtifactResult<Vec<String>> {
        store.genes_with_definitions()
    }

    fn build(&self, store: &Store, gene: &str) -> ArtifactResult<Workbook> {
        encode_definitions(&load_allele_definitions(store, gene)?)
    }
}

/// Everything the allele definition artifact shows for one gene. Function
/// status comes from the functionality reference rows.
pub fn load_allele_definitions(store: &Store, gene: &str) -> ArtifactResult<GeneAlleleDefinitions> {
    let header = store
        .gene_header(gene)?
        .ok_or_else(|| ArtifactError::UnknownGene(gene.to_string()))?;
    let statuses = store.function_statuses(gene)?;

    let mut alleles = Vec::new();
    for (id, name) in store.allele_definitions(gene)? {
        alleles.push(AlleleDefinition {
            function_status: statuses.get(&name).copied(),
            values: store.location_values(id)?,
            name,
        });
    }

    Ok(GeneAlleleDefinitions {
        gene: header,
        locations: store.locations(gene)?,
        alleles,
        notes: store.notes(gene, FileType::AlleleDefinition)?,
        history: store.history(gene, FileType::AlleleDefinition)?,
    })
}
