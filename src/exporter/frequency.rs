use super::ArtifactExporter;
use crate::codec::encode_frequencies;
use crate::error::{ArtifactError, ArtifactResult};
use crate::store::Store;
use crate::types::{FileType, GeneFrequencies};
use crate::workbook::Workbook;

/// One frequency table per gene with population rows
#[derive(Debug, Default, Clone, Copy)]
pub struct FrequencyExporter;

impl ArtifactExporter for FrequencyExporter {
    fn file_type(&self) -> FileType {
        FileType::Frequency
    }

    fn entity_keys(&self, store: &Store) -> ArtifactResult<Vec<String>> {
        store.genes_with_frequencies()
    }

    fn build(&self, store: &Store, gene: &str) -> ArtifactResult<Workbook> {
        encode_frequencies(&load_frequencies(store, gene)?)
    }
}

pub fn load_frequencies(store: &Store, gene: &str) -> ArtifactResult<GeneFrequencies> {
    if !store.gene_exists(gene)? {
        return Err(ArtifactError::UnknownGene(gene.to_string()));
    }

    Ok(GeneFrequencies {
        gene: gene.to_string(),
        populations: store.populations(gene)?,
        methods: store.frequency_methods(gene)?,
        notes: store.notes(gene, FileType::Frequency)?,
        history: store.history(gene, FileType::Frequency)?,
    })
}
