use super::ArtifactExporter;
use crate::codec::encode_function_references;
use crate::error::{ArtifactError, ArtifactResult};
use crate::store::Store;
use crate::types::{FileType, GeneFunctionReferences};
use crate::workbook::Workbook;

/// One functionality reference per gene with reference rows
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionReferenceExporter;

impl ArtifactExporter for FunctionReferenceExporter {
    fn file_type(&self) -> FileType {
        FileType::AlleleFunctionReference
    }

    fn entity_keys(&self, store: &Store) -> ArtifactResult<Vec<String>> {
        store.genes_with_function_references()
    }

    fn build(&self, store: &Store, gene: &str) -> ArtifactResult<Workbook> {
        encode_function_references(&load_function_references(store, gene)?)
    }
}

pub fn load_function_references(store: &Store, gene: &str) -> ArtifactResult<GeneFunctionReferences> {
    if !store.gene_exists(gene)? {
        return Err(ArtifactError::UnknownGene(gene.to_string()));
    }

    Ok(GeneFunctionReferences {
        gene: gene.to_string(),
        references: store.function_references(gene)?,
        methods: store.function_methods(gene)?,
        notes: store.notes(gene, FileType::AlleleFunctionReference)?,
        history: store.history(gene, FileType::AlleleFunctionReference)?,
    })
}
