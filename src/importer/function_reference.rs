use super::{entity_key_from_file_name, DirectoryImporter, StagedFile};
use crate::codec::{decode_function_references, FUNCTION_SHEET_NAME};
use crate::error::{ArtifactError, ArtifactResult};
use crate::store::Store;
use crate::types::{FileType, FunctionReference, HistoryEntry};
use crate::workbook::{sidecar, Workbook};
use std::collections::HashMap;
use tracing::warn;

const DELETE_STATEMENTS: &[&str] = &[
    "DELETE FROM change_log WHERE type = 'ALLELE_FUNCTION_REFERENCE'",
    "DELETE FROM file_note WHERE type = 'ALLELE_FUNCTION_REFERENCE'",
    "DELETE FROM allele_function",
    "UPDATE gene SET function_methods = NULL",
];

/// Loads allele functionality references, one gene per file.
///
/// Rows naming an allele with no definition for the gene are logged and
/// skipped. The gene itself must already exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct FunctionReferenceImporter;

#[derive(Debug)]
pub struct ParsedReferences {
    gene: String,
    sheet: String,
    references: Vec<(usize, FunctionReference)>,
    methods: Option<String>,
    notes: Vec<String>,
    history: Vec<HistoryEntry>,
}

impl DirectoryImporter for FunctionReferenceImporter {
    type Parsed = ParsedReferences;

    fn file_type(&self) -> FileType {
        FileType::AlleleFunctionReference
    }

    fn delete_statements(&self) -> &'static [&'static str] {
        DELETE_STATEMENTS
    }

    fn parse(&self, workbook: &Workbook, file_name: &str) -> ArtifactResult<ParsedReferences> {
        let sheet = workbook.open_sheet(&[FUNCTION_SHEET_NAME])?;
        let decoded = decode_function_references(sheet)?;
        let gene = decoded
            .gene
            .or_else(|| entity_key_from_file_name(file_name))
            .ok_or_else(|| ArtifactError::malformed(sheet.name(), 0, "couldn't find gene symbol"))?;

        Ok(ParsedReferences {
            gene,
            sheet: sheet.name().to_string(),
            references: decoded.references,
            methods: sidecar::read_methods(workbook),
            notes: sidecar::read_notes(workbook),
            history: sidecar::read_history(workbook)?,
        })
    }

    fn stage(&self, store: &Store, parsed: ParsedReferences) -> ArtifactResult<StagedFile> {
        let gene = parsed.gene.as_str();
        if !store.gene_exists(gene)? {
            return Err(ArtifactError::UnknownGene(gene.to_string()));
        }
        let alleles = store.allele_definition_ids(gene)?;

        let mut staged = StagedFile {
            entity_keys: vec![gene.to_string()],
            ..Default::default()
        };
        for (row_idx, reference) in &parsed.references {
            match resolve_allele(&alleles, reference) {
                Ok(()) => {
                    store.insert_function_reference(gene, reference)?;
                    staged.rows += 1;
                }
                Err(e) if e.is_recoverable() => {
                    warn!("{} (sheet '{}' row {}), skipping", e, parsed.sheet, row_idx + 1);
                    staged.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        store.set_function_methods(gene, parsed.methods.as_deref())?;
        for (ordinal, note) in parsed.notes.iter().enumerate() {
            store.insert_note(gene, FileType::AlleleFunctionReference, ordinal, note)?;
        }
        for (ordinal, entry) in parsed.history.iter().enumerate() {
            store.insert_history(gene, FileType::AlleleFunctionReference, ordinal, entry)?;
        }
        Ok(staged)
    }
}

fn resolve_allele(alleles: &HashMap<String, i64>, reference: &FunctionReference) -> ArtifactResult<()> {
    if alleles.contains_key(&reference.allele_name) {
        Ok(())
    } else {
        Err(ArtifactError::UnknownEntityReference {
            entity: "allele",
            name: reference.allele_name.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_function_references;
    use crate::types::{FunctionStatus, GeneFunctionReferences, GeneHeader};

    fn reference(name: &str) -> FunctionReference {
        FunctionReference {
            allele_name: name.to_string(),
            function_status: Some(FunctionStatus::Normal),
            ..Default::default()
        }
    }

    fn workbook(gene: &str) -> Workbook {
        encode_function_references(&GeneFunctionReferences {
            gene: gene.to_string(),
            references: vec![reference("*1"), reference("*99"), reference("*2")],
            methods: Some("Curated by the working group".to_string()),
            ..Default::default()
        })
        .unwrap()
    }

    fn store_with_alleles() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store.upsert_gene(&GeneHeader::new("TPMT")).unwrap();
        store.insert_allele_definition("TPMT", "*1").unwrap();
        store.insert_allele_definition("TPMT", "*2").unwrap();
        store
    }

    #[test]
    fn test_unknown_allele_is_skipped() {
        let store = store_with_alleles();
        let parsed = FunctionReferenceImporter.parse(&workbook("TPMT"), "TPMT.xlsx").unwrap();
        let staged = FunctionReferenceImporter.stage(&store, parsed).unwrap();

        assert_eq!(staged.rows, 2);
        assert_eq!(staged.skipped, 1);
        let names: Vec<String> = store
            .function_references("TPMT")
            .unwrap()
            .into_iter()
            .map(|r| r.allele_name)
            .collect();
        assert_eq!(names, vec!["*1", "*2"]);
        assert_eq!(
            store.function_methods("TPMT").unwrap().as_deref(),
            Some("Curated by the working group")
        );
    }

    #[test]
    fn test_unknown_gene_is_fatal() {
        let store = store_with_alleles();
        let parsed = FunctionReferenceImporter.parse(&workbook("DPYD"), "DPYD.xlsx").unwrap();
        assert!(matches!(
            FunctionReferenceImporter.stage(&store, parsed).unwrap_err(),
            ArtifactError::UnknownGene(gene) if gene == "DPYD"
        ));
    }
}
