use super::{entity_key_from_file_name, DirectoryImporter, StagedFile};
use crate::codec::{decode_frequencies, FREQUENCY_SHEET_NAME};
use crate::error::{ArtifactError, ArtifactResult};
use crate::store::Store;
use crate::types::{FileType, HistoryEntry, PopulationFrequencies};
use crate::workbook::{sidecar, Workbook};
use tracing::{debug, warn};

const DELETE_STATEMENTS: &[&str] = &[
    "DELETE FROM change_log WHERE type = 'FREQUENCY'",
    "DELETE FROM file_note WHERE type = 'FREQUENCY'",
    "DELETE FROM allele_frequency",
    "DELETE FROM population",
    "UPDATE gene SET frequency_methods = NULL",
];

/// Loads population allele frequencies, one gene per file.
///
/// Every file must carry a Methods sheet. Allele columns naming an allele
/// with no definition for the gene are logged and their values skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrequencyImporter;

#[derive(Debug)]
pub struct ParsedFrequencies {
    gene: String,
    sheet: String,
    alleles: Vec<String>,
    populations: Vec<(usize, PopulationFrequencies)>,
    methods: Option<String>,
    notes: Vec<String>,
    history: Vec<HistoryEntry>,
}

impl DirectoryImporter for FrequencyImporter {
    type Parsed = ParsedFrequencies;

    fn file_type(&self) -> FileType {
        FileType::Frequency
    }

    fn delete_statements(&self) -> &'static [&'static str] {
        DELETE_STATEMENTS
    }

    fn parse(&self, workbook: &Workbook, file_name: &str) -> ArtifactResult<ParsedFrequencies> {
        let sheet = workbook.open_sheet(&[FREQUENCY_SHEET_NAME])?;
        let decoded = decode_frequencies(sheet)?;
        let gene = decoded
            .gene
            .or_else(|| entity_key_from_file_name(file_name))
            .ok_or_else(|| ArtifactError::malformed(sheet.name(), 0, "couldn't find gene symbol"))?;

        workbook.open_sheet(sidecar::METHODS_SHEET_ALIASES)?;

        Ok(ParsedFrequencies {
            gene,
            sheet: sheet.name().to_string(),
            alleles: decoded.alleles,
            populations: decoded.populations,
            methods: sidecar::read_methods(workbook),
            notes: sidecar::read_notes(workbook),
            history: sidecar::read_history(workbook)?,
        })
    }

    fn stage(&self, store: &Store, parsed: ParsedFrequencies) -> ArtifactResult<StagedFile> {
        let gene = parsed.gene.as_str();
        if !store.gene_exists(gene)? {
            return Err(ArtifactError::UnknownGene(gene.to_string()));
        }
        let known = store.allele_definition_ids(gene)?;

        let mut staged = StagedFile {
            entity_keys: vec![gene.to_string()],
            ..Default::default()
        };
        for allele in parsed.alleles.iter().filter(|a| !known.contains_key(*a)) {
            let e = ArtifactError::UnknownEntityReference {
                entity: "allele",
                name: allele.clone(),
            };
            warn!("{} (sheet '{}' header), skipping its column", e, parsed.sheet);
            staged.skipped += 1;
        }

        for (row_idx, population) in &parsed.populations {
            let id = store.insert_population(gene, population)?;
            for freq in &population.frequencies {
                if known.contains_key(&freq.allele_name) {
                    store.insert_allele_frequency(id, freq)?;
                }
            }
            debug!("Stored population {} from row {}", population.population, row_idx + 1);
            staged.rows += 1;
        }

        store.set_frequency_methods(gene, parsed.methods.as_deref())?;
        for (ordinal, note) in parsed.notes.iter().enumerate() {
            store.insert_note(gene, FileType::Frequency, ordinal, note)?;
        }
        for (ordinal, entry) in parsed.history.iter().enumerate() {
            store.insert_history(gene, FileType::Frequency, ordinal, entry)?;
        }
        Ok(staged)
    }
}
