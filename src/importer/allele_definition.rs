use super::{entity_key_from_file_name, DirectoryImporter, StagedFile};
use crate::codec::{self, DecodedAllele, DecodedLocation, ALLELE_SHEET_NAME};
use crate::error::{ArtifactError, ArtifactResult};
use crate::store::Store;
use crate::types::{FileType, FunctionStatus, GeneHeader, HistoryEntry, Location};
use crate::workbook::{sidecar, Workbook};
use std::collections::HashMap;
use tracing::debug;

const DELETE_STATEMENTS: &[&str] = &[
    "DELETE FROM change_log WHERE type = 'ALLELE_DEFINITION'",
    "DELETE FROM file_note WHERE type = 'ALLELE_DEFINITION'",
    "DELETE FROM allele_location_value",
    "DELETE FROM allele_definition",
    "DELETE FROM sequence_location",
];

/// Loads allele definition tables, one gene per file.
///
/// Owns `sequence_location`, `allele_definition`, `allele_location_value`
/// and the ALLELE_DEFINITION notes and change log. The gene row itself is
/// reference data: it is created when missing and its header fields are
/// refreshed from the sheet, but never deleted.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlleleDefinitionImporter;

#[derive(Debug)]
pub struct ParsedDefinitions {
    gene: GeneHeader,
    locations: Vec<DecodedLocation>,
    alleles: Vec<DecodedAllele>,
    notes: Vec<String>,
    history: Vec<HistoryEntry>,
}

impl DirectoryImporter for AlleleDefinitionImporter {
    type Parsed = ParsedDefinitions;

    fn file_type(&self) -> FileType {
        FileType::AlleleDefinition
    }

    fn delete_statements(&self) -> &'static [&'static str] {
        DELETE_STATEMENTS
    }

    fn parse(&self, workbook: &Workbook, file_name: &str) -> ArtifactResult<ParsedDefinitions> {
        let sheet = workbook.open_sheet(&[ALLELE_SHEET_NAME])?;
        let decoded = codec::decode(sheet)?;

        let mut gene = decoded.gene;
        if gene.symbol.is_empty() {
            gene.symbol = entity_key_from_file_name(file_name).ok_or_else(|| {
                ArtifactError::malformed(sheet.name(), 0, "no gene label and no gene in the file name")
            })?;
        }

        // The status column is owned by the functionality reference; it is
        // validated here but not stored
        for allele in &decoded.alleles {
            if let Some(label) = &allele.function_status {
                FunctionStatus::from_label(label)
                    .map_err(|e| ArtifactError::malformed(sheet.name(), allele.row, e.to_string()))?;
            }
        }

        Ok(ParsedDefinitions {
            gene,
            locations: decoded.locations,
            alleles: decoded.alleles,
            notes: sidecar::read_notes(workbook),
            history: sidecar::read_history(workbook)?,
        })
    }

    fn stage(&self, store: &Store, parsed: ParsedDefinitions) -> ArtifactResult<StagedFile> {
        let symbol = parsed.gene.symbol.as_str();
        if store.gene_exists(symbol)? {
            store.update_definition_header(&parsed.gene)?;
        } else {
            debug!("Registering new gene {}", symbol);
            store.upsert_gene(&parsed.gene)?;
        }

        let mut column_ids: HashMap<usize, i64> = HashMap::new();
        for location in &parsed.locations {
            let id = store.insert_location(
                symbol,
                &Location {
                    id: 0,
                    name: location.name.clone(),
                    protein_location: location.protein_location.clone(),
                    chromosome_location: location.chromosome_location.clone(),
                    gene_location: location.gene_location.clone(),
                    dbsnp_id: location.dbsnp_id.clone(),
                },
            )?;
            column_ids.insert(location.column, id);
        }

        for allele in &parsed.alleles {
            let allele_id = store.insert_allele_definition(symbol, &allele.name)?;
            for (col, value) in &allele.values {
                let location_id = column_ids
                    .get(col)
                    .ok_or_else(|| ArtifactError::UnknownLocation(format!("column {}", col)))?;
                store.insert_location_value(allele_id, *location_id, value)?;
            }
        }

        for (ordinal, note) in parsed.notes.iter().enumerate() {
            store.insert_note(symbol, FileType::AlleleDefinition, ordinal, note)?;
        }
        for (ordinal, entry) in parsed.history.iter().enumerate() {
            store.insert_history(symbol, FileType::AlleleDefinition, ordinal, entry)?;
        }

        debug!(
            "{}: {} location(s), {} allele(s)",
            symbol,
            parsed.locations.len(),
            parsed.alleles.len()
        );
        Ok(StagedFile {
            entity_keys: vec![symbol.to_string()],
            rows: parsed.alleles.len(),
            skipped: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_definitions;
    use crate::types::{AlleleDefinition, GeneAlleleDefinitions, LocationValue};
    use crate::workbook::Cell;

    fn store() -> Store {
        let store = Store::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    fn workbook() -> Workbook {
        let location = |id: i64, name: &str| Location {
            id,
            name: name.to_string(),
            protein_location: None,
            chromosome_location: None,
            gene_location: None,
            dbsnp_id: Some(format!("rs{}", id)),
        };
        encode_definitions(&GeneAlleleDefinitions {
            gene: GeneHeader::new("TPMT"),
            locations: vec![location(5, "c.238G>C"), location(9, "c.460G>A")],
            alleles: vec![
                AlleleDefinition {
                    name: "*1".to_string(),
                    function_status: None,
                    values: vec![
                        LocationValue { location_id: 5, variant_allele: "G".to_string() },
                        LocationValue { location_id: 9, variant_allele: "G".to_string() },
                    ],
                },
                AlleleDefinition {
                    name: "*2".to_string(),
                    function_status: None,
                    values: vec![LocationValue { location_id: 5, variant_allele: "C".to_string() }],
                },
            ],
            notes: vec!["Reference is *1".to_string()],
            history: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_stage_maps_columns_to_new_location_ids() {
        let store = store();
        let importer = AlleleDefinitionImporter;
        let parsed = importer.parse(&workbook(), "TPMT_defs.xlsx").unwrap();
        let staged = importer.stage(&store, parsed).unwrap();

        assert_eq!(staged.entity_keys, vec!["TPMT"]);
        assert_eq!(staged.rows, 2);

        let locations = store.locations("TPMT").unwrap();
        let names: Vec<&str> = locations.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["c.238G>C", "c.460G>A"]);

        let ids = store.allele_definition_ids("TPMT").unwrap();
        let star2 = store.location_values(ids["*2"]).unwrap();
        assert_eq!(star2.len(), 1);
        assert_eq!(star2[0].location_id, locations[0].id);
        assert_eq!(store.notes("TPMT", FileType::AlleleDefinition).unwrap(), vec!["Reference is *1"]);
    }

    #[test]
    fn test_gene_falls_back_to_file_name() {
        let mut wb = workbook();
        wb.sheet_mut(ALLELE_SHEET_NAME).unwrap().row_at(0).set(0, Cell::Blank);

        let parsed = AlleleDefinitionImporter.parse(&wb, "NUDT15_alleles.xlsx").unwrap();
        assert_eq!(parsed.gene.symbol, "NUDT15");
    }

    #[test]
    fn test_bad_status_label_is_malformed() {
        let mut wb = workbook();
        wb.sheet_mut(ALLELE_SHEET_NAME)
            .unwrap()
            .row_at(codec::FIRST_ALLELE_ROW)
            .set_text(1, Some("Mostly fine"));

        let err = AlleleDefinitionImporter.parse(&wb, "TPMT.xlsx").unwrap_err();
        assert!(matches!(err, ArtifactError::MalformedRow { row, .. } if row == codec::FIRST_ALLELE_ROW + 1));
    }

    #[test]
    fn test_missing_allele_sheet() {
        let wb = Workbook::new("TPMT.xlsx");
        assert!(matches!(
            AlleleDefinitionImporter.parse(&wb, "TPMT.xlsx").unwrap_err(),
            ArtifactError::SheetNotFound(_)
        ));
    }
}
