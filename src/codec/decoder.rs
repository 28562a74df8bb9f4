use super::*;
use crate::error::{ArtifactError, ArtifactResult};
use crate::excel::column_letter;
use crate::types::GeneHeader;
use crate::workbook::{Row, Sheet};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

fn accession_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\(([^()]+)\)\s*$").expect("valid regex"))
}

/// A column of the directory rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLocation {
    pub column: usize,
    pub name: String,
    pub protein_location: Option<String>,
    pub chromosome_location: Option<String>,
    pub gene_location: Option<String>,
    pub dbsnp_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedAllele {
    /// 0-based sheet row
    pub row: usize,
    pub name: String,
    /// Raw label; validated by the importer
    pub function_status: Option<String>,
    /// (column, trimmed value) for every non-blank cell
    pub values: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedDefinitions {
    /// `symbol` is empty when the sheet does not name its gene
    pub gene: GeneHeader,
    pub locations: Vec<DecodedLocation>,
    pub alleles: Vec<DecodedAllele>,
}

impl DecodedDefinitions {
    pub fn gene_symbol(&self) -> Option<&str> {
        Some(self.gene.symbol.as_str()).filter(|s| !s.is_empty())
    }

    /// Flattened (allele name, column, value) triples
    pub fn triples(&self) -> Vec<(String, usize, String)> {
        self.alleles
            .iter()
            .flat_map(|a| {
                a.values
                    .iter()
                    .map(move |(col, value)| (a.name.clone(), *col, value.clone()))
            })
            .collect()
    }
}

/// Read an allele definition sheet back into its column directory and rows.
///
/// Rows are read until the first row with a blank allele name. Structural
/// problems (missing header, unnamed columns, values outside the directory,
/// repeated names) fail the whole sheet.
pub fn decode(sheet: &Sheet) -> ArtifactResult<DecodedDefinitions> {
    let has_header = sheet
        .row(HEADER_ROW)
        .map(|row| row.has_text(COL_ALLELE))
        .unwrap_or(false);
    if !has_header {
        return Err(ArtifactError::malformed(
            sheet.name(),
            HEADER_ROW,
            "missing allele header row",
        ));
    }

    let gene = decode_gene_header(sheet);
    let locations = decode_locations(sheet)?;
    let directory: HashSet<usize> = locations.iter().map(|l| l.column).collect();

    let mut alleles = Vec::new();
    let mut seen = HashSet::new();
    for row_idx in FIRST_ALLELE_ROW..sheet.row_count() {
        let Some(row) = sheet.row(row_idx) else { break };
        let Some(name) = row.text_or_null(COL_ALLELE) else { break };

        if !seen.insert(name.clone()) {
            return Err(ArtifactError::malformed(
                sheet.name(),
                row_idx,
                format!("allele {} is listed more than once", name),
            ));
        }

        let mut values = Vec::new();
        for col in FIRST_LOCATION_COL..row.width() {
            let Some(value) = row.text_or_null(col) else { continue };
            if !directory.contains(&col) {
                return Err(ArtifactError::UnknownLocation(format!(
                    "column {} in row {} has no variant header",
                    column_letter(col),
                    row_idx + 1
                )));
            }
            values.push((col, value));
        }

        alleles.push(DecodedAllele {
            row: row_idx,
            name,
            function_status: row.text_or_null(COL_FUNCTION),
            values,
        });
    }

    Ok(DecodedDefinitions {
        gene,
        locations,
        alleles,
    })
}

fn decode_gene_header(sheet: &Sheet) -> GeneHeader {
    let text_at = |row_idx: usize, col: usize| sheet.row(row_idx).and_then(|r| r.text_or_null(col));
    let accession_at = |row_idx: usize| {
        text_at(row_idx, COL_FUNCTION).and_then(|label| {
            accession_pattern()
                .captures(&label)
                .map(|c| c[1].trim().to_string())
        })
    };

    let symbol = text_at(GENE_ROW, COL_ALLELE)
        .and_then(|label| gene_label_symbol(&label))
        .unwrap_or_default();

    GeneHeader {
        symbol,
        alleles_last_modified: sheet.row(GENE_ROW).and_then(|r| r.date_or_null(COL_FUNCTION)),
        mrna_sequence_id: accession_at(NAME_ROW),
        protein_sequence_id: accession_at(PROTEIN_ROW),
        chromo_sequence_id: accession_at(CHROMOSOME_ROW),
        gene_sequence_id: accession_at(GENE_SEQUENCE_ROW),
    }
}

fn decode_locations(sheet: &Sheet) -> ArtifactResult<Vec<DecodedLocation>> {
    let directory_rows: Vec<Option<&Row>> = (NAME_ROW..=DBSNP_ROW).map(|idx| sheet.row(idx)).collect();
    let width = directory_rows
        .iter()
        .flatten()
        .map(|r| r.width())
        .max()
        .unwrap_or(0);
    let label = |row_idx: usize, col: usize| {
        directory_rows[row_idx - NAME_ROW].and_then(|r| r.text_or_null(col))
    };

    let mut locations = Vec::new();
    let mut names = HashSet::new();
    for col in FIRST_LOCATION_COL..width {
        let protein_location = label(PROTEIN_ROW, col);
        let chromosome_location = label(CHROMOSOME_ROW, col);
        let gene_location = label(GENE_SEQUENCE_ROW, col);
        let dbsnp_id = label(DBSNP_ROW, col);

        let Some(name) = label(NAME_ROW, col) else {
            let has_other_labels = protein_location.is_some()
                || chromosome_location.is_some()
                || gene_location.is_some()
                || dbsnp_id.is_some();
            if has_other_labels {
                return Err(ArtifactError::malformed(
                    sheet.name(),
                    NAME_ROW,
                    format!("column {} has position labels but no variant name", column_letter(col)),
                ));
            }
            continue;
        };

        if !names.insert(name.clone()) {
            return Err(ArtifactError::DuplicateLocation(name));
        }

        locations.push(DecodedLocation {
            column: col,
            name,
            protein_location,
            chromosome_location,
            gene_location,
            dbsnp_id,
        });
    }
    Ok(locations)
}
