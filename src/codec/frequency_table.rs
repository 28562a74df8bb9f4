//! Allele frequency sheet
//!
//! One row per studied population. Seven descriptive columns come first,
//! then one column per allele named in the header row:
//!
//! ```text
//! row 0  GENE: UGT1A1
//! row 1  Authors | Year | PMID | … | N subjects genotyped | *1    | *28
//! row 2  Smith   | 2019 | 123  | … | 480                  | 0.62  | 0.35
//! ```
//!
//! The gene label is optional on read; without it the header is row 0.

use super::gene_label_symbol;
use crate::error::{ArtifactError, ArtifactResult};
use crate::excel::column_letter;
use crate::ordering::sort_by_haplotype_name;
use crate::types::{AlleleFrequency, FileType, GeneFrequencies, PopulationFrequencies};
use crate::workbook::{sidecar, Cell, Row, Sheet, Workbook};
use std::collections::{HashMap, HashSet};

pub const FREQUENCY_SHEET_NAME: &str = "References";

const COL_AUTHORS: usize = 0;
const COL_YEAR: usize = 1;
const COL_CITATION: usize = 2;
const COL_GROUP: usize = 3;
const COL_POPULATION: usize = 4;
const COL_INFO: usize = 5;
const COL_SUBJECTS: usize = 6;
const FIRST_ALLELE_COL: usize = 7;

const HEADERS: [&str; FIRST_ALLELE_COL] = [
    "Authors",
    "Year",
    "PMID",
    "Biogeographical group",
    "Population",
    "Additional population info",
    "N subjects genotyped",
];

/// Build the frequency artifact. Allele columns are the union of alleles
/// reported by any population, in haplotype order. The Methods sheet is
/// written even when empty.
pub fn encode_frequencies(gene: &GeneFrequencies) -> ArtifactResult<Workbook> {
    let symbol = gene.gene.trim();
    if symbol.is_empty() {
        return Err(ArtifactError::Export("Gene must be specified".to_string()));
    }

    let mut alleles: Vec<&str> = Vec::new();
    for population in &gene.populations {
        if population.population.trim().is_empty() {
            return Err(ArtifactError::Export(format!(
                "{} has a frequency row without a population name",
                symbol
            )));
        }
        let mut reported = HashSet::new();
        for freq in &population.frequencies {
            let name = freq.allele_name.trim();
            if name.is_empty() {
                return Err(ArtifactError::Export(format!(
                    "Frequency for population {} has no allele name",
                    population.population
                )));
            }
            if !reported.insert(name) {
                return Err(ArtifactError::Export(format!(
                    "Allele {} is reported twice for population {}",
                    name, population.population
                )));
            }
            if !alleles.contains(&name) {
                alleles.push(name);
            }
        }
    }
    sort_by_haplotype_name(&mut alleles, |a| *a);
    let columns: HashMap<&str, usize> = alleles
        .iter()
        .enumerate()
        .map(|(i, name)| (*name, FIRST_ALLELE_COL + i))
        .collect();

    let mut sheet = Sheet::new(FREQUENCY_SHEET_NAME);
    let label_row = sheet.next_row();
    label_row.header = true;
    label_row.set(0, Cell::text(format!("GENE: {}", symbol)));

    let header = sheet.next_row();
    header.header = true;
    for (col, text) in HEADERS.iter().chain(alleles.iter()).enumerate() {
        header.set(col, Cell::text(*text));
    }

    for population in &gene.populations {
        let row = sheet.next_row();
        write_population(row, population);
        for freq in &population.frequencies {
            let col = columns[freq.allele_name.trim()];
            row.set_text(col, Some(freq.frequency.as_str()));
        }
    }

    let mut workbook = Workbook::new(FileType::Frequency.file_name(symbol));
    workbook.add_sheet(sheet);
    sidecar::write_methods(&mut workbook, gene.methods.as_deref());
    if workbook.find_sheet(sidecar::METHODS_SHEET_ALIASES).is_none() {
        workbook.create_sheet(sidecar::METHODS_SHEET_ALIASES[0]);
    }
    sidecar::write_notes(&mut workbook, &gene.notes);
    sidecar::write_history(&mut workbook, &gene.history);
    Ok(workbook)
}

fn write_population(row: &mut Row, population: &PopulationFrequencies) {
    let year = population.year.map(|y| y.to_string());
    let subjects = population.subject_count.map(|n| n.to_string());
    row.set_text(COL_AUTHORS, population.authors.as_deref());
    row.set_text(COL_YEAR, year.as_deref());
    row.set_text(COL_CITATION, population.citation.as_deref());
    row.set_text(COL_GROUP, population.population_group.as_deref());
    row.set_text(COL_POPULATION, Some(population.population.as_str()));
    row.set_text(COL_INFO, population.population_info.as_deref());
    row.set_text(COL_SUBJECTS, subjects.as_deref());
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFrequencies {
    pub gene: Option<String>,
    /// Allele names from the header row, left to right
    pub alleles: Vec<String>,
    /// (0-based sheet row, population)
    pub populations: Vec<(usize, PopulationFrequencies)>,
}

/// Read the References sheet. Blank rows are skipped. A repeated allele
/// header, a value under an unnamed column, a missing population name or a
/// non-numeric year or subject count fails the sheet.
pub fn decode_frequencies(sheet: &Sheet) -> ArtifactResult<DecodedFrequencies> {
    let label = (0..sheet.row_count()).find_map(|idx| {
        let text = sheet.row(idx)?.text_or_null(0)?;
        gene_label_symbol(&text).map(|symbol| (idx, symbol))
    });
    let (gene, header_row) = match label {
        Some((idx, symbol)) => (Some(symbol), idx + 1),
        None => (None, 0),
    };

    let Some(header) = sheet.row(header_row).filter(|r| r.has_text(COL_AUTHORS)) else {
        return Err(ArtifactError::malformed(sheet.name(), header_row, "missing header row"));
    };

    let mut alleles = Vec::new();
    let mut allele_columns = HashMap::new();
    for col in FIRST_ALLELE_COL..header.width() {
        let Some(name) = header.text_or_null(col) else { continue };
        if allele_columns.contains_key(&name) {
            return Err(ArtifactError::malformed(
                sheet.name(),
                header_row,
                format!("allele {} has more than one column", name),
            ));
        }
        allele_columns.insert(name.clone(), col);
        alleles.push(name);
    }
    let names_by_column: HashMap<usize, &str> = allele_columns
        .iter()
        .map(|(name, col)| (*col, name.as_str()))
        .collect();

    let mut populations = Vec::new();
    for row_idx in header_row + 1..sheet.row_count() {
        let Some(row) = sheet.row(row_idx) else { continue };
        if row.cells().iter().all(Cell::is_blank) {
            continue;
        }

        let malformed = |reason: String| ArtifactError::malformed(sheet.name(), row_idx, reason);
        let population = row
            .text_or_null(COL_POPULATION)
            .ok_or_else(|| malformed("population name is missing".to_string()))?;

        let mut frequencies = Vec::new();
        for col in FIRST_ALLELE_COL..row.width() {
            let Some(frequency) = row.text_or_null(col) else { continue };
            let allele_name = names_by_column.get(&col).ok_or_else(|| {
                malformed(format!("column {} has a value but no allele header", column_letter(col)))
            })?;
            frequencies.push(AlleleFrequency {
                allele_name: allele_name.to_string(),
                frequency,
            });
        }

        populations.push((
            row_idx,
            PopulationFrequencies {
                authors: row.text_or_null(COL_AUTHORS),
                year: whole_number(row, COL_YEAR).map_err(&malformed)?,
                citation: row.text_or_null(COL_CITATION),
                population_group: row.text_or_null(COL_GROUP),
                population,
                population_info: row.text_or_null(COL_INFO),
                subject_count: whole_number(row, COL_SUBJECTS).map_err(&malformed)?,
                frequencies,
            },
        ));
    }

    Ok(DecodedFrequencies {
        gene,
        alleles,
        populations,
    })
}

/// Integer cell; spreadsheet numbers arrive as "2019" or "2019.0"
fn whole_number<T: TryFrom<i64>>(row: &Row, col: usize) -> Result<Option<T>, String> {
    let Some(text) = row.text_or_null(col) else {
        return Ok(None);
    };
    let value = text.parse::<i64>().ok().or_else(|| {
        text.parse::<f64>()
            .ok()
            .filter(|f| f.fract() == 0.0 && f.abs() < 1e15)
            .map(|f| f as i64)
    });
    value
        .and_then(|v| T::try_from(v).ok())
        .map(Some)
        .ok_or_else(|| format!("'{}' in {} is not a whole number", text, HEADERS[col]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freq(allele: &str, value: &str) -> AlleleFrequency {
        AlleleFrequency {
            allele_name: allele.to_string(),
            frequency: value.to_string(),
        }
    }

    fn population(name: &str, frequencies: Vec<AlleleFrequency>) -> PopulationFrequencies {
        PopulationFrequencies {
            population: name.to_string(),
            frequencies,
            ..Default::default()
        }
    }

    /// Header row at 0, no gene label
    fn unlabeled_sheet(alleles: &[&str]) -> Sheet {
        let mut sheet = Sheet::new(FREQUENCY_SHEET_NAME);
        let header = sheet.next_row();
        for (col, text) in HEADERS.iter().chain(alleles.iter()).enumerate() {
            header.set_text(col, Some(*text));
        }
        sheet
    }

    #[test]
    fn test_allele_columns_are_union_in_haplotype_order() {
        let gene = GeneFrequencies {
            gene: "UGT1A1".to_string(),
            populations: vec![
                population("Finnish", vec![freq("*28", "0.31"), freq("*1", "0.66")]),
                population("Japanese", vec![freq("*6", "0.13")]),
            ],
            ..Default::default()
        };
        let wb = encode_frequencies(&gene).unwrap();
        let decoded = decode_frequencies(wb.sheet(FREQUENCY_SHEET_NAME).unwrap()).unwrap();

        assert_eq!(decoded.gene.as_deref(), Some("UGT1A1"));
        assert_eq!(decoded.alleles, vec!["*1", "*6", "*28"]);
        assert_eq!(decoded.populations[0].0, 2);
        assert_eq!(
            decoded.populations[1].1.frequencies,
            vec![freq("*6", "0.13")]
        );
        assert_eq!(wb.name(), "UGT1A1-Frequency_Table.xlsx");
    }

    #[test]
    fn test_methods_sheet_always_written() {
        let gene = GeneFrequencies {
            gene: "UGT1A1".to_string(),
            ..Default::default()
        };
        let wb = encode_frequencies(&gene).unwrap();
        assert!(wb.find_sheet(sidecar::METHODS_SHEET_ALIASES).is_some());
    }

    #[test]
    fn test_encode_rejects_population_without_name() {
        let gene = GeneFrequencies {
            gene: "UGT1A1".to_string(),
            populations: vec![population(" ", vec![])],
            ..Default::default()
        };
        assert!(matches!(
            encode_frequencies(&gene).unwrap_err(),
            ArtifactError::Export(_)
        ));
    }

    #[test]
    fn test_encode_rejects_allele_reported_twice() {
        let gene = GeneFrequencies {
            gene: "UGT1A1".to_string(),
            populations: vec![population("Finnish", vec![freq("*1", "0.6"), freq("*1", "0.7")])],
            ..Default::default()
        };
        assert!(encode_frequencies(&gene).is_err());
    }

    #[test]
    fn test_decode_without_label_reads_numbers() {
        let mut sheet = unlabeled_sheet(&["*1", "*3"]);
        let row = sheet.next_row();
        row.set_text(COL_YEAR, Some("2019.0"));
        row.set_text(COL_POPULATION, Some("Korean"));
        row.set_text(COL_SUBJECTS, Some("480"));
        row.set_text(FIRST_ALLELE_COL + 1, Some("0.02"));
        sheet.next_row();

        let decoded = decode_frequencies(&sheet).unwrap();
        assert_eq!(decoded.gene, None);
        assert_eq!(decoded.populations.len(), 1);
        let korean = &decoded.populations[0].1;
        assert_eq!(korean.year, Some(2019));
        assert_eq!(korean.subject_count, Some(480));
        assert_eq!(korean.frequencies, vec![freq("*3", "0.02")]);
    }

    #[test]
    fn test_missing_population_is_malformed_row() {
        let mut sheet = unlabeled_sheet(&["*1"]);
        sheet.next_row().set_text(FIRST_ALLELE_COL, Some("0.9"));

        let err = decode_frequencies(&sheet).unwrap_err();
        assert!(matches!(err, ArtifactError::MalformedRow { row: 2, .. }));
    }

    #[test]
    fn test_bad_subject_count_is_malformed_row() {
        let mut sheet = unlabeled_sheet(&["*1"]);
        let row = sheet.next_row();
        row.set_text(COL_POPULATION, Some("Korean"));
        row.set_text(COL_SUBJECTS, Some("about 400"));

        let err = decode_frequencies(&sheet).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::MalformedRow { row: 2, ref reason, .. } if reason.contains("N subjects genotyped")
        ));
    }

    #[test]
    fn test_repeated_allele_header_is_malformed_row() {
        let sheet = unlabeled_sheet(&["*1", "*1"]);
        let err = decode_frequencies(&sheet).unwrap_err();
        assert!(matches!(err, ArtifactError::MalformedRow { row: 1, .. }));
    }

    #[test]
    fn test_value_under_unnamed_column_is_malformed_row() {
        let mut sheet = unlabeled_sheet(&["*1"]);
        let row = sheet.next_row();
        row.set_text(COL_POPULATION, Some("Korean"));
        row.set_text(FIRST_ALLELE_COL + 2, Some("0.1"));

        assert!(matches!(
            decode_frequencies(&sheet).unwrap_err(),
            ArtifactError::MalformedRow { row: 2, .. }
        ));
    }
}
