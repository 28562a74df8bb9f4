//! Allele functionality reference sheet
//!
//! A flat table, one allele per row, under a gene label and a fixed header:
//!
//! ```text
//! row 0  GENE: TPMT
//! row 1  Allele/cDNA/rsID | Activity Value | … | Comments
//! row 2  *1               | 1.0            | … |
//! ```

use super::gene_label_symbol;
use crate::error::{ArtifactError, ArtifactResult};
use crate::types::{FileType, FunctionReference, FunctionStatus, GeneFunctionReferences};
use crate::workbook::{sidecar, Cell, Row, Sheet, Workbook};
use std::collections::HashSet;

pub const FUNCTION_SHEET_NAME: &str = "Allele Function";

const COL_ALLELE: usize = 0;
const COL_ACTIVITY: usize = 1;
const COL_FUNCTION: usize = 2;
const COL_CLINICAL_FUNCTION: usize = 3;
const COL_SUBSTRATE: usize = 4;
const COL_CITATIONS: usize = 5;
const COL_STRENGTH: usize = 6;
const COL_FINDINGS: usize = 7;
const COL_COMMENTS: usize = 8;

const HEADERS: [&str; 9] = [
    "Allele/cDNA/rsID",
    "Activity Value (Optional)",
    "Allele Functional Status (Optional)",
    "Allele Clinical Functional Status (Required)",
    "Allele Clinical Function Substrate Specificity (Optional)",
    "PMID (Optional)",
    "Strength of Evidence (Optional)",
    "Findings (Optional)",
    "Comments",
];

/// Build the functionality reference artifact: data sheet, then the Methods,
/// Notes and Change History sidecars
pub fn encode_function_references(gene: &GeneFunctionReferences) -> ArtifactResult<Workbook> {
    let symbol = gene.gene.trim();
    if symbol.is_empty() {
        return Err(ArtifactError::Export("Gene must be specified".to_string()));
    }

    let mut sheet = Sheet::new(FUNCTION_SHEET_NAME);
    let label_row = sheet.next_row();
    label_row.header = true;
    label_row.set(COL_ALLELE, Cell::text(format!("GENE: {}", symbol)));

    let header = sheet.next_row();
    header.header = true;
    for (col, text) in HEADERS.iter().enumerate() {
        header.set(col, Cell::text(*text));
    }

    let mut seen = HashSet::new();
    for reference in &gene.references {
        let name = reference.allele_name.trim();
        if name.is_empty() {
            return Err(ArtifactError::Export(format!(
                "{} has a functionality reference without an allele name",
                symbol
            )));
        }
        if !seen.insert(name) {
            return Err(ArtifactError::Export(format!(
                "Allele {} is listed more than once",
                name
            )));
        }
        write_reference(sheet.next_row(), reference);
    }

    let mut workbook = Workbook::new(FileType::AlleleFunctionReference.file_name(symbol));
    workbook.add_sheet(sheet);
    sidecar::write_methods(&mut workbook, gene.methods.as_deref());
    sidecar::write_notes(&mut workbook, &gene.notes);
    sidecar::write_history(&mut workbook, &gene.history);
    Ok(workbook)
}

fn write_reference(row: &mut Row, reference: &FunctionReference) {
    let citations = reference.citations.join("; ");
    row.set_text(COL_ALLELE, Some(reference.allele_name.as_str()));
    row.set_text(COL_ACTIVITY, reference.activity_value.as_deref());
    row.set_text(COL_FUNCTION, reference.function_status.map(|s| s.label()));
    row.set_text(
        COL_CLINICAL_FUNCTION,
        reference.clinical_function_status.map(|s| s.label()),
    );
    row.set_text(COL_SUBSTRATE, reference.clinical_substrate.as_deref());
    row.set_text(COL_CITATIONS, Some(citations.as_str()));
    row.set_text(COL_STRENGTH, reference.strength.as_deref());
    row.set_text(COL_FINDINGS, reference.findings.as_deref());
    row.set_text(COL_COMMENTS, reference.comments.as_deref());
}

/// Rows read from a functionality reference sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedFunctionReferences {
    /// None when no "GENE:" label was found above the table
    pub gene: Option<String>,
    /// (0-based sheet row, reference)
    pub references: Vec<(usize, FunctionReference)>,
}

/// Read the data sheet. The table starts two rows below the gene label, or
/// at row 1 when there is no label, and ends at the first blank allele name.
pub fn decode_function_references(sheet: &Sheet) -> ArtifactResult<DecodedFunctionReferences> {
    let label = (0..sheet.row_count()).find_map(|idx| {
        let text = sheet.row(idx)?.text_or_null(COL_ALLELE)?;
        gene_label_symbol(&text).map(|symbol| (idx, symbol))
    });

    let (gene, first_row) = match label {
        Some((idx, symbol)) => (Some(symbol), idx + 2),
        None => (None, 1),
    };

    let mut references = Vec::new();
    let mut seen = HashSet::new();
    for row_idx in first_row..sheet.row_count() {
        let Some(row) = sheet.row(row_idx) else { break };
        let Some(allele_name) = row.text_or_null(COL_ALLELE) else { break };

        if !seen.insert(allele_name.clone()) {
            return Err(ArtifactError::malformed(
                sheet.name(),
                row_idx,
                format!("allele {} is listed more than once", allele_name),
            ));
        }

        let status = |col: usize| {
            row.text_or_null(col)
                .map(|label| FunctionStatus::from_label(&label))
                .transpose()
                .map_err(|e| ArtifactError::malformed(sheet.name(), row_idx, e.to_string()))
        };

        references.push((
            row_idx,
            FunctionReference {
                allele_name,
                activity_value: row.text_or_null(COL_ACTIVITY),
                function_status: status(COL_FUNCTION)?,
                clinical_function_status: status(COL_CLINICAL_FUNCTION)?,
                clinical_substrate: row.text_or_null(COL_SUBSTRATE),
                citations: split_citations(row.text_or_null(COL_CITATIONS).as_deref()),
                strength: row.text_or_null(COL_STRENGTH),
                findings: row.text_or_null(COL_FINDINGS),
                comments: row.text_or_null(COL_COMMENTS),
            },
        ));
    }

    Ok(DecodedFunctionReferences { gene, references })
}

/// PMIDs are entered separated by ';' or ','
fn split_citations(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split([';', ','])
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}
