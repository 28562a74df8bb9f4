use super::*;
use crate::error::{ArtifactError, ArtifactResult};
use crate::ordering::sort_by_haplotype_name;
use crate::types::{AlleleDefinition, FileType, FunctionStatus, GeneAlleleDefinitions, GeneHeader, Location};
use crate::workbook::{sidecar, Cell, Sheet, Workbook};
use std::collections::{HashMap, HashSet};

/// Writes one gene's allele definition sheet.
///
/// Holds the column directory for a single artifact: build one per gene and
/// drop it after [`finish`](Self::finish).
pub struct AlleleDefinitionEncoder {
    sheet: Sheet,
    location_columns: HashMap<i64, usize>,
    /// Trimmed names already given a column; the decoder keys on these
    location_names: HashSet<String>,
    allele_names: HashSet<String>,
    next_col: usize,
    /// Row the next value is written to
    allele_row: Option<usize>,
}

impl AlleleDefinitionEncoder {
    /// Start a sheet with the gene header and the empty column directory rows
    pub fn new(gene: &GeneHeader) -> ArtifactResult<Self> {
        let symbol = gene.symbol.trim();
        if symbol.is_empty() {
            return Err(ArtifactError::Export("Gene must be specified".to_string()));
        }

        let mut sheet = Sheet::new(ALLELE_SHEET_NAME);

        let gene_row = sheet.next_row();
        gene_row.header = true;
        gene_row.set(COL_ALLELE, Cell::text(format!("GENE: {}", symbol)));
        gene_row.set_date(COL_FUNCTION, gene.alleles_last_modified);

        let labels = [
            label_with_accession(LABEL_NAME, gene.mrna_sequence_id.as_deref()),
            label_with_accession(LABEL_PROTEIN, gene.protein_sequence_id.as_deref()),
            label_with_accession(LABEL_CHROMOSOME, gene.chromo_sequence_id.as_deref()),
            label_with_accession(LABEL_GENE_SEQUENCE, gene.gene_sequence_id.as_deref()),
            LABEL_DBSNP.to_string(),
        ];
        for label in labels {
            sheet.next_row().set(COL_FUNCTION, Cell::text(label));
        }

        let header = sheet.next_row();
        header.header = true;
        header.set(COL_ALLELE, Cell::text(format!("{} Allele", symbol)));
        header.set(COL_FUNCTION, Cell::text(HEADER_FUNCTION));

        debug_assert_eq!(sheet.cursor(), FIRST_ALLELE_ROW);

        Ok(Self {
            sheet,
            location_columns: HashMap::new(),
            location_names: HashSet::new(),
            allele_names: HashSet::new(),
            next_col: FIRST_LOCATION_COL,
            allele_row: None,
        })
    }

    /// Allocate the next column for a location and write its labels.
    /// Returns the column index.
    pub fn write_location(&mut self, location: &Location) -> ArtifactResult<usize> {
        if self.location_columns.contains_key(&location.id) {
            return Err(ArtifactError::DuplicateLocation(location.id.to_string()));
        }
        let name = location.name.trim();
        if name.is_empty() {
            return Err(ArtifactError::Export(format!(
                "Location {} has no name",
                location.id
            )));
        }
        if self.location_names.contains(name) {
            return Err(ArtifactError::DuplicateLocation(name.to_string()));
        }

        let col = self.next_col;
        let labels = [
            (NAME_ROW, Some(name)),
            (PROTEIN_ROW, location.protein_location.as_deref()),
            (CHROMOSOME_ROW, location.chromosome_location.as_deref()),
            (GENE_SEQUENCE_ROW, location.gene_location.as_deref()),
            (DBSNP_ROW, location.dbsnp_id.as_deref()),
        ];
        for (row_idx, value) in labels {
            if let Some(row) = self.sheet.row_mut(row_idx) {
                row.set_text(col, value);
            }
        }

        self.location_names.insert(name.to_string());
        self.location_columns.insert(location.id, col);
        self.next_col += 1;
        Ok(col)
    }

    pub fn column_of(&self, location_id: i64) -> Option<usize> {
        self.location_columns.get(&location_id).copied()
    }

    /// Start a new allele row; following values go to this row.
    /// Blank and repeated names are rejected since neither reads back.
    pub fn write_allele(
        &mut self,
        name: &str,
        function_status: Option<FunctionStatus>,
    ) -> ArtifactResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ArtifactError::Export("Allele name must be specified".to_string()));
        }
        if !self.allele_names.insert(name.to_string()) {
            return Err(ArtifactError::Export(format!(
                "Allele {} is listed more than once",
                name
            )));
        }

        let row_idx = self.sheet.cursor();
        let row = self.sheet.next_row();
        row.set_text(COL_ALLELE, Some(name));
        row.set_text(COL_FUNCTION, function_status.map(|s| s.label()));
        self.allele_row = Some(row_idx);
        Ok(())
    }

    /// Write a value into the current allele row at the location's column
    pub fn write_value(&mut self, location_id: i64, value: &str) -> ArtifactResult<()> {
        let col = self
            .column_of(location_id)
            .ok_or_else(|| ArtifactError::UnknownLocation(location_id.to_string()))?;
        let row_idx = self.allele_row.ok_or_else(|| {
            ArtifactError::Export(format!(
                "Value for location {} written before any allele row",
                location_id
            ))
        })?;

        if let Some(row) = self.sheet.row_mut(row_idx) {
            row.set_text(col, Some(value));
        }
        Ok(())
    }

    pub fn finish(self) -> Sheet {
        self.sheet
    }
}

fn write_allele_rows(
    encoder: &mut AlleleDefinitionEncoder,
    alleles: &[AlleleDefinition],
) -> ArtifactResult<()> {
    let mut sorted: Vec<&AlleleDefinition> = alleles.iter().collect();
    sort_by_haplotype_name(&mut sorted, |a| a.name.as_str());

    for allele in sorted {
        encoder.write_allele(&allele.name, allele.function_status)?;
        for value in &allele.values {
            encoder.write_value(value.location_id, &value.variant_allele)?;
        }
    }
    Ok(())
}

/// Build the complete allele definition artifact for one gene: the matrix
/// sheet followed by the Notes and Change History sidecars
pub fn encode_definitions(definitions: &GeneAlleleDefinitions) -> ArtifactResult<Workbook> {
    let mut encoder = AlleleDefinitionEncoder::new(&definitions.gene)?;
    for location in &definitions.locations {
        encoder.write_location(location)?;
    }
    write_allele_rows(&mut encoder, &definitions.alleles)?;

    let mut workbook = Workbook::new(FileType::AlleleDefinition.file_name(definitions.gene.symbol.trim()));
    workbook.add_sheet(encoder.finish());
    sidecar::write_notes(&mut workbook, &definitions.notes);
    sidecar::write_history(&mut workbook, &definitions.history);
    Ok(workbook)
}
