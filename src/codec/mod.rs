//! Artifact sheet layouts
//!
//! The allele definition matrix is the involved one; the functionality
//! reference table lives in [`function_table`] and the population ×
//! allele frequency grid in [`frequency_table`].
//!
//! An allele definition artifact is a sparse allele × variant-position
//! matrix. Positions ("locations") become columns, allocated left to right
//! the first time the encoder sees them; alleles become rows in haplotype
//! name order. Five header rows above the matrix describe each column, and
//! the decoder reads them back as the column directory.
//!
//! ```text
//! row 0  GENE: CYP2D6          | <last modified>
//! row 1                        | Nucleotide change (NM_…)      | c.100C>T | …
//! row 2                        | Effect on protein (NP_…)      | P34S     | …
//! row 3                        | Position at chromosome (NC_…) | g.…      | …
//! row 4                        | Position at gene (NG_…)       | g.…      | …
//! row 5                        | rsID                          | rs1065852| …
//! row 6  CYP2D6 Allele         | Allele Functional Status
//! row 7  *1                    | Normal function               | C        | …
//! ```

use regex::Regex;
use std::sync::OnceLock;

mod decoder;
mod encoder;
pub mod frequency_table;
pub mod function_table;

pub use decoder::{decode, DecodedAllele, DecodedDefinitions, DecodedLocation};
pub use encoder::{encode_definitions, AlleleDefinitionEncoder};
pub use frequency_table::{
    decode_frequencies, encode_frequencies, DecodedFrequencies, FREQUENCY_SHEET_NAME,
};
pub use function_table::{
    decode_function_references, encode_function_references, DecodedFunctionReferences,
    FUNCTION_SHEET_NAME,
};

pub const ALLELE_SHEET_NAME: &str = "Alleles";

pub(crate) const GENE_ROW: usize = 0;
pub(crate) const NAME_ROW: usize = 1;
pub(crate) const PROTEIN_ROW: usize = 2;
pub(crate) const CHROMOSOME_ROW: usize = 3;
pub(crate) const GENE_SEQUENCE_ROW: usize = 4;
pub(crate) const DBSNP_ROW: usize = 5;
pub(crate) const HEADER_ROW: usize = 6;
pub(crate) const FIRST_ALLELE_ROW: usize = 7;

pub(crate) const COL_ALLELE: usize = 0;
pub(crate) const COL_FUNCTION: usize = 1;
pub(crate) const FIRST_LOCATION_COL: usize = 2;

pub(crate) const LABEL_NAME: &str = "Nucleotide change";
pub(crate) const LABEL_PROTEIN: &str = "Effect on protein";
pub(crate) const LABEL_CHROMOSOME: &str = "Position at chromosome";
pub(crate) const LABEL_GENE_SEQUENCE: &str = "Position at gene";
pub(crate) const LABEL_DBSNP: &str = "rsID";
pub(crate) const HEADER_FUNCTION: &str = "Allele Functional Status";

/// "Position at gene (NG_008376.4)", or just the label without an accession
pub(crate) fn label_with_accession(label: &str, accession: Option<&str>) -> String {
    match accession.map(str::trim).filter(|a| !a.is_empty()) {
        Some(acc) => format!("{} ({})", label, acc),
        None => label.to_string(),
    }
}

fn gene_label_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^\s*gene:\s*(\S+)").expect("valid regex"))
}

/// Symbol from a "GENE: CYP2D6" label cell, shared by both artifact layouts
pub(crate) fn gene_label_symbol(text: &str) -> Option<String> {
    gene_label_pattern()
        .captures(text)
        .map(|c| c[1].to_string())
}
