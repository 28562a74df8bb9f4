use crate::error::{ArtifactError, ArtifactResult};
use chrono::NaiveDate;
use std::fmt;

//==============================================================================
// Artifact Families
//==============================================================================

/// The kind of artifact a file holds. Also used as the `type` discriminator
/// for notes, change log entries and file history rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    AlleleDefinition,
    AlleleFunctionReference,
    Frequency,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::AlleleDefinition => "ALLELE_DEFINITION",
            FileType::AlleleFunctionReference => "ALLELE_FUNCTION_REFERENCE",
            FileType::Frequency => "FREQUENCY",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ALLELE_DEFINITION" => Some(FileType::AlleleDefinition),
            "ALLELE_FUNCTION_REFERENCE" => Some(FileType::AlleleFunctionReference),
            "FREQUENCY" => Some(FileType::Frequency),
            _ => None,
        }
    }

    /// Generated file name for an entity, e.g. `CYP2D6-Allele_Definition_Table.xlsx`
    pub fn file_name(&self, entity_key: &str) -> String {
        match self {
            FileType::AlleleDefinition => format!("{}-Allele_Definition_Table.xlsx", entity_key),
            FileType::AlleleFunctionReference => {
                format!("{}-Allele_Functionality_Reference.xlsx", entity_key)
            }
            FileType::Frequency => format!("{}-Frequency_Table.xlsx", entity_key),
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//==============================================================================
// Function Status Vocabulary
//==============================================================================

/// Allele functional status terms accepted in curated files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionStatus {
    Normal,
    Decreased,
    No,
    Increased,
    PossibleDecreased,
    PossibleIncreased,
    Uncertain,
    Unknown,
}

/// Normalized (lowercase, single-spaced) label -> status
const STATUS_LABELS: &[(&str, FunctionStatus)] = &[
    ("normal function", FunctionStatus::Normal),
    ("decreased function", FunctionStatus::Decreased),
    ("no function", FunctionStatus::No),
    ("increased function", FunctionStatus::Increased),
    ("possible decreased function", FunctionStatus::PossibleDecreased),
    ("possible increased function", FunctionStatus::PossibleIncreased),
    ("uncertain function", FunctionStatus::Uncertain),
    ("unknown function", FunctionStatus::Unknown),
];

impl FunctionStatus {
    /// Look up a curator-entered label. Case and repeated whitespace are ignored.
    pub fn from_label(label: &str) -> ArtifactResult<Self> {
        let normalized = label
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        STATUS_LABELS
            .iter()
            .find(|(key, _)| *key == normalized)
            .map(|(_, status)| *status)
            .ok_or_else(|| ArtifactError::UnknownStatus(label.to_string()))
    }

    /// Canonical display label, e.g. "Decreased function"
    pub fn label(&self) -> &'static str {
        match self {
            FunctionStatus::Normal => "Normal function",
            FunctionStatus::Decreased => "Decreased function",
            FunctionStatus::No => "No function",
            FunctionStatus::Increased => "Increased function",
            FunctionStatus::PossibleDecreased => "Possible decreased function",
            FunctionStatus::PossibleIncreased => "Possible increased function",
            FunctionStatus::Uncertain => "Uncertain function",
            FunctionStatus::Unknown => "Unknown function",
        }
    }
}

impl fmt::Display for FunctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//==============================================================================
// Allele Definition Model
//==============================================================================

/// Gene-level metadata written above the allele definition matrix
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneHeader {
    pub symbol: String,
    pub alleles_last_modified: Option<NaiveDate>,
    pub chromo_sequence_id: Option<String>,
    pub protein_sequence_id: Option<String>,
    pub gene_sequence_id: Option<String>,
    pub mrna_sequence_id: Option<String>,
}

impl GeneHeader {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            ..Default::default()
        }
    }
}

/// A variant position: one dynamically allocated matrix column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Surrogate id from the store
    pub id: i64,
    pub name: String,
    pub protein_location: Option<String>,
    pub chromosome_location: Option<String>,
    pub gene_location: Option<String>,
    pub dbsnp_id: Option<String>,
}

/// The variant allele an allele carries at a location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationValue {
    pub location_id: i64,
    pub variant_allele: String,
}

/// One matrix row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleDefinition {
    pub name: String,
    pub function_status: Option<FunctionStatus>,
    pub values: Vec<LocationValue>,
}

/// Everything needed to render one gene's allele definition artifact
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneAlleleDefinitions {
    pub gene: GeneHeader,
    /// In discovery order; this order fixes the column order
    pub locations: Vec<Location>,
    pub alleles: Vec<AlleleDefinition>,
    pub notes: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

//==============================================================================
// Sidecar Records
//==============================================================================

/// A dated change log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub note: String,
}

impl HistoryEntry {
    pub fn new(date: NaiveDate, note: impl Into<String>) -> Self {
        Self {
            date,
            note: note.into(),
        }
    }
}

//==============================================================================
// Allele Function Reference Model
//==============================================================================

/// One row of the allele functionality reference sheet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionReference {
    pub allele_name: String,
    pub activity_value: Option<String>,
    pub function_status: Option<FunctionStatus>,
    pub clinical_function_status: Option<FunctionStatus>,
    pub clinical_substrate: Option<String>,
    pub citations: Vec<String>,
    pub strength: Option<String>,
    pub findings: Option<String>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneFunctionReferences {
    pub gene: String,
    pub references: Vec<FunctionReference>,
    pub methods: Option<String>,
    pub notes: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

//==============================================================================
// Allele Frequency Model
//==============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlleleFrequency {
    pub allele_name: String,
    /// As curated: "0.052", "<0.001", "0.3 (n=12)"
    pub frequency: String,
}

/// One studied population and the allele frequencies reported for it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationFrequencies {
    pub authors: Option<String>,
    pub year: Option<i32>,
    /// PubMed id of the study
    pub citation: Option<String>,
    pub population_group: Option<String>,
    pub population: String,
    pub population_info: Option<String>,
    pub subject_count: Option<u32>,
    pub frequencies: Vec<AlleleFrequency>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeneFrequencies {
    pub gene: String,
    pub populations: Vec<PopulationFrequencies>,
    pub methods: Option<String>,
    pub notes: Vec<String>,
    pub history: Vec<HistoryEntry>,
}

//==============================================================================
// Provenance
//==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvenanceAction {
    Import,
    Export,
    Upload,
}

impl ProvenanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvenanceAction::Import => "import",
            ProvenanceAction::Export => "export",
            ProvenanceAction::Upload => "upload",
        }
    }
}

/// One `file_history` row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceRecord {
    pub file_name: String,
    pub file_type: FileType,
    pub action: ProvenanceAction,
    pub entity_keys: Vec<String>,
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_lookup_ignores_case_and_spacing() {
        assert_eq!(
            FunctionStatus::from_label("Normal Function").unwrap(),
            FunctionStatus::Normal
        );
        assert_eq!(
            FunctionStatus::from_label("  possible   decreased function ").unwrap(),
            FunctionStatus::PossibleDecreased
        );
    }

    #[test]
    fn test_status_lookup_rejects_unknown_label() {
        let err = FunctionStatus::from_label("Mostly function").unwrap_err();
        assert!(matches!(err, ArtifactError::UnknownStatus(label) if label == "Mostly function"));
    }

    #[test]
    fn test_status_labels_round_trip() {
        for (_, status) in STATUS_LABELS {
            assert_eq!(FunctionStatus::from_label(status.label()).unwrap(), *status);
        }
    }

    #[test]
    fn test_file_names() {
        assert_eq!(
            FileType::AlleleDefinition.file_name("CYP2D6"),
            "CYP2D6-Allele_Definition_Table.xlsx"
        );
        assert_eq!(
            FileType::AlleleFunctionReference.file_name("TPMT"),
            "TPMT-Allele_Functionality_Reference.xlsx"
        );
        assert_eq!(FileType::Frequency.file_name("UGT1A1"), "UGT1A1-Frequency_Table.xlsx");
    }

    #[test]
    fn test_file_type_parse() {
        for ft in [
            FileType::AlleleDefinition,
            FileType::AlleleFunctionReference,
            FileType::Frequency,
        ] {
            assert_eq!(FileType::parse(ft.as_str()), Some(ft));
        }
        assert_eq!(FileType::parse("PAIRS"), None);
    }
}
