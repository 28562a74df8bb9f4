use thiserror::Error;

pub type ArtifactResult<T> = Result<T, ArtifactError>;

#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Sheet not found, tried: {}", .0.join(", "))]
    SheetNotFound(Vec<String>),

    /// `row` is 1-based, as shown in a spreadsheet application
    #[error("Malformed row {row} in sheet '{sheet}': {reason}")]
    MalformedRow {
        sheet: String,
        row: usize,
        reason: String,
    },

    #[error("No column registered for location {0}")]
    UnknownLocation(String),

    #[error("Location {0} already has a column")]
    DuplicateLocation(String),

    #[error("No {entity} found with name '{name}'")]
    UnknownEntityReference { entity: &'static str, name: String },

    #[error("Gene '{0}' is not in the database")]
    UnknownGene(String),

    #[error("Unrecognized status '{0}'")]
    UnknownStatus(String),

    #[error("Directory doesn't exist: {0}")]
    DirectoryNotFound(String),

    #[error("No {extension} files found in {directory}")]
    EmptyDirectory {
        directory: String,
        extension: String,
    },

    #[error("Export error: {0}")]
    Export(String),

    #[error("Error processing file {file}")]
    FileFailed {
        file: String,
        #[source]
        source: Box<ArtifactError>,
    },
}

impl ArtifactError {
    pub fn malformed(sheet: &str, row_idx: usize, reason: impl Into<String>) -> Self {
        ArtifactError::MalformedRow {
            sheet: sheet.to_string(),
            row: row_idx + 1,
            reason: reason.into(),
        }
    }

    /// True for reference-resolution failures that skip a row instead of aborting the file
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ArtifactError::UnknownEntityReference { .. })
    }
}
