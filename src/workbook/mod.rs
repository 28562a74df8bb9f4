//! In-memory spreadsheet model shared by every artifact
//!
//! A [`Workbook`] is an ordered list of named [`Sheet`]s, each an ordered
//! list of [`Row`]s of [`Cell`]s. Producers append rows top to bottom with
//! [`Sheet::next_row`]; consumers read with the typed accessors on [`Row`].
//! Serialization to and from `.xlsx` lives in [`crate::excel`].

pub mod sidecar;

use crate::error::{ArtifactError, ArtifactResult};
use chrono::NaiveDate;

/// Date formats accepted when a curator typed a date as text
const TEXT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%m/%d/%y"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Cell {
    Text(String),
    Date(NaiveDate),
    #[default]
    Blank,
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Date(_) => false,
            Cell::Blank => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Row {
    cells: Vec<Cell>,
    /// Presentation hint for writers; never read back
    pub header: bool,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            header: false,
        }
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Number of cells up to and including the last populated one
    pub fn width(&self) -> usize {
        self.cells
            .iter()
            .rposition(|c| !c.is_blank())
            .map(|i| i + 1)
            .unwrap_or(0)
    }

    /// Missing trailing cells read as blank
    pub fn cell(&self, col: usize) -> &Cell {
        static BLANK: Cell = Cell::Blank;
        self.cells.get(col).unwrap_or(&BLANK)
    }

    /// Set a cell, padding with blanks as needed
    pub fn set(&mut self, col: usize, cell: Cell) {
        if self.cells.len() <= col {
            self.cells.resize(col + 1, Cell::Blank);
        }
        self.cells[col] = cell;
    }

    /// Write trimmed text; `None` or whitespace leaves the cell blank
    pub fn set_text(&mut self, col: usize, value: Option<&str>) {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => self.set(col, Cell::text(v)),
            _ => self.set(col, Cell::Blank),
        }
    }

    pub fn set_date(&mut self, col: usize, value: Option<NaiveDate>) {
        match value {
            Some(d) => self.set(col, Cell::Date(d)),
            None => self.set(col, Cell::Blank),
        }
    }

    /// Trimmed text, or `None` for blank cells. Dates render as ISO text.
    pub fn text_or_null(&self, col: usize) -> Option<String> {
        match self.cell(col) {
            Cell::Text(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Cell::Blank => None,
        }
    }

    /// A date cell, or a text cell holding a recognizable date
    pub fn date_or_null(&self, col: usize) -> Option<NaiveDate> {
        match self.cell(col) {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_text_date(s.trim()),
            Cell::Blank => None,
        }
    }

    pub fn has_text(&self, col: usize) -> bool {
        !self.cell(col).is_blank()
    }
}

fn parse_text_date(s: &str) -> Option<NaiveDate> {
    TEXT_DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    name: String,
    rows: Vec<Row>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Number of rows, including trailing empty ones
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, idx: usize) -> Option<&Row> {
        self.rows.get(idx)
    }

    pub(crate) fn row_mut(&mut self, idx: usize) -> Option<&mut Row> {
        self.rows.get_mut(idx)
    }

    /// Append a row; the write cursor is the row count
    pub fn next_row(&mut self) -> &mut Row {
        self.rows.push(Row::new());
        let idx = self.rows.len() - 1;
        &mut self.rows[idx]
    }

    /// Index the next appended row will get
    pub fn cursor(&self) -> usize {
        self.rows.len()
    }

    /// Row at an absolute index, padding with empty rows. Used by readers.
    pub(crate) fn row_at(&mut self, idx: usize) -> &mut Row {
        if self.rows.len() <= idx {
            self.rows.resize_with(idx + 1, Row::new);
        }
        &mut self.rows[idx]
    }

    pub fn width(&self) -> usize {
        self.rows.iter().map(Row::width).max().unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    /// File name, e.g. `CYP2D6-Allele_Definition_Table.xlsx`
    name: String,
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sheets: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Create an empty sheet and return it for writing
    pub fn create_sheet(&mut self, name: impl Into<String>) -> &mut Sheet {
        self.sheets.push(Sheet::new(name));
        let idx = self.sheets.len() - 1;
        &mut self.sheets[idx]
    }

    /// Exact name match
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub(crate) fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// Find a sheet by an ordered list of accepted names.
    ///
    /// Every alias is tried as an exact match first; only then is each alias
    /// tried as a case-insensitive prefix of the sheet name.
    pub fn find_sheet(&self, aliases: &[&str]) -> Option<&Sheet> {
        aliases.iter().find_map(|alias| self.sheet(alias)).or_else(|| {
            aliases.iter().find_map(|alias| {
                let alias = alias.to_lowercase();
                self.sheets
                    .iter()
                    .find(|s| s.name.to_lowercase().starts_with(&alias))
            })
        })
    }

    /// Like [`Workbook::find_sheet`] but absence is a `SheetNotFound` error
    pub fn open_sheet(&self, aliases: &[&str]) -> ArtifactResult<&Sheet> {
        self.find_sheet(aliases).ok_or_else(|| {
            ArtifactError::SheetNotFound(aliases.iter().map(|a| a.to_string()).collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workbook_with(names: &[&str]) -> Workbook {
        let mut wb = Workbook::new("test.xlsx");
        for name in names {
            wb.create_sheet(*name);
        }
        wb
    }

    #[test]
    fn test_missing_trailing_cells_read_blank() {
        let mut row = Row::new();
        row.set_text(0, Some("*1"));
        assert_eq!(row.text_or_null(0).as_deref(), Some("*1"));
        assert_eq!(row.text_or_null(7), None);
        assert!(!row.has_text(7));
        assert_eq!(row.cell(7), &Cell::Blank);
    }

    #[test]
    fn test_set_text_trims_and_blanks_whitespace() {
        let mut row = Row::new();
        row.set_text(2, Some("  A  "));
        row.set_text(3, Some("   "));
        assert_eq!(row.cell(2), &Cell::text("A"));
        assert_eq!(row.cell(3), &Cell::Blank);
        assert_eq!(row.cell(0), &Cell::Blank);
        assert_eq!(row.width(), 3);
    }

    #[test]
    fn test_date_from_text() {
        let row = Row::from_cells(vec![
            Cell::text("2021-03-04"),
            Cell::text("3/4/2021"),
            Cell::text("not a date"),
        ]);
        let expected = NaiveDate::from_ymd_opt(2021, 3, 4);
        assert_eq!(row.date_or_null(0), expected);
        assert_eq!(row.date_or_null(1), expected);
        assert_eq!(row.date_or_null(2), None);
    }

    #[test]
    fn test_next_row_advances_cursor() {
        let mut sheet = Sheet::new("Alleles");
        assert_eq!(sheet.cursor(), 0);
        sheet.next_row().set_text(0, Some("a"));
        sheet.next_row().set_text(0, Some("b"));
        assert_eq!(sheet.cursor(), 2);
        assert_eq!(sheet.row(1).unwrap().text_or_null(0).as_deref(), Some("b"));
    }

    #[test]
    fn test_find_sheet_prefers_exact_alias_order() {
        let wb = workbook_with(&["Methods", "Methods and caveats"]);
        let sheet = wb.find_sheet(&["Methods and caveats", "Methods"]).unwrap();
        assert_eq!(sheet.name(), "Methods and caveats");
    }

    #[test]
    fn test_find_sheet_falls_back_to_prefix() {
        let wb = workbook_with(&["Alleles", "methods and caveats (draft)"]);
        let sheet = wb.find_sheet(&["Methods"]).unwrap();
        assert_eq!(sheet.name(), "methods and caveats (draft)");
    }

    #[test]
    fn test_open_sheet_not_found() {
        let wb = workbook_with(&["Alleles"]);
        let err = wb.open_sheet(&["Allele Function"]).unwrap_err();
        assert!(matches!(err, ArtifactError::SheetNotFound(names) if names == vec!["Allele Function"]));
    }
}
