//! Conventional auxiliary sheets: Notes, Change History and Methods

use super::{Cell, Row, Workbook};
use crate::error::{ArtifactError, ArtifactResult};
use crate::types::HistoryEntry;

pub const NOTES_SHEET_NAME: &str = "Notes";
pub const HISTORY_SHEET_NAME: &str = "Change History";
/// Accepted names for the methods sheet, most specific first
pub const METHODS_SHEET_ALIASES: &[&str] = &["Methods and caveats", "Methods"];

const NOTES_HEADER: &str = "Notes";
const HISTORY_HEADER_DATE: &str = "Date";
const HISTORY_HEADER_TEXT: &str = "Entry";

/// Append a Notes sheet. Nothing is written when there are no notes.
pub fn write_notes(workbook: &mut Workbook, notes: &[String]) {
    let notes: Vec<&str> = notes
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();
    if notes.is_empty() {
        return;
    }

    let sheet = workbook.create_sheet(NOTES_SHEET_NAME);
    let header = sheet.next_row();
    header.header = true;
    header.set(0, Cell::text(NOTES_HEADER));

    for note in notes {
        sheet.next_row().set_text(0, Some(note));
    }
}

/// Notes from the optional Notes sheet, in sheet order
pub fn read_notes(workbook: &Workbook) -> Vec<String> {
    let Some(sheet) = workbook.sheet(NOTES_SHEET_NAME) else {
        return Vec::new();
    };

    sheet
        .rows()
        .iter()
        .enumerate()
        .filter(|(idx, row)| !(*idx == 0 && is_notes_header(row)))
        .filter_map(|(_, row)| row.text_or_null(0))
        .collect()
}

fn is_notes_header(row: &Row) -> bool {
    row.text_or_null(0)
        .map(|t| t.eq_ignore_ascii_case(NOTES_HEADER))
        .unwrap_or(false)
}

/// Append a Change History sheet with a header row and one row per entry
pub fn write_history(workbook: &mut Workbook, entries: &[HistoryEntry]) {
    let sheet = workbook.create_sheet(HISTORY_SHEET_NAME);
    let header = sheet.next_row();
    header.header = true;
    header.set(0, Cell::text(HISTORY_HEADER_DATE));
    header.set(1, Cell::text(HISTORY_HEADER_TEXT));

    for entry in entries {
        let row = sheet.next_row();
        row.set_date(0, Some(entry.date));
        row.set_text(1, Some(entry.note.as_str()));
    }
}

/// Change log entries from the optional Change History sheet.
///
/// Row 0 is the header. A row must have both a date and text or neither;
/// a one-sided row is a `MalformedRow`.
pub fn read_history(workbook: &Workbook) -> ArtifactResult<Vec<HistoryEntry>> {
    let Some(sheet) = workbook.sheet(HISTORY_SHEET_NAME) else {
        return Ok(Vec::new());
    };

    let mut entries = Vec::new();
    for (idx, row) in sheet.rows().iter().enumerate().skip(1) {
        let has_date = row.has_text(0);
        let has_text = row.has_text(1);
        if has_date != has_text {
            return Err(ArtifactError::malformed(
                sheet.name(),
                idx,
                "row must have both date and text",
            ));
        }
        if !has_date {
            continue;
        }

        let date = row.date_or_null(0).ok_or_else(|| {
            ArtifactError::malformed(sheet.name(), idx, "first column is not a date")
        })?;
        let note = row.text_or_null(1).unwrap_or_default();
        entries.push(HistoryEntry { date, note });
    }
    Ok(entries)
}

/// Append a Methods sheet, one line per row. Nothing is written for empty text.
pub fn write_methods(workbook: &mut Workbook, methods: Option<&str>) {
    let Some(text) = methods.filter(|t| !t.trim().is_empty()) else {
        return;
    };

    let sheet = workbook.create_sheet(METHODS_SHEET_ALIASES[0]);
    for line in text.lines() {
        sheet.next_row().set_text(0, Some(line));
    }
}

/// Methods text joined with newlines; blank rows become empty lines.
/// `None` when no methods sheet exists or it holds no text.
pub fn read_methods(workbook: &Workbook) -> Option<String> {
    let sheet = workbook.find_sheet(METHODS_SHEET_ALIASES)?;
    let lines: Vec<String> = sheet
        .rows()
        .iter()
        .map(|row| row.text_or_null(0).unwrap_or_default())
        .collect();

    let text = lines.join("\n");
    let text = text.trim_matches('\n');
    (!text.is_empty()).then(|| text.to_string())
}
