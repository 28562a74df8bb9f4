//! Excel importer implementation - .xlsx → Workbook model

use crate::error::ArtifactResult;
use crate::workbook::{Cell, Workbook};
use calamine::{open_workbook, Data, Reader, Xlsx};
use chrono::{Days, NaiveDate};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Reads .xlsx documents into the [`Workbook`] model
pub struct ExcelImporter {
    path: std::path::PathBuf,
}

impl ExcelImporter {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Read every sheet of the file. The workbook is named after the file.
    pub fn import(&self) -> ArtifactResult<Workbook> {
        let mut xlsx: Xlsx<_> = open_workbook(&self.path)?;
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        read_workbook(name, &mut xlsx)
    }

    /// Read an in-memory .xlsx document
    pub fn from_bytes(name: &str, bytes: Vec<u8>) -> ArtifactResult<Workbook> {
        let mut xlsx = Xlsx::new(Cursor::new(bytes))?;
        read_workbook(name.to_string(), &mut xlsx)
    }
}

fn read_workbook<RS: Read + Seek>(name: String, xlsx: &mut Xlsx<RS>) -> ArtifactResult<Workbook> {
    let mut workbook = Workbook::new(name);

    for sheet_name in xlsx.sheet_names().to_vec() {
        let range = xlsx.worksheet_range(&sheet_name)?;
        let sheet = workbook.create_sheet(sheet_name);

        // used_cells is relative to the range start, which need not be A1
        let (row_offset, col_offset) = range
            .start()
            .map(|(r, c)| (r as usize, c as usize))
            .unwrap_or((0, 0));

        for (r, c, data) in range.used_cells() {
            let cell = to_cell(data);
            if cell != Cell::Blank {
                sheet.row_at(row_offset + r).set(col_offset + c, cell);
            }
        }
    }

    Ok(workbook)
}

/// Numbers are read as text; callers parse what they need
fn to_cell(data: &Data) -> Cell {
    match data {
        Data::String(s) => Cell::Text(s.clone()),
        Data::Float(f) => Cell::Text(format_float(*f)),
        Data::Int(i) => Cell::Text(i.to_string()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Blank),
        Data::DateTimeIso(s) => s
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Blank,
    }
}

/// Whole numbers without a trailing ".0"
fn format_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

/// Excel 1900 date system serial number → date (valid from March 1900)
fn serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}
