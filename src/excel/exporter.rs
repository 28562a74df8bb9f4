//! Excel exporter implementation - Workbook model → .xlsx

use crate::error::{ArtifactError, ArtifactResult};
use crate::workbook::{Cell, Sheet, Workbook};
use chrono::Datelike;
use rust_xlsxwriter::{ExcelDateTime, Format, Worksheet};
use std::path::Path;

const DATE_FORMAT: &str = "m/d/yy";
const MIN_COLUMN_WIDTH: f64 = 8.0;
const MAX_COLUMN_WIDTH: f64 = 60.0;

/// Serializes a [`Workbook`] to the .xlsx format
pub struct ExcelExporter<'a> {
    workbook: &'a Workbook,
    header_format: Format,
    date_format: Format,
}

impl<'a> ExcelExporter<'a> {
    pub fn new(workbook: &'a Workbook) -> Self {
        Self {
            workbook,
            header_format: Format::new().set_bold(),
            date_format: Format::new().set_num_format(DATE_FORMAT),
        }
    }

    /// Write the workbook to an .xlsx file
    pub fn export(&self, output_path: &Path) -> ArtifactResult<()> {
        let mut xlsx = self.build()?;
        xlsx.save(output_path).map_err(|e| {
            ArtifactError::Export(format!(
                "Failed to save {}: {}",
                output_path.display(),
                e
            ))
        })?;
        Ok(())
    }

    /// Serialize to an in-memory .xlsx document
    pub fn to_buffer(&self) -> ArtifactResult<Vec<u8>> {
        let mut xlsx = self.build()?;
        Ok(xlsx.save_to_buffer()?)
    }

    fn build(&self) -> ArtifactResult<rust_xlsxwriter::Workbook> {
        let mut xlsx = rust_xlsxwriter::Workbook::new();
        for sheet in self.workbook.sheets() {
            let worksheet = xlsx.add_worksheet();
            worksheet.set_name(sheet.name()).map_err(|e| {
                ArtifactError::Export(format!(
                    "Failed to set worksheet name '{}': {}",
                    sheet.name(),
                    e
                ))
            })?;
            self.export_sheet(worksheet, sheet)?;
        }
        Ok(xlsx)
    }

    fn export_sheet(&self, worksheet: &mut Worksheet, sheet: &Sheet) -> ArtifactResult<()> {
        for (row_idx, row) in sheet.rows().iter().enumerate() {
            let r = row_idx as u32;
            for (col_idx, cell) in row.cells().iter().enumerate() {
                let c = col_idx as u16;
                match cell {
                    Cell::Text(value) if row.header => {
                        worksheet.write_string_with_format(r, c, value, &self.header_format)?;
                    }
                    Cell::Text(value) => {
                        worksheet.write_string(r, c, value)?;
                    }
                    Cell::Date(date) => {
                        let dt = ExcelDateTime::from_ymd(
                            date.year() as u16,
                            date.month() as u8,
                            date.day() as u8,
                        )?;
                        worksheet.write_datetime_with_format(r, c, &dt, &self.date_format)?;
                    }
                    Cell::Blank => {}
                }
            }
        }

        for (col_idx, width) in column_widths(sheet).into_iter().enumerate() {
            worksheet.set_column_width(col_idx as u16, width)?;
        }
        Ok(())
    }
}

/// Rough auto-fit: longest text in each column, clamped
fn column_widths(sheet: &Sheet) -> Vec<f64> {
    let mut widths = vec![MIN_COLUMN_WIDTH; sheet.width()];
    for row in sheet.rows() {
        for (idx, cell) in row.cells().iter().enumerate().take(widths.len()) {
            let len = match cell {
                Cell::Text(s) => s.chars().count() as f64 + 2.0,
                Cell::Date(_) => 10.0,
                Cell::Blank => 0.0,
            };
            widths[idx] = widths[idx].max(len.min(MAX_COLUMN_WIDTH));
        }
    }
    widths
}
