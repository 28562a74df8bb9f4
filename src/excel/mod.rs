//! Excel .xlsx storage for the workbook model
//!
//! - Export: [`Workbook`](crate::workbook::Workbook) → .xlsx (rust_xlsxwriter)
//! - Import: .xlsx → [`Workbook`](crate::workbook::Workbook) (calamine)
//!
//! Styling (bold headers, date formats, column widths) is applied on export
//! only and is never needed to parse a file back.

mod exporter;
mod importer;

pub use exporter::ExcelExporter;
pub use importer::ExcelImporter;

/// Convert column index to Excel column letter (0→A, 1→B, 25→Z, 26→AA, etc.)
pub fn column_letter(n: usize) -> String {
    let mut result = String::new();
    let mut num = n;

    loop {
        let remainder = num % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if num < 26 {
            break;
        }
        num = num / 26 - 1;
    }

    result
}
