//! Spreadsheet export of the filtered document list.
//!
//! Column order and header labels are consumed downstream and must not
//! change.

use crate::models::{Document, NumericField};
use rust_xlsxwriter::{Workbook, XlsxError};
use thiserror::Error;

pub const EXPORT_HEADERS: [&str; 6] = [
    "Document Type",
    "Document Number",
    "Name",
    "Description",
    "Date Acquired",
    "Quantity",
];

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to build workbook: {0}")]
    Workbook(#[from] XlsxError),

    #[error("too many rows for one sheet: {0}")]
    TooManyRows(usize),
}

/// A single spreadsheet cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Blank,
}

impl From<Option<&String>> for Cell {
    fn from(value: Option<&String>) -> Self {
        match value {
            Some(text) => Cell::Text(text.clone()),
            None => Cell::Blank,
        }
    }
}

impl From<Option<&NumericField>> for Cell {
    fn from(value: Option<&NumericField>) -> Self {
        match value {
            Some(NumericField::Text(text)) => Cell::Text(text.clone()),
            Some(number) => number.as_f64().map(Cell::Number).unwrap_or(Cell::Blank),
            None => Cell::Blank,
        }
    }
}

/// One exported document, columns in [`EXPORT_HEADERS`] order.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportRow {
    pub document_type: Cell,
    pub document_number: Cell,
    pub name: Cell,
    pub description: Cell,
    pub date_acquired: Cell,
    pub quantity: Cell,
}

impl ExportRow {
    pub fn cells(&self) -> [&Cell; 6] {
        [
            &self.document_type,
            &self.document_number,
            &self.name,
            &self.description,
            &self.date_acquired,
            &self.quantity,
        ]
    }
}

impl From<&Document> for ExportRow {
    fn from(doc: &Document) -> Self {
        Self {
            document_type: doc.document_type.as_ref().into(),
            document_number: doc.document_number.as_ref().into(),
            name: doc.uploader_name.as_ref().into(),
            description: doc.description.as_ref().into(),
            date_acquired: Cell::Text(doc.acquired_date().to_string()),
            quantity: doc.quantity.as_ref().into(),
        }
    }
}

pub fn export_rows(documents: &[Document]) -> Vec<ExportRow> {
    documents.iter().map(ExportRow::from).collect()
}

/// Sheet contents top to bottom: the header row, then one row per document.
pub fn sheet_rows(rows: &[ExportRow]) -> Vec<Vec<Cell>> {
    let header = EXPORT_HEADERS
        .iter()
        .map(|label| Cell::Text(label.to_string()))
        .collect();

    std::iter::once(header)
        .chain(rows.iter().map(|row| row.cells().into_iter().cloned().collect()))
        .collect()
}

/// One-sheet workbook named `sheet_name` holding [`sheet_rows`].
fn workbook(rows: &[ExportRow], sheet_name: &str) -> Result<Workbook, ExportError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet_name)?;

    for (index, cells) in sheet_rows(rows).iter().enumerate() {
        let row_num = u32::try_from(index).map_err(|_| ExportError::TooManyRows(rows.len()))?;
        for (col, cell) in (0u16..).zip(cells) {
            match cell {
                Cell::Number(value) => {
                    worksheet.write_number(row_num, col, *value)?;
                }
                Cell::Text(text) if !text.is_empty() => {
                    worksheet.write_string(row_num, col, text)?;
                }
                Cell::Text(_) | Cell::Blank => {}
            }
        }
    }

    Ok(workbook)
}

/// Serialize the export to `.xlsx` bytes.
pub fn build_workbook(rows: &[ExportRow], sheet_name: &str) -> Result<Vec<u8>, ExportError> {
    Ok(workbook(rows, sheet_name)?.save_to_buffer()?)
}
