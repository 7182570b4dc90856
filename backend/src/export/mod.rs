//! Rendering output tables as CSV, JSON or an xlsx workbook.

use rust_xlsxwriter::{Format, Workbook, XlsxError};
use serde::Serialize;
use std::path::Path;

use crate::error::{IngestError, IngestResult};
use crate::models::Tabular;

/// Download base name for Florida output.
pub const FLORIDA_OUTPUT: &str = "Florida_Output";
/// Download base name for Washington output.
pub const WASHINGTON_OUTPUT: &str = "Washington_Output";
/// Download base name for West Virginia output.
pub const WEST_VIRGINIA_OUTPUT: &str = "WV_Output";
/// Download base name for combined output.
pub const COMBINED_OUTPUT: &str = "Combined_States";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
    Xlsx,
}

impl OutputFormat {
    /// `csv`, `json` or `xlsx`, any case.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Xlsx => "xlsx",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        }
    }
}

/// `base` with the extension of `format`, e.g. `WV_Output.xlsx`.
pub fn file_name(base: &str, format: OutputFormat) -> String {
    format!("{}.{}", base, format.extension())
}

/// Header row plus one row of cells per record.
pub fn table<T: Tabular>(records: &[T]) -> (Vec<String>, Vec<Vec<String>>) {
    let headers = T::COLUMNS.iter().map(|c| c.to_string()).collect();
    let rows = records
        .iter()
        .map(|r| r.cells().into_iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

/// Comma-separated output with a header row.
pub fn to_csv<T: Tabular>(records: &[T]) -> IngestResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(T::COLUMNS)?;
    for record in records {
        writer.write_record(record.cells())?;
    }
    writer
        .into_inner()
        .map_err(|e| std::io::Error::other(e.to_string()).into())
}

/// Pretty JSON array keyed by column name.
pub fn to_json<T: Serialize>(records: &[T]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(records)
}

/// Single-sheet workbook with a bold header row. Every cell is written as text.
pub fn to_xlsx<T: Tabular>(records: &[T]) -> IngestResult<Vec<u8>> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let header = Format::new().set_bold();

    for (col, name) in T::COLUMNS.iter().enumerate() {
        sheet
            .write_string_with_format(0, col as u16, *name, &header)
            .map_err(workbook_error)?;
    }
    for (i, record) in records.iter().enumerate() {
        let row = u32::try_from(i + 1)
            .map_err(|_| IngestError::Workbook("too many rows for one worksheet".into()))?;
        for (col, cell) in record.cells().into_iter().enumerate() {
            sheet.write_string(row, col as u16, cell).map_err(workbook_error)?;
        }
    }

    workbook.save_to_buffer().map_err(workbook_error)
}

fn workbook_error(err: XlsxError) -> IngestError {
    IngestError::Workbook(err.to_string())
}

/// Records in the given format.
pub fn render<T: Tabular + Serialize>(records: &[T], format: OutputFormat) -> IngestResult<Vec<u8>> {
    match format {
        OutputFormat::Csv => to_csv(records),
        OutputFormat::Json => Ok(to_json(records).map_err(std::io::Error::from)?.into_bytes()),
        OutputFormat::Xlsx => to_xlsx(records),
    }
}

/// Write records to `path` in the given format.
pub fn write_file<T: Tabular + Serialize>(path: &Path, records: &[T], format: OutputFormat) -> IngestResult<()> {
    std::fs::write(path, render(records, format)?)?;
    Ok(())
}
