//! High-level entry points: one function per operation, each reading raw
//! upload bytes, running the matching transformer and logging progress.
//!
//! # Example
//!
//! ```rust,ignore
//! use boi::transform::{process_florida, FloridaOptions};
//!
//! let bytes = std::fs::read("cordata.txt")?;
//! let run = process_florida(&bytes, &FloridaOptions::default());
//! println!("Kept {} of {} lines", run.output.len(), run.lines_seen);
//! ```

use serde::Serialize;

use super::combiner::{CombineReport, Combiner};
use super::florida::{parse_florida, FloridaOptions, FloridaOutput};
use super::selector::Selection;
use super::washington::{read_washington, transform_washington};
use super::west_virginia::{read_west_virginia, transform_west_virginia};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::error::PipelineError;
use crate::models::StandardRecord;
use crate::parser::parse_upload;

/// One uploaded file for the combiner.
#[derive(Debug, Clone)]
pub struct NamedUpload {
    pub name: String,
    pub bytes: Vec<u8>,
    /// Row selection text; `ALL` when absent
    pub selection: Option<String>,
}

impl NamedUpload {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            selection: None,
        }
    }

    pub fn with_selection(mut self, selection: impl Into<String>) -> Self {
        self.selection = Some(selection.into());
        self
    }
}

/// Result of a Florida run.
#[derive(Debug, Clone)]
pub struct FloridaRun {
    pub output: FloridaOutput,
    /// Non-blank lines in the file
    pub lines_seen: usize,
    /// Lines that did not match the layout
    pub lines_rejected: usize,
}

/// Result of a Washington or West Virginia run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRun {
    pub records: Vec<StandardRecord>,
    /// Data rows in the upload
    pub rows_read: usize,
}

impl StateRun {
    /// Rows filtered out or incomplete.
    pub fn rows_dropped(&self) -> usize {
        self.rows_read.saturating_sub(self.records.len())
    }
}

/// Decode a Florida fixed-width file.
pub fn process_florida(bytes: &[u8], options: &FloridaOptions) -> FloridaRun {
    log_info(format!("📖 Reading Florida file ({} bytes)...", bytes.len()));
    if let Some(date) = options.date_filter.as_deref().filter(|d| !d.trim().is_empty()) {
        log_info_indent(format!("Filing date filter: {}", date.trim()), 1);
    }
    log_info_indent(
        if options.mailing_only {
            "Output: mailing address only"
        } else {
            "Output: principal + mailing address"
        },
        1,
    );

    let parse = parse_florida(bytes, options);
    log_success(format!("Read {} lines", parse.lines_seen));
    if parse.lines_rejected > 0 {
        log_warning(format!("{} lines did not match the layout", parse.lines_rejected));
    }
    log_success(format!("{} records kept", parse.output.len()));

    FloridaRun {
        output: parse.output,
        lines_seen: parse.lines_seen,
        lines_rejected: parse.lines_rejected,
    }
}

/// Transform a Washington export, stamping `filing_date` on every record.
pub fn process_washington(bytes: &[u8], filing_date: &str) -> Result<StateRun, PipelineError> {
    if filing_date.trim().is_empty() {
        return Err(PipelineError::InvalidInput(
            "a filing date is required for Washington files".into(),
        ));
    }

    log_info("📖 Reading Washington export...");
    let rows = read_washington(bytes).inspect_err(|e| log_error(e.to_string()))?;
    log_success(format!("Read {} rows", rows.len()));

    let records = transform_washington(&rows, filing_date);
    let run = StateRun {
        records,
        rows_read: rows.len(),
    };
    log_state_summary(&run, "active Washington LLCs");
    Ok(run)
}

/// Transform a West Virginia export.
pub fn process_west_virginia(bytes: &[u8]) -> Result<StateRun, PipelineError> {
    log_info("📖 Reading West Virginia export...");
    let rows = read_west_virginia(bytes).inspect_err(|e| log_error(e.to_string()))?;
    log_success(format!("Read {} rows", rows.len()));

    let records = transform_west_virginia(&rows);
    let run = StateRun {
        records,
        rows_read: rows.len(),
    };
    log_state_summary(&run, "active organizations");
    Ok(run)
}

fn log_state_summary(run: &StateRun, kept: &str) {
    if run.rows_dropped() > 0 {
        log_warning(format!("{} rows filtered out or incomplete", run.rows_dropped()));
    }
    log_success(format!("{} {}", run.records.len(), kept));
}

/// Merge processed files, each sliced by its selection.
///
/// Uploads may be delimited text or xlsx workbooks. Files that cannot be
/// read are reported as exclusions alongside files missing a standard column.
pub fn combine_files(files: Vec<NamedUpload>) -> Result<CombineReport, PipelineError> {
    log_info(format!("🔗 Combining {} file(s)...", files.len()));

    let mut combiner = Combiner::new();
    for file in &files {
        let selection = file
            .selection
            .as_deref()
            .map(Selection::parse)
            .unwrap_or_default();

        match parse_upload(&file.bytes) {
            Ok(table) => {
                log_info_indent(
                    format!("{}: {} rows, selection {}", file.name, table.len(), selection),
                    1,
                );
                combiner.add(file.name.as_str(), &table, selection);
            }
            Err(e) => {
                log_error(format!("{}: {}", file.name, e));
                combiner.exclude(file.name.as_str(), e.to_string());
            }
        }
    }

    let report = combiner.finish().inspect_err(|_| log_error("No valid data to combine"))?;
    for file in report.included.iter().filter(|f| f.dropped > 0) {
        log_warning(format!("{}: {} incomplete row(s) dropped", file.name, file.dropped));
    }
    for excluded in &report.excluded {
        log_warning(format!("Excluded {}: {}", excluded.name, excluded.reason));
    }
    log_success(format!(
        "{} records from {} file(s)",
        report.records.len(),
        report.included.len()
    ));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CombineError, IngestError};

    const STANDARD_CSV: &str = "Name,Address,City,State,Zipcode,Filing Date,Document Number\n\
                                A LLC,1 ST,MIAMI,FL,33101,01/02/2024,L1\n\
                                B LLC,2 ST,TAMPA,FL,33601,01/03/2024,L2\n\
                                C LLC,3 ST,OCALA,FL,34470,01/04/2024,L3\n";

    #[test]
    fn test_washington_requires_filing_date() {
        let csv = b"Business Name,UBI,Status,Business Type,Principal Office Address\n";
        assert!(matches!(
            process_washington(csv, " "),
            Err(PipelineError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_washington_run_counts() {
        let csv = "Business Name,UBI,Status,Business Type,Principal Office Address\n\
                   EVERGREEN LLC,604123456,Active,WA LIMITED LIABILITY COMPANY,\"123 PINE ST, SEATTLE, WA, 98101\"\n\
                   OLD CO,601000000,Inactive,WA LIMITED LIABILITY COMPANY,\"1 MAIN ST, TACOMA, WA, 98402\"\n";
        let run = process_washington(csv.as_bytes(), "02/01/2025").unwrap();
        assert_eq!(run.rows_read, 2);
        assert_eq!(run.records.len(), 1);
        assert_eq!(run.rows_dropped(), 1);
    }

    #[test]
    fn test_west_virginia_missing_columns() {
        let err = process_west_virginia(b"Id,Organization Name\n1,A\n").unwrap_err();
        match err {
            PipelineError::Ingest(IngestError::MissingColumns(cols)) => {
                assert!(cols.contains(&"Termination Date".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_florida_empty_file_is_empty_run() {
        let run = process_florida(b"", &FloridaOptions::default());
        assert!(run.output.is_empty());
        assert_eq!(run.lines_seen, 0);
    }

    #[test]
    fn test_combine_files_with_selection_and_bad_upload() {
        let files = vec![
            NamedUpload::new("fl.csv", STANDARD_CSV.as_bytes().to_vec()).with_selection("last 2"),
            NamedUpload::new("empty.csv", Vec::new()),
            NamedUpload::new("partial.csv", b"Name,City\nX,Y\n".to_vec()),
        ];
        let report = combine_files(files).unwrap();

        let ids: Vec<_> = report.records.iter().map(|r| r.document_number.as_str()).collect();
        assert_eq!(ids, vec!["L2", "L3"]);
        assert_eq!(report.excluded.len(), 2);
        assert_eq!(report.excluded[0].name, "empty.csv");
        assert_eq!(report.excluded[1].name, "partial.csv");
    }

    #[test]
    fn test_exported_csv_combines_back_unchanged() {
        let csv = "Id,Organization Name,Street1,Street2,City,StateProvince,ZipCode,Effective Date,Termination Date\n\
                   512345,\"MOUNTAINEER, LLC\",1 CAPITOL ST,SUITE 2,CHARLESTON,WV,25301,2024-03-04,\n\
                   512347,ANNEX LLC,3 RIVER RD,,WHEELING,WV,26003,01/05/2024,\n";
        let run = process_west_virginia(csv.as_bytes()).unwrap();
        assert_eq!(run.records.len(), 2);

        let exported = crate::export::to_csv(&run.records).unwrap();
        let report = combine_files(vec![NamedUpload::new("WV_Output.csv", exported).with_selection("ALL")]).unwrap();
        assert_eq!(report.records, run.records);
        assert_eq!(report.included[0].dropped, 0);
    }

    #[test]
    fn test_combine_files_accepts_workbooks() {
        let fl = combine_files(vec![NamedUpload::new("fl.csv", STANDARD_CSV.as_bytes().to_vec())]).unwrap();
        let xlsx = crate::export::to_xlsx(&fl.records).unwrap();

        let report = combine_files(vec![
            NamedUpload::new("Florida_Output.xlsx", xlsx).with_selection("2-3"),
            NamedUpload::new("fl.csv", STANDARD_CSV.as_bytes().to_vec()).with_selection("first 1"),
        ])
        .unwrap();

        let ids: Vec<_> = report.records.iter().map(|r| r.document_number.as_str()).collect();
        assert_eq!(ids, vec!["L2", "L3", "L1"]);
        assert_eq!(report.records[0], fl.records[1]);
        assert!(report.excluded.is_empty());
    }

    #[test]
    fn test_combine_files_nothing_valid() {
        let err = combine_files(vec![NamedUpload::new("empty.csv", Vec::new())]).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Combine(CombineError::NoValidInputs { .. })
        ));
    }
}
