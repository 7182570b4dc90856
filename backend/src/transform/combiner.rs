//! Merge previously processed files into one standard table.
//!
//! Each input is checked for the seven standard columns first; inputs missing
//! any of them are excluded and reported, the rest are sliced with their row
//! selection and appended in order. Selected rows with a blank standard cell
//! are dropped, so combined output holds only complete records.

use serde::Serialize;

use super::selector::Selection;
use crate::error::{CombineError, IngestError};
use crate::models::{StandardRecord, Tabular, STANDARD_COLUMNS};
use crate::parser::CsvTable;

/// An input left out of the combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exclusion {
    pub name: String,
    pub reason: String,
    /// Standard columns the input lacks (empty for unreadable files)
    pub missing_columns: Vec<String>,
}

/// An input that made it into the combination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncludedFile {
    pub name: String,
    pub selection: String,
    /// Rows in the file
    pub available: usize,
    /// Rows taken after selection
    pub selected: usize,
    /// Selected rows left out for a blank cell
    pub dropped: usize,
}

/// Outcome of a combination with at least one retained input.
#[derive(Debug, Clone)]
pub struct CombineReport {
    pub records: Vec<StandardRecord>,
    pub included: Vec<IncludedFile>,
    pub excluded: Vec<Exclusion>,
}

struct Retained {
    name: String,
    selection: Selection,
    records: Vec<StandardRecord>,
}

/// Accumulates inputs, validating each as it is added.
#[derive(Default)]
pub struct Combiner {
    retained: Vec<Retained>,
    excluded: Vec<Exclusion>,
}

impl Combiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; excluded when it lacks a standard column.
    pub fn add(&mut self, name: impl Into<String>, table: &CsvTable, selection: Selection) -> &mut Self {
        let name = name.into();
        let missing = table.missing_columns(&STANDARD_COLUMNS);
        if !missing.is_empty() {
            let reason = IngestError::MissingColumns(missing.clone()).to_string();
            self.excluded.push(Exclusion {
                name,
                reason,
                missing_columns: missing,
            });
            return self;
        }

        self.retained.push(Retained {
            name,
            selection,
            records: table_records(table),
        });
        self
    }

    /// Record an input that could not be read at all.
    pub fn exclude(&mut self, name: impl Into<String>, reason: impl Into<String>) -> &mut Self {
        self.excluded.push(Exclusion {
            name: name.into(),
            reason: reason.into(),
            missing_columns: Vec::new(),
        });
        self
    }

    /// Concatenate the selected rows of every retained input.
    ///
    /// Fails with [`CombineError::NoValidInputs`] when nothing was retained;
    /// an `Ok` report may still hold zero records.
    pub fn finish(self) -> Result<CombineReport, CombineError> {
        if self.retained.is_empty() {
            return Err(CombineError::NoValidInputs {
                excluded: self.excluded,
            });
        }

        let mut records = Vec::new();
        let mut included = Vec::with_capacity(self.retained.len());
        for input in self.retained {
            let selected = input.selection.apply(&input.records);
            let before = records.len();
            records.extend(selected.iter().filter(|r| r.is_complete()).cloned());
            included.push(IncludedFile {
                name: input.name,
                selection: input.selection.to_string(),
                available: input.records.len(),
                selected: selected.len(),
                dropped: selected.len() - (records.len() - before),
            });
        }

        Ok(CombineReport {
            records,
            included,
            excluded: self.excluded,
        })
    }
}

/// Combine named tables, each with its own selection.
pub fn combine<'a, I>(inputs: I) -> Result<CombineReport, CombineError>
where
    I: IntoIterator<Item = (&'a str, &'a CsvTable, Selection)>,
{
    let mut combiner = Combiner::new();
    for (name, table, selection) in inputs {
        combiner.add(name, table, selection);
    }
    combiner.finish()
}

/// Read standard records out of a table by header name.
///
/// The table must carry every standard column.
fn table_records(table: &CsvTable) -> Vec<StandardRecord> {
    let idx = |name: &str| table.column(name).unwrap_or(usize::MAX);
    let cols = STANDARD_COLUMNS.map(idx);
    let get = |row: &Vec<String>, i: usize| row.get(cols[i]).map(|c| c.trim().to_string()).unwrap_or_default();

    table
        .rows
        .iter()
        .map(|row| StandardRecord {
            name: get(row, 0),
            address: get(row, 1),
            city: get(row, 2),
            state: get(row, 3),
            zipcode: get(row, 4),
            filing_date: get(row, 5),
            document_number: get(row, 6),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_table;

    const HEADER: &str = "Name,Address,City,State,Zipcode,Filing Date,Document Number";

    fn table(prefix: &str, rows: usize) -> CsvTable {
        let mut csv = format!("{HEADER}\n");
        for i in 1..=rows {
            csv.push_str(&format!("{prefix} {i},1 ST,TOWN,FL,33101,01/0{i}/2024,{prefix}{i}\n"));
        }
        parse_table(csv.as_bytes()).unwrap()
    }

    fn ids(report: &CombineReport) -> Vec<&str> {
        report.records.iter().map(|r| r.document_number.as_str()).collect()
    }

    #[test]
    fn test_concatenates_in_order() {
        let fl = table("FL", 3);
        let wa = table("WA", 2);
        let report = combine([
            ("fl.csv", &fl, Selection::All),
            ("wa.csv", &wa, Selection::All),
        ])
        .unwrap();

        assert_eq!(ids(&report), vec!["FL1", "FL2", "FL3", "WA1", "WA2"]);
        assert!(report.excluded.is_empty());
        assert_eq!(report.included[0].available, 3);
    }

    #[test]
    fn test_selection_per_file() {
        let fl = table("FL", 5);
        let wa = table("WA", 4);
        let report = combine([
            ("fl.csv", &fl, Selection::parse("2-3")),
            ("wa.csv", &wa, Selection::parse("last 1")),
        ])
        .unwrap();

        assert_eq!(ids(&report), vec!["FL2", "FL3", "WA4"]);
        assert_eq!(report.included[0].selection, "2-3");
        assert_eq!(report.included[0].selected, 2);
        assert_eq!(report.included[1].selected, 1);
    }

    #[test]
    fn test_missing_document_number_excluded() {
        let good = table("FL", 2);
        let bad = parse_table(b"Name,Address,City,State,Zipcode,Filing Date\nX,1 ST,T,FL,33101,01/01/2024\n").unwrap();

        let report = combine([
            ("bad.csv", &bad, Selection::All),
            ("good.csv", &good, Selection::All),
        ])
        .unwrap();

        assert_eq!(ids(&report), vec!["FL1", "FL2"]);
        assert_eq!(report.excluded.len(), 1);
        assert_eq!(report.excluded[0].name, "bad.csv");
        assert_eq!(report.excluded[0].missing_columns, vec!["Document Number"]);
    }

    #[test]
    fn test_no_valid_inputs_is_distinct_from_empty() {
        let bad = parse_table(b"Name\nX\n").unwrap();
        let err = combine([("bad.csv", &bad, Selection::All)]).unwrap_err();
        let CombineError::NoValidInputs { excluded } = err;
        assert_eq!(excluded.len(), 1);

        assert!(matches!(
            combine(Vec::<(&str, &CsvTable, Selection)>::new()),
            Err(CombineError::NoValidInputs { .. })
        ));

        let fl = table("FL", 3);
        let report = combine([("fl.csv", &fl, Selection::First(0))]).unwrap();
        assert!(report.records.is_empty());
        assert_eq!(report.included.len(), 1);
    }

    #[test]
    fn test_column_order_does_not_matter() {
        let t = parse_table(
            b"Document Number,Extra,Zipcode,State,City,Address,Name,Filing Date\nD1,x,33101,FL,MIAMI,1 ST,ACME,01/02/2024\n",
        )
        .unwrap();
        let report = combine([("t.csv", &t, Selection::All)]).unwrap();

        assert_eq!(
            report.records[0],
            StandardRecord {
                name: "ACME".into(),
                address: "1 ST".into(),
                city: "MIAMI".into(),
                state: "FL".into(),
                zipcode: "33101".into(),
                filing_date: "01/02/2024".into(),
                document_number: "D1".into(),
            }
        );
    }

    #[test]
    fn test_incomplete_rows_dropped() {
        let t = parse_table(
            format!("{HEADER}\nA,,,FL,,01/01/2024,D1\nB,2 ST,TAMPA,FL,33601,01/02/2024,D2\nC,3 ST,OCALA,FL,34470, ,D3\n")
                .as_bytes(),
        )
        .unwrap();
        let report = combine([("t.csv", &t, Selection::All)]).unwrap();

        assert_eq!(ids(&report), vec!["D2"]);
        assert_eq!(report.included[0].available, 3);
        assert_eq!(report.included[0].selected, 3);
        assert_eq!(report.included[0].dropped, 2);
    }

    #[test]
    fn test_selection_counts_file_rows_before_dropping() {
        let t = parse_table(
            format!("{HEADER}\nA,,,FL,,01/01/2024,D1\nB,2 ST,TAMPA,FL,33601,01/02/2024,D2\n").as_bytes(),
        )
        .unwrap();
        let report = combine([("t.csv", &t, Selection::First(1))]).unwrap();

        assert!(report.records.is_empty());
        assert_eq!(report.included[0].selected, 1);
        assert_eq!(report.included[0].dropped, 1);
    }

    #[test]
    fn test_unreadable_input_reported() {
        let fl = table("FL", 1);
        let mut combiner = Combiner::new();
        combiner
            .exclude("broken.csv", "File is empty")
            .add("fl.csv", &fl, Selection::All);
        let report = combiner.finish().unwrap();

        assert_eq!(report.records.len(), 1);
        assert_eq!(report.excluded[0].reason, "File is empty");
    }
}
