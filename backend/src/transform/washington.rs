//! Washington corporations export.
//!
//! Keeps active Washington LLCs and splits the one-cell principal office
//! address (`street, city, state zip[, country]`). The export has no filing
//! date, so the caller supplies one that is stamped on every row.

use super::fields::{first_state_code, first_zip5};
use crate::error::IngestResult;
use crate::models::{StandardRecord, Tabular, WashingtonRow, WASHINGTON_COLUMNS};
use crate::parser::read_rows;

const ACTIVE: &str = "Active";
const LLC_TYPE: &str = "WA LIMITED LIABILITY COMPANY";

/// Read a Washington CSV export.
pub fn read_washington(bytes: &[u8]) -> IngestResult<Vec<WashingtonRow>> {
    read_rows(bytes, &WASHINGTON_COLUMNS)
}

/// Transform Washington rows, stamping `filing_date` on each.
pub fn transform_washington(rows: &[WashingtonRow], filing_date: &str) -> Vec<StandardRecord> {
    let filing_date = filing_date.trim();
    rows.iter()
        .filter(|row| is_active_llc(row))
        .filter_map(|row| to_standard(row, filing_date))
        .filter(StandardRecord::is_complete)
        .collect()
}

fn is_active_llc(row: &WashingtonRow) -> bool {
    row.status.as_deref() == Some(ACTIVE)
        && row.principal_office_address.is_some()
        && row
            .business_type
            .as_deref()
            .is_some_and(|t| t.trim().to_uppercase() == LLC_TYPE)
}

fn to_standard(row: &WashingtonRow, filing_date: &str) -> Option<StandardRecord> {
    let address = row.principal_office_address.as_deref()?;
    let segments: Vec<&str> = address.split(',').map(str::trim).collect();
    let segment = |i: usize| segments.get(i).copied().unwrap_or("");

    let state = first_state_code(segment(2)).unwrap_or("");
    let zip_source = format!("{},{}", segment(2), segment(3));
    let zipcode = first_zip5(&zip_source).unwrap_or("");

    Some(StandardRecord {
        name: row.business_name.as_deref().unwrap_or("").trim().to_string(),
        address: segment(0).to_string(),
        city: segment(1).to_string(),
        state: state.to_string(),
        zipcode: zipcode.to_string(),
        filing_date: filing_date.to_string(),
        document_number: row.ubi.as_deref().unwrap_or("").trim().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, address: &str, business_type: &str) -> WashingtonRow {
        WashingtonRow {
            business_name: Some(" EVERGREEN LLC ".into()),
            status: Some(status.into()),
            principal_office_address: Some(address.into()),
            business_type: Some(business_type.into()),
            ubi: Some("604123456".into()),
        }
    }

    const ADDRESS: &str = "123 PINE ST, SEATTLE, WA, 98101-1234, USA";

    #[test]
    fn test_active_llc_transformed() {
        let records = transform_washington(
            &[row("Active", ADDRESS, "WA LIMITED LIABILITY COMPANY")],
            " 01/15/2025 ",
        );

        assert_eq!(
            records,
            vec![StandardRecord {
                name: "EVERGREEN LLC".into(),
                address: "123 PINE ST".into(),
                city: "SEATTLE".into(),
                state: "WA".into(),
                zipcode: "98101".into(),
                filing_date: "01/15/2025".into(),
                document_number: "604123456".into(),
            }]
        );
    }

    #[test]
    fn test_state_and_zip_in_one_segment() {
        let records = transform_washington(
            &[row("Active", "9 ELM AVE, SPOKANE, WA 99201", "WA LIMITED LIABILITY COMPANY")],
            "01/15/2025",
        );
        assert_eq!(records[0].state, "WA");
        assert_eq!(records[0].zipcode, "99201");
    }

    #[test]
    fn test_business_type_case_and_space_insensitive() {
        let records = transform_washington(
            &[row("Active", ADDRESS, "  wa limited liability company ")],
            "01/15/2025",
        );
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_inactive_always_excluded() {
        for status in ["Inactive", "active", "ACTIVE", " Active"] {
            let records = transform_washington(
                &[row(status, ADDRESS, "WA LIMITED LIABILITY COMPANY")],
                "01/15/2025",
            );
            assert!(records.is_empty(), "status {status}");
        }
    }

    #[test]
    fn test_other_business_types_excluded() {
        let records = transform_washington(
            &[row("Active", ADDRESS, "WA PROFIT CORPORATION")],
            "01/15/2025",
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_address_excluded() {
        let mut r = row("Active", ADDRESS, "WA LIMITED LIABILITY COMPANY");
        r.principal_office_address = None;
        assert!(transform_washington(&[r], "01/15/2025").is_empty());
    }

    #[test]
    fn test_incomplete_address_dropped() {
        let records = transform_washington(
            &[
                row("Active", "123 PINE ST", "WA LIMITED LIABILITY COMPANY"),
                row("Active", "123 PINE ST, SEATTLE", "WA LIMITED LIABILITY COMPANY"),
            ],
            "01/15/2025",
        );
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_ubi_or_date_dropped() {
        let mut r = row("Active", ADDRESS, "WA LIMITED LIABILITY COMPANY");
        r.ubi = None;
        assert!(transform_washington(&[r], "01/15/2025").is_empty());

        let r = row("Active", ADDRESS, "WA LIMITED LIABILITY COMPANY");
        assert!(transform_washington(&[r], "  ").is_empty());
    }

    #[test]
    fn test_read_and_transform_csv() {
        let csv = "Business Name,UBI,Status,Business Type,Principal Office Address\n\
                   EVERGREEN LLC,604123456,Active,WA LIMITED LIABILITY COMPANY,\"123 PINE ST, SEATTLE, WA, 98101\"\n\
                   OLD CO,601000000,Inactive,WA LIMITED LIABILITY COMPANY,\"1 MAIN ST, TACOMA, WA, 98402\"\n";
        let rows = read_washington(csv.as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        let first = transform_washington(&rows, "02/01/2025");
        let second = transform_washington(&rows, "02/01/2025");
        assert_eq!(first.len(), 1);
        assert_eq!(first, second);
        assert_eq!(first[0].document_number, "604123456");
    }
}
