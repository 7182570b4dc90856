//! West Virginia business organizations export.
//!
//! A row is active while its termination date is empty.

use super::fields::{first_zip5, to_mdy};
use crate::error::IngestResult;
use crate::models::{StandardRecord, Tabular, WestVirginiaRow, WEST_VIRGINIA_COLUMNS};
use crate::parser::read_rows;

/// Read a West Virginia CSV export.
pub fn read_west_virginia(bytes: &[u8]) -> IngestResult<Vec<WestVirginiaRow>> {
    read_rows(bytes, &WEST_VIRGINIA_COLUMNS)
}

/// Transform West Virginia rows.
pub fn transform_west_virginia(rows: &[WestVirginiaRow]) -> Vec<StandardRecord> {
    rows.iter()
        .filter(|row| is_active(row))
        .map(to_standard)
        .filter(StandardRecord::is_complete)
        .collect()
}

fn is_active(row: &WestVirginiaRow) -> bool {
    row.organization_name.is_some()
        && row.street1.is_some()
        && row.city.is_some()
        && row.state_province.is_some()
        && row.zip_code.is_some()
        && row.termination_date.is_none()
}

fn cell(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("").trim()
}

fn to_standard(row: &WestVirginiaRow) -> StandardRecord {
    let street1 = cell(&row.street1);
    let street2 = cell(&row.street2);
    let address = if street2.is_empty() {
        street1.to_string()
    } else {
        format!("{}, {}", street1, street2)
    };

    StandardRecord {
        name: cell(&row.organization_name).to_string(),
        address: address.trim().to_string(),
        city: cell(&row.city).to_string(),
        state: cell(&row.state_province).to_string(),
        zipcode: first_zip5(cell(&row.zip_code)).unwrap_or("").to_string(),
        filing_date: to_mdy(cell(&row.effective_date)),
        document_number: cell(&row.id).to_string(),
    }
}
