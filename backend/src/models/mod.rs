//! Domain models for the registry processing pipeline.
//!
//! - [`StandardRecord`] - the seven-column mailing row every state produces
//! - [`FloridaRecord`] - the full principal + mailing Florida row
//! - [`WashingtonRow`] / [`WestVirginiaRow`] - raw rows as read from the state exports
//! - [`Tabular`] - column headers and cell order of an output record

use serde::{Deserialize, Serialize};

use crate::parser::nullable;

// =============================================================================
// Tabular output
// =============================================================================

/// A record that renders as one row of an output table.
pub trait Tabular {
    /// Header names, in output order.
    const COLUMNS: &'static [&'static str];

    /// Cell values, in the same order as [`Tabular::COLUMNS`].
    fn cells(&self) -> Vec<&str>;

    /// True when every cell is non-empty after trimming.
    fn is_complete(&self) -> bool {
        self.cells().iter().all(|cell| !cell.trim().is_empty())
    }
}

// =============================================================================
// Standard Record
// =============================================================================

/// Column order of the standard mailing schema.
pub const STANDARD_COLUMNS: [&str; 7] = [
    "Name",
    "Address",
    "City",
    "State",
    "Zipcode",
    "Filing Date",
    "Document Number",
];

/// The common output row shared by all state transformers.
///
/// Filing date is `MM/DD/YYYY`, zipcode is exactly five digits.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StandardRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Address")]
    pub address: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Zipcode")]
    pub zipcode: String,
    #[serde(rename = "Filing Date")]
    pub filing_date: String,
    #[serde(rename = "Document Number")]
    pub document_number: String,
}

impl Tabular for StandardRecord {
    const COLUMNS: &'static [&'static str] = &STANDARD_COLUMNS;

    fn cells(&self) -> Vec<&str> {
        vec![
            self.name.as_str(),
            self.address.as_str(),
            self.city.as_str(),
            self.state.as_str(),
            self.zipcode.as_str(),
            self.filing_date.as_str(),
            self.document_number.as_str(),
        ]
    }
}

// =============================================================================
// Florida
// =============================================================================

/// Column order of the full Florida output.
pub const FLORIDA_COLUMNS: [&str; 10] = [
    "Entity ID",
    "Name",
    "Filing Date",
    "Principal Street",
    "Principal City",
    "Principal ZIP",
    "Mailing Street",
    "Mailing City",
    "Mailing State",
    "Mailing ZIP",
];

/// One decoded line of the Florida fixed-width corporate file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FloridaRecord {
    #[serde(rename = "Entity ID")]
    pub entity_id: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Filing Date")]
    pub filing_date: String,
    #[serde(rename = "Principal Street")]
    pub principal_street: String,
    #[serde(rename = "Principal City")]
    pub principal_city: String,
    #[serde(rename = "Principal ZIP")]
    pub principal_zip: String,
    #[serde(rename = "Mailing Street")]
    pub mailing_street: String,
    #[serde(rename = "Mailing City")]
    pub mailing_city: String,
    #[serde(rename = "Mailing State")]
    pub mailing_state: String,
    #[serde(rename = "Mailing ZIP")]
    pub mailing_zip: String,
}

impl FloridaRecord {
    /// Project onto the standard schema using the mailing address block.
    pub fn to_mailing(&self) -> StandardRecord {
        StandardRecord {
            name: self.name.clone(),
            address: self.mailing_street.clone(),
            city: self.mailing_city.clone(),
            state: self.mailing_state.clone(),
            zipcode: self.mailing_zip.clone(),
            filing_date: self.filing_date.clone(),
            document_number: self.entity_id.clone(),
        }
    }
}

impl Tabular for FloridaRecord {
    const COLUMNS: &'static [&'static str] = &FLORIDA_COLUMNS;

    fn cells(&self) -> Vec<&str> {
        vec![
            self.entity_id.as_str(),
            self.name.as_str(),
            self.filing_date.as_str(),
            self.principal_street.as_str(),
            self.principal_city.as_str(),
            self.principal_zip.as_str(),
            self.mailing_street.as_str(),
            self.mailing_city.as_str(),
            self.mailing_state.as_str(),
            self.mailing_zip.as_str(),
        ]
    }
}

// =============================================================================
// Washington
// =============================================================================

/// Columns a Washington export must carry.
pub const WASHINGTON_COLUMNS: [&str; 5] = [
    "Business Name",
    "Status",
    "Principal Office Address",
    "Business Type",
    "UBI",
];

/// A row of the Washington corporations export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WashingtonRow {
    #[serde(rename = "Business Name", default, deserialize_with = "nullable")]
    pub business_name: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "nullable")]
    pub status: Option<String>,
    #[serde(rename = "Principal Office Address", default, deserialize_with = "nullable")]
    pub principal_office_address: Option<String>,
    #[serde(rename = "Business Type", default, deserialize_with = "nullable")]
    pub business_type: Option<String>,
    #[serde(rename = "UBI", default, deserialize_with = "nullable")]
    pub ubi: Option<String>,
}

// =============================================================================
// West Virginia
// =============================================================================

/// Columns a West Virginia export must carry. `Street2` is optional.
pub const WEST_VIRGINIA_COLUMNS: [&str; 8] = [
    "Organization Name",
    "Street1",
    "City",
    "StateProvince",
    "ZipCode",
    "Effective Date",
    "Termination Date",
    "Id",
];

/// A row of the West Virginia business organizations export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WestVirginiaRow {
    #[serde(rename = "Organization Name", default, deserialize_with = "nullable")]
    pub organization_name: Option<String>,
    #[serde(rename = "Street1", default, deserialize_with = "nullable")]
    pub street1: Option<String>,
    #[serde(rename = "Street2", default, deserialize_with = "nullable")]
    pub street2: Option<String>,
    #[serde(rename = "City", default, deserialize_with = "nullable")]
    pub city: Option<String>,
    #[serde(rename = "StateProvince", default, deserialize_with = "nullable")]
    pub state_province: Option<String>,
    #[serde(rename = "ZipCode", default, deserialize_with = "nullable")]
    pub zip_code: Option<String>,
    #[serde(rename = "Effective Date", default, deserialize_with = "nullable")]
    pub effective_date: Option<String>,
    #[serde(rename = "Termination Date", default, deserialize_with = "nullable")]
    pub termination_date: Option<String>,
    #[serde(rename = "Id", default, deserialize_with = "nullable")]
    pub id: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================
