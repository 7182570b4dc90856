//! # BOI - state business-registry exports to one mailing table
//!
//! Reads the Florida fixed-width corporate file and the Washington and West
//! Virginia CSV exports, keeps the active entities and rewrites them into a
//! seven-column table (`Name, Address, City, State, Zipcode, Filing Date,
//! Document Number`). Processed tables, CSV or xlsx, can then be sliced and
//! merged.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ State file  │────▶│   Parser    │────▶│ Transformer │────▶│  CSV / JSON │
//! │ (txt / csv) │     │  (lenient)  │     │ (per state) │     │  (7 cols)   │
//! └─────────────┘     └─────────────┘     └─────────────┘     └──────┬──────┘
//!                                                                    │
//!                                          ┌─────────────┐           │
//!                                          │  Combiner   │◀──────────┘
//!                                          │ (selection) │
//!                                          └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use boi::{process_west_virginia, to_csv};
//!
//! let bytes = std::fs::read("orgs.csv")?;
//! let run = process_west_virginia(&bytes)?;
//! std::fs::write("WV_Output.csv", to_csv(&run.records)?)?;
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Output records and raw state rows
//! - [`parser`] - Upload decoding, CSV and workbook reading
//! - [`transform`] - State transformers, row selection, combiner, pipeline
//! - [`export`] - CSV, JSON and xlsx output
//! - [`auth`] - Credential store
//! - [`config`] - Environment configuration
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Transformation
pub mod transform;

// Output
pub mod export;

// Accounts
pub mod auth;
pub mod config;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CombineError, CredentialError, IngestError, PipelineError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    FloridaRecord, StandardRecord, Tabular, WashingtonRow, WestVirginiaRow, STANDARD_COLUMNS,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, decode_lossy, detect_delimiter, detect_encoding, is_workbook, parse_table,
    parse_table_file, parse_upload, parse_workbook, read_rows, CsvTable,
};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    combine, combine_files, parse_florida, process_florida, process_washington,
    process_west_virginia, select_rows, transform_washington, transform_west_virginia,
    CombineReport, Exclusion, FloridaOptions, FloridaOutput, FloridaRun, NamedUpload, Selection,
    StateRun,
};

// =============================================================================
// Re-exports - Export
// =============================================================================

pub use export::{render, to_csv, to_json, to_xlsx, OutputFormat};

// =============================================================================
// Re-exports - Accounts
// =============================================================================

pub use auth::{
    authenticate, hash_password, register, verify_password, Credential, CredentialStore,
    FileCredentialStore, MemoryCredentialStore,
};
pub use config::AppConfig;

// Server
pub mod server {
    pub use crate::api::server::{build_router, start_server};
}
