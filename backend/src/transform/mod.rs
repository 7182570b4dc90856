//! Transformation module.
//!
//! - Florida: fixed-width corporate file decoder
//! - Washington / West Virginia: CSV export transformers
//! - Selector: row selection expressions
//! - Combiner: merge processed files
//! - Pipeline: per-operation entry points with progress logging

pub mod combiner;
pub mod fields;
pub mod florida;
pub mod pipeline;
pub mod selector;
pub mod washington;
pub mod west_virginia;

pub use combiner::{combine, CombineReport, Combiner, Exclusion, IncludedFile};
pub use florida::{parse_florida, parse_line, FloridaOptions, FloridaOutput, FloridaParse};
pub use pipeline::*;
pub use selector::{select_rows, Selection};
pub use washington::{read_washington, transform_washington};
pub use west_virginia::{read_west_virginia, transform_west_virginia};
