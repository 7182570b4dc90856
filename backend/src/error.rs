//! Error types for the registry processing pipeline.
//!
//! - [`IngestError`] - reading uploaded files into rows or tables, writing workbooks
//! - [`CombineError`] - merging processed files
//! - [`CredentialError`] - credential store and login
//! - [`PipelineError`] - top-level orchestration errors
//! - [`ServerError`] - HTTP layer
//!
//! Per-line and per-row rejections are not errors: they only show up in the
//! run counts. Conversion is via `From`, so `?` works across boundaries.

use thiserror::Error;

use crate::transform::combiner::Exclusion;

// =============================================================================
// Ingest Errors
// =============================================================================

/// Errors while reading an uploaded file.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Empty file.
    #[error("File is empty")]
    EmptyFile,

    /// No header row.
    #[error("No headers found")]
    NoHeaders,

    /// Malformed CSV.
    #[error("Line {line}: {message}")]
    Csv { line: u64, message: String },

    /// Unreadable xlsx workbook.
    #[error("Failed to read workbook: {0}")]
    Workbook(String),

    /// The file lacks columns the state layout requires.
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

impl From<csv::Error> for IngestError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        IngestError::Csv {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Combine Errors
// =============================================================================

/// Errors while combining processed files.
#[derive(Debug, Error)]
pub enum CombineError {
    /// Every input was excluded (or none was given).
    #[error("No valid data to combine ({} file(s) excluded)", excluded.len())]
    NoValidInputs { excluded: Vec<Exclusion> },
}

// =============================================================================
// Credential Errors
// =============================================================================

/// Errors from the credential store and login checks.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Unknown user or wrong password.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Account past its expiry.
    #[error("Account '{0}' has expired")]
    Expired(String),

    /// Username already taken.
    #[error("User '{0}' already exists")]
    DuplicateUser(String),

    /// Blank username or password.
    #[error("Invalid user: {0}")]
    InvalidUser(String),

    /// IO error.
    #[error("Credential store IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("Credential store JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level processing errors.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Input could not be read.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Nothing to combine.
    #[error("{0}")]
    Combine(#[from] CombineError),

    /// Missing or invalid option.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Output could not be written.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("{0}")]
    Pipeline(#[from] PipelineError),

    /// Login failure.
    #[error("{0}")]
    Credential(#[from] CredentialError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// No logged-in session.
    #[error("Not logged in")]
    Unauthorized,

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // IngestError -> PipelineError
        let err: PipelineError = IngestError::EmptyFile.into();
        assert!(err.to_string().contains("empty"));

        // PipelineError -> ServerError keeps the message
        let err: ServerError = PipelineError::InvalidInput("filing date".into()).into();
        assert!(err.to_string().contains("filing date"));
    }

    #[test]
    fn test_missing_columns_format() {
        let err = IngestError::MissingColumns(vec!["Status".into(), "UBI".into()]);
        assert_eq!(err.to_string(), "Missing required column(s): Status, UBI");
    }

    #[test]
    fn test_no_valid_inputs_format() {
        let err = CombineError::NoValidInputs {
            excluded: vec![Exclusion {
                name: "a.csv".into(),
                reason: "Missing required column(s): Document Number".into(),
                missing_columns: vec!["Document Number".into()],
            }],
        };
        assert!(err.to_string().contains("1 file(s) excluded"));
    }

    #[test]
    fn test_bad_login_hides_which_part_failed() {
        assert_eq!(
            CredentialError::InvalidCredentials.to_string(),
            "Invalid username or password"
        );
    }
}
