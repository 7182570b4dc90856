//! REST response types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use super::logs::log_error;
use crate::error::{CombineError, CredentialError, IngestError, PipelineError, ServerError};
use crate::export;
use crate::models::Tabular;
use crate::transform::combiner::{CombineReport, Exclusion, IncludedFile};
use crate::transform::florida::FloridaOutput;
use crate::transform::pipeline::{FloridaRun, StateRun};

/// Body returned by every processing route.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableResponse {
    /// Unique job identifier
    pub job_id: String,
    /// "ready" when rows were produced, "empty" otherwise
    pub status: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub counts: RunCounts,
    /// Combine only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub included: Vec<IncludedFile>,
    /// Combine only
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub excluded: Vec<Exclusion>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunCounts {
    /// Lines or rows read
    pub input: usize,
    /// Lines or rows not carried into the output
    pub dropped: usize,
    pub output: usize,
}

impl TableResponse {
    fn from_records<T: Tabular>(records: &[T], input: usize, dropped: usize) -> Self {
        let (columns, rows) = export::table(records);
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: if rows.is_empty() { "empty" } else { "ready" }.to_string(),
            counts: RunCounts {
                input,
                dropped,
                output: rows.len(),
            },
            columns,
            rows,
            included: Vec::new(),
            excluded: Vec::new(),
        }
    }
}

impl From<&FloridaRun> for TableResponse {
    fn from(run: &FloridaRun) -> Self {
        let dropped = run.lines_seen.saturating_sub(run.output.len());
        match &run.output {
            FloridaOutput::Mailing(records) => Self::from_records(records, run.lines_seen, dropped),
            FloridaOutput::Full(records) => Self::from_records(records, run.lines_seen, dropped),
        }
    }
}

impl From<&StateRun> for TableResponse {
    fn from(run: &StateRun) -> Self {
        Self::from_records(&run.records, run.rows_read, run.rows_dropped())
    }
}

impl From<&CombineReport> for TableResponse {
    fn from(report: &CombineReport) -> Self {
        let available = report.included.iter().map(|f| f.available).sum::<usize>();
        let mut response = Self::from_records(
            &report.records,
            available,
            available.saturating_sub(report.records.len()),
        );
        response.included = report.included.clone();
        response.excluded = report.excluded.clone();
        response
    }
}

/// Create an error response body
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "columns": [],
        "rows": [],
    })
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Unauthorized => StatusCode::UNAUTHORIZED,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Credential(e) => match e {
                CredentialError::InvalidCredentials | CredentialError::Expired(_) => {
                    StatusCode::UNAUTHORIZED
                }
                CredentialError::DuplicateUser(_) | CredentialError::InvalidUser(_) => {
                    StatusCode::BAD_REQUEST
                }
                CredentialError::Io(_) | CredentialError::Json(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            ServerError::Pipeline(e) => match e {
                PipelineError::Ingest(IngestError::Io(_)) | PipelineError::Io(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
                PipelineError::Ingest(_) | PipelineError::InvalidInput(_) => {
                    StatusCode::BAD_REQUEST
                }
                PipelineError::Combine(_) => StatusCode::UNPROCESSABLE_ENTITY,
            },
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log_error(self.to_string());
        }

        let mut body = error_response(&self.to_string());
        match &self {
            ServerError::Pipeline(PipelineError::Ingest(IngestError::MissingColumns(cols))) => {
                body["missingColumns"] = json!(cols);
            }
            ServerError::Pipeline(PipelineError::Combine(CombineError::NoValidInputs { excluded })) => {
                body["excluded"] = json!(excluded);
            }
            _ => {}
        }
        (status, Json(body)).into_response()
    }
}
