//! HTTP server for the registry processor.
//!
//! # API Endpoints
//!
//! | Method | Path                 | Description                            |
//! |--------|----------------------|----------------------------------------|
//! | GET    | `/health`            | Health check                           |
//! | POST   | `/auth/login`        | Start a session                        |
//! | POST   | `/auth/logout`       | End the session                        |
//! | GET    | `/auth/status`       | Current session user                   |
//! | POST   | `/api/florida`       | Decode a Florida fixed-width file      |
//! | POST   | `/api/washington`    | Transform a Washington export          |
//! | POST   | `/api/west-virginia` | Transform a West Virginia export       |
//! | POST   | `/api/combine`       | Merge processed files                  |
//! | GET    | `/api/logs`          | SSE stream for real-time logs          |
//!
//! Processing routes answer JSON by default and a file attachment with
//! `?format=csv` or `?format=xlsx`.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query},
    http::{header, Method},
    middleware::from_fn_with_state,
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::{collections::HashMap, convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use super::logs::{log_info, LOG_BROADCASTER};
use super::middleware::require_auth;
use super::session;
use super::state::AppState;
use super::types::TableResponse;
use crate::auth::FileCredentialStore;
use crate::config::{AppConfig, MAX_SESSION_HOURS};
use crate::error::{ServerError, ServerResult};
use crate::export::{
    self, OutputFormat, COMBINED_OUTPUT, FLORIDA_OUTPUT, WASHINGTON_OUTPUT, WEST_VIRGINIA_OUTPUT,
};
use crate::models::Tabular;
use crate::transform::florida::{FloridaOptions, FloridaOutput};
use crate::transform::pipeline::{
    combine_files, process_florida, process_washington, process_west_virginia, NamedUpload,
};

/// Largest accepted request body
const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let credentials = FileCredentialStore::open(&config.credentials_path)?;
    let port = config.port;
    if !config.is_auth_enabled() {
        println!("⚠️  Authentication disabled (BOI_AUTH=off)");
    }
    let app = build_router(AppState::new(config, Arc::new(credentials)));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 BOI filing server running on http://localhost:{}", port);
    println!("   POST /auth/login          - Log in");
    println!("   POST /api/florida         - Florida fixed-width file");
    println!("   POST /api/washington      - Washington CSV export");
    println!("   POST /api/west-virginia   - West Virginia CSV export");
    println!("   POST /api/combine         - Merge processed files");
    println!("   GET  /api/logs            - SSE log stream");
    println!("   GET  /health              - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Routes, session layer and CORS around `state`.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE, header::CONTENT_DISPOSITION]);

    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            state.config.session_hours.clamp(1, MAX_SESSION_HOURS),
        )))
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_secure(false);

    let protected = Router::new()
        .route("/api/florida", post(florida))
        .route("/api/washington", post(washington))
        .route("/api/west-virginia", post(west_virginia))
        .route("/api/combine", post(combine))
        .route("/api/logs", get(sse_logs))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/auth/login", post(session::login))
        .route("/auth/logout", post(session::logout))
        .route("/auth/status", get(session::status))
        .merge(protected)
        .with_state(state)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(session_layer)
        .layer(cors)
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "boi",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// =============================================================================
// Upload forms
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct FormatQuery {
    format: Option<String>,
}

impl FormatQuery {
    /// File format to download, `None` for the JSON table.
    fn download(&self) -> ServerResult<Option<OutputFormat>> {
        let Some(value) = self.format.as_deref().filter(|f| !f.trim().is_empty()) else {
            return Ok(None);
        };
        match OutputFormat::parse(value) {
            Some(OutputFormat::Json) => Ok(None),
            Some(format) => Ok(Some(format)),
            None => Err(ServerError::BadRequest(format!(
                "Unknown format '{}' (use csv or xlsx)",
                value.trim()
            ))),
        }
    }
}

/// Multipart fields: uploaded files in order, text fields by name.
#[derive(Debug, Default)]
struct UploadForm {
    files: Vec<(String, Vec<u8>)>,
    texts: HashMap<String, Vec<String>>,
}

impl UploadForm {
    async fn read(mut multipart: Multipart) -> ServerResult<Self> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
        {
            let name = field.name().unwrap_or("").to_string();
            if name == "file" {
                let file_name = field
                    .file_name()
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("file {}", form.files.len() + 1));
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.files.push((file_name, bytes.to_vec()));
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                form.texts.entry(name).or_default().push(value);
            }
        }
        Ok(form)
    }

    fn single_file(&mut self) -> ServerResult<(String, Vec<u8>)> {
        if self.files.is_empty() {
            return Err(ServerError::BadRequest("No file provided".into()));
        }
        Ok(self.files.swap_remove(0))
    }

    fn text(&self, name: &str) -> Option<&str> {
        self.texts
            .get(name)
            .and_then(|values| values.first())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn flag(&self, name: &str, default: bool) -> ServerResult<bool> {
        match self.text(name).map(str::to_lowercase).as_deref() {
            None => Ok(default),
            Some("true" | "1" | "on" | "yes") => Ok(true),
            Some("false" | "0" | "off" | "no") => Ok(false),
            Some(other) => Err(ServerError::BadRequest(format!(
                "{} must be true or false, got '{}'",
                name, other
            ))),
        }
    }
}

fn attachment<T: Tabular + Serialize>(
    records: &[T],
    base_name: &str,
    format: OutputFormat,
) -> ServerResult<Response> {
    let body = export::render(records, format).map_err(|e| ServerError::Internal(e.to_string()))?;
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", export::file_name(base_name, format)),
            ),
        ],
        body,
    )
        .into_response())
}

// =============================================================================
// Processing handlers
// =============================================================================

async fn florida(Query(query): Query<FormatQuery>, multipart: Multipart) -> ServerResult<Response> {
    let download = query.download()?;
    let mut form = UploadForm::read(multipart).await?;
    let (name, bytes) = form.single_file()?;
    let options = FloridaOptions {
        date_filter: form.text("date_filter").map(str::to_string),
        mailing_only: form.flag("mailing_only", true)?,
    };

    log_info(format!("📄 Florida upload: {} ({} bytes)", name, bytes.len()));
    let run = process_florida(&bytes, &options);

    if let Some(format) = download {
        return match &run.output {
            FloridaOutput::Mailing(records) => attachment(records, FLORIDA_OUTPUT, format),
            FloridaOutput::Full(records) => attachment(records, FLORIDA_OUTPUT, format),
        };
    }
    Ok(Json(TableResponse::from(&run)).into_response())
}

async fn washington(Query(query): Query<FormatQuery>, multipart: Multipart) -> ServerResult<Response> {
    let download = query.download()?;
    let mut form = UploadForm::read(multipart).await?;
    let (name, bytes) = form.single_file()?;
    let filing_date = form.text("filing_date").unwrap_or("");

    log_info(format!("📄 Washington upload: {} ({} bytes)", name, bytes.len()));
    let run = process_washington(&bytes, filing_date)?;

    if let Some(format) = download {
        return attachment(&run.records, WASHINGTON_OUTPUT, format);
    }
    Ok(Json(TableResponse::from(&run)).into_response())
}

async fn west_virginia(Query(query): Query<FormatQuery>, multipart: Multipart) -> ServerResult<Response> {
    let download = query.download()?;
    let mut form = UploadForm::read(multipart).await?;
    let (name, bytes) = form.single_file()?;

    log_info(format!("📄 West Virginia upload: {} ({} bytes)", name, bytes.len()));
    let run = process_west_virginia(&bytes)?;

    if let Some(format) = download {
        return attachment(&run.records, WEST_VIRGINIA_OUTPUT, format);
    }
    Ok(Json(TableResponse::from(&run)).into_response())
}

async fn combine(Query(query): Query<FormatQuery>, multipart: Multipart) -> ServerResult<Response> {
    let download = query.download()?;
    let form = UploadForm::read(multipart).await?;
    if form.files.is_empty() {
        return Err(ServerError::BadRequest("No file provided".into()));
    }

    let selections = form.texts.get("selection").cloned().unwrap_or_default();
    let uploads: Vec<NamedUpload> = form
        .files
        .into_iter()
        .enumerate()
        .map(|(i, (name, bytes))| {
            let upload = NamedUpload::new(name, bytes);
            match selections.get(i) {
                Some(selection) => upload.with_selection(selection.as_str()),
                None => upload,
            }
        })
        .collect();

    let report = combine_files(uploads)?;

    if let Some(format) = download {
        return attachment(&report.records, COMBINED_OUTPUT, format);
    }
    Ok(Json(TableResponse::from(&report)).into_response())
}
