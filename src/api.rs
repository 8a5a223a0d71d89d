// 🌐 REST API - Axum router
// Upload a transactions CSV, read back the aggregate report

use crate::error::ApiError;
use crate::parser::CsvParser;
use crate::report::{process_upload, AggregateReport, ReportStore};
use axum::{
    extract::{multipart::MultipartRejection, DefaultBodyLimit, Multipart, State},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Only this declared content type is accepted for uploads.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Multipart field carrying the upload
pub const FILE_FIELD: &str = "file";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ReportStore>,
    pub parser: Arc<CsvParser>,
}

impl AppState {
    pub fn new(parser: CsvParser) -> Self {
        Self {
            store: Arc::new(ReportStore::new()),
            parser: Arc::new(parser),
        }
    }
}

/// Upload acknowledgement
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /ping - Liveness probe
async fn ping() -> impl IntoResponse {
    Json("pong")
}

/// GET /report/ - Current aggregate
async fn get_report(State(state): State<AppState>) -> Json<AggregateReport> {
    Json(*state.store.snapshot())
}

/// POST /transactions/ - Upload a CSV and replace the report
///
/// Aggregation finishes before the response is sent, so a report read after
/// a 200 always reflects this upload (or a later one).
async fn post_transactions(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            debug!(name = ?field.name(), "skipping form field");
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        if content_type.as_deref() != Some(CSV_CONTENT_TYPE) {
            return Err(ApiError::NotCsv { content_type });
        }

        let filename = field.file_name().map(str::to_string);
        let contents = field.bytes().await?;
        debug!(?filename, bytes = contents.len(), "received CSV upload");

        process_upload(&contents, &state.parser, &state.store);

        return Ok(Json(UploadResponse {
            message: "CSV received and processed".to_string(),
        }));
    }

    Err(ApiError::MissingFile)
}

// ============================================================================
// Router
// ============================================================================

/// Build the application router. `max_upload_bytes` caps request bodies.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/ping", get(ping))
        .route("/report", get(get_report))
        .route("/report/", get(get_report))
        .route("/transactions", post(post_transactions))
        .route("/transactions/", post(post_transactions))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
