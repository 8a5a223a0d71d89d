//! Request-level errors for the HTTP API
//!
//! Row-level problems never reach this type; the parser absorbs them.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Errors surfaced to API callers
#[derive(Error, Debug)]
pub enum ApiError {
    /// The uploaded part was not declared as `text/csv`
    #[error("The file must be a CSV file")]
    NotCsv { content_type: Option<String> },

    /// The form had no `file` part
    #[error("No file uploaded")]
    MissingFile,

    /// The request body could not be read as multipart form data
    #[error("Invalid multipart body: {message}")]
    Multipart { status: StatusCode, message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotCsv { .. } => StatusCode::BAD_REQUEST,
            ApiError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart { status, .. } => *status,
        }
    }
}

impl From<axum::extract::multipart::MultipartError> for ApiError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        ApiError::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl From<axum::extract::multipart::MultipartRejection> for ApiError {
    fn from(rejection: axum::extract::multipart::MultipartRejection) -> Self {
        ApiError::Multipart {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if let ApiError::NotCsv { content_type } = &self {
            warn!(?content_type, "rejected upload with non-CSV content type");
        } else {
            warn!(error = %self, "rejected upload");
        }

        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}
