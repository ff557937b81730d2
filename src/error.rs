//! Error types for the Markcheck server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::pipeline::CheckError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Message returned when the check request lacks a source URL
pub const MISSING_INPUT_MESSAGE: &str = "Missing required URLs in JSON payload";

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    MissingInput(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("{0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Check(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            AppError::Check(e) => tracing::error!("Check failed: {}", e),
            AppError::Internal(msg) => tracing::error!("Internal error: {}", msg),
            AppError::MissingInput(msg) | AppError::NotFound(msg) => {
                tracing::debug!("Rejected request: {}", msg)
            }
        }

        let body = Json(ErrorResponse {
            error: self.to_string(),
        });

        (status, body).into_response()
    }
}
