//! Result download route
//!
//! Serves annotated PDFs from the result directory as attachments.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// GET /download/:filename
pub async fn download_result(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let not_found = || AppError::NotFound(format!("File not found: {}", filename));

    let path = state
        .storage()
        .find_result(&filename)
        .await
        .ok_or_else(not_found)?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => not_found(),
        _ => AppError::Internal(format!("Failed to read {}: {}", path.display(), e)),
    })?;

    let content_type = mime_guess::from_path(&path).first_or_octet_stream();

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, bytes.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .map_err(|e| AppError::Internal(e.to_string()))
}
