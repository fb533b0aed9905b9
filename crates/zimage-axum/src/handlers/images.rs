//! Serving previously generated images.

use axum::extract::{Path, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};

use crate::error::HttpError;
use crate::state::AppState;

const NOT_FOUND: &str = "Image not found";

/// Return a stored PNG by file name.
pub async fn get(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> Result<Response, HttpError> {
    let path = state
        .generation
        .resolve_path(&filename)
        .await
        .ok_or_else(|| HttpError::NotFound(NOT_FOUND.to_string()))?;

    // The file can be evicted between resolving and reading.
    let png = tokio::fs::read(&path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            HttpError::NotFound(NOT_FOUND.to_string())
        } else {
            HttpError::Internal(format!("Failed to read image: {e}"))
        }
    })?;

    Ok(([(CONTENT_TYPE, "image/png")], png).into_response())
}
