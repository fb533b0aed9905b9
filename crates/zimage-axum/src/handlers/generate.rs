//! Generation handlers.
//!
//! Generation runs in its own task: if the client disconnects, the handler
//! future is dropped but the image is still produced and stored.

use axum::Json;
use axum::body::Body;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HOST};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use zimage_core::ports::InferenceError;
use zimage_core::{GeneratedArtifact, GenerationError};

use crate::dto::{GenerateRequest, GenerateUrlResponse};
use crate::error::HttpError;
use crate::state::AppState;

pub const GENERATED_FILENAME_HEADER: HeaderName = HeaderName::from_static("x-generated-filename");
pub const GENERATION_SEED_HEADER: HeaderName = HeaderName::from_static("x-generation-seed");

/// Generate an image and return the PNG bytes.
pub async fn file(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Response, HttpError> {
    let Json(req) = body.map_err(|e| HttpError::Unprocessable(e.body_text()))?;
    let artifact = spawn_generation(&state, req).await?;

    let disposition = HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        artifact.filename
    ))
    .map_err(|e| HttpError::Internal(e.to_string()))?;
    let filename = HeaderValue::from_str(&artifact.filename)
        .map_err(|e| HttpError::Internal(e.to_string()))?;

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(CONTENT_DISPOSITION, disposition);
    headers.insert(GENERATED_FILENAME_HEADER, filename);
    if let Some(seed) = artifact.seed() {
        headers.insert(GENERATION_SEED_HEADER, HeaderValue::from(seed));
    }

    Ok((StatusCode::OK, headers, Body::from(artifact.png)).into_response())
}

/// Generate an image and return a URL it can be fetched from.
pub async fn url(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> (StatusCode, Json<GenerateUrlResponse>) {
    let req = match body {
        Ok(Json(req)) => req,
        Err(e) => {
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(GenerateUrlResponse::failed(e.body_text())),
            );
        }
    };
    match spawn_generation(&state, req).await {
        Ok(artifact) => {
            let image_url = format!(
                "{}/images/{}",
                image_base_url(&state, &headers),
                artifact.filename
            );
            (
                StatusCode::OK,
                Json(GenerateUrlResponse::generated(artifact.filename, image_url)),
            )
        }
        Err(e) if e.is_client_error() => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(GenerateUrlResponse::failed(e.to_string())),
        ),
        Err(e) => (
            StatusCode::OK,
            Json(GenerateUrlResponse::failed(format!(
                "Error generating image: {e}"
            ))),
        ),
    }
}

async fn spawn_generation(
    state: &AppState,
    req: GenerateRequest,
) -> Result<GeneratedArtifact, GenerationError> {
    let service = state.generation.clone();
    tokio::spawn(async move { service.generate(req.into()).await })
        .await
        .unwrap_or_else(|e| {
            Err(InferenceError::Failed(format!("generation task failed: {e}")).into())
        })
}

/// Base for image URLs: the configured public URL, then the request's
/// `Host` header, then the bound address.
fn image_base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.public_base_url {
        return base.clone();
    }
    headers
        .get(HOST)
        .and_then(|host| host.to_str().ok())
        .filter(|host| !host.is_empty())
        .map_or_else(
            || state.fallback_base_url.clone(),
            |host| format!("http://{host}"),
        )
}
