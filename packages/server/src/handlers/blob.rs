use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use portfolio_common::storage::BlobKey;
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

/// Keys embed the upload time, so a key never changes content.
const IMMUTABLE_CACHE: &str = "public, max-age=31536000, immutable";

#[utoipa::path(
    get,
    path = "/{*key}",
    tag = "Blobs",
    operation_id = "downloadBlob",
    summary = "Download a stored image",
    description = "Public. Streams the blob stored under `key`. Supports `If-None-Match`.",
    params(("key" = String, Path, description = "Blob key, e.g. `portfolio-<id>/<millis>-shot.png`")),
    responses(
        (status = 200, description = "Blob content"),
        (status = 304, description = "Not Modified (ETag match)"),
        (status = 400, description = "Malformed key (VALIDATION_ERROR)", body = ErrorBody),
        (status = 404, description = "Blob not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, headers), fields(key = %key))]
pub async fn download_blob(
    State(state): State<AppState>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let key = BlobKey::parse(&key)?;

    let reader = state.blob_store.get_stream(&key).await?;

    let etag_value = format!("\"{key}\"");
    if let Some(if_none_match) = headers.get(header::IF_NONE_MATCH)
        && let Ok(val) = if_none_match.to_str()
        && (val == etag_value || val == "*")
    {
        return Ok(StatusCode::NOT_MODIFIED.into_response());
    }

    let content_type = mime_guess::from_path(key.file_name()).first_or_octet_stream();
    let body = Body::from_stream(ReaderStream::new(reader));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.essence_str())
        .header(header::ETAG, &etag_value)
        .header(header::CACHE_CONTROL, IMMUTABLE_CACHE)
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))
}
