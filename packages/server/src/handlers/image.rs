use axum::Json;
use axum::extract::multipart::Field;
use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::{DateTime, Duration, Utc};
use portfolio_common::portfolio::{ALLOWED_IMAGE_TYPES, is_allowed_image_type};
use portfolio_common::storage::{BlobKey, BlobStore, StoredBlob};
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entity::{portfolio, portfolio_image};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::handlers::portfolio::{find_portfolio, find_visible_portfolio, parse_id};
use crate::models::image::{ImageListResponse, ImageResponse, UploadImagesForm};
use crate::state::AppState;
use crate::store::images_of;
use crate::utils::filename::{sanitize_for_key, validate_flat_filename};

/// Most images accepted by a single multipart request.
pub const MAX_IMAGES_PER_REQUEST: usize = 10;

/// Body limit for routes taking image uploads: a full batch plus room for
/// the text fields.
pub fn image_upload_body_limit(config: &AppConfig) -> DefaultBodyLimit {
    let per_image = usize::try_from(config.storage.max_image_size).unwrap_or(usize::MAX);
    DefaultBodyLimit::max(
        per_image
            .saturating_mul(MAX_IMAGES_PER_REQUEST)
            .saturating_add(1024 * 1024),
    )
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Images",
    operation_id = "listImages",
    summary = "List images of a portfolio",
    params(("id" = String, Path, description = "Portfolio ID")),
    responses(
        (status = 200, description = "Images, oldest first", body = ImageListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Portfolio not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, portfolio_id = %id))]
pub async fn list_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ImageListResponse>, AppError> {
    let portfolio = find_visible_portfolio(&state.db, &auth_user, parse_id(&id)?).await?;
    let images = images_of(&state.db, portfolio.id).await?;

    Ok(Json(ImageListResponse {
        total: images.len() as u64,
        images: images.into_iter().map(ImageResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Images",
    operation_id = "uploadImages",
    summary = "Add images to a portfolio",
    description = "Stores every `images` part of the multipart body. Accepts JPEG, PNG and WebP, \
        at most 10 files per request. Only the owner may upload.",
    params(("id" = String, Path, description = "Portfolio ID")),
    request_body(content = UploadImagesForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Images stored", body = ImageListResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Portfolio not found (NOT_FOUND)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, portfolio_id = %id))]
pub async fn upload_images(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let portfolio = find_portfolio(&state.db, parse_id(&id)?).await?;
    auth_user.require_owner(portfolio.user_id, "update")?;

    let max_size = state.config.storage.max_image_size;
    let mut uploads = Vec::new();
    while let Some(field) = next_field(&mut multipart).await? {
        if field.name() == Some("images")
            && let Some(upload) = read_image_field(field, max_size, uploads.len()).await?
        {
            uploads.push(upload);
        }
    }
    if uploads.is_empty() {
        return Err(AppError::Validation("At least one image is required".into()));
    }

    let stored = store_images(&*state.blob_store, portfolio.id, uploads).await?;
    let keys = stored.iter().map(|s| s.blob.key.clone()).collect::<Vec<_>>();

    let result = async {
        let txn = state.db.begin().await?;
        let mut models = Vec::with_capacity(stored.len());
        for image in stored {
            models.push(image.into_active_model(portfolio.id).insert(&txn).await?);
        }

        let mut active: portfolio::ActiveModel = portfolio.into();
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;

        txn.commit().await?;
        Ok::<_, DbErr>(models)
    }
    .await;

    let models = match result {
        Ok(models) => models,
        Err(e) => {
            discard_blobs(&*state.blob_store, &keys).await;
            return Err(e.into());
        }
    };
    tracing::info!(count = models.len(), "images uploaded");

    Ok((
        StatusCode::CREATED,
        Json(ImageListResponse {
            total: models.len() as u64,
            images: models.into_iter().map(ImageResponse::from).collect(),
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/{image_id}",
    tag = "Images",
    operation_id = "deleteImage",
    summary = "Remove an image from a portfolio",
    params(
        ("id" = String, Path, description = "Portfolio ID"),
        ("image_id" = String, Path, description = "Image ID"),
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Portfolio or image not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, portfolio_id = %id, image_id = %image_id))]
pub async fn delete_image(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path((id, image_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let portfolio = find_portfolio(&state.db, parse_id(&id)?).await?;
    auth_user.require_owner(portfolio.user_id, "update")?;

    let image_id = Uuid::parse_str(&image_id)
        .map_err(|_| AppError::Validation("Invalid image ID".into()))?;
    let image = portfolio_image::Entity::find_by_id(image_id)
        .filter(portfolio_image::Column::PortfolioId.eq(portfolio.id))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Image not found".into()))?;

    let txn = state.db.begin().await?;
    portfolio_image::Entity::delete_by_id(image.id)
        .exec(&txn)
        .await?;
    let mut active: portfolio::ActiveModel = portfolio.into();
    active.updated_at = Set(Utc::now());
    active.update(&txn).await?;
    txn.commit().await?;

    discard_blob_keys(&*state.blob_store, [image.blob_key.as_str()]).await;

    Ok(StatusCode::NO_CONTENT)
}

/// An image read from a multipart part, not yet stored.
pub(crate) struct ImageUpload {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// An image whose bytes are in the blob store but whose row is not written.
pub(crate) struct StoredImage {
    pub id: Uuid,
    pub name: String,
    pub content_type: String,
    pub blob: StoredBlob,
    pub created_at: DateTime<Utc>,
}

impl StoredImage {
    pub fn into_active_model(self, portfolio_id: Uuid) -> portfolio_image::ActiveModel {
        portfolio_image::ActiveModel {
            id: Set(self.id),
            portfolio_id: Set(portfolio_id),
            image_url: Set(self.blob.url),
            image_name: Set(self.name),
            content_type: Set(self.content_type),
            blob_key: Set(self.blob.key.to_string()),
            size: Set(i64::try_from(self.blob.size).unwrap_or(i64::MAX)),
            created_at: Set(self.created_at),
        }
    }
}

pub(crate) async fn next_field(multipart: &mut Multipart) -> Result<Option<Field<'_>>, AppError> {
    multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))
}

/// Reads one `images` part. Empty parts (a form submitted without a file)
/// yield `None`.
///
/// `already_read` is the number of images accepted so far in this request.
pub(crate) async fn read_image_field(
    mut field: Field<'_>,
    max_size: u64,
    already_read: usize,
) -> Result<Option<ImageUpload>, AppError> {
    let raw_name = field.file_name().unwrap_or_default().to_string();
    let declared_type = field.content_type().map(str::to_string);

    let mut data = Vec::new();
    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| AppError::Validation(format!("Upload read error: {e}")))?
    {
        if (data.len() + chunk.len()) as u64 > max_size {
            return Err(AppError::PayloadTooLarge(format!(
                "Image '{raw_name}' exceeds the {max_size} byte limit"
            )));
        }
        data.extend_from_slice(&chunk);
    }
    if data.is_empty() {
        return Ok(None);
    }

    if already_read >= MAX_IMAGES_PER_REQUEST {
        return Err(AppError::Validation(format!(
            "At most {MAX_IMAGES_PER_REQUEST} images can be uploaded at once"
        )));
    }

    let name = validate_flat_filename(&raw_name)
        .map_err(|e| AppError::Validation(e.message().into()))?
        .to_string();

    let content_type = declared_type
        .filter(|t| t != "application/octet-stream")
        .or_else(|| mime_guess::from_path(&name).first().map(|m| m.essence_str().to_string()))
        .unwrap_or_default();
    if !is_allowed_image_type(&content_type) {
        return Err(AppError::Validation(format!(
            "Unsupported image type for '{name}'. Allowed: {}",
            ALLOWED_IMAGE_TYPES.join(", ")
        )));
    }

    Ok(Some(ImageUpload {
        name,
        content_type,
        data,
    }))
}

/// Writes uploads to the blob store under `portfolio-<id>/...`.
///
/// On failure, blobs written by this call are removed again.
pub(crate) async fn store_images(
    blob_store: &dyn BlobStore,
    portfolio_id: Uuid,
    uploads: Vec<ImageUpload>,
) -> Result<Vec<StoredImage>, AppError> {
    let uploaded_at = Utc::now();
    let mut stored: Vec<StoredImage> = Vec::with_capacity(uploads.len());

    for (i, upload) in uploads.into_iter().enumerate() {
        // Offsetting by position keeps keys distinct and order stable within a batch.
        let created_at = uploaded_at + Duration::milliseconds(i as i64);
        let result = async {
            let key = BlobKey::for_image(
                portfolio_id,
                created_at.timestamp_millis(),
                &sanitize_for_key(&upload.name),
            )?;
            blob_store.put(&key, &upload.content_type, &upload.data).await
        }
        .await;

        match result {
            Ok(blob) => stored.push(StoredImage {
                id: Uuid::now_v7(),
                name: upload.name,
                content_type: upload.content_type,
                blob,
                created_at,
            }),
            Err(e) => {
                let keys = stored.iter().map(|s| s.blob.key.clone()).collect::<Vec<_>>();
                discard_blobs(blob_store, &keys).await;
                return Err(e.into());
            }
        }
    }

    Ok(stored)
}

/// Best-effort removal of blobs whose rows never made it (or no longer exist).
pub(crate) async fn discard_blobs(blob_store: &dyn BlobStore, keys: &[BlobKey]) {
    for key in keys {
        if let Err(e) = blob_store.delete(key).await {
            tracing::warn!(key = %key, error = %e, "failed to remove blob");
        }
    }
}

/// Like `discard_blobs`, for keys read back from the database.
pub(crate) async fn discard_blob_keys<'a>(
    blob_store: &dyn BlobStore,
    keys: impl IntoIterator<Item = &'a str>,
) {
    let keys = keys
        .into_iter()
        .filter_map(|raw| match BlobKey::parse(raw) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(key = raw, error = %e, "stored blob key is invalid");
                None
            }
        })
        .collect::<Vec<_>>();
    discard_blobs(blob_store, &keys).await;
}

