use axum::Json;
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use sea_orm::*;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{portfolio, portfolio_image};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::handlers::image::{
    discard_blob_keys, discard_blobs, next_field, read_image_field, store_images,
};
use crate::models::image::ImageResponse;
use crate::models::portfolio::{
    CreatePortfolioForm, PortfolioDetailResponse, PortfolioListResponse, PortfolioResponse,
    UpdatePortfolioRequest, validate_update_portfolio,
};
use crate::models::shared::{
    MAX_AI_CONTEXT_CHARS, MAX_DESCRIPTION_CHARS, validate_optional_text, validate_portfolio_name,
};
use crate::state::AppState;
use crate::store::{images_of, visible_portfolios};

#[utoipa::path(
    get,
    path = "/",
    tag = "Portfolios",
    operation_id = "listPortfolios",
    summary = "List portfolios",
    description = "Regular users see their own portfolios, guests see all of them. Newest first.",
    responses(
        (status = 200, description = "Portfolio list", body = PortfolioListResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn list_portfolios(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<PortfolioListResponse>, AppError> {
    let models = visible_portfolios(&state.db, &auth_user.scope()).await?;

    Ok(Json(PortfolioListResponse {
        total: models.len() as u64,
        portfolios: models.into_iter().map(PortfolioResponse::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Portfolios",
    operation_id = "createPortfolio",
    summary = "Create a portfolio",
    description = "Multipart form with `name`, optional `description` and `ai_context`, and any \
        number of `images` parts (at most 10). Names are unique per owner.",
    request_body(content = CreatePortfolioForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Portfolio created", body = PortfolioDetailResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
        (status = 413, description = "Image too large (PAYLOAD_TOO_LARGE)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id, portfolio_id))]
pub async fn create_portfolio(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let max_size = state.config.storage.max_image_size;
    let mut name: Option<String> = None;
    let mut description: Option<String> = None;
    let mut ai_context: Option<String> = None;
    let mut uploads = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name() {
            Some("images") => {
                if let Some(upload) = read_image_field(field, max_size, uploads.len()).await? {
                    uploads.push(upload);
                }
            }
            Some(text_field @ ("name" | "description" | "ai_context")) => {
                let text_field = text_field.to_string();
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Multipart error: {e}")))?;
                match text_field.as_str() {
                    "name" => name = Some(text),
                    "description" => description = Some(text),
                    _ => ai_context = Some(text),
                }
            }
            _ => {}
        }
    }

    let name = validate_portfolio_name(name.as_deref().unwrap_or_default())?;
    let description =
        validate_optional_text("Description", description.as_deref(), MAX_DESCRIPTION_CHARS)?;
    let ai_context =
        validate_optional_text("AI context", ai_context.as_deref(), MAX_AI_CONTEXT_CHARS)?;

    let duplicate = portfolio::Entity::find()
        .filter(portfolio::Column::UserId.eq(auth_user.user_id))
        .filter(portfolio::Column::Name.eq(&name))
        .count(&state.db)
        .await?;
    if duplicate > 0 {
        return Err(duplicate_name(&name));
    }

    let id = Uuid::now_v7();
    tracing::Span::current().record("portfolio_id", tracing::field::display(id));

    let stored = store_images(&*state.blob_store, id, uploads).await?;
    let keys = stored.iter().map(|s| s.blob.key.clone()).collect::<Vec<_>>();

    let result = async {
        let txn = state.db.begin().await?;
        let now = Utc::now();
        let created = portfolio::ActiveModel {
            id: Set(id),
            user_id: Set(Some(auth_user.user_id)),
            name: Set(name.clone()),
            description: Set(description),
            ai_context: Set(ai_context),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut images = Vec::with_capacity(stored.len());
        for image in stored {
            images.push(image.into_active_model(id).insert(&txn).await?);
        }

        txn.commit().await?;
        Ok::<_, DbErr>((created, images))
    }
    .await;

    let (created, images) = match result {
        Ok(rows) => rows,
        Err(e) => {
            discard_blobs(&*state.blob_store, &keys).await;
            return Err(match e.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => duplicate_name(&name),
                _ => AppError::from(e),
            });
        }
    };
    tracing::info!(images = images.len(), "portfolio created");

    Ok((
        StatusCode::CREATED,
        Json(PortfolioDetailResponse {
            portfolio: created.into(),
            images: images.into_iter().map(ImageResponse::from).collect(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Portfolios",
    operation_id = "getPortfolio",
    summary = "Get a portfolio with its images",
    params(("id" = String, Path, description = "Portfolio ID")),
    responses(
        (status = 200, description = "Portfolio detail", body = PortfolioDetailResponse),
        (status = 400, description = "Invalid ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Portfolio not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, portfolio_id = %id))]
pub async fn get_portfolio(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<PortfolioDetailResponse>, AppError> {
    let portfolio = find_visible_portfolio(&state.db, &auth_user, parse_id(&id)?).await?;
    let images = images_of(&state.db, portfolio.id).await?;

    Ok(Json(PortfolioDetailResponse {
        portfolio: portfolio.into(),
        images: images.into_iter().map(ImageResponse::from).collect(),
    }))
}

#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Portfolios",
    operation_id = "updatePortfolio",
    summary = "Update a portfolio",
    description = "Partial update. `description` and `ai_context` accept `null` to clear them. \
        Only the owner may update.",
    params(("id" = String, Path, description = "Portfolio ID")),
    request_body = UpdatePortfolioRequest,
    responses(
        (status = 200, description = "Portfolio updated", body = PortfolioResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Portfolio not found (NOT_FOUND)", body = ErrorBody),
        (status = 409, description = "Name already used (CONFLICT)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id, portfolio_id = %id))]
pub async fn update_portfolio(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdatePortfolioRequest>,
) -> Result<Json<PortfolioResponse>, AppError> {
    let changes = validate_update_portfolio(payload)?;
    let existing = find_portfolio(&state.db, parse_id(&id)?).await?;
    auth_user.require_owner(existing.user_id, "update")?;

    if changes.is_empty() {
        return Ok(Json(existing.into()));
    }

    let mut active: portfolio::ActiveModel = existing.into();
    let new_name = changes.name.clone();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(ai_context) = changes.ai_context {
        active.ai_context = Set(ai_context);
    }
    active.updated_at = Set(Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| match (e.sql_err(), new_name.as_deref()) {
            (Some(SqlErr::UniqueConstraintViolation(_)), Some(name)) => duplicate_name(name),
            _ => AppError::from(e),
        })?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Portfolios",
    operation_id = "deletePortfolio",
    summary = "Delete a portfolio and its images",
    params(("id" = String, Path, description = "Portfolio ID")),
    responses(
        (status = 204, description = "Portfolio deleted"),
        (status = 400, description = "Invalid ID (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Portfolio not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id, portfolio_id = %id))]
pub async fn delete_portfolio(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let existing = find_portfolio(&state.db, parse_id(&id)?).await?;
    auth_user.require_owner(existing.user_id, "delete")?;

    let txn = state.db.begin().await?;
    let images = images_of(&txn, existing.id).await?;
    portfolio_image::Entity::delete_many()
        .filter(portfolio_image::Column::PortfolioId.eq(existing.id))
        .exec(&txn)
        .await?;
    portfolio::Entity::delete_by_id(existing.id)
        .exec(&txn)
        .await?;
    txn.commit().await?;

    discard_blob_keys(
        &*state.blob_store,
        images.iter().map(|image| image.blob_key.as_str()),
    )
    .await;
    tracing::info!(images = images.len(), "portfolio deleted");

    Ok(StatusCode::NO_CONTENT)
}

pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::Validation("Invalid portfolio ID".into()))
}

pub(crate) async fn find_portfolio<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<portfolio::Model, AppError> {
    portfolio::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Portfolio not found".into()))
}

/// Like `find_portfolio`, but portfolios outside the caller's scope are
/// reported as missing.
pub(crate) async fn find_visible_portfolio<C: ConnectionTrait>(
    db: &C,
    auth_user: &AuthUser,
    id: Uuid,
) -> Result<portfolio::Model, AppError> {
    let model = find_portfolio(db, id).await?;
    match auth_user.scope().owner() {
        Some(owner) if model.user_id != Some(owner) => {
            Err(AppError::NotFound("Portfolio not found".into()))
        }
        _ => Ok(model),
    }
}

fn duplicate_name(name: &str) -> AppError {
    AppError::Conflict(format!("A portfolio named '{name}' already exists"))
}
