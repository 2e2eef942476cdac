use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::portfolio;
use crate::error::AppError;
use crate::models::image::ImageResponse;
use crate::models::shared::{
    MAX_AI_CONTEXT_CHARS, MAX_DESCRIPTION_CHARS, double_option, validate_optional_text,
    validate_portfolio_name,
};

/// Multipart form accepted by `POST /portfolios`. Documentation only; the
/// handler reads the fields one by one.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct CreatePortfolioForm {
    /// Portfolio name (1-100 characters, unique per owner).
    #[schema(example = "ReX")]
    pub name: String,
    #[schema(example = "Enterprise AI assistant for support teams")]
    pub description: Option<String>,
    /// Background the assistant may use when discussing the project.
    pub ai_context: Option<String>,
    /// JPEG, PNG or WebP files, at most 5 MiB each by default.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}

/// A portfolio without its images.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PortfolioResponse {
    /// Portfolio ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000001")]
    pub id: String,
    /// Owner's user ID.
    #[schema(example = 42)]
    pub user_id: Option<i32>,
    #[schema(example = "ReX")]
    pub name: String,
    pub description: Option<String>,
    pub ai_context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<portfolio::Model> for PortfolioResponse {
    fn from(model: portfolio::Model) -> Self {
        Self {
            id: model.id.to_string(),
            user_id: model.user_id,
            name: model.name,
            description: model.description,
            ai_context: model.ai_context,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A portfolio with its images, oldest image first.
#[derive(Serialize, utoipa::ToSchema)]
pub struct PortfolioDetailResponse {
    pub portfolio: PortfolioResponse,
    pub images: Vec<ImageResponse>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PortfolioListResponse {
    /// Newest first.
    pub portfolios: Vec<PortfolioResponse>,
    pub total: u64,
}

/// Request body for `PATCH /portfolios/{id}`.
#[derive(Deserialize, Default, PartialEq, utoipa::ToSchema)]
pub struct UpdatePortfolioRequest {
    #[schema(example = "ReX Enterprise")]
    pub name: Option<String>,
    /// `null` clears the description.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub description: Option<Option<String>>,
    /// `null` clears the assistant context.
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>)]
    pub ai_context: Option<Option<String>>,
}

/// Normalized form of an `UpdatePortfolioRequest`.
#[derive(Debug, Default, PartialEq)]
pub struct PortfolioChanges {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub ai_context: Option<Option<String>>,
}

impl PortfolioChanges {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn validate_update_portfolio(
    payload: UpdatePortfolioRequest,
) -> Result<PortfolioChanges, AppError> {
    let name = payload
        .name
        .as_deref()
        .map(validate_portfolio_name)
        .transpose()?;
    let description = payload
        .description
        .map(|d| validate_optional_text("Description", d.as_deref(), MAX_DESCRIPTION_CHARS))
        .transpose()?;
    let ai_context = payload
        .ai_context
        .map(|c| validate_optional_text("AI context", c.as_deref(), MAX_AI_CONTEXT_CHARS))
        .transpose()?;

    Ok(PortfolioChanges {
        name,
        description,
        ai_context,
    })
}
