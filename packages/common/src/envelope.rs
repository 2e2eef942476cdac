use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::portfolio::{PortfolioImage, PortfolioRecord};
use crate::resolver::ResolutionFailure;

/// Image entry inside a success envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub id: String,
    pub portfolio_id: String,
    pub image_url: String,
    pub image_name: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<PortfolioImage> for ImagePayload {
    fn from(image: PortfolioImage) -> Self {
        Self {
            id: image.id.to_string(),
            portfolio_id: image.portfolio_id.to_string(),
            image_url: image.image_url,
            image_name: image.image_name,
            content_type: image.content_type,
            created_at: image.created_at,
        }
    }
}

/// Portfolio data delivered to the panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioPayload {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub ai_context: Option<String>,
    pub images: Vec<ImagePayload>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PortfolioPayload {
    pub fn new(record: PortfolioRecord, images: Vec<PortfolioImage>) -> Self {
        Self {
            id: record.id.to_string(),
            name: record.name,
            description: record.description,
            ai_context: record.ai_context,
            images: images.into_iter().map(ImagePayload::from).collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Error shape delivered to the panel. `error` is always `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FailurePayload {
    pub error: bool,
    pub message: String,
    pub attempted_name: String,
}

impl FailurePayload {
    pub fn new(message: impl Into<String>, attempted_name: impl Into<String>) -> Self {
        Self {
            error: true,
            message: message.into(),
            attempted_name: attempted_name.into(),
        }
    }
}

impl From<&ResolutionFailure> for FailurePayload {
    fn from(failure: &ResolutionFailure) -> Self {
        Self::new(failure.to_string(), failure.attempted_name())
    }
}

/// The single data event of a display: success and failure share one event
/// type and are told apart by the presence of `error` in the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortfolioEnvelope {
    // Failure first: untagged deserialization tries variants in order and the
    // success shape carries no `error` key.
    Failure(FailurePayload),
    Success(PortfolioPayload),
}

impl PortfolioEnvelope {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
