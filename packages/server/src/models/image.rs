use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entity::portfolio_image;

/// A stored portfolio image.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    /// Image ID (UUIDv7).
    #[schema(example = "01936f0e-1234-7abc-8000-000000000002")]
    pub id: String,
    pub portfolio_id: String,
    /// Public URL of the image.
    #[schema(example = "http://127.0.0.1:3000/api/v1/blobs/portfolio-01936f0e/1700000000000-shot.png")]
    pub image_url: String,
    /// Original upload filename.
    #[schema(example = "shot.png")]
    pub image_name: String,
    #[schema(example = "image/png")]
    pub content_type: String,
    /// Size in bytes.
    #[schema(example = 142857)]
    pub size: i64,
    pub created_at: DateTime<Utc>,
}

impl From<portfolio_image::Model> for ImageResponse {
    fn from(model: portfolio_image::Model) -> Self {
        Self {
            id: model.id.to_string(),
            portfolio_id: model.portfolio_id.to_string(),
            image_url: model.image_url,
            image_name: model.image_name,
            content_type: model.content_type,
            size: model.size,
            created_at: model.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageListResponse {
    /// Oldest first.
    pub images: Vec<ImageResponse>,
    pub total: u64,
}

/// Multipart form accepted by `POST /portfolios/{id}/images`.
#[derive(utoipa::ToSchema)]
#[allow(dead_code)]
pub struct UploadImagesForm {
    /// JPEG, PNG or WebP files.
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}
