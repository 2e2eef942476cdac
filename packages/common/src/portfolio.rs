use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Owner identifier of a portfolio (the `user.id` primary key).
pub type OwnerId = i32;

/// A stored portfolio project as seen by the read-only core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioRecord {
    pub id: Uuid,
    /// `None` for records visible to guests only through an unscoped lookup.
    pub owner: Option<OwnerId>,
    pub name: String,
    pub description: Option<String>,
    /// Extra context for the assistant. Not rendered by the dashboard.
    pub ai_context: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An image attached to a portfolio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortfolioImage {
    pub id: Uuid,
    pub portfolio_id: Uuid,
    /// Public URL handed out by the blob store.
    pub image_url: String,
    /// Original upload filename.
    pub image_name: String,
    pub content_type: String,
    pub created_at: DateTime<Utc>,
}

/// Maximum length of a portfolio name, in characters.
pub const MAX_NAME_CHARS: usize = 100;

/// Content types accepted for portfolio images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

/// Returns the trimmed name if it is 1-100 characters long.
pub fn normalize_portfolio_name(name: &str) -> Option<&str> {
    let name = name.trim();
    let len = name.chars().count();
    (len > 0 && len <= MAX_NAME_CHARS).then_some(name)
}

pub fn is_allowed_image_type(content_type: &str) -> bool {
    ALLOWED_IMAGE_TYPES.contains(&content_type)
}
