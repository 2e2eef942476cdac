use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Longest accepted project mention, in characters.
pub const MAX_MENTION_CHARS: usize = 200;

/// Request body for `POST /display/portfolio`.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct DisplayPortfolioRequest {
    /// Project name as the user mentioned it. Matched case-insensitively
    /// and by substring against the caller's portfolios.
    #[schema(example = "code review")]
    pub portfolio_name: String,
}

pub fn validate_display_request(payload: &DisplayPortfolioRequest) -> Result<(), AppError> {
    let len = payload.portfolio_name.trim().chars().count();
    if len == 0 || payload.portfolio_name.chars().count() > MAX_MENTION_CHARS {
        return Err(AppError::Validation(format!(
            "Portfolio name must be 1-{MAX_MENTION_CHARS} characters"
        )));
    }
    Ok(())
}

/// Data of the `tool-error` frame closing a failed display.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ToolErrorBody {
    #[schema(example = "Failed to load portfolio data. Please try again later.")]
    pub message: String,
}
