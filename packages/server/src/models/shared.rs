use portfolio_common::portfolio::{MAX_NAME_CHARS, normalize_portfolio_name};
use serde::{Deserialize, Deserializer};

use crate::error::AppError;

/// Longest accepted portfolio description, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 5_000;
/// Longest accepted assistant context, in characters.
pub const MAX_AI_CONTEXT_CHARS: usize = 20_000;

/// Serde helper for PATCH semantics on nullable fields.
///
/// * JSON field absent  => `None`          (don't update)
/// * JSON field = null  => `Some(None)`    (set to NULL)
/// * JSON field = value => `Some(Some(v))` (set to value)
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Some(Option::deserialize(deserializer)?))
}

/// Trimmed portfolio name, or a validation error.
pub fn validate_portfolio_name(name: &str) -> Result<String, AppError> {
    normalize_portfolio_name(name)
        .map(str::to_string)
        .ok_or_else(|| AppError::Validation(format!("Name must be 1-{MAX_NAME_CHARS} characters")))
}

/// Free-text field: blank means absent, anything longer than `max` is rejected.
pub fn validate_optional_text(
    field: &str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, AppError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max {
        return Err(AppError::Validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(Some(value.to_string()))
}
