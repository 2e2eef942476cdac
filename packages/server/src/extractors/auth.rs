use axum::{extract::FromRef, extract::FromRequestParts, http::request::Parts};
use portfolio_common::scope::CallerScope;

use crate::entity::user::UserType;
use crate::error::AppError;
use crate::state::AppState;
use crate::utils::jwt;

/// Authenticated user extracted from the `Authorization: Bearer <token>` header.
///
/// Add this as a handler parameter to require authentication. Ownership
/// checks happen in the handler body via `require_owner()`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
    pub user_type: UserType,
}

impl AuthUser {
    pub fn is_guest(&self) -> bool {
        self.user_type == UserType::Guest
    }

    /// Visibility boundary for portfolio lookups: guests see every
    /// portfolio, regular users only their own.
    pub fn scope(&self) -> CallerScope {
        match self.user_type {
            UserType::Guest => CallerScope::Unscoped,
            UserType::Regular => CallerScope::Owner(self.user_id),
        }
    }

    /// Returns `Err(PermissionDenied)` unless the user owns a record.
    ///
    /// `action` completes the message, e.g. "delete" gives
    /// "You can only delete your own portfolios".
    pub fn require_owner(&self, owner_id: Option<i32>, action: &str) -> Result<(), AppError> {
        if self.is_guest() {
            return Err(AppError::PermissionDenied(format!(
                "Guests cannot {action} portfolios"
            )));
        }
        if owner_id != Some(self.user_id) {
            return Err(AppError::PermissionDenied(format!(
                "You can only {action} your own portfolios"
            )));
        }
        Ok(())
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::TokenInvalid)?;

        let state = AppState::from_ref(state);
        let claims = jwt::verify(token, &state.config.auth.jwt_secret)
            .map_err(|_| AppError::TokenInvalid)?;

        Ok(AuthUser {
            user_id: claims.uid,
            username: claims.sub,
            user_type: claims.user_type,
        })
    }
}
