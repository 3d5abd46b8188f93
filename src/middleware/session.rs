//! Session authentication for billing endpoints.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::db::{queries, AppState};
use crate::error::AppError;
use crate::models::User;

/// Extractor that resolves `Authorization: Bearer <token>` to the session's
/// user. Billing endpoints take this as an argument; there is no way to
/// reach a mirror row without going through it.
#[derive(Debug, Clone)]
pub struct SessionUser(pub User);

impl FromRequestParts<AppState> for SessionUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let conn = state.db.get()?;
        let user =
            queries::get_user_by_session_token(&conn, token)?.ok_or(AppError::Unauthorized)?;

        Ok(SessionUser(user))
    }
}
