use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::CookieJar;
use tracing::warn;

use super::{cookie::SESSION_COOKIE, jwt::TokenError};
use crate::{error::AppError, state::AppState};

/// Identity of the caller, resolved from the session cookie before the handler runs.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub i64);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Unauthenticated("Not authenticated".into()))?;

        let user_id = state.jwt.verify(&token).map_err(|e: TokenError| {
            warn!(error = %e, "session token rejected");
            AppError::Unauthenticated(e.to_string())
        })?;
        Ok(AuthUser(user_id))
    }
}
