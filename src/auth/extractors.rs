use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::error::AppError;

use super::{
    jwt::JwtKeys,
    session::{Session, SessionState},
};

/// Reads the provider session from `Authorization: Bearer <token>`.
/// A missing header is `Absent`; a header that does not verify is rejected.
#[async_trait]
impl<S> FromRequestParts<S> for SessionState
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(auth) = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
        else {
            return Ok(SessionState::Absent);
        };

        let token = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            .ok_or(AppError::InvalidSession)?;

        let keys = JwtKeys::from_ref(state);
        match keys.verify(token) {
            Ok(claims) => Ok(SessionState::Present(Session::from(claims))),
            Err(e) => {
                warn!(error = %e, "invalid or expired session token");
                Err(AppError::InvalidSession)
            }
        }
    }
}
