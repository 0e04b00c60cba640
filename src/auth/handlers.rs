use axum::{routing::get, Json, Router};
use tracing::instrument;

use super::session::{Session, SessionState};
use crate::{error::AppError, state::AppState};

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

/// Profile of the signed-in user as reported by the identity provider.
#[instrument(skip(session))]
pub async fn get_me(session: SessionState) -> Result<Json<Session>, AppError> {
    Ok(Json(session.require()?))
}
