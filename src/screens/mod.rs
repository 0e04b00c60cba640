mod dto;
pub mod handlers;
mod reconcile;
mod screen;
mod sequence;
mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_router())
        .merge(handlers::write_router())
}
