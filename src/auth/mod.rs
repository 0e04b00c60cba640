use crate::state::AppState;
use axum::Router;

mod claims;
mod extractors;
pub mod handlers;
pub mod jwt;
pub mod session;

pub use session::{Session, SessionState};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::me_routes())
}
