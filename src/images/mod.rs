mod dto;
pub mod handlers;
pub mod preview;
pub mod session;
pub mod upload;

use crate::state::AppState;
use axum::Router;

pub fn router(body_limit: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::upload_routes(body_limit))
        .merge(handlers::preview_routes())
}
