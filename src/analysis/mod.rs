mod dto;
pub mod encoder;
pub mod error;
pub mod handlers;
pub mod normalizer;
pub mod orchestrator;
pub mod webhook;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::analysis_routes())
}
