use crate::state::AppState;
use axum::Router;

mod claims;
pub(crate) mod extractors;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::me_routes())
}
