use crate::state::AppState;
use axum::Router;

pub mod annotate;
pub mod engine;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
