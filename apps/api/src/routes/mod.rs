pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::candidates::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/upload", post(handlers::handle_upload))
        .route("/candidates", get(handlers::handle_list_candidates))
        .route("/candidate/:id", get(handlers::handle_get_candidate))
        .route("/ask/:id", post(handlers::handle_ask))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
