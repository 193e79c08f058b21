use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Build the node's HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::welcome))
        .route("/health", get(handlers::health_check))
        .route("/register", post(handlers::register))
        .route("/sign", post(handlers::sign))
        .route("/authenticate", post(handlers::authenticate))
        .route("/challenge", post(handlers::challenge))
        .route("/verify", post(handlers::verify))
        .route("/sync_block", post(handlers::sync_block))
        .route("/consensus", get(handlers::consensus))
        .route("/chain", get(handlers::chain))
        .route("/validate", get(handlers::validate))
        .with_state(state)
}
