//! HTTP API module
//!
//! Control surface standing in for the reconnect dialog: failure reports come
//! in from the connection side, retry-now and cancel from the user side.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/failure", post(failure_handler))
        .route("/retry-now", post(retry_now_handler))
        .route("/cancel", post(cancel_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
