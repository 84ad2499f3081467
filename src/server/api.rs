//! API route definitions

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;

use super::handlers;

/// Create the demo router
pub fn create_router() -> Router {
    Router::new()
        .route("/", get(handlers::read_root))
        .route("/Welcome", get(handlers::welcome))
        .route("/health", get(handlers::health_check))
        .fallback(handlers::handle_404)
        .layer(TraceLayer::new_for_http())
}
