use crate::AppState;
use axum::{Router, routing::get};

/// Public Router Module
///
/// Endpoints that involve neither the session nor the route table.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Monitoring and load balancer checks.
        .route("/health", get(|| async { "ok" }))
}
