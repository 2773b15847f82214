use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Pages Router Module
///
/// Every other GET is a browser navigation. The handler asks the guards for a
/// decision: a redirect, or the page to render (with the shell for protected
/// views).
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::render_page))
        .route("/{*path}", get(handlers::render_page))
}
