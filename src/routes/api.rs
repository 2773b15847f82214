use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// The JSON endpoints the browser client calls from its views.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET/POST/DELETE /api/session
        // Read the session, submit the login form, or log out from the shell.
        .route(
            "/session",
            get(handlers::get_session)
                .post(handlers::login)
                .delete(handlers::logout),
        )
        // POST /api/register
        // Registration form; validation plus a simulated round-trip.
        .route("/register", post(handlers::register_user))
        // POST /api/forgot-password
        .route("/forgot-password", post(handlers::forgot_password))
        // GET /api/navigation?path=...
        // Full redirect chain for a path, for clients that route on their own.
        .route("/navigation", get(handlers::resolve_navigation))
}
