use axum::{Router, extract::FromRef, http::HeaderName};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Core services.
pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod navigation;
pub mod session;

// HTTP routing, split by what each group serves.
pub mod routes;
use routes::{api, pages, public};

// --- Public Re-exports ---

pub use auth::{AuthState, DemoAuthenticator, MockAuthenticator};
pub use config::AppConfig;
pub use navigation::RouteTable;
pub use session::{SessionState, SessionStore};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_session, handlers::login, handlers::logout,
        handlers::register_user, handlers::forgot_password, handlers::resolve_navigation,
    ),
    components(
        schemas(
            models::Session, models::Identity, models::Role, models::LoginRequest,
            models::RegisterUserRequest, models::RegistrationReceipt,
            models::ForgotPasswordRequest, models::PasswordResetReceipt, models::ErrorResponse,
            navigation::Navigation, navigation::Page, navigation::View,
            navigation::NavigationShell,
        )
    ),
    tags(
        (name = "clinic-portal", description = "ClinicCare portal session and navigation API")
    )
)]
struct ApiDoc;

/// AppState
///
/// Everything the handlers share: the session store, the static route table
/// and the configuration. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// The one session of this portal instance.
    pub session: SessionState,
    /// Built once at startup, never mutated.
    pub routes: Arc<RouteTable>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires a fresh session store around `auth` with the clinic route table.
    pub fn new(auth: AuthState, config: AppConfig) -> Self {
        Self {
            session: Arc::new(SessionStore::new(auth)),
            routes: Arc::new(RouteTable::clinic()),
            config,
        }
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for SessionState {
    fn from_ref(app_state: &AppState) -> SessionState {
        app_state.session.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the route groups, the API docs, and the tracing/request-id/CORS
/// layers around them.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .nest("/api", api::api_routes())
        // Registered last; static routes above take precedence over its wildcard.
        .merge(pages::page_routes())
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every HTTP request, tagged with the `x-request-id` assigned above.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        path = %request.uri().path(),
        req_id = %request_id,
    )
}
