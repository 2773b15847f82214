use crate::{
    AppState,
    config::AppConfig,
    models::{
        ErrorResponse, ForgotPasswordRequest, LoginRequest, PasswordResetReceipt,
        RegisterUserRequest, RegistrationReceipt, Session,
    },
    navigation::{Decision, Navigation, NavigationError, Page, navigate, resolve},
    session::{LoginError, SessionState},
};
use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

pub const MSG_INVALID_CREDENTIALS: &str = "Incorrect username or password";
pub const MSG_MISSING_FIELDS: &str = "Please fill in all required fields";
pub const MSG_TRANSIENT: &str = "Something went wrong. Please try again.";

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message)))
}

/// NavigationQuery
///
/// Query parameters for `GET /api/navigation`.
#[derive(Deserialize, utoipa::IntoParams)]
pub struct NavigationQuery {
    /// The path the client wants to open, e.g. `/patients`.
    pub path: String,
}

// --- Session Handlers ---

/// get_session
///
/// [Public Route] Returns the current session snapshot, including the loading
/// flag of an in-flight login.
#[utoipa::path(
    get,
    path = "/api/session",
    responses((status = 200, description = "Current session", body = Session))
)]
pub async fn get_session(State(session): State<SessionState>) -> Json<Session> {
    Json(session.session())
}

/// login
///
/// [Public Route] Submits the login form. A rejection and a collaborator fault
/// are both shown to the user as an inline error, but with distinct statuses
/// so the client and the logs can tell them apart.
#[utoipa::path(
    post,
    path = "/api/session",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = Session),
        (status = 400, description = "Missing fields", body = ErrorResponse),
        (status = 401, description = "Invalid credentials", body = ErrorResponse),
        (status = 503, description = "Authentication unavailable", body = ErrorResponse)
    )
)]
pub async fn login(
    State(session): State<SessionState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<Session>, ApiError> {
    match session.login(&payload.username, &payload.password).await {
        Ok(true) => Ok(Json(session.session())),
        Ok(false) => Err(api_error(StatusCode::UNAUTHORIZED, MSG_INVALID_CREDENTIALS)),
        Err(LoginError::MissingFields) => {
            Err(api_error(StatusCode::BAD_REQUEST, MSG_MISSING_FIELDS))
        }
        Err(LoginError::Transient(_)) => {
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, MSG_TRANSIENT))
        }
    }
}

/// logout
///
/// [Public Route] The shell's logout control. Always succeeds.
#[utoipa::path(
    delete,
    path = "/api/session",
    responses((status = 204, description = "Signed out"))
)]
pub async fn logout(State(session): State<SessionState>) -> StatusCode {
    session.logout();
    StatusCode::NO_CONTENT
}

// --- Auth-only Form Handlers ---

/// register_user
///
/// [Public Route] Validates the registration form and acknowledges it after the
/// simulated round-trip. No login-able account is created.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = RegistrationReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<(StatusCode, Json<RegistrationReceipt>), ApiError> {
    let role = payload
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    simulate_round_trip(state.config.auth_latency()).await;

    let receipt = RegistrationReceipt {
        account_id: Uuid::new_v4(),
        username: payload.username,
        role,
        next: state.routes.login_path().to_string(),
    };
    tracing::info!(username = %receipt.username, role = ?role, "registration accepted");
    Ok((StatusCode::CREATED, Json(receipt)))
}

/// forgot_password
///
/// [Public Route] Accepts a password reset request for a well-formed address.
#[utoipa::path(
    post,
    path = "/api/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 202, description = "Reset instructions sent", body = PasswordResetReceipt),
        (status = 400, description = "Validation failed", body = ErrorResponse)
    )
)]
pub async fn forgot_password(
    State(config): State<AppConfig>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<(StatusCode, Json<PasswordResetReceipt>), ApiError> {
    payload
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    simulate_round_trip(config.reset_latency()).await;

    Ok((
        StatusCode::ACCEPTED,
        Json(PasswordResetReceipt {
            message: format!(
                "Password reset instructions have been sent to {}",
                payload.email
            ),
            email: payload.email,
        }),
    ))
}

async fn simulate_round_trip(latency: Duration) {
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

// --- Navigation Handlers ---

/// resolve_navigation
///
/// [Public Route] Follows every redirect for `path` against the current session
/// and reports the chain together with the page that finally renders.
#[utoipa::path(
    get,
    path = "/api/navigation",
    params(NavigationQuery),
    responses(
        (status = 200, description = "Resolved navigation", body = Navigation),
        (status = 508, description = "Redirect loop", body = ErrorResponse)
    )
)]
pub async fn resolve_navigation(
    State(state): State<AppState>,
    Query(query): Query<NavigationQuery>,
) -> Result<Json<Navigation>, ApiError> {
    let snapshot = state.session.session();
    navigate(&state.routes, &query.path, &snapshot)
        .map(Json)
        .map_err(|e: NavigationError| {
            tracing::error!(error = %e, "route table produced a redirect loop");
            api_error(StatusCode::LOOP_DETECTED, e.to_string())
        })
}

/// render_page
///
/// [Public Route] Browser entry point for every non-API path. Evaluates one
/// navigation step: either a `303 See Other` to the guard's target, or the
/// page descriptor (404 for unregistered paths).
pub async fn render_page(State(state): State<AppState>, uri: Uri) -> Response {
    let snapshot = state.session.session();
    match resolve(&state.routes, uri.path(), &snapshot) {
        Decision::Redirect(target) => {
            tracing::debug!(from = %uri.path(), to = %target, "guard redirect");
            Redirect::to(&target).into_response()
        }
        Decision::Render(page) => page_response(page),
    }
}

fn page_response(page: Page) -> Response {
    let status = if page.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::OK
    };
    (status, Json(page)).into_response()
}
