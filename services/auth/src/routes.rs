//! Authentication service routes

use axum::{
    Router,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use common::{ServiceError, ServiceResult, extract::Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    credentials::{AuthSession, CredentialService},
    guard::AuthorizationGuard,
    models::Role,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    validation::{required, required_secret},
};

/// State used by the `/auth` routes
#[derive(Clone)]
pub struct AuthState {
    pub credentials: CredentialService,
    pub guard: AuthorizationGuard,
    pub rate_limiter: RateLimiter,
}

impl AuthState {
    pub fn new(credentials: CredentialService) -> Self {
        Self {
            guard: AuthorizationGuard::new(credentials.clone()),
            credentials,
            rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
        }
    }
}

impl FromRef<AuthState> for AuthorizationGuard {
    fn from_ref(state: &AuthState) -> Self {
        state.guard.clone()
    }
}

/// Request for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Request for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response for register and login
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
}

impl AuthResponse {
    pub fn from_session(session: AuthSession) -> Self {
        Self {
            id: session.user.id,
            name: session.user.name,
            email: session.user.email,
            role: session.user.role,
            token: session.token,
            qr_code: None,
        }
    }
}

/// The code printed on a user's collection card and accepted by the scan
/// operation
pub fn qr_payload(user_id: Uuid) -> String {
    format!("User:{}", user_id)
}

/// Parse an optional role name into a [`Role`]
pub fn parse_role(role: Option<&str>) -> ServiceResult<Option<Role>> {
    role.map(|r| r.parse::<Role>().map_err(ServiceError::Validation))
        .transpose()
}

/// The public `/auth` routes, for mounting into a larger router
pub fn auth_routes() -> Router<AuthState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

/// Create the router for the authentication service
pub fn create_router(state: AuthState) -> Router {
    auth_routes()
        .route("/health", get(health_check))
        .fallback(not_found)
        .with_state(state)
}

/// Answer for paths no route matches
pub async fn not_found() -> ServiceError {
    ServiceError::not_found("Route not found")
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Public registration. Admin accounts can only be created by an admin.
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> ServiceResult<impl IntoResponse> {
    let name = required(&payload.name, "Name")?;
    let email = required(&payload.email, "Email")?;
    let password = required_secret(&payload.password, "Password")?;
    let role = parse_role(payload.role.as_deref())?;

    if role == Some(Role::Admin) {
        warn!("Rejected public registration requesting the admin role");
        return Err(ServiceError::forbidden(
            "Admin accounts can only be created by an admin",
        ));
    }

    let session = state.credentials.register(name, email, password, role).await?;
    let qr_code = qr_payload(session.user.id);

    let mut response = AuthResponse::from_session(session);
    response.qr_code = Some(qr_code);

    Ok((StatusCode::CREATED, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> ServiceResult<impl IntoResponse> {
    let email = required(&payload.email, "Email")?;
    let password = required_secret(&payload.password, "Password")?;

    if !state.rate_limiter.is_allowed(&email.to_lowercase()).await {
        return Err(ServiceError::TooManyRequests(
            "Too many login attempts, try again later".to_string(),
        ));
    }

    let session = state.credentials.login(email, password).await?;
    info!(user_id = %session.user.id, "Issued token on login");

    Ok((StatusCode::OK, Json(AuthResponse::from_session(session))))
}
