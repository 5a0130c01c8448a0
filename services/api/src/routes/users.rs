//! `/users` routes: own profile and admin user management

use auth::{
    Authorized, UserChanges, op,
    routes::{AuthResponse, parse_role},
    validation::{required, required_secret},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, put},
};
use common::{ServiceError, ServiceResult, extract::{Json, Path}};
use serde::Deserialize;
use uuid::Uuid;

use super::removed;
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

impl UserRequest {
    fn into_changes(self) -> ServiceResult<UserChanges> {
        Ok(UserChanges {
            role: parse_role(self.role.as_deref())?,
            name: self.name,
            email: self.email,
            password: self.password,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/profile", get(profile).put(update_profile))
        .route("/users/personnel", get(list_personnel))
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", put(update_user).delete(delete_user))
        .route("/users/:id/role", put(change_role))
}

pub async fn profile(
    State(state): State<AppState>,
    actor: Authorized<op::ViewProfile>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.directory.profile(&actor).await?))
}

/// Update own name, email or password; responds with a fresh token
pub async fn update_profile(
    State(state): State<AppState>,
    actor: Authorized<op::UpdateProfile>,
    Json(payload): Json<UserRequest>,
) -> ServiceResult<impl IntoResponse> {
    let changes = UserChanges {
        role: None,
        ..payload.into_changes()?
    };
    let session = state.directory.update_profile(&actor, changes).await?;
    Ok(Json(AuthResponse::from_session(session)))
}

pub async fn list_users(
    State(state): State<AppState>,
    actor: Authorized<op::ListUsers>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.directory.list(&actor).await?))
}

pub async fn create_user(
    State(state): State<AppState>,
    actor: Authorized<op::CreateUser>,
    Json(payload): Json<UserRequest>,
) -> ServiceResult<impl IntoResponse> {
    let name = required(&payload.name, "Name")?;
    let email = required(&payload.email, "Email")?;
    let password = required_secret(&payload.password, "Password")?;
    let role = parse_role(payload.role.as_deref())?
        .ok_or_else(|| ServiceError::validation("Role is required"))?;

    let session = state
        .directory
        .create(&actor, name, email, password, role)
        .await?;
    Ok((StatusCode::CREATED, Json(session.user)))
}

pub async fn update_user(
    State(state): State<AppState>,
    actor: Authorized<op::UpdateUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UserRequest>,
) -> ServiceResult<impl IntoResponse> {
    let user = state
        .directory
        .update(&actor, id, payload.into_changes()?)
        .await?;
    Ok(Json(user))
}

pub async fn change_role(
    State(state): State<AppState>,
    actor: Authorized<op::ChangeRole>,
    Path(id): Path<Uuid>,
    Json(payload): Json<RoleRequest>,
) -> ServiceResult<impl IntoResponse> {
    let role = parse_role(payload.role.as_deref())?
        .ok_or_else(|| ServiceError::validation("Role is required"))?;
    Ok(Json(state.directory.change_role(&actor, id, role).await?))
}

pub async fn delete_user(
    State(state): State<AppState>,
    actor: Authorized<op::DeleteUser>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    state.directory.delete(&actor, id).await?;
    Ok(removed("User removed"))
}

/// Personnel accounts; an empty list when there are none
pub async fn list_personnel(
    State(state): State<AppState>,
    actor: Authorized<op::ListPersonnel>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.directory.personnel(&actor).await?))
}
