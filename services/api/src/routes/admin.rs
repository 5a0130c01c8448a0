//! `/admin` routes

use auth::{
    Authorized, op,
    validation::{required, required_secret},
};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;
use common::{ServiceResult, extract::Json};
use serde::Deserialize;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PersonnelRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/personnel", post(add_personnel))
        .route("/admin/analytics", get(analytics))
}

pub async fn add_personnel(
    State(state): State<AppState>,
    actor: Authorized<op::AddPersonnel>,
    Json(payload): Json<PersonnelRequest>,
) -> ServiceResult<impl IntoResponse> {
    let name = required(&payload.name, "Name")?;
    let email = required(&payload.email, "Email")?;
    let password = required_secret(&payload.password, "Password")?;

    let personnel = state
        .directory
        .add_personnel(&actor, name, email, password)
        .await?;
    Ok((StatusCode::CREATED, Json(personnel)))
}

pub async fn analytics(
    State(state): State<AppState>,
    actor: Authorized<op::ViewAnalytics>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.collections.analytics(&actor, Utc::now()).await?))
}
