use auth::{Authorized, op};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{post, put},
};
use chrono::{DateTime, Utc};
use common::{ServiceResult, extract::{Json, Path}};
use serde::Deserialize;
use uuid::Uuid;

use super::wastes::{AssignRequest, StatusRequest};
use crate::{AppState, schedules::ScheduleDraft};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    pub scheduled_date: Option<DateTime<Utc>>,
    pub area: Option<String>,
    pub notes: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schedules", post(create).get(list))
        .route("/schedules/:id", put(update_status))
        .route("/schedules/:id/assign", put(assign))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Authorized<op::CreateSchedule>,
    Json(payload): Json<CreateScheduleRequest>,
) -> ServiceResult<impl IntoResponse> {
    let draft = ScheduleDraft {
        scheduled_date: payload.scheduled_date,
        area: payload.area,
        notes: payload.notes,
    };
    let schedule = state.schedules.create(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(schedule)))
}

pub async fn list(
    State(state): State<AppState>,
    actor: Authorized<op::ListSchedules>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.schedules.list(&actor).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    actor: Authorized<op::UpdateScheduleStatus>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> ServiceResult<impl IntoResponse> {
    let schedule = state
        .schedules
        .update_status(&actor, id, payload.status.as_deref())
        .await?;
    Ok(Json(schedule))
}

pub async fn assign(
    State(state): State<AppState>,
    actor: Authorized<op::AssignSchedule>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> ServiceResult<impl IntoResponse> {
    let schedule = state
        .schedules
        .assign(&actor, id, payload.personnel_id)
        .await?;
    Ok(Json(schedule))
}
