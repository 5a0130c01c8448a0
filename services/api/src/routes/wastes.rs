//! `/wastes` routes: the collection lifecycle

use auth::{Authorized, op};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use common::{ServiceResult, extract::{Json, Path}};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use super::removed;
use crate::{AppState, lifecycle::CollectionDraft};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCollectionRequest {
    pub location: Option<String>,
    pub waste_type: Option<String>,
    pub quantity: Option<f64>,
    pub collection_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub personnel_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub qr_code: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/wastes", post(create).get(list_all))
        .route("/wastes/scan", post(scan))
        .route("/wastes/summary/daily", get(daily_summary))
        .route("/wastes/user/:user_id", get(list_for_user))
        .route(
            "/wastes/:id",
            get(get_record).put(update_status).delete(delete_record),
        )
        .route("/wastes/:id/assign", put(assign))
        .route("/wastes/:id/missed", put(record_missed))
}

pub async fn create(
    State(state): State<AppState>,
    actor: Authorized<op::CreateCollection>,
    Json(payload): Json<CreateCollectionRequest>,
) -> ServiceResult<impl IntoResponse> {
    let draft = CollectionDraft {
        location: payload.location,
        waste_type: payload.waste_type,
        quantity: payload.quantity,
        collection_date: payload.collection_date,
    };
    let record = state.collections.create(&actor, draft).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_all(
    State(state): State<AppState>,
    actor: Authorized<op::ListAllCollections>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.collections.list_all(&actor).await?))
}

pub async fn list_for_user(
    State(state): State<AppState>,
    actor: Authorized<op::ListUserCollections>,
    Path(user_id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.collections.list_for_user(&actor, user_id).await?))
}

pub async fn get_record(
    State(state): State<AppState>,
    actor: Authorized<op::ViewCollection>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.collections.get(&actor, id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    actor: Authorized<op::UpdateCollectionStatus>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> ServiceResult<impl IntoResponse> {
    let record = state
        .collections
        .update_status(&actor, id, payload.status.as_deref())
        .await?;
    Ok(Json(record))
}

pub async fn assign(
    State(state): State<AppState>,
    actor: Authorized<op::AssignCollection>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssignRequest>,
) -> ServiceResult<impl IntoResponse> {
    let view = state
        .collections
        .assign(&actor, id, payload.personnel_id)
        .await?;
    Ok(Json(json!({
        "message": "Personnel assigned successfully",
        "wasteCollection": view,
    })))
}

pub async fn record_missed(
    State(state): State<AppState>,
    actor: Authorized<op::RecordMissed>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.collections.record_missed(&actor, id).await?))
}

pub async fn delete_record(
    State(state): State<AppState>,
    actor: Authorized<op::DeleteCollection>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    state.collections.delete(&actor, id).await?;
    Ok(removed("Waste collection record removed"))
}

pub async fn scan(
    State(state): State<AppState>,
    actor: Authorized<op::ScanCode>,
    Json(payload): Json<ScanRequest>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(
        state
            .collections
            .scan(&actor, payload.qr_code.as_deref())
            .await?,
    ))
}

pub async fn daily_summary(
    State(state): State<AppState>,
    actor: Authorized<op::DailySummary>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.collections.daily_summary(&actor, Utc::now()).await?))
}
