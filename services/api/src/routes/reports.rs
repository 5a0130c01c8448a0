use auth::{Authorized, op};
use axum::{
    Router,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
    routing::get,
};
use common::{ServiceResult, extract::{Json, Path}};
use serde::Deserialize;
use uuid::Uuid;

use super::removed;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    pub report_type: Option<String>,
    pub criteria: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports", get(list).post(generate))
        .route("/reports/:id", get(get_report).delete(delete_report))
        .route("/reports/:id/download", get(download))
}

pub async fn generate(
    State(state): State<AppState>,
    actor: Authorized<op::GenerateReport>,
    Json(payload): Json<GenerateReportRequest>,
) -> ServiceResult<impl IntoResponse> {
    let report = state
        .reports
        .generate(
            &actor,
            payload.report_type.as_deref(),
            payload.criteria.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list(
    State(state): State<AppState>,
    actor: Authorized<op::ListReports>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.reports.list(&actor).await?))
}

pub async fn get_report(
    State(state): State<AppState>,
    actor: Authorized<op::ViewReport>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.reports.get(&actor, id).await?))
}

pub async fn download(
    State(state): State<AppState>,
    actor: Authorized<op::DownloadReport>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    let file = state.reports.download(&actor, id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name),
            ),
        ],
        file.bytes,
    ))
}

pub async fn delete_report(
    State(state): State<AppState>,
    actor: Authorized<op::DeleteReport>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    state.reports.delete(&actor, id).await?;
    Ok(removed("Report removed"))
}
