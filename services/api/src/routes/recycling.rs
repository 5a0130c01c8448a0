use auth::{Authorized, op};
use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, put},
};
use common::{ServiceResult, extract::{Json, Path}};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct AddCreditsRequest {
    pub credits: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recycling/add-credits/:id", put(add_credits))
        .route("/recycling/credits", get(credits))
}

pub async fn add_credits(
    State(state): State<AppState>,
    actor: Authorized<op::AddCredits>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AddCreditsRequest>,
) -> ServiceResult<impl IntoResponse> {
    let balance = state
        .recycling
        .add_credits(&actor, id, payload.credits)
        .await?;
    Ok(Json(balance))
}

pub async fn credits(
    State(state): State<AppState>,
    actor: Authorized<op::ViewCredits>,
) -> ServiceResult<impl IntoResponse> {
    let balance = state.recycling.balance(&actor).await?;
    Ok(Json(json!({ "recyclingCredits": balance })))
}
