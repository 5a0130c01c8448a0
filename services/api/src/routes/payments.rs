use auth::{Authorized, op};
use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use common::{ServiceResult, extract::{Json, Path}};
use serde::Deserialize;
use uuid::Uuid;

use super::{removed, wastes::StatusRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentRequest {
    pub amount: Option<f64>,
    pub payment_method: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/payments", get(list).post(create))
        .route(
            "/payments/:id",
            get(get_payment).put(update_status).delete(delete_payment),
        )
}

pub async fn create(
    State(state): State<AppState>,
    actor: Authorized<op::CreatePayment>,
    Json(payload): Json<CreatePaymentRequest>,
) -> ServiceResult<impl IntoResponse> {
    let payment = state
        .payments
        .create(&actor, payload.amount, payload.payment_method.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

pub async fn list(
    State(state): State<AppState>,
    actor: Authorized<op::ListPayments>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.payments.list(&actor).await?))
}

pub async fn get_payment(
    State(state): State<AppState>,
    actor: Authorized<op::ViewPayment>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    Ok(Json(state.payments.get(&actor, id).await?))
}

pub async fn update_status(
    State(state): State<AppState>,
    actor: Authorized<op::UpdatePaymentStatus>,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusRequest>,
) -> ServiceResult<impl IntoResponse> {
    let payment = state
        .payments
        .update_status(&actor, id, payload.status.as_deref())
        .await?;
    Ok(Json(payment))
}

pub async fn delete_payment(
    State(state): State<AppState>,
    actor: Authorized<op::DeletePayment>,
    Path(id): Path<Uuid>,
) -> ServiceResult<impl IntoResponse> {
    state.payments.delete(&actor, id).await?;
    Ok(removed("Payment removed"))
}
