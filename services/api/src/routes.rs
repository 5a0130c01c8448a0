//! API service routes

pub mod admin;
pub mod payments;
pub mod recycling;
pub mod reports;
pub mod schedules;
pub mod users;
pub mod wastes;

use axum::{Router, response::IntoResponse, routing::get};
use common::extract::Json;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Create the router for the API service, including the `/auth` routes
pub fn create_router(state: AppState) -> Router {
    let auth = auth::routes::auth_routes().with_state(state.auth.clone());

    Router::new()
        .route("/health", get(health_check))
        .merge(users::router())
        .merge(admin::router())
        .merge(wastes::router())
        .merge(schedules::router())
        .merge(payments::router())
        .merge(recycling::router())
        .merge(reports::router())
        .with_state(state)
        .merge(auth)
        .fallback(auth::routes::not_found)
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// Body of a successful deletion
pub(crate) fn removed(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "message": message }))
}
