use axum::{response::IntoResponse, response::Json};
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthStatus {
    status: &'static str,
}

/// Reports process liveness only; a degraded model still answers here.
pub async fn healthcheck() -> impl IntoResponse {
    Json(HealthStatus {
        status: "Available",
    })
}
