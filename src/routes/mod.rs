mod health;
mod predict_tumor;

use crate::server::SharedState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

pub fn api_routes() -> Router<SharedState> {
    Router::new()
        .route("/healthcheck", get(health::healthcheck))
        .route(
            "/predict_tumor",
            post(predict_tumor::predict_tumor).layer(DefaultBodyLimit::disable()),
        )
}
