//! `/test/*` endpoints that produce known outcomes, for exercising the
//! recorder by hand.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::{Router, routing::get};
use serde_json::json;
use std::time::Duration;

#[derive(Clone, Copy)]
struct SlowDelay(Duration);

pub fn demo_router(slow_delay: Duration) -> Router {
    Router::new()
        .route("/test/ok", get(ok))
        .route("/test/error", get(server_error))
        .route("/test/notfound", get(not_found))
        .route("/test/slow", get(slow))
        .with_state(SlowDelay(slow_delay))
}

async fn ok() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "message": "Success" })))
}

async fn server_error() -> impl IntoResponse {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "Server error" })),
    )
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}

async fn slow(State(SlowDelay(delay)): State<SlowDelay>) -> impl IntoResponse {
    tokio::time::sleep(delay).await;
    Json(json!({
        "message": "Slow response",
        "delay": delay.as_millis() as u64,
    }))
}
