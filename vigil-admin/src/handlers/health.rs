use crate::server::AdminState;
use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};
use std::sync::Arc;

/// Liveness probe. Never gated, always 200.
pub async fn health_check(State(state): State<Arc<AdminState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "uptime": state.uptime().as_secs_f64(),
        "version": env!("CARGO_PKG_VERSION"),
        "history": {
            "entries": state.store.len(),
            "capacity": state.store.capacity(),
        },
    }))
}
