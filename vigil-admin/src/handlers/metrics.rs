use crate::error::ApiError;
use crate::extract::ClientAddr;
use crate::server::AdminState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use std::sync::Arc;
use tracing::debug;
use vigil_observability::{ServerMetrics, analyze};

/// `GET <metrics-path>`: headline latency and outcome figures.
pub async fn server_metrics(
    State(state): State<Arc<AdminState>>,
    client: ClientAddr,
    headers: HeaderMap,
) -> Result<Json<ServerMetrics>, ApiError> {
    state.authorize(&headers, &client)?;
    let metrics = ServerMetrics::from_analysis(&analyze(&state.store.snapshot()));
    debug!(total = metrics.total_requests, "Serving server metrics");
    Ok(Json(metrics))
}
