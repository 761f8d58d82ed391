use crate::error::ApiError;
use crate::extract::ClientAddr;
use crate::server::AdminState;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::Json;
use std::sync::Arc;
use tracing::debug;
use vigil_core::record::RequestRecord;
use vigil_observability::analysis::{TrafficAnalysis, analyze};

/// `GET <history-path>`: the retained records, newest first.
pub async fn traffic_history(
    State(state): State<Arc<AdminState>>,
    client: ClientAddr,
    headers: HeaderMap,
) -> Result<Json<Vec<RequestRecord>>, ApiError> {
    state.authorize(&headers, &client)?;
    let snapshot = state.store.snapshot();
    debug!(entries = snapshot.len(), "Serving traffic history");
    Ok(Json(snapshot))
}

/// `GET <analysis-path>`: full breakdown of the retained records.
pub async fn traffic_analysis(
    State(state): State<Arc<AdminState>>,
    client: ClientAddr,
    headers: HeaderMap,
) -> Result<Json<TrafficAnalysis>, ApiError> {
    state.authorize(&headers, &client)?;
    Ok(Json(analyze(&state.store.snapshot())))
}
