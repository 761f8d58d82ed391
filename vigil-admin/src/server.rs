use crate::capture::capture_traffic;
use crate::error::ApiError;
use crate::extract::ClientAddr;
use crate::gate::AccessGate;
use crate::handlers;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::{Router, middleware, routing::get};
use std::any::Any;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tower_http::catch_panic::CatchPanicLayer;
use tracing::{error, info, warn};
use vigil_core::config::{TrafficConfig, VigilConfig};
use vigil_core::error::VigilError;
use vigil_store::RingLogStore;

/// Shared state for the capture middleware and the query API.
pub struct AdminState {
    pub store: Arc<RingLogStore>,
    pub gate: AccessGate,
    pub endpoints: TrafficConfig,
    pub started_at: Instant,
}

impl AdminState {
    pub fn new(store: Arc<RingLogStore>, gate: AccessGate, endpoints: TrafficConfig) -> Self {
        Self {
            store,
            gate,
            endpoints,
            started_at: Instant::now(),
        }
    }

    /// Count uptime from `at` (process start) rather than from construction.
    pub fn with_started_at(mut self, at: Instant) -> Self {
        self.started_at = at;
        self
    }

    /// Fresh store sized from the config, gate keyed from the config.
    pub fn from_config(config: &VigilConfig) -> Self {
        Self::new(
            Arc::new(RingLogStore::new(config.traffic.capacity)),
            AccessGate::from_config(&config.auth),
            config.traffic.clone(),
        )
    }

    /// Requests to these paths are served but never recorded.
    pub fn is_query_path(&self, path: &str) -> bool {
        self.endpoints.query_paths().contains(&path)
    }

    /// Gate check for a query handler. Failures are logged here and surface
    /// as a bare 401.
    pub fn authorize(&self, headers: &HeaderMap, client: &ClientAddr) -> Result<(), ApiError> {
        if self.gate.authorize_headers(headers) {
            Ok(())
        } else {
            warn!(client = %client, "Unauthorized traffic query");
            Err(VigilError::Unauthorized.into())
        }
    }

    /// Time since `started_at`: construction unless set by [`Self::with_started_at`].
    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Router with the query endpoints and health probe.
///
/// Not instrumented on its own; pass the final application router to
/// [`instrument`] so every route, including these, goes through capture.
pub fn build_admin_router(state: Arc<AdminState>) -> Router {
    let paths = &state.endpoints;
    Router::new()
        .route(&paths.history_path, get(handlers::traffic::traffic_history))
        .route(&paths.metrics_path, get(handlers::metrics::server_metrics))
        .route(&paths.analysis_path, get(handlers::traffic::traffic_analysis))
        .route(&paths.health_path, get(handlers::health::health_check))
        .with_state(Arc::clone(&state))
}

/// Wrap an application router with traffic capture.
///
/// Panics inside handlers are turned into 500 responses beneath the capture
/// layer, so they are recorded like any other response.
pub fn instrument(router: Router, state: Arc<AdminState>) -> Router {
    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn_with_state(state, capture_traffic))
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| err.downcast_ref::<String>().cloned())
        .unwrap_or_default();
    error!(panic = %detail, "Handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        [(header::CONTENT_TYPE, "application/json")],
        VigilError::Internal(detail).to_json_body(),
    )
        .into_response()
}

/// Bind `addr` and serve `app` with client addresses available to capture,
/// until `shutdown` resolves.
pub async fn serve<F>(app: Router, addr: &str, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}
