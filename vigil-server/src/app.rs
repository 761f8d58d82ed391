use crate::demo::demo_router;
use axum::handler::HandlerWithoutStateExt;
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Json};
use axum::Router;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use vigil_admin::{AdminState, build_admin_router, instrument};
use vigil_core::config::{API_KEY_HEADER, VigilConfig};

/// Full application: query API, optional demo routes, static files, then a
/// JSON 404. Everything, including CORS preflights, passes through capture.
pub fn build_app(config: &VigilConfig, state: Arc<AdminState>) -> Router {
    let mut app = build_admin_router(Arc::clone(&state));

    if config.demo.enabled {
        app = app.merge(demo_router(Duration::from_millis(config.demo.slow_delay_ms)));
    }

    app = match &config.server.static_dir {
        Some(dir) => app.fallback_service(ServeDir::new(dir).not_found_service(not_found.into_service())),
        None => app.fallback(not_found),
    };

    instrument(app.layer(cors_layer()), state)
}

/// Browser clients on other origins need to send the key header.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" })))
}
