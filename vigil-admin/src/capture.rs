//! Per-request recording.
//!
//! The middleware starts a clock when the request enters, lets the inner
//! service produce a response, then hands the response body to a
//! [`CapturedBody`]. The record is emitted when that body reaches its end,
//! fails, or is dropped, whichever comes first, so the measured duration
//! covers the complete hand-off of the response. A [`CaptureGuard`] makes the
//! emission happen exactly once on every one of those paths.

use crate::extract::ClientAddr;
use crate::server::AdminState;
use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use bytes::Bytes;
use chrono::Utc;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;
use vigil_core::record::{RequestRecord, UNKNOWN};
use vigil_observability::access_log;
use vigil_store::RingLogStore;

/// Request-side fields, known before the handler runs.
#[derive(Debug)]
struct PendingRecord {
    method: String,
    path: String,
    url: String,
    remote_address: String,
    user_agent: String,
}

impl PendingRecord {
    fn from_request(request: &Request) -> Self {
        let uri = request.uri();
        let path = uri.path().to_string();
        let url = uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| path.clone());
        let user_agent = request
            .headers()
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();

        Self {
            method: request.method().as_str().to_string(),
            path,
            url,
            remote_address: ClientAddr::from_extensions(request.extensions()).0,
            user_agent,
        }
    }
}

/// Emits one record into the store, at most once.
pub struct CaptureGuard {
    store: Arc<RingLogStore>,
    started: Instant,
    status_code: u16,
    pending: Option<PendingRecord>,
}

impl CaptureGuard {
    fn finish(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let record = RequestRecord {
            timestamp: Utc::now(),
            method: pending.method,
            path: pending.path,
            url: pending.url,
            status_code: self.status_code,
            duration_ms: self.started.elapsed().as_secs_f64() * 1000.0,
            remote_address: pending.remote_address,
            user_agent: pending.user_agent,
        };
        access_log::log_request(&record);
        self.store.record(record);
    }
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.finish();
    }
}

/// Response body wrapper that fires its guard at end of stream.
pub struct CapturedBody {
    inner: Body,
    guard: CaptureGuard,
}

impl HttpBody for CapturedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let this = self.get_mut();
        let polled = Pin::new(&mut this.inner).poll_frame(cx);
        if matches!(polled, Poll::Ready(None) | Poll::Ready(Some(Err(_)))) {
            this.guard.finish();
        }
        polled
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}

/// Record every request except those aimed at the query endpoints.
pub async fn capture_traffic(
    State(state): State<Arc<AdminState>>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();

    if state.is_query_path(request.uri().path()) {
        return next.run(request).await;
    }

    let pending = PendingRecord::from_request(&request);
    let response = next.run(request).await;

    let guard = CaptureGuard {
        store: Arc::clone(&state.store),
        started,
        status_code: response.status().as_u16(),
        pending: Some(pending),
    };
    let (parts, body) = response.into_parts();
    Response::from_parts(parts, Body::new(CapturedBody { inner: body, guard }))
}
