use tracing::info;
use vigil_core::record::RequestRecord;

/// Tracing target for per-request access events, so they can be filtered
/// independently (`RUST_LOG=vigil::traffic=off`).
pub const TARGET: &str = "vigil::traffic";

/// Emit one structured access-log event for a recorded request.
#[inline]
pub fn log_request(record: &RequestRecord) {
    info!(
        target: TARGET,
        method = %record.method,
        path = %record.path,
        status = record.status_code,
        duration_ms = record.duration_ms,
        client_ip = %record.remote_address,
        "{} {} - {} ({:.0}ms)",
        record.method,
        record.path,
        record.status_code,
        record.duration_ms,
    );
}
