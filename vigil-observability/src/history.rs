//! Client-side handling of a fetched history payload.

use serde_json::Value;
use tracing::debug;
use vigil_core::record::RequestRecord;

/// Decode a history payload defensively.
///
/// Anything that is not a JSON array becomes an empty history. Array
/// elements that cannot be read as a record are skipped; missing fields in
/// the rest take their defaults.
pub fn coerce_history(payload: Value) -> Vec<RequestRecord> {
    let Value::Array(items) = payload else {
        debug!("History payload is not an array, treating as empty");
        return Vec::new();
    };
    let total = items.len();
    let records: Vec<RequestRecord> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if records.len() < total {
        debug!(skipped = total - records.len(), "Skipped malformed history entries");
    }
    records
}

/// Drop entries whose path is one of `excluded`.
pub fn without_paths(records: Vec<RequestRecord>, excluded: &[&str]) -> Vec<RequestRecord> {
    records
        .into_iter()
        .filter(|r| !excluded.contains(&r.path.as_str()))
        .collect()
}
