use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for identifiers the client did not supply.
pub const UNKNOWN: &str = "unknown";

/// One observed request/response cycle.
///
/// Every field is always present. Records decoded from JSON that lack a
/// field, or carry `null` for it, get the default instead, so consumers never
/// have to probe for absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RequestRecord {
    /// When the response was fully handed off.
    #[serde(deserialize_with = "null_as_default")]
    pub timestamp: DateTime<Utc>,

    /// HTTP method (`GET`, `POST`, ...)
    #[serde(deserialize_with = "null_as_default")]
    pub method: String,

    /// Request path without the query string.
    #[serde(deserialize_with = "null_as_default")]
    pub path: String,

    /// Original request target, query string included.
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,

    /// Response status. `0` means the status is unknown.
    #[serde(deserialize_with = "null_as_default")]
    pub status_code: u16,

    /// Wall-clock time from request entry to response completion.
    #[serde(alias = "duration", deserialize_with = "null_as_default")]
    pub duration_ms: f64,

    /// Client IP address.
    #[serde(alias = "ip", deserialize_with = "null_as_unknown")]
    pub remote_address: String,

    /// `User-Agent` header value.
    #[serde(deserialize_with = "null_as_unknown")]
    pub user_agent: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_unknown<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(|| UNKNOWN.to_string()))
}

impl Default for RequestRecord {
    fn default() -> Self {
        Self {
            timestamp: DateTime::<Utc>::default(),
            method: String::new(),
            path: String::new(),
            url: String::new(),
            status_code: 0,
            duration_ms: 0.0,
            remote_address: UNKNOWN.to_string(),
            user_agent: UNKNOWN.to_string(),
        }
    }
}

impl RequestRecord {
    /// Duration usable for arithmetic: negative or non-finite values count as zero.
    #[inline]
    pub fn effective_duration_ms(&self) -> f64 {
        if self.duration_ms.is_finite() && self.duration_ms > 0.0 {
            self.duration_ms
        } else {
            0.0
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_error(&self) -> bool {
        self.status_code >= 400
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_with_camel_case_field_names() {
        let record = RequestRecord {
            method: "GET".into(),
            path: "/a".into(),
            url: "/a?x=1".into(),
            status_code: 200,
            duration_ms: 12.0,
            remote_address: "10.0.0.1".into(),
            ..Default::default()
        };
        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["statusCode"], 200);
        assert_eq!(v["durationMs"], 12.0);
        assert_eq!(v["remoteAddress"], "10.0.0.1");
        assert_eq!(v["userAgent"], "unknown");
        assert_eq!(v["url"], "/a?x=1");
        assert!(v["timestamp"].is_string());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let record: RequestRecord = serde_json::from_value(json!({ "path": "/x" })).unwrap();
        assert_eq!(record.path, "/x");
        assert_eq!(record.status_code, 0);
        assert_eq!(record.duration_ms, 0.0);
        assert_eq!(record.user_agent, UNKNOWN);
        assert_eq!(record.remote_address, UNKNOWN);
    }

    #[test]
    fn null_fields_take_defaults() {
        let record: RequestRecord = serde_json::from_value(json!({
            "timestamp": null,
            "method": null,
            "path": "/x",
            "statusCode": null,
            "duration": null,
            "ip": null,
            "userAgent": null,
        }))
        .unwrap();
        assert_eq!(record.path, "/x");
        assert_eq!(record.method, "");
        assert_eq!(record.status_code, 0);
        assert_eq!(record.duration_ms, 0.0);
        assert_eq!(record.remote_address, UNKNOWN);
        assert_eq!(record.user_agent, UNKNOWN);
    }

    #[test]
    fn legacy_field_names_are_accepted() {
        let record: RequestRecord =
            serde_json::from_value(json!({ "duration": 42, "ip": "::1", "statusCode": 404 }))
                .unwrap();
        assert_eq!(record.duration_ms, 42.0);
        assert_eq!(record.remote_address, "::1");
        assert!(record.is_error());
        assert!(!record.is_success());
    }

    #[test]
    fn effective_duration_clamps_bad_values() {
        let mut record = RequestRecord::default();
        record.duration_ms = -5.0;
        assert_eq!(record.effective_duration_ms(), 0.0);
        record.duration_ms = f64::NAN;
        assert_eq!(record.effective_duration_ms(), 0.0);
        record.duration_ms = 7.5;
        assert_eq!(record.effective_duration_ms(), 7.5);
    }
}
