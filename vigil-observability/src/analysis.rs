//! Summary statistics over a history snapshot.
//!
//! Everything here is a pure function of its input: no I/O, no clocks, and
//! identical snapshots always produce identical results.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use vigil_core::record::{RequestRecord, UNKNOWN};

/// Number of paths reported in [`TrafficAnalysis::top_paths`].
pub const TOP_PATHS: usize = 5;

/// Number of records reported in [`TrafficAnalysis::slowest_requests`].
pub const SLOWEST_REQUESTS: usize = 10;

const DEFAULT_METHOD: &str = "GET";
const DEFAULT_PATH: &str = "/";

/// How often a path occurs in the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathCount {
    pub path: String,
    pub count: usize,
}

/// Reduced projection of a slow record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlowRequest {
    pub path: String,
    pub method: String,
    pub duration_ms: f64,
    pub status_code: u16,
}

/// Derived view of a snapshot. Recomputed on every query, never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficAnalysis {
    pub total_requests: usize,
    /// Status code (as text, `"unknown"` for 0) → count.
    pub status_codes: BTreeMap<String, usize>,
    pub methods: BTreeMap<String, usize>,
    /// Mean duration, rounded to two decimals.
    pub avg_duration_ms: f64,
    pub min_duration_ms: f64,
    pub max_duration_ms: f64,
    /// Share of 2xx responses, whole percent.
    pub success_rate_pct: u32,
    /// Share of responses with status >= 400, whole percent.
    pub error_rate_pct: u32,
    /// Most frequent paths, most frequent first.
    pub top_paths: Vec<PathCount>,
    /// Slowest individual records, slowest first.
    pub slowest_requests: Vec<SlowRequest>,
}

/// Round to two decimals, halves away from zero.
#[inline]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// `part / total` as a whole percentage; 0 when `total` is 0.
#[inline]
pub fn percent(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u32
}

fn status_key(status: u16) -> String {
    if status == 0 {
        UNKNOWN.to_string()
    } else {
        status.to_string()
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// Analyze a newest-first snapshot.
pub fn analyze(records: &[RequestRecord]) -> TrafficAnalysis {
    if records.is_empty() {
        return TrafficAnalysis::default();
    }

    let total = records.len();
    let mut sum = 0.0;
    let mut min = f64::INFINITY;
    let mut max = 0.0_f64;
    let mut success = 0usize;
    let mut errors = 0usize;
    let mut status_codes: BTreeMap<String, usize> = BTreeMap::new();
    let mut methods: BTreeMap<String, usize> = BTreeMap::new();

    // Paths in first-seen order, with an index for O(1) increments.
    let mut path_counts: Vec<PathCount> = Vec::new();
    let mut path_index: HashMap<&str, usize> = HashMap::new();

    for record in records {
        let duration = record.effective_duration_ms();
        sum += duration;
        min = min.min(duration);
        max = max.max(duration);

        *status_codes.entry(status_key(record.status_code)).or_default() += 1;
        let method = non_empty_or(&record.method, DEFAULT_METHOD);
        *methods.entry(method.to_string()).or_default() += 1;

        if record.is_success() {
            success += 1;
        } else if record.is_error() {
            errors += 1;
        }

        let path = non_empty_or(&record.path, DEFAULT_PATH);
        match path_index.get(path) {
            Some(&i) => path_counts[i].count += 1,
            None => {
                path_index.insert(path, path_counts.len());
                path_counts.push(PathCount {
                    path: path.to_string(),
                    count: 1,
                });
            }
        }
    }

    TrafficAnalysis {
        total_requests: total,
        status_codes,
        methods,
        avg_duration_ms: round2(sum / total as f64),
        min_duration_ms: if min.is_finite() { min } else { 0.0 },
        max_duration_ms: max,
        success_rate_pct: percent(success, total),
        error_rate_pct: percent(errors, total),
        top_paths: top_paths(path_counts),
        slowest_requests: slowest(records),
    }
}

/// Stable sort keeps first-seen order among equal counts.
fn top_paths(mut counts: Vec<PathCount>) -> Vec<PathCount> {
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(TOP_PATHS);
    counts
}

/// Stable sort keeps snapshot order among equal durations.
fn slowest(records: &[RequestRecord]) -> Vec<SlowRequest> {
    let mut ranked: Vec<&RequestRecord> = records.iter().collect();
    ranked.sort_by(|a, b| {
        b.effective_duration_ms()
            .total_cmp(&a.effective_duration_ms())
    });
    ranked
        .into_iter()
        .take(SLOWEST_REQUESTS)
        .map(|r| SlowRequest {
            path: r.path.clone(),
            method: r.method.clone(),
            duration_ms: r.effective_duration_ms(),
            status_code: r.status_code,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(path: &str, status: u16, duration: f64) -> RequestRecord {
        RequestRecord {
            method: "GET".into(),
            path: path.into(),
            url: path.into(),
            status_code: status,
            duration_ms: duration,
            ..Default::default()
        }
    }

    #[test]
    fn empty_snapshot_yields_zero_result() {
        let a = analyze(&[]);
        assert_eq!(a, TrafficAnalysis::default());
        assert_eq!(a.total_requests, 0);
        assert_eq!(a.avg_duration_ms, 0.0);
        assert_eq!(a.min_duration_ms, 0.0);
        assert_eq!(a.max_duration_ms, 0.0);
        assert!(a.status_codes.is_empty());
        assert!(a.top_paths.is_empty());
    }

    #[test]
    fn three_record_example() {
        let a = analyze(&[
            rec("/a", 200, 10.0),
            rec("/b", 500, 30.0),
            rec("/c", 404, 20.0),
        ]);
        assert_eq!(a.total_requests, 3);
        assert_eq!(a.avg_duration_ms, 20.0);
        assert_eq!(a.min_duration_ms, 10.0);
        assert_eq!(a.max_duration_ms, 30.0);
        assert_eq!(a.success_rate_pct, 33);
        assert_eq!(a.error_rate_pct, 67);
        assert_eq!(a.status_codes["200"], 1);
        assert_eq!(a.status_codes["500"], 1);
        assert_eq!(a.status_codes["404"], 1);
        assert_eq!(a.methods["GET"], 3);
    }

    #[test]
    fn mean_rounds_to_two_decimals() {
        let a = analyze(&[rec("/a", 200, 1.0), rec("/a", 200, 1.0), rec("/a", 200, 2.0)]);
        assert_eq!(a.avg_duration_ms, 1.33);
        let b = analyze(&[rec("/a", 200, 0.006)]);
        assert_eq!(b.avg_duration_ms, 0.01);
    }

    #[test]
    fn unknown_status_and_missing_method_get_defaults() {
        let mut r = rec("", 0, 5.0);
        r.method.clear();
        let a = analyze(&[r]);
        assert_eq!(a.status_codes[UNKNOWN], 1);
        assert_eq!(a.methods["GET"], 1);
        assert_eq!(a.top_paths[0].path, "/");
        assert_eq!(a.success_rate_pct, 0);
        assert_eq!(a.error_rate_pct, 0);
    }

    #[test]
    fn out_of_range_status_is_counted_verbatim() {
        let a = analyze(&[rec("/x", 999, 1.0), rec("/x", 42, 1.0)]);
        assert_eq!(a.status_codes["999"], 1);
        assert_eq!(a.status_codes["42"], 1);
        assert_eq!(a.error_rate_pct, 50);
    }

    #[test]
    fn bad_durations_count_as_zero() {
        let a = analyze(&[rec("/a", 200, f64::NAN), rec("/b", 200, -3.0), rec("/c", 200, 9.0)]);
        assert_eq!(a.min_duration_ms, 0.0);
        assert_eq!(a.max_duration_ms, 9.0);
        assert_eq!(a.avg_duration_ms, 3.0);
        assert_eq!(a.slowest_requests[0].path, "/c");
        assert_eq!(a.slowest_requests.len(), 3);
    }

    #[test]
    fn top_paths_rank_by_count_then_first_seen() {
        // Counts: /p1=1 /p2=5 /p3=3 /p4=5 /p5=3 /p6=1 /p7=3, first seen in that order.
        let mut records = Vec::new();
        for (path, n) in [("/p1", 1), ("/p2", 5), ("/p3", 3), ("/p4", 5), ("/p5", 3), ("/p6", 1), ("/p7", 3)] {
            records.push(rec(path, 200, 1.0));
            for _ in 1..n {
                records.push(rec(path, 200, 1.0));
            }
        }
        let a = analyze(&records);
        let ranked: Vec<(&str, usize)> =
            a.top_paths.iter().map(|p| (p.path.as_str(), p.count)).collect();
        assert_eq!(
            ranked,
            vec![("/p2", 5), ("/p4", 5), ("/p3", 3), ("/p5", 3), ("/p7", 3)]
        );
    }

    #[test]
    fn top_paths_first_seen_uses_first_occurrence_not_last() {
        // /b appears first, /a overtakes in position later but ties in count.
        let records = vec![
            rec("/b", 200, 1.0),
            rec("/a", 200, 1.0),
            rec("/a", 200, 1.0),
            rec("/b", 200, 1.0),
        ];
        let a = analyze(&records);
        assert_eq!(a.top_paths[0].path, "/b");
        assert_eq!(a.top_paths[1].path, "/a");
    }

    #[test]
    fn slowest_keeps_snapshot_order_on_ties_and_caps_at_ten() {
        let mut records: Vec<RequestRecord> =
            (0..15).map(|i| rec(&format!("/tie{i}"), 200, 50.0)).collect();
        records.insert(3, rec("/slowest", 503, 80.0));
        let a = analyze(&records);
        assert_eq!(a.slowest_requests.len(), SLOWEST_REQUESTS);
        assert_eq!(a.slowest_requests[0].path, "/slowest");
        assert_eq!(a.slowest_requests[0].status_code, 503);
        let ties: Vec<&str> = a.slowest_requests[1..].iter().map(|s| s.path.as_str()).collect();
        let expected: Vec<String> = (0..9).map(|i| format!("/tie{i}")).collect();
        assert_eq!(ties, expected.iter().map(String::as_str).collect::<Vec<_>>());
    }

    #[test]
    fn analysis_is_deterministic() {
        let records = vec![rec("/a", 200, 3.0), rec("/b", 301, 4.0), rec("/a", 404, 3.0)];
        assert_eq!(analyze(&records), analyze(&records));
    }

    #[test]
    fn serializes_with_camel_case_names() {
        let a = analyze(&[rec("/a", 200, 10.0)]);
        let v = serde_json::to_value(&a).unwrap();
        assert_eq!(v["totalRequests"], 1);
        assert_eq!(v["avgDurationMs"], 10.0);
        assert_eq!(v["statusCodes"]["200"], 1);
        assert_eq!(v["topPaths"][0]["path"], "/a");
        assert_eq!(v["slowestRequests"][0]["durationMs"], 10.0);
    }

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(0, 0), 0);
    }
}
