use crate::analysis::{TrafficAnalysis, round2};
use serde::{Deserialize, Serialize};

/// Headline server-side latency and outcome figures.
///
/// Everything is derived from [`TrafficAnalysis`]; nothing is sampled
/// separately.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerMetrics {
    pub avg_response_time_ms: f64,
    pub max_response_time_ms: f64,
    pub success_rate_pct: u32,
    pub error_rate_pct: u32,
    pub total_requests: usize,
    /// `total_requests / 60`, rounded to two decimals. The history carries
    /// no time window, so this assumes it spans one hour.
    pub requests_per_minute: f64,
}

impl ServerMetrics {
    pub fn from_analysis(analysis: &TrafficAnalysis) -> Self {
        Self {
            avg_response_time_ms: analysis.avg_duration_ms,
            max_response_time_ms: analysis.max_duration_ms,
            success_rate_pct: analysis.success_rate_pct,
            error_rate_pct: analysis.error_rate_pct,
            total_requests: analysis.total_requests,
            requests_per_minute: round2(analysis.total_requests as f64 / 60.0),
        }
    }
}

impl From<&TrafficAnalysis> for ServerMetrics {
    fn from(analysis: &TrafficAnalysis) -> Self {
        Self::from_analysis(analysis)
    }
}
