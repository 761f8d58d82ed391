//! `vigil inspect`: fetch a running server's history and metrics and print a
//! summary, the way a dashboard client would.

use anyhow::{Context, bail};
use clap::Args;
use reqwest::StatusCode;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::{debug, warn};
use vigil_core::config::{API_KEY_HEADER, DEFAULT_API_KEY};
use vigil_core::record::RequestRecord;
use vigil_observability::history::{coerce_history, without_paths};
use vigil_observability::{ServerMetrics, TrafficAnalysis, analyze};

/// Rows shown per section of the text report.
const REPORT_ROWS: usize = 3;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Base URL of the server to inspect
    #[arg(long, default_value = "http://127.0.0.1:80")]
    pub url: String,

    /// Access key sent in the X-Traffic-Key header
    #[arg(long, env = "TRAFFIC_API_KEY", default_value = DEFAULT_API_KEY)]
    pub key: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout: u64,

    #[arg(long, default_value = "/api/traffic")]
    pub history_path: String,

    #[arg(long, default_value = "/api/metrics")]
    pub metrics_path: String,

    /// Print the analysis as JSON instead of a text report
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: InspectArgs) -> anyhow::Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(args.timeout))
        .build()?;
    let base = args.url.trim_end_matches('/');

    let history_url = format!("{base}{}", args.history_path);
    let resp = client
        .get(&history_url)
        .header(API_KEY_HEADER, args.key.as_str())
        .send()
        .await
        .with_context(|| format!("requesting {history_url}"))?;
    if resp.status() == StatusCode::UNAUTHORIZED {
        bail!("{history_url} rejected the access key");
    }
    let body = resp
        .text()
        .await
        .with_context(|| format!("reading {history_url}"))?;

    let records = without_paths(
        decode_history(&history_url, &body),
        &[args.history_path.as_str(), args.metrics_path.as_str()],
    );
    debug!(records = records.len(), "Fetched history");
    let analysis = analyze(&records);

    let metrics = fetch_metrics(&client, base, &args).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render_report(&analysis, metrics.as_ref()));
    }
    Ok(())
}

/// A body that is not JSON at all (an HTML error page, say) is handled like
/// any other non-array payload: an empty history.
fn decode_history(url: &str, body: &str) -> Vec<RequestRecord> {
    match serde_json::from_str(body) {
        Ok(payload) => coerce_history(payload),
        Err(e) => {
            warn!(url = %url, error = %e, "History response is not JSON, treating as empty");
            Vec::new()
        }
    }
}

/// Metrics are optional for the report; failures are logged and skipped.
async fn fetch_metrics(
    client: &reqwest::Client,
    base: &str,
    args: &InspectArgs,
) -> Option<ServerMetrics> {
    let url = format!("{base}{}", args.metrics_path);
    let result = async {
        client
            .get(&url)
            .header(API_KEY_HEADER, args.key.as_str())
            .send()
            .await?
            .error_for_status()?
            .json::<ServerMetrics>()
            .await
    }
    .await;

    match result {
        Ok(m) => Some(m),
        Err(e) => {
            warn!(url = %url, error = %e, "Could not fetch server metrics");
            None
        }
    }
}

pub fn render_report(analysis: &TrafficAnalysis, metrics: Option<&ServerMetrics>) -> String {
    let mut out = String::new();

    if analysis.total_requests == 0 {
        out.push_str("No traffic recorded yet.\n");
    } else {
        let _ = writeln!(out, "Requests:      {}", analysis.total_requests);
        let _ = writeln!(
            out,
            "Duration (ms): avg {} / min {} / max {}",
            analysis.avg_duration_ms, analysis.min_duration_ms, analysis.max_duration_ms
        );
        let _ = writeln!(
            out,
            "Success rate:  {}%  Error rate: {}%",
            analysis.success_rate_pct, analysis.error_rate_pct
        );

        out.push_str("\nTop endpoints:\n");
        for p in analysis.top_paths.iter().take(REPORT_ROWS) {
            let _ = writeln!(out, "  {:<32} {}", p.path, p.count);
        }

        let methods: Vec<String> = analysis
            .methods
            .iter()
            .map(|(m, n)| format!("{m}:{n}"))
            .collect();
        let _ = writeln!(out, "\nMethods:       {}", methods.join(" "));

        let statuses: Vec<String> = analysis
            .status_codes
            .iter()
            .map(|(s, n)| format!("{s}:{n}"))
            .collect();
        let _ = writeln!(out, "Status codes:  {}", statuses.join(" "));

        out.push_str("\nSlowest requests:\n");
        for s in analysis.slowest_requests.iter().take(REPORT_ROWS) {
            let _ = writeln!(
                out,
                "  {:<6} {:<32} {:>10} ms  {}",
                s.method, s.path, s.duration_ms, s.status_code
            );
        }
    }

    if let Some(m) = metrics {
        let _ = writeln!(
            out,
            "\nServer: avg {} ms, max {} ms, {} req/min, {} total",
            m.avg_response_time_ms, m.max_response_time_ms, m.requests_per_minute, m.total_requests
        );
    }

    out
}
