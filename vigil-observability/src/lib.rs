pub mod access_log;
pub mod analysis;
pub mod history;
pub mod metrics;

pub use analysis::{TrafficAnalysis, analyze};
pub use metrics::ServerMetrics;
