use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::VigilError;

/// Shared secret used when none is configured.
///
/// Only acceptable for a single-tenant, trusted-network deployment. Any
/// exposed instance must set `TRAFFIC_API_KEY` to a securely generated value.
pub const DEFAULT_API_KEY: &str = "trafficapikey";

/// Header carrying the shared secret on query requests.
pub const API_KEY_HEADER: &str = "x-traffic-key";

/// Legacy environment variable holding the shared secret.
pub const API_KEY_ENV: &str = "TRAFFIC_API_KEY";

/// Prefixed form of the shared secret, overridden by [`API_KEY_ENV`].
pub const PREFIXED_API_KEY_ENV: &str = "VIGIL_AUTH__API_KEY";

/// Upper bound on `traffic.capacity`.
pub const MAX_CAPACITY: usize = 1_000_000;

/// Legacy environment variable holding the listen port.
pub const PORT_ENV: &str = "PORT";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VigilConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub traffic: TrafficConfig,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Listener and static-file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Directory served for paths no other route matches. `None` disables it.
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<PathBuf>,
}

/// Access gate settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected value of the `X-Traffic-Key` header.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Recording buffer and query endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrafficConfig {
    /// Number of records retained; older ones are evicted.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_history_path")]
    pub history_path: String,
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,
    #[serde(default = "default_analysis_path")]
    pub analysis_path: String,
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

/// Built-in `/test/*` endpoints used to generate sample traffic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Artificial delay of the slow endpoint.
    #[serde(default = "default_slow_delay")]
    pub slow_delay_ms: u64,
}

// ── Defaults ──────────────────────────────────────────────────

fn default_host() -> String { "0.0.0.0".into() }
fn default_port() -> u16 { 80 }
fn default_static_dir() -> Option<PathBuf> { Some(PathBuf::from("public")) }
fn default_capacity() -> usize { 500 }
fn default_history_path() -> String { "/api/traffic".into() }
fn default_metrics_path() -> String { "/api/metrics".into() }
fn default_analysis_path() -> String { "/api/analysis".into() }
fn default_health_path() -> String { "/api/health".into() }
fn default_true() -> bool { true }
fn default_slow_delay() -> u64 { 2000 }

// ── Impls ─────────────────────────────────────────────────────

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: default_static_dir(),
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            history_path: default_history_path(),
            metrics_path: default_metrics_path(),
            analysis_path: default_analysis_path(),
            health_path: default_health_path(),
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            slow_delay_ms: default_slow_delay(),
        }
    }
}

impl AuthConfig {
    /// The trimmed key the gate compares against, falling back to
    /// [`DEFAULT_API_KEY`] when none is set or it is blank.
    pub fn effective_key(&self) -> &str {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key,
            _ => DEFAULT_API_KEY,
        }
    }

    pub fn uses_default_key(&self) -> bool {
        self.effective_key() == DEFAULT_API_KEY
    }
}

impl TrafficConfig {
    /// Paths whose requests are never recorded.
    pub fn query_paths(&self) -> [&str; 3] {
        [
            self.history_path.as_str(),
            self.metrics_path.as_str(),
            self.analysis_path.as_str(),
        ]
    }

    /// Endpoint paths must be absolute and distinct to be routable, and the
    /// history must fit in memory.
    pub fn validate(&self) -> Result<(), VigilError> {
        if self.capacity > MAX_CAPACITY {
            return Err(VigilError::Config(format!(
                "traffic.capacity must be at most {MAX_CAPACITY}, got {}",
                self.capacity
            )));
        }
        let paths = [
            ("history_path", &self.history_path),
            ("metrics_path", &self.metrics_path),
            ("analysis_path", &self.analysis_path),
            ("health_path", &self.health_path),
        ];
        for (i, (name, path)) in paths.iter().enumerate() {
            if !path.starts_with('/') {
                return Err(VigilError::Config(format!("traffic.{name} must start with '/': {path:?}")));
            }
            if let Some((other, _)) = paths[..i].iter().find(|(_, p)| p == path) {
                return Err(VigilError::Config(format!("traffic.{name} duplicates traffic.{other}")));
            }
        }
        Ok(())
    }
}

impl VigilConfig {
    /// Provider chain: optional YAML file, `VIGIL_`-prefixed env
    /// (`VIGIL_SERVER__PORT`), then the legacy `PORT` / `TRAFFIC_API_KEY`.
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new();
        if let Some(path) = path {
            figment = figment.merge(Yaml::file(path));
        }
        figment = figment
            .merge(Env::prefixed("VIGIL_").split("__").ignore(&["auth.api_key"]))
            .merge(Env::raw().only(&[PORT_ENV]).map(|_| "server.port".into()));

        // Secrets bypass `Env` so numeric-looking keys stay strings.
        for var in [PREFIXED_API_KEY_ENV, API_KEY_ENV] {
            if let Ok(key) = std::env::var(var) {
                figment = figment.merge(Serialized::default("auth.api_key", key));
            }
        }
        figment
    }

    /// Load configuration from an optional YAML file + env overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let config: VigilConfig = Self::figment(path).extract()?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
