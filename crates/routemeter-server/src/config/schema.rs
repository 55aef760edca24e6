use std::net::SocketAddr;

use serde::Deserialize;
use routemeter_core::error::{Result, RouteMeterError};
use routemeter_core::metrics::{validate_buckets, DEFAULT_BUCKETS};
use routemeter_core::middleware::UNMATCHED_ROUTE;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub metrics: MetricsSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            metrics: MetricsSection::default(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(RouteMeterError::BadConfig(format!(
                "unsupported config version {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.metrics.validate()?;

        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    /// `null` disables static file serving.
    #[serde(default = "default_static_dir")]
    pub static_dir: Option<String>,

    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            static_dir: default_static_dir(),
            metrics_path: default_metrics_path(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;

        if let Some(dir) = &self.static_dir {
            if dir.trim().is_empty() {
                return Err(RouteMeterError::BadConfig(
                    "server.static_dir must not be empty (use null to disable)".into(),
                ));
            }
        }

        let p = self.metrics_path.as_str();
        if !p.starts_with('/') || p == "/" || p == "/healthz" {
            return Err(RouteMeterError::BadConfig(format!(
                "server.metrics_path must be an absolute path other than / and /healthz: {p}"
            )));
        }
        if p.contains([':', '*', '{', '}']) {
            return Err(RouteMeterError::BadConfig(format!(
                "server.metrics_path must be a literal path: {p}"
            )));
        }

        if self.max_body_bytes == 0 {
            return Err(RouteMeterError::BadConfig(
                "server.max_body_bytes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|e| {
            RouteMeterError::BadConfig(format!("server.listen is not a socket address ({}): {e}", self.listen))
        })
    }
}

fn default_listen() -> String {
    "0.0.0.0:9000".into()
}
fn default_static_dir() -> Option<String> {
    Some("./static/".into())
}
fn default_metrics_path() -> String {
    "/prometheus".into()
}
fn default_max_body_bytes() -> usize {
    1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default = "default_unmatched_label")]
    pub unmatched_label: String,

    /// Upper bounds in seconds.
    #[serde(default = "default_duration_buckets")]
    pub duration_buckets: Vec<f64>,
}

impl Default for MetricsSection {
    fn default() -> Self {
        Self {
            unmatched_label: default_unmatched_label(),
            duration_buckets: default_duration_buckets(),
        }
    }
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        if self.unmatched_label.trim().is_empty() {
            return Err(RouteMeterError::BadConfig(
                "metrics.unmatched_label must not be empty".into(),
            ));
        }
        validate_buckets(&self.duration_buckets)
            .map_err(|e| RouteMeterError::BadConfig(format!("metrics.duration_buckets: {e}")))
    }
}

fn default_unmatched_label() -> String {
    UNMATCHED_ROUTE.into()
}
fn default_duration_buckets() -> Vec<f64> {
    DEFAULT_BUCKETS.to_vec()
}
