//! Server config loader (strict parsing).

pub mod schema;

use std::fs;
use std::io::ErrorKind;

use routemeter_core::error::{Result, RouteMeterError};

pub use schema::{AppConfig, MetricsSection, ServerSection};

/// Load and validate `path`. A missing file yields the defaults.
pub fn load_from_file(path: &str) -> Result<AppConfig> {
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::info!(path, "config file not found; using defaults");
            Ok(AppConfig::default())
        }
        Err(e) => Err(RouteMeterError::BadConfig(format!("read {path} failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<AppConfig> {
    let cfg: AppConfig = serde_yaml::from_str(s)
        .map_err(|e| RouteMeterError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
