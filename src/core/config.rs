use std::env;
use std::path::PathBuf;

use crate::errors::AppError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const DEFAULT_PROMETHEUS_URL: &str =
    "http://prometheus-server.prometheus-system.svc.cluster.local:80";
pub const DEFAULT_GPU_ANNOTATION: &str = "hami.io/node-nvidia-register";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_USAGE_STEP_SECONDS: u64 = 300;

/// Process configuration, read from `KW_*` environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub templates_dir: PathBuf,
    pub prometheus_url: String,
    /// Node annotation carrying per-device GPU registration records.
    pub gpu_annotation: String,
    pub log_dir: PathBuf,
    pub log_level: String,
    pub usage_step_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            prometheus_url: DEFAULT_PROMETHEUS_URL.to_string(),
            gpu_annotation: DEFAULT_GPU_ANNOTATION.to_string(),
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            usage_step_seconds: DEFAULT_USAGE_STEP_SECONDS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from any key lookup (the process env in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = AppConfig::default();

        if let Some(v) = lookup("KW_BIND_ADDR") {
            cfg.bind_addr = v;
        }
        if let Some(v) = lookup("KW_TEMPLATES_DIR") {
            cfg.templates_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("KW_PROMETHEUS_URL") {
            cfg.prometheus_url = v;
        }
        if let Some(v) = lookup("KW_GPU_ANNOTATION") {
            cfg.gpu_annotation = v;
        }
        if let Some(v) = lookup("KW_LOG_DIR") {
            cfg.log_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("KW_LOG_LEVEL") {
            cfg.log_level = v;
        }
        if let Some(v) = lookup("KW_USAGE_STEP_SECONDS") {
            cfg.usage_step_seconds = v.trim().parse().map_err(|_| {
                AppError::ValidationError(format!("KW_USAGE_STEP_SECONDS must be an integer, got '{}'", v))
            })?;
        }

        Ok(cfg)
    }
}
