// Configuration management with layered configuration (file, env)
// Operational knobs only; the watch definition itself comes from the CLI.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main settings structure containing all configuration options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub render: RenderConfig,
    pub notification: NotificationServiceConfig,
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
    /// 0 means no cap
    pub max_concurrency: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: format!("page-watcher/{}", env!("CARGO_PKG_VERSION")),
            max_concurrency: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationServiceConfig {
    pub service_base_url: String,
    pub timeout_seconds: u64,
}

impl Default for NotificationServiceConfig {
    fn default() -> Self {
        Self {
            service_base_url: "https://maker.ifttt.com".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    pub metrics_port: Option<u16>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "watcher=info,common=info".to_string(),
            log_format: LogFormat::Json,
            metrics_port: None,
        }
    }
}

impl Settings {
    /// Load configuration with layered precedence: defaults → file → env
    pub fn load_from_path<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Add local configuration (not committed to git)
            .add_source(File::from(config_dir.join("local.toml")).required(false))
            .add_source(
                Environment::with_prefix("WATCHER")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), String> {
        if self.render.timeout_seconds == 0 {
            return Err("render.timeout_seconds must be greater than 0".to_string());
        }
        if self.render.user_agent.trim().is_empty() {
            return Err("render.user_agent cannot be empty".to_string());
        }

        if self.notification.service_base_url.trim().is_empty() {
            return Err("notification.service_base_url cannot be empty".to_string());
        }
        if self.notification.timeout_seconds == 0 {
            return Err("notification.timeout_seconds must be greater than 0".to_string());
        }

        if self.observability.log_level.trim().is_empty() {
            return Err("observability.log_level cannot be empty".to_string());
        }
        if self.observability.metrics_port == Some(0) {
            return Err("observability.metrics_port must be greater than 0".to_string());
        }

        Ok(())
    }
}
