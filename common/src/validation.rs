// Startup validation
// Turns raw command-line values into a checked watch configuration, or the
// first fatal configuration error.

use crate::endpoints::load_endpoints;
use crate::errors::ConfigError;
use crate::models::{
    EndpointSpec, JitterConfig, NotificationConfig, RawNotificationConfig,
    DEFAULT_COOLDOWN_SECONDS, DEFAULT_JITTER_PERCENT, DEFAULT_SELECTOR, MAX_JITTER_PERCENT,
};
use crate::renderer::parse_selector;
use std::path::{Path, PathBuf};

/// Unvalidated watch arguments as they arrive from the command line
#[derive(Debug, Clone)]
pub struct WatchArgs {
    pub endpoints: Option<PathBuf>,
    pub interval: Option<String>,
    pub notification: Option<PathBuf>,
    pub jitter: Option<String>,
    pub selector: String,
}

impl Default for WatchArgs {
    fn default() -> Self {
        Self {
            endpoints: None,
            interval: None,
            notification: None,
            jitter: None,
            selector: DEFAULT_SELECTOR.to_string(),
        }
    }
}

/// Everything the scheduler needs, checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchConfig {
    pub endpoints: Vec<EndpointSpec>,
    pub jitter: JitterConfig,
    pub notification: Option<NotificationConfig>,
}

/// Validate all arguments in one pass. Nothing is started on error.
pub fn validate(args: &WatchArgs) -> Result<WatchConfig, ConfigError> {
    let interval = args
        .interval
        .as_deref()
        .ok_or(ConfigError::MissingArgument("interval"))?;
    let endpoints_path = args
        .endpoints
        .as_deref()
        .ok_or(ConfigError::MissingArgument("endpoints"))?;

    let base_interval_seconds = parse_interval(interval)?;
    let jitter_percent = parse_jitter(args.jitter.as_deref())?;

    let default_selector = args.selector.trim();
    if default_selector.is_empty() {
        return Err(ConfigError::InvalidEndpoint {
            identifier: "--selector".to_string(),
            reason: "default selector is empty".to_string(),
        });
    }

    let endpoints = load_endpoints(endpoints_path, default_selector)?;
    for endpoint in &endpoints {
        parse_selector(&endpoint.selector).map_err(|e| ConfigError::InvalidEndpoint {
            identifier: endpoint.identifier.clone(),
            reason: e.to_string(),
        })?;
    }

    let notification = args
        .notification
        .as_deref()
        .map(load_notification_config)
        .transpose()?;

    Ok(WatchConfig {
        endpoints,
        jitter: JitterConfig::new(base_interval_seconds, jitter_percent),
        notification,
    })
}

/// Base interval must be a positive integer number of seconds
pub fn parse_interval(value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(seconds) if seconds > 0 => Ok(seconds),
        _ => Err(ConfigError::InvalidInterval(value.to_string())),
    }
}

/// Jitter is absent, a boolean, or an integer percent in [0, 99].
/// `true` (or a bare flag) selects the default percent; `false` disables.
/// An explicit empty value is rejected.
pub fn parse_jitter(value: Option<&str>) -> Result<u8, ConfigError> {
    let Some(raw) = value else {
        return Ok(0);
    };

    match raw.trim() {
        "true" => Ok(DEFAULT_JITTER_PERCENT),
        "false" => Ok(0),
        other => match other.parse::<i64>() {
            Ok(percent) if (0..=i64::from(MAX_JITTER_PERCENT)).contains(&percent) => {
                Ok(percent as u8)
            }
            _ => Err(ConfigError::InvalidJitter(raw.to_string())),
        },
    }
}

/// Load the notification JSON file; all three string fields are required
pub fn load_notification_config(path: &Path) -> Result<NotificationConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotificationNotAFile(path.to_path_buf()));
    }

    let invalid = |reason: String| ConfigError::InvalidNotificationConfig {
        path: path.to_path_buf(),
        reason,
    };

    let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
    let raw: RawNotificationConfig =
        serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

    let required = |value: Option<String>, field: &str| match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(invalid(format!("'{}' must be a non-empty string", field))),
    };

    Ok(NotificationConfig {
        service_key: required(raw.key, "key")?,
        event_name: required(raw.event_name, "eventName")?,
        payload_field: required(raw.body_key, "bodyKey")?,
        cooldown_seconds: raw.timeout.unwrap_or(DEFAULT_COOLDOWN_SECONDS),
    })
}
