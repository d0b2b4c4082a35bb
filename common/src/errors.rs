// Error handling framework
// Startup errors are fatal and carry a stable exit code; runtime errors are
// recovered by the scheduling loop.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration errors, detected in a single pass before the
/// scheduler is constructed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("--{0} is required")]
    MissingArgument(&'static str),

    #[error("--interval must be a positive integer, got '{0}'")]
    InvalidInterval(String),

    #[error("--endpoints should refer to a file (list of endpoints): {}", .0.display())]
    EndpointsNotAFile(PathBuf),

    #[error("--endpoints file {} could not be read: {reason}", .path.display())]
    EndpointsUnreadable { path: PathBuf, reason: String },

    #[error("--endpoints file {} does not contain any endpoints", .0.display())]
    NoEndpoints(PathBuf),

    #[error("Invalid endpoint '{identifier}': {reason}")]
    InvalidEndpoint { identifier: String, reason: String },

    #[error("--notification should refer to a file (notification config): {}", .0.display())]
    NotificationNotAFile(PathBuf),

    #[error("Invalid notification config {}: {reason}", .path.display())]
    InvalidNotificationConfig { path: PathBuf, reason: String },

    #[error("--jitter must be a boolean or an integer between 0 and 99, got '{0}'")]
    InvalidJitter(String),

    #[error("Invalid settings: {0}")]
    Settings(String),
}

impl ConfigError {
    /// Process exit code for this error class. Codes are stable across
    /// releases; operators script against them.
    pub fn exit_code(&self) -> u8 {
        match self {
            ConfigError::MissingArgument(_) | ConfigError::InvalidInterval(_) => 1,
            ConfigError::EndpointsNotAFile(_) => 2,
            ConfigError::EndpointsUnreadable { .. } => 3,
            ConfigError::NoEndpoints(_) => 4,
            ConfigError::NotificationNotAFile(_) => 5,
            ConfigError::InvalidNotificationConfig { .. } => 6,
            ConfigError::InvalidJitter(_) => 7,
            ConfigError::InvalidEndpoint { .. } => 8,
            ConfigError::Settings(_) => 9,
        }
    }
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::Settings(err.to_string())
    }
}

/// Per-endpoint render failure. Never aborts a batch.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("No elements matched selector '{0}'")]
    NoMatch(String),

    #[error("Render task aborted: {0}")]
    Aborted(String),
}

/// Notification transport failure. Logged only; never touches throttle state.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to build notification client: {0}")]
    Client(String),

    #[error("Notification request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Notification service rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_name_the_argument() {
        let err = ConfigError::MissingArgument("interval");
        assert_eq!(err.to_string(), "--interval is required");

        let err = ConfigError::NoEndpoints(PathBuf::from("urls.txt"));
        assert!(err.to_string().contains("urls.txt"));
    }

    #[test]
    fn test_missing_argument_shares_interval_exit_code() {
        assert_eq!(ConfigError::MissingArgument("endpoints").exit_code(), 1);
        assert_eq!(ConfigError::InvalidInterval("0".into()).exit_code(), 1);
    }

    #[test]
    fn test_settings_error_from_config_crate() {
        let err: ConfigError = config::ConfigError::Message("bad".into()).into();
        assert_eq!(err.exit_code(), 9);
    }
}
