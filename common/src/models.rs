// Core data models shared by the watch loop

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default cooldown between two notifications for the same endpoint
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 10;

/// Jitter percent substituted when jitter is enabled without a value
pub const DEFAULT_JITTER_PERCENT: u8 = 20;

/// Largest accepted jitter percent
pub const MAX_JITTER_PERCENT: u8 = 99;

/// Default selector for flat endpoint lists
pub const DEFAULT_SELECTOR: &str = "body";

/// A watched page: the URL and the selector whose text is compared
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointSpec {
    pub identifier: String,
    pub selector: String,
}

impl EndpointSpec {
    pub fn new(identifier: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            selector: selector.into(),
        }
    }
}

/// Freshly observed text per endpoint identifier for one cycle.
/// Endpoints that failed to load are absent.
pub type FetchResult = BTreeMap<String, String>;

/// One endpoint whose text differs from its snapshot entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub identifier: String,
    /// `None` on first observation
    pub old_text: Option<String>,
    pub new_text: String,
}

/// Outbound notification settings, loaded from a JSON file of the shape
/// `{ "key": "...", "eventName": "...", "bodyKey": "...", "timeout": 10 }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationConfig {
    pub service_key: String,
    pub event_name: String,
    pub payload_field: String,
    pub cooldown_seconds: u64,
}

/// Raw notification file contents before validation
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawNotificationConfig {
    pub key: Option<String>,
    pub event_name: Option<String>,
    pub body_key: Option<String>,
    pub timeout: Option<u64>,
}

/// Base interval and jitter for the scheduling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JitterConfig {
    pub base_interval_seconds: u64,
    pub jitter_percent: u8,
}

impl JitterConfig {
    pub fn new(base_interval_seconds: u64, jitter_percent: u8) -> Self {
        Self {
            base_interval_seconds,
            jitter_percent,
        }
    }
}

/// Scheduler state machine. There is no terminal state; the loop leaves
/// `Waiting` only for `Fetching` or when stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CycleState {
    Idle,
    Fetching,
    Diffing,
    Notifying,
    Waiting,
}

/// Summary of one completed cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub failed: Vec<String>,
    pub changes: Vec<ChangeEvent>,
    pub dispatched: Vec<String>,
    pub suppressed: Vec<String>,
}
