// Per-endpoint notification cooldown

use chrono::Utc;
use std::collections::HashMap;

/// Source of the current epoch second
pub trait Clock: Send + Sync {
    fn now_epoch_seconds(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_epoch_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Timestamp of the last dispatch attempt per endpoint.
///
/// Entries are only ever inserted or refreshed; a suppressed attempt leaves
/// the clock untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThrottleState {
    last_dispatch: HashMap<String, i64>,
}

impl ThrottleState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_dispatch(&self, identifier: &str) -> Option<i64> {
        self.last_dispatch.get(identifier).copied()
    }

    pub fn len(&self) -> usize {
        self.last_dispatch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_dispatch.is_empty()
    }

    /// An endpoint is eligible when it has never dispatched or strictly
    /// more than `cooldown_seconds` have passed since the last attempt.
    pub fn is_eligible(&self, identifier: &str, now: i64, cooldown_seconds: u64) -> bool {
        match self.last_dispatch(identifier) {
            None => true,
            Some(last) => now.saturating_sub(last) > cooldown_seconds as i64,
        }
    }

    /// Record a dispatch attempt at `now` if eligible. Returns whether the
    /// caller may dispatch.
    pub fn try_acquire(&mut self, identifier: &str, now: i64, cooldown_seconds: u64) -> bool {
        if !self.is_eligible(identifier, now, cooldown_seconds) {
            return false;
        }
        self.last_dispatch.insert(identifier.to_string(), now);
        true
    }
}
