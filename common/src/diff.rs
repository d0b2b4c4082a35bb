// Snapshot store and differ
// Changes are detected per endpoint key, never by comparing value sets

use crate::models::{ChangeEvent, FetchResult};
use std::collections::HashMap;
use tracing::info;

/// Last successfully observed text per endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: HashMap<String, String>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<&str> {
        self.entries.get(identifier).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Record a baseline without producing change events. Returns the
    /// number of entries stored.
    pub fn seed(&mut self, fetched: &FetchResult) -> usize {
        for (identifier, text) in fetched {
            self.entries.insert(identifier.clone(), text.clone());
        }
        fetched.len()
    }

    /// Compare `text` against the stored entry and store it on divergence.
    /// A missing entry counts as a change.
    pub fn compare_and_update(&mut self, identifier: &str, text: &str) -> Option<ChangeEvent> {
        match self.entries.get_mut(identifier) {
            Some(current) if current.as_str() == text => None,
            Some(current) => {
                let old = std::mem::replace(current, text.to_string());
                Some(ChangeEvent {
                    identifier: identifier.to_string(),
                    old_text: Some(old),
                    new_text: text.to_string(),
                })
            }
            None => {
                self.entries
                    .insert(identifier.to_string(), text.to_string());
                Some(ChangeEvent {
                    identifier: identifier.to_string(),
                    old_text: None,
                    new_text: text.to_string(),
                })
            }
        }
    }
}

/// Diff a fetch result against the snapshot, updating it in place.
///
/// Endpoints missing from `fetched` keep their prior entry. Each changed
/// endpoint is updated once and yields one event, ordered by identifier.
pub fn diff(snapshot: &mut Snapshot, fetched: &FetchResult) -> Vec<ChangeEvent> {
    let changes: Vec<ChangeEvent> = fetched
        .iter()
        .filter_map(|(identifier, text)| snapshot.compare_and_update(identifier, text))
        .collect();

    for change in &changes {
        info!(endpoint = %change.identifier, "Difference identified within {}", change.identifier);
    }

    if changes.is_empty() {
        info!(
            responses = fetched.len(),
            "No differences identified for {} responses",
            fetched.len()
        );
    } else {
        info!(
            differences = changes.len(),
            responses = fetched.len(),
            "{} differences identified across {} responses",
            changes.len(),
            fetched.len()
        );
    }

    changes
}
