//! Process-lifetime memory of dispatched files.

use std::collections::HashSet;

/// Names already handed to the pipeline in this process.
///
/// Grows monotonically and is never persisted, so a restart reprocesses
/// anything still sitting in the inbox.
#[derive(Debug, Default)]
pub struct DedupTracker {
    seen: HashSet<String>,
}

impl DedupTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `name` was already marked.
    pub fn seen(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Remember `name`. Returns `false` if it was already known.
    pub fn mark(&mut self, name: &str) -> bool {
        self.seen.insert(name.to_string())
    }

    /// Number of names remembered.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been marked yet.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
