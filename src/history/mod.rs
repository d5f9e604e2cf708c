use serde::Serialize;
use std::collections::VecDeque;

pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// Bounded trail of recently visited paths, most recent last
///
/// Only consulted by the access guard to pick a redirect target on denial.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationHistory {
    entries: VecDeque<String>,
    #[serde(skip)]
    capacity: usize,
}

impl Default for NavigationHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl NavigationHistory {
    /// Capacity is clamped to at least one entry
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a visited path, skipping consecutive duplicates and evicting the oldest on overflow
    pub fn record(&mut self, path: impl Into<String>) {
        let path = path.into();

        if self.entries.back() == Some(&path) {
            return;
        }

        self.entries.push_back(path);
        while self.entries.len() > self.capacity {
            if let Some(evicted) = self.entries.pop_front() {
                tracing::trace!("History evicted {}", evicted);
            }
        }
    }

    /// Second-to-last entry, if any
    pub fn previous(&self) -> Option<&str> {
        let len = self.entries.len();
        if len < 2 {
            return None;
        }
        self.entries.get(len - 2).map(String::as_str)
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
