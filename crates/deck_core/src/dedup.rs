use std::collections::HashSet;

/// Run-scoped record of canonical download URLs already retrieved.
///
/// Created fresh for every run and dropped with it; nothing is persisted.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<String>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Test-and-mark in one step: returns `true` the first time `url` is offered
    /// and records it, `false` for every later offer.
    pub fn should_retrieve(&mut self, url: &str) -> bool {
        if self.seen.contains(url) {
            return false;
        }
        self.seen.insert(url.to_string())
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
