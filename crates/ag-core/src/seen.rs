//! Run-scoped record of source identifiers already processed.

use std::collections::HashSet;

use crate::types::SourceId;

/// Append-only set of identifiers seen during one aggregation run.
///
/// Owned by the aggregator; a fresh set is created for every run and never
/// persisted.
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<SourceId>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `id` has already been marked.
    pub fn seen(&self, id: &SourceId) -> bool {
        self.ids.contains(id)
    }

    /// Marks `id` and reports whether this is its first sighting.
    pub fn test_and_set(&mut self, id: &SourceId) -> bool {
        self.ids.insert(id.clone())
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
