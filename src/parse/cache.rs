//! Tracks which schema documents have been queued or turned into classes

use std::collections::HashSet;

use crate::schema::NodeId;

/// Set of processed schema nodes (queued or done).
///
/// Nodes are keyed by their [`NodeId`]; the store interns one node per
/// document URI, so a document reached through different references is
/// recognised as the same entry. Append-only.
#[derive(Debug, Default)]
pub struct SchemaCache {
    processed: HashSet<NodeId>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a node as processed; returns false if it already was
    pub fn process(&mut self, schema: NodeId) -> bool {
        self.processed.insert(schema)
    }

    pub fn has_processed(&self, schema: NodeId) -> bool {
        self.processed.contains(&schema)
    }

    /// Processed nodes, in no particular order
    pub fn schemas(&self) -> Vec<NodeId> {
        self.processed.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.processed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }
}
