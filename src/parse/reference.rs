//! References between schemas
//!
//! A [`Reference`] is recorded whenever type derivation follows a `$ref` or
//! `$dynamicRef`. The [`ReferenceTracker`] also owns the worklist: the first
//! time a referenced document is seen it is queued for class construction.

use std::collections::VecDeque;
use std::fmt;

use tracing::debug;

use super::cache::SchemaCache;
use crate::error::{Result, TransformError};
use crate::schema::{NodeId, SchemaStore};

/// How a reference was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// Plain `$ref` / `$dynamicRef`
    Ref,
    /// Inside a `oneOf` branch
    OneOf,
    AllOf,
    AnyOf,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keyword = match self {
            Self::Ref => "$ref",
            Self::OneOf => "oneOf",
            Self::AllOf => "allOf",
            Self::AnyOf => "anyOf",
        };
        f.write_str(keyword)
    }
}

/// Edge between two schemas, before classes are matched up
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub kind: ReferenceKind,
    /// Schema holding the `$ref`
    pub from: NodeId,
    /// Document being turned into a class when the reference was found
    pub from_parent: NodeId,
    /// Resolved target
    pub to: NodeId,
    /// Document owning the target
    pub to_parent: NodeId,
    /// Property whose type derivation found the reference
    pub property: String,
}

/// Resolves references met during class construction and queues their documents
#[derive(Debug)]
pub struct ReferenceTracker<'s> {
    store: &'s SchemaStore,
    cache: SchemaCache,
    queue: VecDeque<NodeId>,
    references: Vec<Reference>,
}

impl<'s> ReferenceTracker<'s> {
    pub fn new(store: &'s SchemaStore) -> Self {
        Self {
            store,
            cache: SchemaCache::new(),
            queue: VecDeque::new(),
            references: Vec::new(),
        }
    }

    /// Queue a document unless it was queued before
    pub fn enqueue(&mut self, schema: NodeId) -> bool {
        if !self.cache.process(schema) {
            return false;
        }

        debug!(document = %self.store[schema].document_uri, "queued");
        self.queue.push_back(schema);
        true
    }

    /// Next document to build, first in first out
    pub fn dequeue(&mut self) -> Option<NodeId> {
        self.queue.pop_front()
    }

    /// Follow the `$ref`/`$dynamicRef` of `value`, a schema found while
    /// building `parent`, and return the node it resolves to.
    pub fn track(
        &mut self,
        kind: ReferenceKind,
        property: &str,
        parent: NodeId,
        value: NodeId,
    ) -> Result<NodeId> {
        let store = self.store;
        let node = &store[value];
        let Some(target) = node.resolved_target() else {
            return Err(TransformError::UnknownSchema {
                reference: node.reference.clone().unwrap_or_default(),
                dynamic_reference: node.dynamic_reference.clone().unwrap_or_default(),
            });
        };

        let uri = &store[target].document_uri;
        let Some(target_parent) = store.document(uri) else {
            return Err(TransformError::MissingDocument { uri: uri.clone() });
        };

        self.enqueue(target_parent);

        self.references.push(Reference {
            kind,
            from: value,
            from_parent: parent,
            to: target,
            to_parent: target_parent,
            property: property.to_string(),
        });

        Ok(target)
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    pub fn references(&self) -> &[Reference] {
        &self.references
    }

    pub fn into_references(self) -> Vec<Reference> {
        self.references
    }
}
