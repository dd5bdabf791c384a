//! Schema Nodes
//!
//! Every JSON Schema object loaded by the transformer, root or nested, is
//! interned once in a [`SchemaStore`] and addressed by a [`NodeId`]. Nodes keep
//! only the keywords the class model needs; `$ref` and `$dynamicRef` targets
//! are resolved statically when the store is built.

pub mod loader;
pub mod store;

pub use loader::{LoadedSchemas, SchemaLoader};
pub use store::SchemaStore;

use std::collections::BTreeMap;
use std::fmt;

use url::Url;

/// Arena index of a schema node inside a [`SchemaStore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single parsed JSON Schema object
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub id: NodeId,
    /// `title`
    pub title: Option<String>,
    /// `description`
    pub description: Option<String>,
    /// `type`, normalized to a list
    pub types: Vec<String>,
    /// `format`
    pub format: Option<String>,
    /// `properties`, ordered by name
    pub properties: BTreeMap<String, NodeId>,
    /// `items` (object form only)
    pub items: Option<NodeId>,
    /// `oneOf` branches in declaration order
    pub one_of: Vec<NodeId>,
    /// `$ref` as written
    pub reference: Option<String>,
    /// `$dynamicRef` as written
    pub dynamic_reference: Option<String>,
    /// Target of `reference`, if it could be resolved
    pub resolved_ref: Option<NodeId>,
    /// Target of `dynamic_reference`, if it could be resolved
    pub resolved_dynamic_ref: Option<NodeId>,
    /// URI of the resource (document or embedded `$id`) this node belongs to
    pub document_uri: String,
    /// `document_uri#json-pointer`
    pub location: String,
    /// Base URI that relative references are resolved against
    pub(crate) base_uri: Url,
}

impl SchemaNode {
    /// True when the node carries a `$ref` or `$dynamicRef`
    pub fn has_reference(&self) -> bool {
        self.reference.is_some() || self.dynamic_reference.is_some()
    }

    /// Resolved `$ref` target, falling back to the `$dynamicRef` target
    pub fn resolved_target(&self) -> Option<NodeId> {
        self.resolved_ref.or(self.resolved_dynamic_ref)
    }

    /// First declared `type`, if any
    pub fn first_type(&self) -> Option<&str> {
        self.types.first().map(String::as_str)
    }
}
