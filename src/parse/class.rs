//! Class construction
//!
//! Turns one schema document into a [`Class`], deriving a type string for
//! every property. References met on the way are handed to the
//! [`ReferenceTracker`].

use super::reference::{ReferenceKind, ReferenceTracker};
use crate::domain::{Class, ClassId, Property, Source};
use crate::error::{Result, TransformError};
use crate::schema::{NodeId, SchemaStore};

/// Builds classes from schema nodes
#[derive(Debug, Clone, Copy)]
pub struct ClassBuilder<'s> {
    store: &'s SchemaStore,
}

/// Type and docstring derived for one property schema
#[derive(Debug, Clone, PartialEq, Eq)]
struct Derived {
    type_name: String,
    docstring: String,
}

impl<'s> ClassBuilder<'s> {
    pub fn new(store: &'s SchemaStore) -> Self {
        Self { store }
    }

    /// Build the class for `schema`. Properties are visited by name.
    pub fn build(&self, tracker: &mut ReferenceTracker<'s>, id: ClassId, schema: NodeId) -> Result<Class> {
        let node = &self.store[schema];
        let name = node.title.clone().unwrap_or_default();

        let mut properties = Vec::with_capacity(node.properties.len());
        for (property, &value) in &node.properties {
            let mut path = Vec::new();
            let derived = self
                .derive(tracker, ReferenceKind::Ref, schema, property, value, &mut path)
                .map_err(|e| TransformError::Property {
                    property: property.clone(),
                    class: name.clone(),
                    source: Box::new(e),
                })?;

            properties.push(Property {
                name: property.clone(),
                type_name: derived.type_name,
                docstring: derived.docstring,
                owner: id,
            });
        }

        Ok(Class {
            id,
            name,
            docstring: node.description.clone().unwrap_or_default(),
            source: Source::default(),
            properties,
            schema,
        })
    }

    /// Derive the type of `value`, a property schema of `parent`.
    ///
    /// `path` holds the nodes currently being derived; a node met again is
    /// not descended into, which keeps self-referencing `items` finite.
    fn derive(
        &self,
        tracker: &mut ReferenceTracker<'s>,
        kind: ReferenceKind,
        parent: NodeId,
        property: &str,
        value: NodeId,
        path: &mut Vec<NodeId>,
    ) -> Result<Derived> {
        let mut node = &self.store[value];
        if node.has_reference() {
            let target = tracker.track(kind, property, parent, value)?;
            node = &self.store[target];
        }

        let mut type_name = node.first_type().unwrap_or_default().to_string();
        let docstring = node.description.clone().unwrap_or_default();

        if path.contains(&node.id) {
            return Ok(Derived { type_name, docstring });
        }
        path.push(node.id);

        let derived = if let Some(items) = node.items {
            let item = self.derive(tracker, kind, parent, property, items, path)?;
            Derived {
                type_name: format!("[]{}", item.type_name),
                docstring: item.docstring,
            }
        } else {
            if !node.one_of.is_empty() {
                let mut branches = Vec::with_capacity(node.one_of.len());
                for &branch in &node.one_of {
                    let derived = self.derive(tracker, ReferenceKind::OneOf, parent, property, branch, path)?;
                    branches.push(derived.type_name);
                }
                type_name = format!("oneOf[{}]", branches.join(","));
            }

            if let Some(format) = &node.format {
                if type_name.is_empty() {
                    type_name = format.clone();
                } else {
                    type_name = format!("{type_name}[{format}]");
                }
            }

            Derived { type_name, docstring }
        };

        path.pop();
        Ok(derived)
    }
}
