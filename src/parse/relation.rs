//! Turns [`Reference`]s between schema documents into [`Relation`]s between classes

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::reference::Reference;
use crate::domain::{Class, ClassId, Relation};
use crate::error::{Result, TransformError};
use crate::schema::{NodeId, SchemaStore};

/// Matches reference endpoints to the classes built from them
#[derive(Debug)]
pub struct RelationResolver<'a> {
    store: &'a SchemaStore,
    by_schema: HashMap<NodeId, ClassId>,
    /// Documents whose classes were removed by depth filtering
    pruned: Option<&'a HashSet<NodeId>>,
}

impl<'a> RelationResolver<'a> {
    pub fn new(store: &'a SchemaStore, classes: &[Class]) -> Self {
        Self {
            store,
            by_schema: classes.iter().map(|c| (c.schema, c.id)).collect(),
            pruned: None,
        }
    }

    /// Drop references into or out of `pruned` documents instead of failing
    pub fn excusing(mut self, pruned: &'a HashSet<NodeId>) -> Self {
        self.pruned = Some(pruned);
        self
    }

    /// One `associates` relation per reference, in reference order
    pub fn resolve(&self, references: &[Reference]) -> Result<Vec<Relation>> {
        let mut relations = Vec::with_capacity(references.len());

        for reference in references {
            let from = self.by_schema.get(&reference.from_parent);
            let to = self.by_schema.get(&reference.to_parent);

            let (Some(&from), Some(&to)) = (from, to) else {
                if self.is_excused(reference, from.is_none(), to.is_none()) {
                    debug!(
                        from = %self.store[reference.from_parent].document_uri,
                        to = %self.store[reference.to_parent].document_uri,
                        "dropping relation to filtered class"
                    );
                    continue;
                }

                return Err(TransformError::MissingRelationEndpoint {
                    from: self.store[reference.from_parent].document_uri.clone(),
                    reference: self.reference_text(reference),
                    to: self.store[reference.to_parent].document_uri.clone(),
                });
            };

            let mut relation = Relation::associates(from, to);
            relation.from_property = Some(reference.property.clone());
            relations.push(relation);
        }

        Ok(relations)
    }

    /// Every missing endpoint must have been pruned
    fn is_excused(&self, reference: &Reference, from_missing: bool, to_missing: bool) -> bool {
        let Some(pruned) = self.pruned else {
            return false;
        };

        (!from_missing || pruned.contains(&reference.from_parent))
            && (!to_missing || pruned.contains(&reference.to_parent))
    }

    fn reference_text(&self, reference: &Reference) -> String {
        let node = &self.store[reference.from];
        node.reference
            .clone()
            .or_else(|| node.dynamic_reference.clone())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Source, ASSOCIATES};
    use crate::parse::reference::ReferenceKind;
    use serde_json::json;
    use url::Url;

    struct Fixture {
        store: SchemaStore,
        a: NodeId,
        b: NodeId,
        reference: Reference,
    }

    fn fixture() -> Fixture {
        let mut store = SchemaStore::new();
        let a = store
            .add_document(
                Url::parse("file:///a.json").unwrap(),
                &json!({ "properties": { "b": { "$ref": "b.json" } } }),
            )
            .unwrap();
        let b = store.add_document(Url::parse("file:///b.json").unwrap(), &json!({})).unwrap();
        store.resolve_references(|_| None);

        let reference = Reference {
            kind: ReferenceKind::Ref,
            from: store[a].properties["b"],
            from_parent: a,
            to: b,
            to_parent: b,
            property: "b".to_string(),
        };
        Fixture { store, a, b, reference }
    }

    fn class(id: usize, schema: NodeId) -> Class {
        Class {
            id: ClassId(id),
            name: String::new(),
            docstring: String::new(),
            source: Source::default(),
            properties: Vec::new(),
            schema,
        }
    }

    #[test]
    fn test_resolves_associates_relation() {
        let f = fixture();
        let classes = vec![class(0, f.a), class(1, f.b)];

        let relations = RelationResolver::new(&f.store, &classes)
            .resolve(&[f.reference.clone()])
            .unwrap();

        assert_eq!(relations.len(), 1);
        assert_eq!(relations[0].kind, ASSOCIATES);
        assert_eq!(relations[0].from, ClassId(0));
        assert_eq!(relations[0].to, ClassId(1));
        assert_eq!(relations[0].from_property.as_deref(), Some("b"));
        assert_eq!(relations[0].to_property, None);
    }

    #[test]
    fn test_missing_endpoint_is_an_error() {
        let f = fixture();
        let classes = vec![class(0, f.a)];

        let err = RelationResolver::new(&f.store, &classes)
            .resolve(&[f.reference.clone()])
            .unwrap_err();

        match err {
            TransformError::MissingRelationEndpoint { from, reference, to } => {
                assert_eq!(from, "file:///a.json");
                assert_eq!(reference, "b.json");
                assert_eq!(to, "file:///b.json");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_pruned_endpoint_is_dropped() {
        let f = fixture();
        let classes = vec![class(0, f.a)];
        let pruned = HashSet::from([f.b]);

        let relations = RelationResolver::new(&f.store, &classes)
            .excusing(&pruned)
            .resolve(&[f.reference.clone()])
            .unwrap();
        assert!(relations.is_empty());
    }

    #[test]
    fn test_unpruned_missing_endpoint_fails_even_when_filtering() {
        let f = fixture();
        let classes = vec![class(0, f.a)];
        let pruned = HashSet::new();

        let err = RelationResolver::new(&f.store, &classes)
            .excusing(&pruned)
            .resolve(&[f.reference.clone()])
            .unwrap_err();
        assert!(matches!(err, TransformError::MissingRelationEndpoint { .. }));
    }
}
