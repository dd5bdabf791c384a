//! Schema to Class Parsing
//!
//! A [`Parser`] turns loaded schemas into [`Class`]es and [`Relation`]s:
//!
//! - every root document and every document reached through a `$ref` becomes
//!   one class, each built exactly once
//! - every followed reference becomes an `associates` relation
//! - with a depth limit, classes further than the limit from all roots are
//!   dropped together with their relations
//!
//! Parsing runs once per `Parser`; later calls return the memoized output.
//!
//! ```no_run
//! use jsonschema_transform::{Parser, SchemaLoader};
//!
//! let loaded = SchemaLoader::new().load_paths(&["schemas/"])?;
//! let parser = Parser::builder().depth(1).build(loaded);
//! for class in parser.classes()? {
//!     println!("{} ({} properties)", class.name, class.properties.len());
//! }
//! # Ok::<(), jsonschema_transform::TransformError>(())
//! ```

pub mod cache;
pub mod class;
pub mod depth;
pub mod reference;
pub mod relation;

pub use cache::SchemaCache;
pub use class::ClassBuilder;
pub use depth::DepthMap;
pub use reference::{Reference, ReferenceKind, ReferenceTracker};
pub use relation::RelationResolver;

use std::cell::OnceCell;
use std::collections::HashSet;

use tracing::{debug, info};

use crate::domain::{Class, ClassId, Relation, Source};
use crate::error::Result;
use crate::schema::{LoadedSchemas, NodeId, SchemaStore};

/// Everything one parse produced
#[derive(Debug, Clone)]
pub struct ParseOutput {
    /// Classes in discovery order (after depth filtering, if enabled)
    pub classes: Vec<Class>,
    pub relations: Vec<Relation>,
    /// References followed while building classes, before filtering
    pub references: Vec<Reference>,
    /// Depths of every class reachable from a root; only computed with a depth limit
    pub depth_map: Option<DepthMap>,
}

impl ParseOutput {
    pub fn class(&self, id: ClassId) -> Option<&Class> {
        self.classes.iter().find(|c| c.id == id)
    }

    pub fn class_named(&self, name: &str) -> Option<&Class> {
        self.classes.iter().find(|c| c.name == name)
    }
}

/// Builder for [`Parser`]; configuration is fixed once the parser exists
#[derive(Debug, Clone)]
pub struct ParserBuilder {
    base_uri: Option<String>,
    depth: i64,
}

impl Default for ParserBuilder {
    fn default() -> Self {
        Self {
            base_uri: None,
            depth: -1,
        }
    }
}

impl ParserBuilder {
    /// Prefix for class sources; file sources lose their `file://` scheme
    pub fn base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = Some(base_uri.into());
        self
    }

    /// Maximum distance from a root class; negative disables filtering
    pub fn depth(mut self, depth: i64) -> Self {
        self.depth = depth;
        self
    }

    pub fn build(self, loaded: LoadedSchemas) -> Parser {
        Parser {
            store: loaded.store,
            roots: loaded.roots,
            base_uri: self.base_uri.filter(|b| !b.is_empty()),
            depth: usize::try_from(self.depth).ok(),
            output: OnceCell::new(),
        }
    }
}

/// Parses loaded schemas into classes and relations
#[derive(Debug)]
pub struct Parser {
    store: SchemaStore,
    roots: Vec<NodeId>,
    base_uri: Option<String>,
    depth: Option<usize>,
    output: OnceCell<ParseOutput>,
}

impl Parser {
    pub fn builder() -> ParserBuilder {
        ParserBuilder::default()
    }

    /// Parser without base URI or depth limit
    pub fn new(loaded: LoadedSchemas) -> Self {
        Self::builder().build(loaded)
    }

    pub fn classes(&self) -> Result<&[Class]> {
        Ok(&self.output()?.classes)
    }

    pub fn relations(&self) -> Result<&[Relation]> {
        Ok(&self.output()?.relations)
    }

    /// Depths used for filtering, `None` when no depth limit is set
    pub fn depth_map(&self) -> Result<Option<&DepthMap>> {
        Ok(self.output()?.depth_map.as_ref())
    }

    /// Parse on first call; an error leaves nothing memoized
    pub fn output(&self) -> Result<&ParseOutput> {
        if let Some(output) = self.output.get() {
            return Ok(output);
        }

        let output = ParseSession::new(self).run()?;
        Ok(self.output.get_or_init(|| output))
    }

    pub fn store(&self) -> &SchemaStore {
        &self.store
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn depth(&self) -> Option<usize> {
        self.depth
    }
}

/// State of a single parse
struct ParseSession<'p> {
    parser: &'p Parser,
    tracker: ReferenceTracker<'p>,
    classes: Vec<Class>,
}

impl<'p> ParseSession<'p> {
    fn new(parser: &'p Parser) -> Self {
        Self {
            parser,
            tracker: ReferenceTracker::new(&parser.store),
            classes: Vec::new(),
        }
    }

    fn run(mut self) -> Result<ParseOutput> {
        let parser = self.parser;
        let store = &parser.store;
        let builder = ClassBuilder::new(store);

        for &root in &parser.roots {
            self.tracker.enqueue(root);
        }

        while let Some(schema) = self.tracker.dequeue() {
            let id = ClassId(self.classes.len());
            let mut class = builder.build(&mut self.tracker, id, schema)?;
            class.source = Source::new(self.source_path(&store[schema].document_uri));
            debug!(class = %class.name, id = %id, "built class");
            self.classes.push(class);
        }

        let references = self.tracker.into_references();
        let relations = RelationResolver::new(store, &self.classes).resolve(&references)?;

        let Some(limit) = parser.depth else {
            info!(classes = self.classes.len(), relations = relations.len(), "parsed schemas");
            return Ok(ParseOutput {
                classes: self.classes,
                relations,
                references,
                depth_map: None,
            });
        };

        let roots: Vec<ClassId> = self
            .classes
            .iter()
            .filter(|c| parser.roots.contains(&c.schema))
            .map(|c| c.id)
            .collect();
        let depth_map = DepthMap::compute(&roots, &self.classes, &relations);

        let (kept, dropped): (Vec<Class>, Vec<Class>) = self
            .classes
            .into_iter()
            .partition(|c| depth_map.within(c.id, limit));
        let pruned: HashSet<NodeId> = dropped.iter().map(|c| c.schema).collect();

        let relations = RelationResolver::new(store, &kept)
            .excusing(&pruned)
            .resolve(&references)?;

        info!(
            classes = kept.len(),
            relations = relations.len(),
            filtered = dropped.len(),
            depth = limit,
            "parsed schemas"
        );

        Ok(ParseOutput {
            classes: kept,
            relations,
            references,
            depth_map: Some(depth_map),
        })
    }

    /// Source of a class: its document URI, rebased onto the base URI if one is set
    fn source_path(&self, document_uri: &str) -> String {
        match &self.parser.base_uri {
            Some(base) => format!("{base}{}", strip_file_scheme(document_uri)),
            None => document_uri.to_string(),
        }
    }
}

/// `file:///a/b.json` -> `/a/b.json`; other URIs are returned unchanged
fn strip_file_scheme(uri: &str) -> &str {
    let Some(rest) = uri.strip_prefix("file:") else {
        return uri;
    };

    let slashes = rest.len() - rest.trim_start_matches('/').len();
    if slashes == 0 {
        return uri;
    }
    &rest[slashes.min(3) - 1..]
}
