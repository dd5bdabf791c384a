//! Schema Store
//!
//! Interns JSON Schema documents into an arena of [`SchemaNode`]s, indexes
//! them by document URI, JSON pointer and anchor, and resolves `$ref` /
//! `$dynamicRef` targets. A document URI maps to exactly one root node, so a
//! document reached through two different references is still one node.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::ops::Index;

use percent_encoding::percent_decode_str;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::{NodeId, SchemaNode};
use crate::error::{Result, TransformError};

/// Keywords whose value is a single subschema
const SUBSCHEMA_KEYWORDS: &[&str] = &[
    "additionalProperties",
    "not",
    "contains",
    "if",
    "then",
    "else",
    "propertyNames",
    "unevaluatedItems",
    "unevaluatedProperties",
];

/// Keywords whose value is a list of subschemas (`oneOf` is kept on the node)
const SUBSCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "prefixItems"];

/// Keywords whose value maps names to subschemas (`properties` is kept on the node)
const SUBSCHEMA_MAP_KEYWORDS: &[&str] = &["$defs", "definitions", "patternProperties", "dependentSchemas"];

/// Arena of every schema node loaded for one transform run
#[derive(Debug, Default)]
pub struct SchemaStore {
    nodes: Vec<SchemaNode>,

    /// Index: canonical document URI -> resource root
    documents: HashMap<String, NodeId>,

    /// Index: retrieval URI -> canonical document URI (when `$id` differs)
    aliases: HashMap<String, String>,

    /// Index: `document#/json/pointer` -> node
    pointers: HashMap<String, NodeId>,

    /// Index: `document#anchor` -> node (`$anchor` and `$dynamicAnchor`)
    anchors: HashMap<String, NodeId>,

    /// Documents a fetch already failed for
    unavailable: HashSet<String>,
}

impl SchemaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of interned nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.0)
    }

    /// Intern a document retrieved from `uri`
    pub fn add_document(&mut self, uri: Url, json: &Value) -> Result<NodeId> {
        self.add_document_with_base(uri, None, json)
    }

    /// Intern a document retrieved from `uri`, resolving a root `$id` against
    /// `id_base` when one is given.
    ///
    /// Adding a URI that is already loaded returns the existing root.
    pub fn add_document_with_base(
        &mut self,
        uri: Url,
        id_base: Option<&Url>,
        json: &Value,
    ) -> Result<NodeId> {
        let retrieval = without_fragment(uri);
        let key = retrieval.to_string();
        if let Some(existing) = self.document(&key) {
            return Ok(existing);
        }

        let declares_id = json.get("$id").and_then(Value::as_str).is_some();
        let base = match id_base {
            Some(id_base) if declares_id => id_base.clone(),
            _ => retrieval.clone(),
        };

        let mark = self.nodes.len();
        let scopes = [Scope::root(&key)];
        let root = match self.intern(json, &base, &scopes) {
            Ok(root) => root,
            Err(e) => {
                self.rollback(mark);
                return Err(e);
            }
        };
        let canonical = self.nodes[root.0].document_uri.clone();
        if canonical != key {
            if let Some(&other) = self.documents.get(&canonical) {
                if other != root {
                    warn!(id = %canonical, file = %key, "duplicate $id, keeping the first document");
                }
            }
            self.aliases.insert(key.clone(), canonical);
        }
        self.documents.entry(key).or_insert(root);

        Ok(root)
    }

    /// Look up a document root by URI; any fragment is ignored
    pub fn document(&self, uri: &str) -> Option<NodeId> {
        let key = uri.split('#').next().unwrap_or(uri);
        self.documents.get(self.canonical_key(key)).copied()
    }

    /// Root of the resource `id` belongs to
    pub fn owning_document(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| self.document(&node.document_uri))
    }

    /// Find the node an absolute URI points at (`#/pointer`, `#anchor` or none)
    pub fn lookup(&self, target: &Url) -> Option<NodeId> {
        let key = without_fragment(target.clone()).to_string();
        let document = self.canonical_key(&key);

        let fragment = target.fragment().map(|f| percent_decode_str(f).decode_utf8_lossy());
        match fragment.as_deref() {
            None | Some("") => self.documents.get(document).copied(),
            Some(pointer) if pointer.starts_with('/') => {
                self.pointers.get(&format!("{document}#{pointer}")).copied()
            }
            Some(anchor) => self.anchors.get(&format!("{document}#{anchor}")).copied(),
        }
    }

    /// Resolve every `$ref` and `$dynamicRef` in the store.
    ///
    /// Targets in documents that are not loaded yet are requested from
    /// `fetch`; fetched documents are interned and resolved in turn. A
    /// reference that cannot be resolved, or is not a valid URI reference,
    /// keeps `None` as its target.
    pub fn resolve_references<F>(&mut self, mut fetch: F)
    where
        F: FnMut(&Url) -> Option<Value>,
    {
        let mut index = 0;
        while index < self.nodes.len() {
            let node = &self.nodes[index];
            let base = node.base_uri.clone();
            let reference = node.reference.clone();
            let dynamic_reference = node.dynamic_reference.clone();

            if let Some(reference) = reference {
                let target = self.find_or_fetch(&base, &reference, &mut fetch);
                self.nodes[index].resolved_ref = target;
            }

            // $dynamicRef is resolved statically, like a $ref to its anchor
            if let Some(reference) = dynamic_reference {
                let target = self.find_or_fetch(&base, &reference, &mut fetch);
                self.nodes[index].resolved_dynamic_ref = target;
            }

            index += 1;
        }
    }

    fn find_or_fetch<F>(&mut self, base: &Url, reference: &str, fetch: &mut F) -> Option<NodeId>
    where
        F: FnMut(&Url) -> Option<Value>,
    {
        let target = match join(base, reference) {
            Ok(target) => target,
            Err(e) => {
                debug!(reference, base = %base, "unresolvable reference: {e}");
                return None;
            }
        };
        if let Some(id) = self.lookup(&target) {
            return Some(id);
        }

        let document = without_fragment(target.clone());
        let key = document.to_string();
        if self.document(&key).is_some() || self.unavailable.contains(&key) {
            debug!(reference, target = %target, "reference target not found");
            return None;
        }

        let Some(json) = fetch(&document) else {
            self.unavailable.insert(key);
            return None;
        };

        debug!(document = %key, "loading referenced document");
        if let Err(e) = self.add_document(document, &json) {
            warn!("could not load referenced document {key}: {e}");
            self.unavailable.insert(key);
            return None;
        }
        self.lookup(&target)
    }

    /// Forget every node interned from `mark` on
    fn rollback(&mut self, mark: usize) {
        self.nodes.truncate(mark);
        self.documents.retain(|_, id| id.0 < mark);
        self.pointers.retain(|_, id| id.0 < mark);
        self.anchors.retain(|_, id| id.0 < mark);
    }

    fn canonical_key<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Intern `json` and its subschemas.
    ///
    /// `scopes` lists every resource the node is addressable from, innermost
    /// last. A subschema declaring `$id` opens a new resource but stays
    /// reachable by pointer from the documents enclosing it.
    fn intern(&mut self, json: &Value, base: &Url, scopes: &[Scope]) -> Result<NodeId> {
        let id = NodeId(self.nodes.len());
        let object = json.as_object();

        let mut scopes = scopes.to_vec();
        let base = match object.and_then(|o| o.get("$id")).and_then(Value::as_str) {
            Some(declared) => {
                let resource = without_fragment(join(base, declared)?);
                let key = resource.to_string();
                self.documents.entry(key.clone()).or_insert(id);
                scopes.push(Scope::root(&key));
                resource
            }
            None => base.clone(),
        };

        for scope in &scopes {
            self.pointers.entry(scope.to_string()).or_insert(id);
        }
        let Some(innermost) = scopes.last() else {
            return Err(TransformError::MissingDocument { uri: base.to_string() });
        };
        let document_uri = innermost.document.clone();
        let location = innermost.to_string();

        let text = |key: &str| object.and_then(|o| o.get(key)).and_then(Value::as_str).map(String::from);

        for keyword in ["$anchor", "$dynamicAnchor"] {
            if let Some(anchor) = text(keyword) {
                self.anchors.entry(format!("{document_uri}#{anchor}")).or_insert(id);
            }
        }

        let types = match object.and_then(|o| o.get("type")) {
            Some(Value::String(ty)) => vec![ty.clone()],
            Some(Value::Array(types)) => types.iter().filter_map(Value::as_str).map(String::from).collect(),
            _ => Vec::new(),
        };

        self.nodes.push(SchemaNode {
            id,
            title: text("title"),
            description: text("description"),
            types,
            format: text("format"),
            properties: BTreeMap::new(),
            items: None,
            one_of: Vec::new(),
            reference: text("$ref"),
            dynamic_reference: text("$dynamicRef"),
            resolved_ref: None,
            resolved_dynamic_ref: None,
            document_uri,
            location,
            base_uri: base.clone(),
        });

        let Some(object) = object else {
            return Ok(id);
        };

        let nested = |suffix: &str| scopes.iter().map(|s| s.child(suffix)).collect::<Vec<_>>();

        let mut properties = BTreeMap::new();
        if let Some(props) = object.get("properties").and_then(Value::as_object) {
            for (name, value) in props {
                let child = nested(&format!("/properties/{}", escape(name)));
                properties.insert(name.clone(), self.intern(value, &base, &child)?);
            }
        }

        let items = match object.get("items") {
            Some(value @ Value::Object(_)) => Some(self.intern(value, &base, &nested("/items"))?),
            Some(Value::Array(tuple)) => {
                for (i, value) in tuple.iter().enumerate() {
                    self.intern(value, &base, &nested(&format!("/items/{i}")))?;
                }
                None
            }
            _ => None,
        };

        let mut one_of = Vec::new();
        if let Some(branches) = object.get("oneOf").and_then(Value::as_array) {
            for (i, value) in branches.iter().enumerate() {
                one_of.push(self.intern(value, &base, &nested(&format!("/oneOf/{i}")))?);
            }
        }

        // The remaining subschemas are only interned so references can reach them
        for keyword in SUBSCHEMA_KEYWORDS {
            if let Some(value @ Value::Object(_)) = object.get(*keyword) {
                self.intern(value, &base, &nested(&format!("/{}", escape(keyword))))?;
            }
        }
        for keyword in SUBSCHEMA_LIST_KEYWORDS {
            if let Some(list) = object.get(*keyword).and_then(Value::as_array) {
                for (i, value) in list.iter().enumerate() {
                    self.intern(value, &base, &nested(&format!("/{keyword}/{i}")))?;
                }
            }
        }
        for keyword in SUBSCHEMA_MAP_KEYWORDS {
            if let Some(map) = object.get(*keyword).and_then(Value::as_object) {
                for (name, value) in map {
                    let child = nested(&format!("/{}/{}", escape(keyword), escape(name)));
                    self.intern(value, &base, &child)?;
                }
            }
        }

        let node = &mut self.nodes[id.0];
        node.properties = properties;
        node.items = items;
        node.one_of = one_of;

        Ok(id)
    }
}

/// A resource a node is addressable from, and its JSON pointer there
#[derive(Debug, Clone)]
struct Scope {
    document: String,
    pointer: String,
}

impl Scope {
    fn root(document: &str) -> Self {
        Self {
            document: document.to_string(),
            pointer: String::new(),
        }
    }

    fn child(&self, suffix: &str) -> Self {
        Self {
            document: self.document.clone(),
            pointer: format!("{}{suffix}", self.pointer),
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.document, self.pointer)
    }
}

impl Index<NodeId> for SchemaStore {
    type Output = SchemaNode;

    fn index(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }
}

fn join(base: &Url, reference: &str) -> Result<Url> {
    base.join(reference).map_err(|source| TransformError::InvalidUri {
        uri: reference.to_string(),
        source,
    })
}

fn without_fragment(mut uri: Url) -> Url {
    uri.set_fragment(None);
    uri
}

/// Escape a JSON pointer reference token (RFC 6901)
fn escape(token: &str) -> String {
    token.replace('~', "~0").replace('/', "~1")
}
