//! Class model consumed by renderers
//!
//! Classes, their properties and the relations between them. Properties and
//! relations refer to classes by [`ClassId`] rather than holding pointers.

use std::fmt;

use serde::Serialize;

use crate::schema::NodeId;

/// Label every relation currently carries
pub const ASSOCIATES: &str = "associates";

/// Identity of a class: its position in discovery order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ClassId(pub usize);

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "class:{}", self.0)
    }
}

/// Where a class was parsed from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Source {
    pub path: String,
}

impl Source {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

/// A class derived from one schema document
#[derive(Debug, Clone, Serialize)]
pub struct Class {
    pub id: ClassId,
    /// `title` of the schema, empty if absent
    pub name: String,
    /// `description` of the schema, empty if absent
    pub docstring: String,
    pub source: Source,
    /// Properties ordered by name
    pub properties: Vec<Property>,
    /// Schema node the class was built from
    #[serde(skip)]
    pub schema: NodeId,
}

impl Class {
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// A named, typed member of a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Property {
    pub name: String,
    /// Derived type, e.g. `string[date-time]`, `[]integer`, `oneOf[string,integer]`
    #[serde(rename = "type")]
    pub type_name: String,
    pub docstring: String,
    pub owner: ClassId,
}

/// A directed edge between two classes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    /// Free-form label; currently always [`ASSOCIATES`]
    #[serde(rename = "type")]
    pub kind: String,
    pub from: ClassId,
    pub to: ClassId,
    /// Property of `from` the relation originates from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_property: Option<String>,
    /// Property of `to` the relation points at
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_property: Option<String>,
}

impl Relation {
    pub fn associates(from: ClassId, to: ClassId) -> Self {
        Self {
            kind: ASSOCIATES.to_string(),
            from,
            to,
            from_property: None,
            to_property: None,
        }
    }
}
