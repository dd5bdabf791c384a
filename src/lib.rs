//! JSON Schema Transform
//!
//! Turns a set of JSON Schema documents into a class model (classes,
//! properties and relations) and renders it as a diagram.
//!
//! ## Pipeline
//!
//! ```text
//! *.json ──► SchemaLoader ──► SchemaStore ──► Parser ──► classes + relations ──► render
//!             (walkdir)      ($ref / $id)    (worklist,    (depth filtered)       (d2, json)
//!                                             DepthMap)
//! ```
//!
//! - Every input document and every document reached through `$ref` or
//!   `$dynamicRef` becomes one [`Class`], built exactly once.
//! - Property types are derived from `type`, `format`, `items` and `oneOf`,
//!   e.g. `string[date-time]`, `[]integer`, `oneOf[string,integer]`.
//! - With a depth limit, only classes within that many hops of an input
//!   document are kept.

pub mod config;
pub mod domain;
pub mod error;
pub mod parse;
pub mod render;
pub mod schema;

pub use config::TransformConfig;
pub use domain::{Class, ClassId, Property, Relation, Source};
pub use error::{Result, TransformError};
pub use parse::{DepthMap, ParseOutput, Parser, ParserBuilder};
pub use render::Format;
pub use schema::{LoadedSchemas, NodeId, SchemaLoader, SchemaStore};
