//! Diagram Output
//!
//! Renders parsed classes and relations:
//! - `d2`: D2 diagram script
//! - `json`: the class model as pretty-printed JSON

pub mod d2;

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::domain::{Class, Relation};
use crate::error::{Result, TransformError};

/// Output format, chosen from the output file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    D2,
    Json,
}

impl Format {
    /// Format for `path`; a bare extension such as `d2` is accepted too
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = match path.extension() {
            Some(ext) => ext.to_string_lossy().into_owned(),
            None => path.to_string_lossy().into_owned(),
        };

        match extension.as_str() {
            "d2" => Ok(Format::D2),
            "json" => Ok(Format::Json),
            _ => Err(TransformError::UnknownFormat(path.display().to_string())),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Format::D2 => "d2",
            Format::Json => "json",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Serialize)]
struct Document<'a> {
    classes: &'a [Class],
    relations: &'a [Relation],
}

/// Render `classes` and `relations` in `format`
pub fn render(format: Format, classes: &[Class], relations: &[Relation]) -> Result<String> {
    match format {
        Format::D2 => Ok(d2::render(classes, relations)),
        Format::Json => Ok(serde_json::to_string_pretty(&Document { classes, relations })?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClassId, Property, Source};
    use crate::schema::NodeId;

    #[test]
    fn test_format_from_path() {
        assert_eq!(Format::from_path("diagram.d2").unwrap(), Format::D2);
        assert_eq!(Format::from_path("out/model.json").unwrap(), Format::Json);
        assert_eq!(Format::from_path("d2").unwrap(), Format::D2);
        assert!(matches!(Format::from_path("diagram.svg"), Err(TransformError::UnknownFormat(_))));
        assert!(matches!(Format::from_path("diagram"), Err(TransformError::UnknownFormat(_))));
    }

    #[test]
    fn test_json_output() {
        let classes = vec![Class {
            id: ClassId(0),
            name: "Pet".to_string(),
            docstring: "A pet".to_string(),
            source: Source::new("file:///pet.json"),
            properties: vec![Property {
                name: "name".to_string(),
                type_name: "string".to_string(),
                docstring: String::new(),
                owner: ClassId(0),
            }],
            schema: NodeId(0),
        }];
        let mut relation = Relation::associates(ClassId(0), ClassId(0));
        relation.from_property = Some("parent".to_string());

        let output = render(Format::Json, &classes, &[relation]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["classes"][0]["name"], "Pet");
        assert_eq!(value["classes"][0]["source"]["path"], "file:///pet.json");
        assert_eq!(value["classes"][0]["properties"][0]["type"], "string");
        assert_eq!(value["relations"][0]["type"], "associates");
        assert_eq!(value["relations"][0]["from_property"], "parent");
        assert!(value["relations"][0].get("to_property").is_none());
        assert!(value["classes"][0].get("schema").is_none());
    }
}
