//! D2 Emitter
//!
//! Renders classes as D2 `shape: class` blocks and relations as
//! `From -- To: label` connections. Class names that are not plain
//! identifiers are quoted; an untitled class is keyed by its id.

use std::collections::HashMap;

use crate::domain::{Class, ClassId, Relation};

// =============================================================================
// Public API
// =============================================================================

/// Render a complete D2 script
pub fn render(classes: &[Class], relations: &[Relation]) -> String {
    let mut output = String::new();

    for class in classes {
        output.push_str(&emit_class(class));
        output.push('\n');
    }

    let names: HashMap<ClassId, String> = classes.iter().map(|c| (c.id, key_of(c))).collect();
    let lines: Vec<String> = relations.iter().map(|r| emit_relation(r, &names)).collect();
    output.push_str(&lines.join("\n"));

    output
}

// =============================================================================
// Emission
// =============================================================================

fn emit_class(class: &Class) -> String {
    let mut output = String::new();

    output.push_str(&format!("{}: {{\n", key_of(class)));
    output.push_str("  shape: class\n");
    for property in &class.properties {
        output.push_str(&format!("  {}: {}\n", quote(&property.name), quote(&property.type_name)));
    }
    output.push_str("}\n");

    output
}

fn emit_relation(relation: &Relation, names: &HashMap<ClassId, String>) -> String {
    format!(
        "{} -- {}: {}",
        name_of(relation.from, names),
        name_of(relation.to, names),
        relation.kind
    )
}

fn name_of(id: ClassId, names: &HashMap<ClassId, String>) -> String {
    names.get(&id).cloned().unwrap_or_else(|| quote_key(&id.to_string()))
}

fn key_of(class: &Class) -> String {
    if class.name.is_empty() {
        quote_key(&class.id.to_string())
    } else {
        quote_key(&class.name)
    }
}

/// Bare identifiers stay as they are, anything else is quoted
fn quote_key(key: &str) -> String {
    if !key.is_empty() && key.chars().all(|c| c.is_alphanumeric() || c == '_') {
        key.to_string()
    } else {
        quote(key)
    }
}

fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Property, Source};
    use crate::schema::NodeId;

    fn class(id: usize, name: &str, properties: &[(&str, &str)]) -> Class {
        Class {
            id: ClassId(id),
            name: name.to_string(),
            docstring: String::new(),
            source: Source::default(),
            properties: properties
                .iter()
                .map(|(name, type_name)| Property {
                    name: name.to_string(),
                    type_name: type_name.to_string(),
                    docstring: String::new(),
                    owner: ClassId(id),
                })
                .collect(),
            schema: NodeId(id),
        }
    }

    #[test]
    fn test_class_block() {
        let pet = class(0, "Pet", &[("id", "integer[int64]"), ("tags", "[]string")]);
        assert_eq!(
            emit_class(&pet),
            "Pet: {\n  shape: class\n  \"id\": \"integer[int64]\"\n  \"tags\": \"[]string\"\n}\n"
        );
    }

    #[test]
    fn test_full_script() {
        let classes = vec![class(0, "Pet", &[("category", "object")]), class(1, "Category", &[])];
        let relations = vec![
            Relation::associates(ClassId(0), ClassId(1)),
            Relation::associates(ClassId(1), ClassId(0)),
        ];

        let expected = "Pet: {\n  shape: class\n  \"category\": \"object\"\n}\n\n\
                        Category: {\n  shape: class\n}\n\n\
                        Pet -- Category: associates\n\
                        Category -- Pet: associates";
        assert_eq!(render(&classes, &relations), expected);
    }

    #[test]
    fn test_no_relations_has_no_trailing_line() {
        let classes = vec![class(0, "Solo", &[])];
        assert_eq!(render(&classes, &[]), "Solo: {\n  shape: class\n}\n\n");
    }

    #[test]
    fn test_untitled_class_is_keyed_by_id() {
        let classes = vec![class(0, "", &[("next", "object")]), class(1, "Node", &[])];
        let relations = vec![Relation::associates(ClassId(0), ClassId(1))];

        let script = render(&classes, &relations);
        assert!(script.starts_with("\"class:0\": {\n  shape: class\n"));
        assert!(script.ends_with("\"class:0\" -- Node: associates"));
        assert!(!script.contains("\n: {"));
    }

    #[test]
    fn test_quotes_and_backslashes_are_escaped() {
        let odd = class(0, "Odd Name", &[("say \"hi\"", "string[a\\b]")]);
        assert_eq!(
            emit_class(&odd),
            "\"Odd Name\": {\n  shape: class\n  \"say \\\"hi\\\"\": \"string[a\\\\b]\"\n}\n"
        );
    }

    #[test]
    fn test_names_with_separators_are_quoted() {
        assert_eq!(quote_key("Pet"), "Pet");
        assert_eq!(quote_key("pet_store2"), "pet_store2");
        assert_eq!(quote_key("a.b"), "\"a.b\"");
        assert_eq!(quote_key("x: y"), "\"x: y\"");
        assert_eq!(quote_key(""), "\"\"");
    }
}
