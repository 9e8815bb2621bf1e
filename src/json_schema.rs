//! JSON Schema generation for machine-readable outputs.
//!
//! Schemas are generated using the schemars crate and can be exported via
//! the `schema` subcommand.

use schemars::{schema_for, Schema};
use std::collections::BTreeMap;

/// Returns all JSON schemas, keyed by name.
/// Uses BTreeMap for deterministic ordering (important for diffable output).
pub fn all_schemas() -> BTreeMap<&'static str, Schema> {
    let mut schemas = BTreeMap::new();

    // summary --format json
    schemas.insert("summary", schema_for!(crate::diagram::SummaryJson));

    // metadata snapshot accepted as input
    schemas.insert("snapshot", schema_for!(crate::relations::SchemaMetadata));

    schemas
}

/// Generate a single schema by name.
pub fn get_schema(name: &str) -> Option<Schema> {
    all_schemas().remove(name)
}

/// List all available schema names.
pub fn schema_names() -> Vec<&'static str> {
    all_schemas().keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_names() {
        assert_eq!(schema_names(), vec!["snapshot", "summary"]);
    }

    #[test]
    fn test_summary_schema_lists_fields() {
        let schema = get_schema("summary").unwrap();
        let json = serde_json::to_value(&schema).unwrap();

        let properties = json["properties"].as_object().unwrap();
        assert!(properties.contains_key("relationships"));
        assert!(properties.contains_key("stats"));
        assert!(get_schema("split").is_none());
    }
}
