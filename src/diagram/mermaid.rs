//! Mermaid erDiagram format output.

use super::{via_label, Diagram};
use crate::relations::Cardinality;
use tracing::warn;

/// Generate a Mermaid erDiagram. Every focus table gets an entity block,
/// empty when columns were not requested.
pub fn to_mermaid(diagram: &Diagram, command_line: &str) -> String {
    let mut output = String::new();

    output.push_str("%%{init: {'theme':'neutral'}}%%\n");
    output.push_str(&format!(
        "%% Generated by ersummary {}\n",
        env!("CARGO_PKG_VERSION")
    ));
    output.push_str(&format!("%% Command: {}\n", command_line));
    output.push_str("\nerDiagram\n");

    for table in &diagram.tables {
        output.push_str(&format!("    {} {{\n", escape_mermaid_id(&table.name)));

        for col in &table.columns {
            let key_marker = match (col.is_primary_key, col.is_foreign_key) {
                (true, true) => "PK,FK",
                (true, false) => "PK",
                (false, true) => "FK",
                (false, false) => "",
            };

            let col_type = data_type_to_mermaid(&col.data_type);
            let col_name = escape_mermaid_id(&col.name);

            if key_marker.is_empty() {
                output.push_str(&format!("        {} {}\n", col_type, col_name));
            } else {
                output.push_str(&format!(
                    "        {} {} {}\n",
                    col_type, col_name, key_marker
                ));
            }
        }

        output.push_str("    }\n");
    }

    for rel in &diagram.relationships {
        output.push_str(&format!(
            "    {} {} {} : \"{}\"\n",
            escape_mermaid_id(&rel.from.name),
            relation_type(rel.from_cardinality, rel.to_cardinality),
            escape_mermaid_id(&rel.to.name),
            via_label(rel)
        ));
    }

    output
}

/// Crow's-foot symbol for one side, written as it appears on the left of
/// `--`. Unexpected bounds fall back to exactly-one.
pub fn cardinality_symbol(card: Cardinality) -> &'static str {
    match (card.min, card.max) {
        (0, Some(1)) => "|o",
        (1, Some(1)) => "||",
        (0, None) => "}o",
        (1, None) => "}|",
        _ => {
            warn!(cardinality = %card, "unexpected cardinality, drawing as exactly one");
            "||"
        }
    }
}

/// Mirror a left-side symbol for use on the right of `--`: reverse the
/// characters, then swap `{` and `}`.
pub fn reverse_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .rev()
        .map(|c| match c {
            '{' => '}',
            '}' => '{',
            other => other,
        })
        .collect()
}

/// Relationship operator such as `||--|{`
pub fn relation_type(from: Cardinality, to: Cardinality) -> String {
    format!(
        "{}--{}",
        cardinality_symbol(from),
        reverse_symbol(cardinality_symbol(to))
    )
}

/// Map a SQL type to a Mermaid attribute type
fn data_type_to_mermaid(sql_type: &str) -> String {
    let lower = sql_type.to_lowercase();
    let mapped = if lower.contains("int") {
        "int"
    } else if lower.contains("char") || lower.contains("text") {
        "string"
    } else if lower.contains("timestamp") || lower.contains("date") || lower.contains("time") {
        "datetime"
    } else if lower.contains("bool") {
        "boolean"
    } else if lower.contains("numeric")
        || lower.contains("decimal")
        || lower.contains("real")
        || lower.contains("double")
    {
        "float"
    } else {
        return escape_mermaid_type(sql_type);
    };
    mapped.to_string()
}

/// Escape a string for use as a Mermaid entity ID
fn escape_mermaid_id(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Escape a type string for Mermaid (no spaces, special chars)
fn escape_mermaid_type(s: &str) -> String {
    let base = match s.find('(') {
        Some(paren_pos) => &s[..paren_pos],
        None => s,
    };
    base.trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
