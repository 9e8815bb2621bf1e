//! Relationship summary diagrams.
//!
//! This module provides:
//! - Mermaid erDiagram output (default), with cardinality symbols
//! - Graphviz DOT output with crow's-foot edge ends
//! - JSON output for programmatic use

mod dot;
mod json;
mod mermaid;

pub use json::SummaryJson;

use dot::to_dot;
use json::to_json;
use mermaid::to_mermaid;

use crate::relations::{Relationship, Table};
use std::fmt;
use std::str::FromStr;

/// Output format for the summary diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Mermaid erDiagram format
    #[default]
    Mermaid,
    /// Graphviz DOT format
    Dot,
    /// JSON format for programmatic use
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mermaid" | "mmd" => Ok(OutputFormat::Mermaid),
            "dot" | "graphviz" => Ok(OutputFormat::Dot),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!(
                "Unknown format: {}. Valid options: mermaid, dot, json",
                s
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Mermaid => write!(f, "mermaid"),
            OutputFormat::Dot => write!(f, "dot"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

impl OutputFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Mermaid => "mmd",
            OutputFormat::Dot => "dot",
            OutputFormat::Json => "json",
        }
    }

    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mmd" | "mermaid" | "md" => Some(OutputFormat::Mermaid),
            "dot" | "gv" => Some(OutputFormat::Dot),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }
}

/// Layout direction for diagram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Left to right
    #[default]
    LR,
    /// Top to bottom
    TB,
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "lr" | "left-right" | "horizontal" => Ok(Layout::LR),
            "tb" | "td" | "top-bottom" | "top-down" | "vertical" => Ok(Layout::TB),
            _ => Err(format!("Unknown layout: {}. Valid options: lr, tb", s)),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layout::LR => write!(f, "lr"),
            Layout::TB => write!(f, "tb"),
        }
    }
}

/// Focus tables and the relationships inferred between them
#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub schema: String,
    pub tables: Vec<Table>,
    pub relationships: Vec<Relationship>,
}

impl Diagram {
    pub fn new(schema: impl Into<String>, tables: Vec<Table>, relationships: Vec<Relationship>) -> Self {
        Self {
            schema: schema.into(),
            tables,
            relationships,
        }
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    pub fn column_count(&self) -> usize {
        self.tables.iter().map(|t| t.columns.len()).sum()
    }

    pub fn relationship_count(&self) -> usize {
        self.relationships.len()
    }

    /// Relationships that pass through tables outside the focus set
    pub fn indirect_count(&self) -> usize {
        self.relationships.iter().filter(|r| r.is_indirect()).count()
    }

    /// Render in the given format. `command_line` is recorded in Mermaid
    /// output only.
    pub fn render(&self, format: OutputFormat, layout: Layout, command_line: &str) -> String {
        match format {
            OutputFormat::Mermaid => to_mermaid(self, command_line),
            OutputFormat::Dot => to_dot(self, layout),
            OutputFormat::Json => to_json(self),
        }
    }
}

/// Label for a relationship edge: `via X, Y` for indirect relationships
pub(crate) fn via_label(rel: &Relationship) -> String {
    if rel.is_indirect() {
        format!("via {}", rel.via().join(", "))
    } else {
        String::new()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::relations::{Cardinality, Column, Relationship, Table, TableRef};

    fn column(name: &str, data_type: &str, pk: bool, fk: bool) -> Column {
        Column {
            name: name.to_string(),
            data_type: data_type.to_string(),
            is_primary_key: pk,
            is_foreign_key: fk,
        }
    }

    /// customers, orders and products with one direct and one indirect
    /// relationship
    pub fn shop_diagram() -> super::Diagram {
        let tables = vec![
            Table {
                name: "customers".to_string(),
                schema: "public".to_string(),
                columns: vec![
                    column("id", "integer", true, false),
                    column("email", "character varying(255)", false, false),
                ],
            },
            Table {
                name: "orders".to_string(),
                schema: "public".to_string(),
                columns: vec![
                    column("id", "integer", true, false),
                    column("customer_id", "integer", false, true),
                    column("placed_at", "timestamp with time zone", false, false),
                ],
            },
            Table::bare("public", "products"),
        ];
        let relationships = vec![
            Relationship {
                from: TableRef::new("public", "customers"),
                to: TableRef::new("public", "orders"),
                from_cardinality: Cardinality::EXACTLY_ONE,
                to_cardinality: Cardinality::REQUIRED_MANY,
                path: vec!["customers".to_string(), "orders".to_string()],
            },
            Relationship {
                from: TableRef::new("public", "orders"),
                to: TableRef::new("public", "products"),
                from_cardinality: Cardinality::OPTIONAL_MANY,
                to_cardinality: Cardinality::OPTIONAL_MANY,
                path: vec![
                    "orders".to_string(),
                    "order_items".to_string(),
                    "products".to_string(),
                ],
            },
        ];
        super::Diagram::new("public", tables, relationships)
    }
}
