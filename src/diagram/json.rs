//! JSON format output for relationship summaries.

use super::Diagram;
use crate::relations::Cardinality;
use schemars::JsonSchema;
use serde::Serialize;

/// JSON representation of a relationship summary
#[derive(Debug, Serialize, JsonSchema)]
pub struct SummaryJson {
    pub schema: String,
    pub tables: Vec<TableJson>,
    pub relationships: Vec<RelationshipJson>,
    pub stats: SummaryStats,
}

/// JSON representation of a focus table
#[derive(Debug, Serialize, JsonSchema)]
pub struct TableJson {
    pub name: String,
    pub columns: Vec<ColumnJson>,
}

/// JSON representation of a column
#[derive(Debug, Serialize, JsonSchema)]
pub struct ColumnJson {
    pub name: String,
    #[serde(rename = "type")]
    pub col_type: String,
    pub is_primary_key: bool,
    pub is_foreign_key: bool,
}

/// JSON representation of an inferred relationship
#[derive(Debug, Serialize, JsonSchema)]
pub struct RelationshipJson {
    pub from_table: String,
    pub to_table: String,
    pub from_cardinality: Cardinality,
    pub to_cardinality: Cardinality,
    /// Tables from `from_table` to `to_table`, endpoints inclusive
    pub path: Vec<String>,
    /// Tables outside the focus set that connect the pair
    pub via: Vec<String>,
}

/// Summary statistics
#[derive(Debug, Serialize, JsonSchema)]
pub struct SummaryStats {
    pub table_count: usize,
    pub column_count: usize,
    pub relationship_count: usize,
    pub indirect_count: usize,
}

/// Generate JSON output from a diagram
pub fn to_json(diagram: &Diagram) -> String {
    let summary = build_summary_json(diagram);
    serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
}

/// Build the JSON structure
pub fn build_summary_json(diagram: &Diagram) -> SummaryJson {
    let tables = diagram
        .tables
        .iter()
        .map(|table| TableJson {
            name: table.name.clone(),
            columns: table
                .columns
                .iter()
                .map(|col| ColumnJson {
                    name: col.name.clone(),
                    col_type: col.data_type.clone(),
                    is_primary_key: col.is_primary_key,
                    is_foreign_key: col.is_foreign_key,
                })
                .collect(),
        })
        .collect();

    let relationships = diagram
        .relationships
        .iter()
        .map(|rel| RelationshipJson {
            from_table: rel.from.name.clone(),
            to_table: rel.to.name.clone(),
            from_cardinality: rel.from_cardinality,
            to_cardinality: rel.to_cardinality,
            path: rel.path.clone(),
            via: rel.via().to_vec(),
        })
        .collect();

    SummaryJson {
        schema: diagram.schema.clone(),
        tables,
        relationships,
        stats: SummaryStats {
            table_count: diagram.table_count(),
            column_count: diagram.column_count(),
            relationship_count: diagram.relationship_count(),
            indirect_count: diagram.indirect_count(),
        },
    }
}
