//! Extraction of relationship metadata from a parsed DDL schema.

use super::{Schema, TableSchema};
use crate::relations::{column_key, Column, ColumnInfo, ForeignKeyConstraint, SchemaMetadata, Table};
use tracing::{debug, warn};

impl SchemaMetadata {
    /// Snapshot of the tables, single-column foreign keys and FK column info
    /// of a parsed schema.
    ///
    /// Composite foreign keys are skipped. A foreign key that names no
    /// referenced column points at the parent's single primary key column,
    /// or `id` when the parent is unknown or has a composite key.
    pub fn from_schema(schema: &Schema, schema_name: &str) -> Self {
        let mut meta = SchemaMetadata::new(schema_name);

        for table in schema.iter() {
            meta.tables.push(table_record(table, schema_name));

            for fk in &table.foreign_keys {
                if fk.is_composite() {
                    warn!(
                        table = %table.name,
                        columns = %fk.column_names.join(", "),
                        "composite foreign key skipped"
                    );
                    continue;
                }
                let Some(local) = fk.column_names.first() else {
                    continue;
                };

                let parent = fk.referenced_table_id.and_then(|id| schema.table(id));
                let to_table = parent
                    .map(|p| p.name.clone())
                    .unwrap_or_else(|| fk.referenced_table.clone());
                let to_column = fk
                    .referenced_columns
                    .first()
                    .cloned()
                    .or_else(|| parent.and_then(|p| p.single_pk_column()).map(|c| c.name.clone()))
                    .unwrap_or_else(|| "id".to_string());

                if parent.is_none() {
                    debug!(table = %table.name, references = %fk.referenced_table, "referenced table not declared in input");
                }

                let from_column = table
                    .get_column(local)
                    .map(|c| c.name.clone())
                    .unwrap_or_else(|| local.clone());

                if let Some(col) = table.get_column(local) {
                    meta.columns.insert(
                        column_key(&table.name, &from_column),
                        ColumnInfo {
                            is_nullable: col.is_nullable,
                            has_sole_unique_constraint: table.has_sole_unique(&col.name),
                        },
                    );
                } else {
                    debug!(table = %table.name, column = %local, "foreign key column not declared");
                }

                meta.foreign_keys.push(ForeignKeyConstraint {
                    constraint_name: fk
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("{}_{}_fkey", table.name, from_column)),
                    from_table: table.name.clone(),
                    from_column,
                    to_table,
                    to_column,
                });
            }
        }

        meta
    }
}

fn table_record(table: &TableSchema, schema_name: &str) -> Table {
    Table {
        name: table.name.clone(),
        schema: schema_name.to_string(),
        columns: table
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                data_type: c.type_name.clone(),
                is_primary_key: c.is_primary_key,
                is_foreign_key: false,
            })
            .collect(),
    }
}
