//! Schema model built from SQL DDL.
//!
//! This module provides:
//! - Data models for table schemas, columns, keys and foreign keys
//! - DDL parsing for CREATE TABLE, ALTER TABLE and CREATE INDEX
//! - Extraction of the FK/column metadata consumed by relationship inference

mod ddl;
mod metadata;

pub use ddl::*;

use ahash::AHashMap;
use std::fmt;

/// Unique identifier for a table within a schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(pub u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TableId({})", self.0)
    }
}

/// Unique identifier for a column within a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColumnId(pub u16);

/// SQL column type classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    /// INT, INTEGER, SMALLINT, SERIAL, ...
    Int,
    /// BIGINT, BIGSERIAL
    BigInt,
    /// CHAR, VARCHAR, TEXT, ...
    Text,
    Uuid,
    /// DECIMAL, NUMERIC, FLOAT, DOUBLE, REAL
    Decimal,
    /// DATE, TIME, TIMESTAMP, INTERVAL
    DateTime,
    Bool,
    /// Any other type
    Other(String),
}

impl ColumnType {
    /// Classify a SQL type string (MySQL, PostgreSQL and SQLite spellings)
    pub fn from_sql_type(type_str: &str) -> Self {
        let type_lower = type_str.to_lowercase();
        let base_type = type_lower.split('(').next().unwrap_or(&type_lower).trim();
        let base_type = base_type.split_whitespace().next().unwrap_or(base_type);

        match base_type {
            "int" | "integer" | "tinyint" | "smallint" | "mediumint" | "int4" | "int2" => {
                ColumnType::Int
            }
            "serial" | "smallserial" | "serial4" => ColumnType::Int,
            "bigint" | "int8" | "bigserial" | "serial8" => ColumnType::BigInt,
            "char" | "varchar" | "text" | "tinytext" | "mediumtext" | "longtext" | "enum"
            | "set" | "character" | "citext" | "nvarchar" | "nchar" => ColumnType::Text,
            "decimal" | "numeric" | "float" | "double" | "real" | "float4" | "float8" | "money" => {
                ColumnType::Decimal
            }
            "date" | "datetime" | "timestamp" | "time" | "year" | "timestamptz" | "timetz"
            | "interval" | "datetime2" => ColumnType::DateTime,
            "bool" | "boolean" | "bit" => ColumnType::Bool,
            "binary" | "varbinary" | "blob" | "bytea" => {
                if type_lower.contains("16") {
                    ColumnType::Uuid
                } else {
                    ColumnType::Other(type_str.to_string())
                }
            }
            "uuid" | "uniqueidentifier" => ColumnType::Uuid,
            _ => ColumnType::Other(type_str.to_string()),
        }
    }
}

/// Column definition within a table
#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    /// Type as written in the DDL
    pub type_name: String,
    pub col_type: ColumnType,
    /// Position in table (0-indexed)
    pub ordinal: ColumnId,
    pub is_primary_key: bool,
    pub is_nullable: bool,
}

/// Index or unique constraint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexDef {
    pub name: String,
    pub columns: Vec<String>,
    pub is_unique: bool,
    /// Index type (BTREE, HASH, GIN, etc.)
    pub index_type: Option<String>,
}

/// Foreign key constraint definition
#[derive(Debug, Clone)]
pub struct ForeignKey {
    pub name: Option<String>,
    /// Column names in this table
    pub column_names: Vec<String>,
    /// Referenced table name as written
    pub referenced_table: String,
    /// Referenced column names; empty when the DDL relies on the parent's key
    pub referenced_columns: Vec<String>,
    /// Resolved referenced table ID (set after schema is complete)
    pub referenced_table_id: Option<TableId>,
}

impl ForeignKey {
    pub fn is_composite(&self) -> bool {
        self.column_names.len() > 1
    }
}

/// Complete table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    pub id: TableId,
    pub columns: Vec<Column>,
    /// Primary key column IDs (ordered for composite PKs)
    pub primary_key: Vec<ColumnId>,
    pub foreign_keys: Vec<ForeignKey>,
    /// Indexes and UNIQUE constraints
    pub indexes: Vec<IndexDef>,
}

impl TableSchema {
    pub fn new(name: String, id: TableId) -> Self {
        Self {
            name,
            id,
            columns: Vec::new(),
            primary_key: Vec::new(),
            foreign_keys: Vec::new(),
            indexes: Vec::new(),
        }
    }

    /// Get a column by name (case-insensitive)
    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn get_column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns
            .iter_mut()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn get_column_id(&self, name: &str) -> Option<ColumnId> {
        self.get_column(name).map(|c| c.ordinal)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(id.0 as usize)
    }

    pub fn is_pk_column(&self, col_id: ColumnId) -> bool {
        self.primary_key.contains(&col_id)
    }

    /// Mark columns as the primary key
    pub fn set_primary_key(&mut self, column_names: &[String]) {
        for col_name in column_names {
            if let Some(col) = self.get_column_mut(col_name) {
                col.is_primary_key = true;
                col.is_nullable = false;
                let ordinal = col.ordinal;
                if !self.primary_key.contains(&ordinal) {
                    self.primary_key.push(ordinal);
                }
            }
        }
    }

    /// Whether `column` alone forms the primary key or a unique constraint.
    /// Composite keys never count.
    pub fn has_sole_unique(&self, column: &str) -> bool {
        let sole_pk = self.primary_key.len() == 1
            && self
                .column(self.primary_key[0])
                .is_some_and(|c| c.name.eq_ignore_ascii_case(column));

        sole_pk
            || self.indexes.iter().any(|idx| {
                idx.is_unique && idx.columns.len() == 1 && idx.columns[0].eq_ignore_ascii_case(column)
            })
    }

    /// The single primary key column, if the key is not composite
    pub fn single_pk_column(&self) -> Option<&Column> {
        match self.primary_key.as_slice() {
            [only] => self.column(*only),
            _ => None,
        }
    }
}

/// Complete database schema
#[derive(Debug)]
pub struct Schema {
    /// Map from table name to table ID
    pub tables: AHashMap<String, TableId>,
    /// Table schemas indexed by TableId
    pub table_schemas: Vec<TableSchema>,
}

impl Schema {
    pub fn new() -> Self {
        Self {
            tables: AHashMap::new(),
            table_schemas: Vec::new(),
        }
    }

    /// Get table ID by name (case-insensitive)
    pub fn get_table_id(&self, name: &str) -> Option<TableId> {
        if let Some(&id) = self.tables.get(name) {
            return Some(id);
        }
        let name_lower = name.to_lowercase();
        self.tables
            .iter()
            .find(|(k, _)| k.to_lowercase() == name_lower)
            .map(|(_, &id)| id)
    }

    pub fn table(&self, id: TableId) -> Option<&TableSchema> {
        self.table_schemas.get(id.0 as usize)
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut TableSchema> {
        self.table_schemas.get_mut(id.0 as usize)
    }

    pub fn get_table(&self, name: &str) -> Option<&TableSchema> {
        self.get_table_id(name).and_then(|id| self.table(id))
    }

    /// Add a new table schema, returning its ID
    pub fn add_table(&mut self, mut schema: TableSchema) -> TableId {
        let id = TableId(self.table_schemas.len() as u32);
        schema.id = id;
        self.tables.insert(schema.name.clone(), id);
        self.table_schemas.push(schema);
        id
    }

    /// Resolve all foreign key references to table IDs
    pub fn resolve_foreign_keys(&mut self) {
        let table_ids: AHashMap<String, TableId> = self.tables.clone();

        for table in &mut self.table_schemas {
            for fk in &mut table.foreign_keys {
                fk.referenced_table_id = table_ids
                    .get(&fk.referenced_table)
                    .or_else(|| {
                        let lower = fk.referenced_table.to_lowercase();
                        table_ids
                            .iter()
                            .find(|(k, _)| k.to_lowercase() == lower)
                            .map(|(_, v)| v)
                    })
                    .copied();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.table_schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table_schemas.is_empty()
    }

    /// Iterate over all table schemas in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &TableSchema> {
        self.table_schemas.iter()
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
