//! Data model shared by the inference engine, the metadata sources and the
//! diagram emitters.

use ahash::AHashSet;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Identity of a table: (schema, name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// A column as shown in the diagram
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub name: String,
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
}

/// A table with its ordered columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub name: String,
    pub schema: String,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a table record without column details
    pub fn bare(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            columns: Vec::new(),
        }
    }

    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.schema.clone(), self.name.clone())
    }
}

/// A single-column foreign key: `from_table.from_column` references
/// `to_table.to_column`. The child (`from_table`) depends on the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyConstraint {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
    #[serde(default)]
    pub constraint_name: String,
}

impl ForeignKeyConstraint {
    pub fn is_self_reference(&self) -> bool {
        self.from_table == self.to_table
    }

    /// Key of the referencing column in the column info map
    pub fn source_key(&self) -> String {
        column_key(&self.from_table, &self.from_column)
    }
}

/// Nullability and uniqueness of a foreign key source column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub is_nullable: bool,
    /// Only set when the column is the sole member of a UNIQUE or PRIMARY KEY
    /// constraint. Composite constraints never set it.
    #[serde(default)]
    pub has_sole_unique_constraint: bool,
}

/// Build the `table.column` key used by [`SchemaMetadata::columns`]
pub fn column_key(table: &str, column: &str) -> String {
    format!("{}.{}", table, column)
}

/// Multiplicity bound on one side of a relationship.
///
/// `max == None` means unbounded (`*`). Only four combinations are produced by
/// the engine: `0..1`, `1..1`, `0..*` and `1..*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Cardinality {
    pub min: u32,
    #[serde(with = "max_bound")]
    #[schemars(with = "String")]
    pub max: Option<u32>,
}

impl Cardinality {
    pub const OPTIONAL_ONE: Self = Self::new(0, Some(1));
    pub const EXACTLY_ONE: Self = Self::new(1, Some(1));
    pub const OPTIONAL_MANY: Self = Self::new(0, None);
    pub const REQUIRED_MANY: Self = Self::new(1, None);

    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self { min, max }
    }

    /// Whether at least one row is guaranteed on this side
    pub fn is_required(&self) -> bool {
        self.min >= 1
    }

    pub fn is_many(&self) -> bool {
        self.max.is_none()
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}..{}", self.min, max),
            None => write!(f, "{}..*", self.min),
        }
    }
}

mod max_bound {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(max: &Option<u32>, s: S) -> Result<S::Ok, S::Error> {
        match max {
            Some(n) => s.serialize_str(&n.to_string()),
            None => s.serialize_str("*"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let raw = String::deserialize(d)?;
        if raw == "*" {
            return Ok(None);
        }
        raw.parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid cardinality bound: {}", raw)))
    }
}

/// The effective relationship between two focus tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    pub from: TableRef,
    pub to: TableRef,
    pub from_cardinality: Cardinality,
    pub to_cardinality: Cardinality,
    /// Table names from `from` to `to`, endpoints inclusive
    pub path: Vec<String>,
}

impl Relationship {
    /// Tables traversed between the two endpoints
    pub fn via(&self) -> &[String] {
        if self.path.len() > 2 {
            &self.path[1..self.path.len() - 1]
        } else {
            &[]
        }
    }

    pub fn is_indirect(&self) -> bool {
        !self.via().is_empty()
    }

    /// The same relationship read from the other end
    pub fn swapped(self) -> Self {
        let mut path = self.path;
        path.reverse();
        Self {
            from: self.to,
            to: self.from,
            from_cardinality: self.to_cardinality,
            to_cardinality: self.from_cardinality,
            path,
        }
    }

    /// Orient the relationship so that `table` is on the `from` side
    pub fn oriented_from(self, table: &str) -> Self {
        if self.from.name == table {
            self
        } else {
            self.swapped()
        }
    }
}

/// Complete metadata snapshot for one schema.
///
/// This is the input of the inference engine and doubles as the JSON
/// snapshot file format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaMetadata {
    #[serde(default = "default_schema_name")]
    pub schema: String,
    /// Tables with column details, in declaration order
    #[serde(default)]
    pub tables: Vec<Table>,
    /// Every foreign key in the schema, not only those of focus tables
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyConstraint>,
    /// Column info keyed by `table.column`
    #[serde(default)]
    pub columns: BTreeMap<String, ColumnInfo>,
}

pub(crate) fn default_schema_name() -> String {
    "public".to_string()
}

impl SchemaMetadata {
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            ..Self::default()
        }
    }

    pub fn column_info(&self, table: &str, column: &str) -> Option<&ColumnInfo> {
        self.columns.get(&column_key(table, column))
    }

    /// Find a table record by name, exact match first then case-insensitive
    pub fn table(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.name == name).or_else(|| {
            self.tables
                .iter()
                .find(|t| t.name.eq_ignore_ascii_case(name))
        })
    }

    /// All table names known to the snapshot: declared tables first, then any
    /// table only mentioned by a foreign key.
    pub fn table_names(&self) -> Vec<String> {
        let mut seen = AHashSet::new();
        let mut names = Vec::new();
        let declared = self.tables.iter().map(|t| t.name.as_str());
        let referenced = self
            .foreign_keys
            .iter()
            .flat_map(|fk| [fk.from_table.as_str(), fk.to_table.as_str()]);
        for name in declared.chain(referenced) {
            if seen.insert(name) {
                names.push(name.to_string());
            }
        }
        names
    }

    /// Table records for the focus tables, in focus order.
    ///
    /// With `with_columns`, columns are copied from the snapshot and a column
    /// is flagged as a foreign key only when it references another focus
    /// table. Unknown tables come back without columns.
    pub fn focus_tables(&self, focus: &[String], with_columns: bool) -> Vec<Table> {
        let focus_set: AHashSet<&str> = focus.iter().map(String::as_str).collect();
        let fk_columns: AHashSet<(&str, &str)> = self
            .foreign_keys
            .iter()
            .filter(|fk| {
                focus_set.contains(fk.from_table.as_str()) && focus_set.contains(fk.to_table.as_str())
            })
            .map(|fk| (fk.from_table.as_str(), fk.from_column.as_str()))
            .collect();

        focus
            .iter()
            .map(|name| {
                let mut table = Table::bare(self.schema.clone(), name.clone());
                if with_columns {
                    if let Some(known) = self.table(name) {
                        table.columns = known
                            .columns
                            .iter()
                            .map(|c| Column {
                                is_foreign_key: fk_columns.contains(&(name.as_str(), c.name.as_str())),
                                ..c.clone()
                            })
                            .collect();
                    }
                }
                table
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fk(from: &str, col: &str, to: &str) -> ForeignKeyConstraint {
        ForeignKeyConstraint {
            from_table: from.to_string(),
            from_column: col.to_string(),
            to_table: to.to_string(),
            to_column: "id".to_string(),
            constraint_name: format!("{}_{}_fkey", from, col),
        }
    }

    #[test]
    fn test_cardinality_display() {
        assert_eq!(Cardinality::OPTIONAL_ONE.to_string(), "0..1");
        assert_eq!(Cardinality::EXACTLY_ONE.to_string(), "1..1");
        assert_eq!(Cardinality::OPTIONAL_MANY.to_string(), "0..*");
        assert_eq!(Cardinality::REQUIRED_MANY.to_string(), "1..*");
    }

    #[test]
    fn test_cardinality_serializes_star() {
        let json = serde_json::to_string(&Cardinality::REQUIRED_MANY).unwrap();
        assert_eq!(json, r#"{"min":1,"max":"*"}"#);

        let parsed: Cardinality = serde_json::from_str(r#"{"min":0,"max":"1"}"#).unwrap();
        assert_eq!(parsed, Cardinality::OPTIONAL_ONE);

        assert!(serde_json::from_str::<Cardinality>(r#"{"min":0,"max":"many"}"#).is_err());
    }

    #[test]
    fn test_relationship_swap_reverses_path() {
        let rel = Relationship {
            from: TableRef::new("public", "orders"),
            to: TableRef::new("public", "products"),
            from_cardinality: Cardinality::REQUIRED_MANY,
            to_cardinality: Cardinality::OPTIONAL_MANY,
            path: vec![
                "orders".to_string(),
                "order_items".to_string(),
                "products".to_string(),
            ],
        };

        let swapped = rel.clone().swapped();
        assert_eq!(swapped.from.name, "products");
        assert_eq!(swapped.from_cardinality, Cardinality::OPTIONAL_MANY);
        assert_eq!(swapped.path[0], "products");
        assert_eq!(swapped.via(), &["order_items".to_string()]);
        assert_eq!(swapped.swapped(), rel);
    }

    #[test]
    fn test_table_names_include_fk_only_tables() {
        let mut meta = SchemaMetadata::new("public");
        meta.tables.push(Table::bare("public", "users"));
        meta.foreign_keys.push(fk("orders", "user_id", "users"));

        assert_eq!(meta.table_names(), vec!["users", "orders"]);
    }

    #[test]
    fn test_focus_tables_flags_fk_between_focus_only() {
        let mut meta = SchemaMetadata::new("public");
        meta.tables.push(Table {
            name: "orders".to_string(),
            schema: "public".to_string(),
            columns: vec![
                Column {
                    name: "id".to_string(),
                    data_type: "integer".to_string(),
                    is_primary_key: true,
                    is_foreign_key: false,
                },
                Column {
                    name: "user_id".to_string(),
                    data_type: "integer".to_string(),
                    is_primary_key: false,
                    is_foreign_key: false,
                },
                Column {
                    name: "coupon_id".to_string(),
                    data_type: "integer".to_string(),
                    is_primary_key: false,
                    is_foreign_key: false,
                },
            ],
        });
        meta.foreign_keys.push(fk("orders", "user_id", "users"));
        meta.foreign_keys.push(fk("orders", "coupon_id", "coupons"));

        let focus = vec!["orders".to_string(), "users".to_string()];
        let tables = meta.focus_tables(&focus, true);

        assert_eq!(tables.len(), 2);
        let orders = &tables[0];
        assert!(orders.columns[1].is_foreign_key);
        assert!(!orders.columns[2].is_foreign_key);
        assert!(tables[1].columns.is_empty());

        let bare = meta.focus_tables(&focus, false);
        assert!(bare[0].columns.is_empty());
    }
}
