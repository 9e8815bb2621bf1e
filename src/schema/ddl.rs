//! DDL parsing for schema extraction.
//!
//! Parses CREATE TABLE, ALTER TABLE and CREATE INDEX statements to extract:
//! - Column definitions with types and nullability
//! - Primary key and UNIQUE constraints (table level, inline, and added later)
//! - Foreign key constraints (table level, inline REFERENCES, and added later)

use super::{Column, ColumnId, ColumnType, ForeignKey, IndexDef, Schema, TableId, TableSchema};
use once_cell::sync::Lazy;
use regex::Regex;

/// Table name from CREATE TABLE.
/// Handles `table`, "table", [table], bare names and schema-qualified names.
static CREATE_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)CREATE\s+(?:(?:GLOBAL|LOCAL)\s+)?(?:(?:TEMP|TEMPORARY|UNLOGGED)\s+)?TABLE\s+(?:IF\s+NOT\s+EXISTS\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?"#)
        .unwrap()
});

/// Table name from ALTER TABLE
static ALTER_TABLE_NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)ALTER\s+TABLE\s+(?:IF\s+EXISTS\s+)?(?:ONLY\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s]+)[\]`"]?"#).unwrap()
});

/// Column name and type. Multi-word PostgreSQL types keep their first word
/// plus `varying`/`precision`.
static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)^\s*[\[`"]?([^\[\]`"\s,]+)[\]`"]?\s+(\w+(?:\s+(?:varying|precision))?(?:\s*\([^)]+\))?(?:\s+unsigned)?)"#).unwrap()
});

/// PRIMARY KEY (cols), with optional MSSQL CLUSTERED/NONCLUSTERED
static PRIMARY_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)PRIMARY\s+KEY\s*(?:CLUSTERED\s+|NONCLUSTERED\s+)?\(([^)]+)\)").unwrap()
});

static INLINE_PRIMARY_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bPRIMARY\s+KEY\b").unwrap());

static INLINE_UNIQUE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bUNIQUE\b").unwrap());

/// FOREIGN KEY (cols) REFERENCES table (cols) with optional constraint name
static FOREIGN_KEY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?FOREIGN\s+KEY\s*\(([^)]+)\)\s*REFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(]+)[\]`"]?\s*(?:\(([^)]+)\))?"#,
    )
    .unwrap()
});

/// Column-level REFERENCES table [(col)]
static INLINE_REFERENCES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)\bREFERENCES\s+(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?([^\[\]`"\s(,]+)[\]`"]?\s*(?:\(([^)]+)\))?"#,
    )
    .unwrap()
});

/// [CONSTRAINT name] UNIQUE (cols) as a table constraint or ALTER TABLE ADD
static UNIQUE_CONSTRAINT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:CONSTRAINT\s+[\[`"]?([^\[\]`"\s]+)[\]`"]?\s+)?UNIQUE\s*(?:NULLS\s+(?:NOT\s+)?DISTINCT\s*)?\(([^)]+)\)"#).unwrap()
});

static NOT_NULL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bNOT\s+NULL\b").unwrap());

/// INDEX idx (cols), KEY idx (cols), UNIQUE INDEX idx (cols), UNIQUE KEY idx (cols)
static INLINE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:(UNIQUE)\s+)?(?:INDEX|KEY)\s+[\[`"]?(\w+)[\]`"]?\s*\(([^)]+)\)"#).unwrap()
});

/// CREATE [UNIQUE] [CLUSTERED|NONCLUSTERED] INDEX [CONCURRENTLY] [IF NOT EXISTS] name ON [ONLY] table [USING method] (cols)
static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r#"(?i)CREATE\s+(UNIQUE\s+)?(?:CLUSTERED\s+|NONCLUSTERED\s+)?INDEX\s+(?:CONCURRENTLY\s+)?(?:IF\s+NOT\s+EXISTS\s+)?[\[`"]?(\w+)[\]`"]?\s+ON\s+(?:ONLY\s+)?(?:[\[\]`"\w]+\s*\.\s*)*[\[`"]?(\w+)[\]`"]?\s*(?:USING\s+(\w+)\s*)?\(([^)]+)\)"#,
    )
    .unwrap()
});

static PARTIAL_INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\)\s*WHERE\b").unwrap());

/// Builder for constructing schema from DDL statements
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: Schema,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self {
            schema: Schema::new(),
        }
    }

    /// Parse a CREATE TABLE statement and add to schema
    pub fn parse_create_table(&mut self, stmt: &str) -> Option<TableId> {
        let table_name = extract_create_table_name(stmt)?;

        if let Some(id) = self.schema.get_table_id(&table_name) {
            return Some(id);
        }

        let mut table = TableSchema::new(table_name, TableId(0));
        let body = extract_table_body(stmt)?;
        parse_table_body(&body, &mut table);

        Some(self.schema.add_table(table))
    }

    /// Parse an ALTER TABLE statement: added foreign keys, primary keys and
    /// unique constraints update the existing table.
    pub fn parse_alter_table(&mut self, stmt: &str) -> Option<TableId> {
        let table_name = extract_alter_table_name(stmt)?;
        let table_id = self.schema.get_table_id(&table_name)?;
        let table = self.schema.table_mut(table_id)?;
        let stmt = strip_string_literals(stmt);

        table.foreign_keys.extend(parse_foreign_keys(&stmt));

        if let Some(pk_cols) = parse_primary_key_constraint(&stmt) {
            table.set_primary_key(&pk_cols);
        }

        if let Some(idx) = parse_unique_constraint(&stmt, &table.name) {
            table.indexes.push(idx);
        }

        Some(table_id)
    }

    /// Parse a CREATE INDEX statement and add to the appropriate table.
    /// Partial indexes (with a WHERE clause) are never treated as unique.
    pub fn parse_create_index(&mut self, stmt: &str) -> Option<TableId> {
        let caps = CREATE_INDEX_RE.captures(stmt)?;

        let is_unique = caps.get(1).is_some() && !PARTIAL_INDEX_RE.is_match(stmt);
        let index_name = caps.get(2)?.as_str().to_string();
        let table_name = caps.get(3)?.as_str().to_string();
        let index_type = caps.get(4).map(|m| m.as_str().to_uppercase());
        let columns = parse_column_list(caps.get(5)?.as_str());

        let table_id = self.schema.get_table_id(&table_name)?;

        if let Some(table) = self.schema.table_mut(table_id) {
            table.indexes.push(IndexDef {
                name: index_name,
                columns,
                is_unique,
                index_type,
            });
        }

        Some(table_id)
    }

    /// Finalize the schema, resolving all FK references
    pub fn build(mut self) -> Schema {
        self.schema.resolve_foreign_keys();
        self.schema
    }

    /// Current schema (for inspection during building)
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

/// Extract table name from CREATE TABLE statement
pub fn extract_create_table_name(stmt: &str) -> Option<String> {
    CREATE_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Extract table name from ALTER TABLE statement
pub fn extract_alter_table_name(stmt: &str) -> Option<String> {
    ALTER_TABLE_NAME_RE
        .captures(stmt)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Body of a CREATE TABLE statement (between first ( and its matching ))
fn extract_table_body(stmt: &str) -> Option<String> {
    let bytes = stmt.as_bytes();
    let mut depth = 0;
    let mut start = None;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, &b) in bytes.iter().enumerate() {
        if escape_next {
            escape_next = false;
            continue;
        }

        if b == b'\\' && in_string {
            escape_next = true;
            continue;
        }

        if b == b'\'' {
            in_string = !in_string;
            continue;
        }

        if in_string {
            continue;
        }

        if b == b'(' {
            if depth == 0 {
                start = Some(i + 1);
            }
            depth += 1;
        } else if b == b')' {
            depth -= 1;
            if depth == 0 {
                if let Some(s) = start {
                    return Some(stmt[s..i].to_string());
                }
            }
        }
    }

    None
}

/// Parse the body of a CREATE TABLE into columns and constraints
fn parse_table_body(body: &str, table: &mut TableSchema) {
    for part in split_table_body(body) {
        let trimmed = part.trim();
        if trimmed.is_empty() {
            continue;
        }

        let upper = trimmed.to_uppercase();
        let is_constraint = [
            "PRIMARY KEY",
            "CONSTRAINT",
            "FOREIGN KEY",
            "KEY ",
            "INDEX ",
            "UNIQUE",
            "FULLTEXT ",
            "SPATIAL ",
            "CHECK",
            "EXCLUDE",
        ]
        .iter()
        .any(|prefix| upper.starts_with(prefix));

        if is_constraint {
            parse_table_constraint(&strip_string_literals(trimmed), table);
        } else {
            parse_column(trimmed, table);
        }
    }
}

fn parse_table_constraint(constraint: &str, table: &mut TableSchema) {
    if let Some(pk_cols) = parse_primary_key_constraint(constraint) {
        table.set_primary_key(&pk_cols);
    }

    table.foreign_keys.extend(parse_foreign_keys(constraint));

    if let Some(idx) = parse_inline_index(constraint) {
        table.indexes.push(idx);
    } else if let Some(idx) = parse_unique_constraint(constraint, &table.name) {
        table.indexes.push(idx);
    }
}

fn parse_column(def: &str, table: &mut TableSchema) {
    // Keywords inside COMMENT or DEFAULT strings must not count
    let bare = strip_string_literals(def);
    let Some(mut col) = parse_column_def(def, &bare, ColumnId(table.columns.len() as u16)) else {
        return;
    };

    if INLINE_PRIMARY_KEY_RE.is_match(&bare) {
        col.is_primary_key = true;
        col.is_nullable = false;
        table.primary_key.push(col.ordinal);
    }

    if INLINE_UNIQUE_RE.is_match(&bare) {
        table.indexes.push(IndexDef {
            name: format!("{}_{}_key", table.name, col.name),
            columns: vec![col.name.clone()],
            is_unique: true,
            index_type: None,
        });
    }

    if let Some(caps) = INLINE_REFERENCES_RE.captures(&bare) {
        let referenced_table = caps.get(1).map(|m| m.as_str().to_string()).unwrap_or_default();
        let referenced_columns = caps
            .get(2)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        if !referenced_table.is_empty() {
            table.foreign_keys.push(ForeignKey {
                name: None,
                column_names: vec![col.name.clone()],
                referenced_table,
                referenced_columns,
                referenced_table_id: None,
            });
        }
    }

    table.columns.push(col);
}

/// Split table body by commas, respecting nested parentheses and strings
pub fn split_table_body(body: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in body.chars() {
        if escape_next {
            current.push(ch);
            escape_next = false;
            continue;
        }

        if ch == '\\' && in_string {
            current.push(ch);
            escape_next = true;
            continue;
        }

        if ch == '\'' {
            in_string = !in_string;
            current.push(ch);
            continue;
        }

        if in_string {
            current.push(ch);
            continue;
        }

        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth -= 1;
                current.push(ch);
            }
            ',' if depth == 0 => {
                parts.push(current.trim().to_string());
                current = String::new();
            }
            _ => current.push(ch),
        }
    }

    if !current.trim().is_empty() {
        parts.push(current.trim().to_string());
    }

    parts
}

/// `bare` is `def` with string literal contents removed
fn parse_column_def(def: &str, bare: &str, ordinal: ColumnId) -> Option<Column> {
    let caps = COLUMN_DEF_RE.captures(def)?;
    let name = caps.get(1)?.as_str().to_string();
    let type_name = caps.get(2)?.as_str().to_string();

    Some(Column {
        name,
        col_type: ColumnType::from_sql_type(&type_name),
        type_name,
        ordinal,
        is_primary_key: false,
        is_nullable: !NOT_NULL_RE.is_match(bare),
    })
}

/// PRIMARY KEY constraint column names
fn parse_primary_key_constraint(constraint: &str) -> Option<Vec<String>> {
    let caps = PRIMARY_KEY_RE.captures(constraint)?;
    Some(parse_column_list(caps.get(1)?.as_str()))
}

fn parse_inline_index(constraint: &str) -> Option<IndexDef> {
    let caps = INLINE_INDEX_RE.captures(constraint)?;

    Some(IndexDef {
        name: caps.get(2)?.as_str().to_string(),
        columns: parse_column_list(caps.get(3)?.as_str()),
        is_unique: caps.get(1).is_some(),
        index_type: None,
    })
}

fn parse_unique_constraint(constraint: &str, table_name: &str) -> Option<IndexDef> {
    let caps = UNIQUE_CONSTRAINT_RE.captures(constraint)?;
    let columns = parse_column_list(caps.get(2)?.as_str());
    let name = caps
        .get(1)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| format!("{}_{}_key", table_name, columns.join("_")));

    Some(IndexDef {
        name,
        columns,
        is_unique: true,
        index_type: None,
    })
}

/// FOREIGN KEY constraints in a statement
fn parse_foreign_keys(stmt: &str) -> Vec<ForeignKey> {
    let mut fks = Vec::new();

    for caps in FOREIGN_KEY_RE.captures_iter(stmt) {
        let name = caps.get(1).map(|m| m.as_str().to_string());
        let local_cols = caps
            .get(2)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();
        let ref_table = caps
            .get(3)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let ref_cols = caps
            .get(4)
            .map(|m| parse_column_list(m.as_str()))
            .unwrap_or_default();

        if !local_cols.is_empty() && !ref_table.is_empty() {
            fks.push(ForeignKey {
                name,
                column_names: local_cols,
                referenced_table: ref_table,
                referenced_columns: ref_cols,
                referenced_table_id: None,
            });
        }
    }

    fks
}

/// Copy of `sql` with the contents of single-quoted literals dropped. The
/// quotes stay so the text keeps its shape; `''` and backslash escapes are
/// treated as part of the literal.
pub fn strip_string_literals(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut in_string = false;
    let mut chars = sql.chars().peekable();

    while let Some(ch) = chars.next() {
        if !in_string {
            if ch == '\'' {
                in_string = true;
            }
            out.push(ch);
            continue;
        }

        match ch {
            '\\' => {
                chars.next();
            }
            '\'' if chars.peek() == Some(&'\'') => {
                chars.next();
            }
            '\'' => {
                in_string = false;
                out.push(ch);
            }
            _ => {}
        }
    }

    out
}

/// Parse a comma-separated column list, stripping quotes (backticks, double quotes, brackets)
pub fn parse_column_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|c| {
            c.trim()
                .trim_matches('`')
                .trim_matches('"')
                .trim_matches('[')
                .trim_matches(']')
                .to_string()
        })
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_table_names() {
        assert_eq!(
            extract_create_table_name("CREATE TABLE public.orders (id INT);"),
            Some("orders".to_string())
        );
        assert_eq!(
            extract_create_table_name("CREATE UNLOGGED TABLE IF NOT EXISTS \"events\" (id INT)"),
            Some("events".to_string())
        );
        assert_eq!(
            extract_alter_table_name("ALTER TABLE ONLY public.orders ADD CONSTRAINT x"),
            Some("orders".to_string())
        );
    }

    #[test]
    fn test_inline_references_and_unique() {
        let mut builder = SchemaBuilder::new();
        builder.parse_create_table(
            "CREATE TABLE profiles (
                id SERIAL PRIMARY KEY,
                user_id INT NOT NULL UNIQUE REFERENCES users(id),
                avatar_id INT REFERENCES media
            );",
        );
        let schema = builder.build();
        let profiles = schema.get_table("profiles").unwrap();

        assert_eq!(profiles.foreign_keys.len(), 2);
        assert_eq!(profiles.foreign_keys[0].referenced_table, "users");
        assert_eq!(profiles.foreign_keys[0].referenced_columns, vec!["id"]);
        assert!(profiles.foreign_keys[1].referenced_columns.is_empty());
        assert!(profiles.has_sole_unique("user_id"));
        assert!(!profiles.has_sole_unique("avatar_id"));
        assert!(!profiles.get_column("user_id").unwrap().is_nullable);
        assert!(profiles.get_column("avatar_id").unwrap().is_nullable);
    }

    #[test]
    fn test_table_level_constraints() {
        let mut builder = SchemaBuilder::new();
        builder.parse_create_table(
            "CREATE TABLE `enrollments` (
                `student_id` int(11) NOT NULL,
                `course_id` int(11) NOT NULL,
                `seat_id` int(11) DEFAULT NULL,
                PRIMARY KEY (`student_id`, `course_id`),
                UNIQUE KEY `uq_seat` (`seat_id`),
                CONSTRAINT `fk_student` FOREIGN KEY (`student_id`) REFERENCES `students` (`id`),
                CONSTRAINT fk_course FOREIGN KEY (course_id) REFERENCES courses (id)
            );",
        );
        let schema = builder.build();
        let enrollments = schema.get_table("enrollments").unwrap();

        assert_eq!(enrollments.primary_key.len(), 2);
        assert!(!enrollments.has_sole_unique("student_id"));
        assert!(enrollments.has_sole_unique("seat_id"));
        assert_eq!(enrollments.foreign_keys.len(), 2);
        assert_eq!(enrollments.foreign_keys[0].name.as_deref(), Some("fk_student"));
        assert_eq!(enrollments.columns[0].type_name, "int(11)");
    }

    #[test]
    fn test_unique_constraint_without_name() {
        let mut builder = SchemaBuilder::new();
        builder.parse_create_table(
            "CREATE TABLE passports (id INT PRIMARY KEY, person_id INT NOT NULL, UNIQUE (person_id))",
        );
        let schema = builder.build();

        assert!(schema.get_table("passports").unwrap().has_sole_unique("person_id"));
    }

    #[test]
    fn test_alter_table_adds_keys() {
        let mut builder = SchemaBuilder::new();
        builder.parse_create_table(
            "CREATE TABLE public.orders (id integer NOT NULL, customer_id integer NOT NULL, code character varying(20));",
        );
        builder.parse_alter_table(
            "ALTER TABLE ONLY public.orders ADD CONSTRAINT orders_pkey PRIMARY KEY (id);",
        );
        builder.parse_alter_table(
            "ALTER TABLE ONLY public.orders ADD CONSTRAINT orders_code_key UNIQUE (code);",
        );
        builder.parse_alter_table(
            "ALTER TABLE ONLY public.orders ADD CONSTRAINT orders_customer_id_fkey FOREIGN KEY (customer_id) REFERENCES public.customers(id);",
        );
        let schema = builder.build();
        let orders = schema.get_table("orders").unwrap();

        assert!(orders.has_sole_unique("id"));
        assert!(orders.has_sole_unique("code"));
        assert_eq!(orders.foreign_keys.len(), 1);
        assert_eq!(orders.foreign_keys[0].referenced_table, "customers");
        assert_eq!(orders.columns[2].type_name, "character varying(20)");
    }

    #[test]
    fn test_partial_unique_index_is_not_unique() {
        let mut builder = SchemaBuilder::new();
        builder.parse_create_table("CREATE TABLE carts (id INT PRIMARY KEY, user_id INT)");
        builder.parse_create_index(
            "CREATE UNIQUE INDEX carts_active ON carts (user_id) WHERE checked_out = false",
        );
        builder.parse_create_index("CREATE UNIQUE INDEX carts_user ON public.carts USING btree (user_id)");
        let schema = builder.build();
        let carts = schema.get_table("carts").unwrap();

        assert_eq!(carts.indexes.len(), 2);
        assert!(!carts.indexes[0].is_unique);
        assert!(carts.indexes[1].is_unique);
        assert_eq!(carts.indexes[1].index_type.as_deref(), Some("BTREE"));
    }

    #[test]
    fn test_split_table_body_respects_parens() {
        let parts = split_table_body("id INT, price DECIMAL(10,2), note VARCHAR(20) DEFAULT 'a,b'");
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1], "price DECIMAL(10,2)");
    }

    #[test]
    fn test_strip_string_literals() {
        assert_eq!(
            strip_string_literals("x INT COMMENT 'not null, unique'"),
            "x INT COMMENT ''"
        );
        assert_eq!(strip_string_literals("d TEXT DEFAULT 'it''s' NOT NULL"), "d TEXT DEFAULT '' NOT NULL");
        assert_eq!(strip_string_literals(r"d TEXT DEFAULT 'a\'b' UNIQUE"), "d TEXT DEFAULT '' UNIQUE");
        assert_eq!(strip_string_literals("`name` VARCHAR(10)"), "`name` VARCHAR(10)");
    }

    #[test]
    fn test_keywords_inside_column_strings_are_ignored() {
        let mut builder = SchemaBuilder::new();
        builder.parse_create_table(
            "CREATE TABLE orders (\n  id INT PRIMARY KEY,\n  note VARCHAR(20) DEFAULT 'primary key' COMMENT 'not null, unique',\n  status ENUM('unique','references x') NOT NULL\n)",
        );
        let schema = builder.build();
        let orders = schema.get_table("orders").unwrap();

        let note = orders.get_column("note").unwrap();
        assert!(note.is_nullable);
        assert!(!note.is_primary_key);
        assert_eq!(orders.primary_key.len(), 1);
        assert!(!orders.has_sole_unique("note"));
        assert!(!orders.has_sole_unique("status"));
        assert!(!orders.get_column("status").unwrap().is_nullable);
        assert!(orders.foreign_keys.is_empty());
    }

    #[test]
    fn test_parse_column_list() {
        assert_eq!(parse_column_list("`a`, \"b\", [c]"), vec!["a", "b", "c"]);
    }
}
