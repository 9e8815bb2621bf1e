//! Loading schema metadata from SQL dumps and JSON snapshots.

use crate::parser::{determine_buffer_size, Parser, StatementType};
use crate::relations::SchemaMetadata;
use crate::schema::SchemaBuilder;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info};

/// Compression format detected from file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
    Zstd,
}

impl Compression {
    /// Detect compression format from file extension
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("gz" | "gzip") => Compression::Gzip,
            Some("bz2" | "bzip2") => Compression::Bzip2,
            Some("xz" | "lzma") => Compression::Xz,
            Some("zst" | "zstd") => Compression::Zstd,
            _ => Compression::None,
        }
    }

    /// Wrap a reader with the appropriate decompressor
    pub fn wrap_reader<'a>(&self, reader: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Compression::None => reader,
            Compression::Gzip => Box::new(flate2::read::GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(bzip2::read::BzDecoder::new(reader)),
            Compression::Xz => Box::new(xz2::read::XzDecoder::new(reader)),
            Compression::Zstd => Box::new(zstd::stream::read::Decoder::new(reader)?),
        })
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Bzip2 => write!(f, "bzip2"),
            Compression::Xz => write!(f, "xz"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

/// Kind of metadata input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputFormat {
    /// Decide from the file name
    #[default]
    Auto,
    /// SQL DDL dump
    Sql,
    /// JSON metadata snapshot
    Json,
}

impl InputFormat {
    /// Resolve `Auto` from the path: `.json`, optionally followed by a
    /// compression extension, is a snapshot; anything else is SQL.
    pub fn resolve(self, path: &Path) -> Self {
        if self != InputFormat::Auto {
            return self;
        }

        let inner = if Compression::from_path(path) != Compression::None {
            path.file_stem().map(PathBuf::from).unwrap_or_default()
        } else {
            path.to_path_buf()
        };

        match inner.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => InputFormat::Json,
            _ => InputFormat::Sql,
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(InputFormat::Auto),
            "sql" | "ddl" => Ok(InputFormat::Sql),
            "json" | "snapshot" => Ok(InputFormat::Json),
            _ => Err(format!(
                "Unknown input format: {}. Valid options: auto, sql, json",
                s
            )),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Auto => write!(f, "auto"),
            InputFormat::Sql => write!(f, "sql"),
            InputFormat::Json => write!(f, "json"),
        }
    }
}

/// Failure to read schema metadata
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("input file does not exist: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid metadata snapshot: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// Load metadata from a SQL dump or JSON snapshot.
///
/// `schema_name` labels the tables of a SQL dump. For a snapshot it replaces
/// the recorded schema name when given.
pub fn load_metadata(
    path: &Path,
    format: InputFormat,
    schema_name: Option<&str>,
) -> Result<SchemaMetadata, SourceError> {
    if !path.exists() {
        return Err(SourceError::NotFound(path.to_path_buf()));
    }

    let start = Instant::now();
    let compression = Compression::from_path(path);
    let format = format.resolve(path);
    let io_err = |source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_err)?;
    let buffer_size = file
        .metadata()
        .map(|m| determine_buffer_size(m.len()))
        .map_err(io_err)?;
    let reader = compression.wrap_reader(Box::new(file)).map_err(io_err)?;

    debug!(path = %path.display(), %compression, %format, "reading metadata");

    let metadata = match format {
        InputFormat::Json => {
            let mut meta = metadata_from_json(reader)?;
            if let Some(name) = schema_name {
                retag_schema(&mut meta, name);
            }
            meta
        }
        _ => metadata_from_sql(reader, schema_name.unwrap_or("public"), buffer_size)
            .map_err(io_err)?,
    };

    info!(
        path = %path.display(),
        tables = metadata.tables.len(),
        foreign_keys = metadata.foreign_keys.len(),
        elapsed = ?start.elapsed(),
        "loaded schema metadata"
    );
    Ok(metadata)
}

/// Build metadata from a stream of SQL DDL statements
pub fn metadata_from_sql<R: Read>(
    reader: R,
    schema_name: &str,
    buffer_size: usize,
) -> io::Result<SchemaMetadata> {
    let mut parser = Parser::new(reader, buffer_size);
    let mut builder = SchemaBuilder::new();
    let mut statements = 0usize;

    while let Some(stmt) = parser.read_statement()? {
        statements += 1;
        let (stmt_type, table) = Parser::<&[u8]>::parse_statement(&stmt);
        let stmt_str = String::from_utf8_lossy(&stmt);

        let applied = match stmt_type {
            StatementType::CreateTable => builder.parse_create_table(&stmt_str).is_some(),
            StatementType::AlterTable => builder.parse_alter_table(&stmt_str).is_some(),
            StatementType::CreateIndex => builder.parse_create_index(&stmt_str).is_some(),
            StatementType::Unknown => continue,
        };

        if !applied {
            debug!(?stmt_type, %table, "statement did not apply to a known table");
        }
    }

    let schema = builder.build();
    debug!(statements, tables = schema.len(), "parsed DDL");
    Ok(SchemaMetadata::from_schema(&schema, schema_name))
}

/// Read a JSON metadata snapshot
pub fn metadata_from_json<R: Read>(reader: R) -> Result<SchemaMetadata, SourceError> {
    Ok(serde_json::from_reader(reader)?)
}

fn retag_schema(meta: &mut SchemaMetadata, name: &str) {
    meta.schema = name.to_string();
    for table in &mut meta.tables {
        table.schema = name.to_string();
    }
}
