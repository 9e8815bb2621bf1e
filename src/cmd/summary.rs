//! Summary command: infer relationships between focus tables and draw them.

use super::glob_util::{expand_table_patterns, split_table_list};
use crate::config::SummaryConfig;
use crate::diagram::{Diagram, Layout, OutputFormat};
use crate::relations::infer_relationships;
use crate::source::{load_metadata, InputFormat};
use anyhow::{bail, Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Run the summary command
#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    tables: Option<String>,
    schema: Option<String>,
    show_columns: bool,
    format: Option<String>,
    layout: Option<String>,
    input_format: Option<String>,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    json: bool,
) -> Result<()> {
    let config = match config {
        Some(ref path) => SummaryConfig::load(path)?,
        None => SummaryConfig::default(),
    };

    let format = resolve_format(json, format.or(config.format.clone()), output.as_deref())?;
    let layout = layout
        .or(config.layout.clone())
        .map(|l| l.parse::<Layout>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .unwrap_or_default();
    let input_format = input_format
        .or(config.input_format.clone())
        .map(|f| f.parse::<InputFormat>())
        .transpose()
        .map_err(|e| anyhow::anyhow!("{}", e))?
        .unwrap_or_default();
    let schema = schema.or(config.schema.clone());
    let show_columns = show_columns || config.show_columns.unwrap_or(false);

    let entries = match tables {
        Some(ref list) => split_table_list(list),
        None => config.tables.clone(),
    };
    if entries.is_empty() {
        bail!("no focus tables given; pass --tables or list them in a config file");
    }

    if format != OutputFormat::Json {
        eprintln!(
            "Summarizing relationships: {} [input: {}]",
            file.display(),
            input_format.resolve(&file)
        );
    }

    let metadata = load_metadata(&file, input_format, schema.as_deref())
        .with_context(|| format!("failed to load schema metadata from {}", file.display()))?;

    let focus = expand_table_patterns(&entries, &metadata.table_names())?;
    let relationships = infer_relationships(&metadata, &focus)?;
    let diagram = Diagram::new(
        metadata.schema.clone(),
        metadata.focus_tables(&focus, show_columns),
        relationships,
    );

    let command_line = std::env::args().collect::<Vec<_>>().join(" ");
    let content = diagram.render(format, layout, &command_line);

    if let Some(ref out_path) = output {
        let mut file = File::create(out_path)
            .with_context(|| format!("failed to create {}", out_path.display()))?;
        file.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            file.write_all(b"\n")?;
        }
        if format != OutputFormat::Json {
            eprintln!("Diagram written to: {}", out_path.display());
        }
    } else if content.ends_with('\n') {
        print!("{}", content);
    } else {
        println!("{}", content);
    }

    if format != OutputFormat::Json {
        eprintln!(
            "\nSummary: {} tables, {} relationships ({} indirect)",
            diagram.table_count(),
            diagram.relationship_count(),
            diagram.indirect_count()
        );
    }

    Ok(())
}

/// `--json` wins, then an explicit format, then the output file extension
fn resolve_format(json: bool, format: Option<String>, output: Option<&Path>) -> Result<OutputFormat> {
    if json {
        return Ok(OutputFormat::Json);
    }
    if let Some(ref f) = format {
        return f.parse().map_err(|e| anyhow::anyhow!("{}", e));
    }
    Ok(output
        .and_then(|out| out.extension())
        .and_then(|e| e.to_str())
        .and_then(OutputFormat::from_extension)
        .unwrap_or_default())
}
