mod glob_util;
mod summary;

use crate::json_schema;
use crate::logging;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ersummary")]
#[command(version)]
#[command(
    about = "Summarize the effective relationships between a chosen subset of tables",
    long_about = None
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Infer relationships between focus tables and print an ER diagram
    Summary {
        /// SQL DDL dump or JSON metadata snapshot
        /// Supports .gz, .bz2, .xz, .zst compression
        file: PathBuf,

        /// Focus tables (comma-separated, glob patterns allowed)
        #[arg(short, long)]
        tables: Option<String>,

        /// Schema name (labels SQL dump tables; overrides a snapshot's schema)
        #[arg(short, long)]
        schema: Option<String>,

        /// Show columns inside entity blocks
        #[arg(short = 'c', long)]
        show_columns: bool,

        /// Output format: mermaid, dot, json (default: mermaid)
        #[arg(short, long)]
        format: Option<String>,

        /// Layout direction for DOT output: lr, tb
        #[arg(long)]
        layout: Option<String>,

        /// Input kind: auto, sql, json (auto-detected from the file name)
        #[arg(long)]
        input_format: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// YAML config file with defaults for these options
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output results as JSON (same as --format json)
        #[arg(long)]
        json: bool,
    },

    /// Print the JSON Schema of a machine-readable output
    Schema {
        /// Schema name (summary, snapshot); all schemas when omitted
        name: Option<String>,

        /// List available schema names
        #[arg(long, conflicts_with = "name")]
        list: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    logging::init(cli.verbose);

    match cli.command {
        Commands::Summary {
            file,
            tables,
            schema,
            show_columns,
            format,
            layout,
            input_format,
            output,
            config,
            json,
        } => summary::run(
            file,
            tables,
            schema,
            show_columns,
            format,
            layout,
            input_format,
            output,
            config,
            json,
        ),
        Commands::Schema { name, list } => {
            if list {
                for name in json_schema::schema_names() {
                    println!("{}", name);
                }
                return Ok(());
            }

            let value = match name {
                Some(name) => {
                    let schema = json_schema::get_schema(&name).ok_or_else(|| {
                        anyhow::anyhow!(
                            "unknown schema: {}. Available: {}",
                            name,
                            json_schema::schema_names().join(", ")
                        )
                    })?;
                    serde_json::to_value(schema)?
                }
                None => serde_json::to_value(json_schema::all_schemas())?,
            };
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "ersummary", &mut io::stdout());
            Ok(())
        }
    }
}
