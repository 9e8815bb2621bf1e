//! YAML configuration for the summary command.
//!
//! Every field is optional; command-line flags override file values.
//!
//! ```yaml
//! schema: public
//! tables: [customers, orders, "product*"]
//! show_columns: true
//! format: mermaid
//! layout: lr
//! input_format: auto
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Complete YAML configuration for the summary command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SummaryConfig {
    /// Schema name for tables read from SQL dumps
    pub schema: Option<String>,
    /// Focus tables or glob patterns
    pub tables: Vec<String>,
    /// Show columns inside entity blocks
    pub show_columns: Option<bool>,
    /// Output format: mermaid, dot or json
    pub format: Option<String>,
    /// Layout direction for DOT output: lr or tb
    pub layout: Option<String>,
    /// Input kind: auto, sql or json
    pub input_format: Option<String>,
}

impl SummaryConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml_ng::from_str(content)?)
    }
}
