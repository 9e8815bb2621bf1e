//! Glob pattern expansion for focus table selection.
//!
//! Entries like `order*` or `user_?` are matched against the table names
//! known to the loaded metadata; plain names pass through unchanged.

use glob::{MatchOptions, Pattern};

/// Check if a table entry contains glob pattern characters.
pub fn is_glob_pattern(entry: &str) -> bool {
    entry.contains('*') || entry.contains('?') || entry.contains('[')
}

/// Split a comma-separated `--tables` value, dropping empty entries
pub fn split_table_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Expand table entries against the known table names.
///
/// Matches of a pattern keep the order of `known`. Each table appears once,
/// at its first position. Literal names take the spelling of the known table
/// they match case-insensitively, and are kept as given when unknown so the
/// engine can report them.
///
/// # Errors
///
/// Returns an error if a pattern is invalid or matches no table.
pub fn expand_table_patterns(entries: &[String], known: &[String]) -> anyhow::Result<Vec<String>> {
    let options = MatchOptions {
        case_sensitive: false,
        ..MatchOptions::default()
    };
    let mut tables: Vec<String> = Vec::new();

    for entry in entries {
        if !is_glob_pattern(entry) {
            let name = known
                .iter()
                .find(|name| *name == entry)
                .or_else(|| known.iter().find(|name| name.eq_ignore_ascii_case(entry)))
                .unwrap_or(entry);
            push_unique(&mut tables, name);
            continue;
        }

        let pattern = Pattern::new(entry)
            .map_err(|e| anyhow::anyhow!("invalid table pattern '{}': {}", entry, e))?;
        let matches: Vec<&String> = known
            .iter()
            .filter(|name| pattern.matches_with(name, options))
            .collect();

        if matches.is_empty() {
            anyhow::bail!("no tables match pattern: {}", entry);
        }
        for name in matches {
            push_unique(&mut tables, name);
        }
    }

    Ok(tables)
}

fn push_unique(tables: &mut Vec<String>, name: &str) {
    if !tables.iter().any(|t| t == name) {
        tables.push(name.to_string());
    }
}
