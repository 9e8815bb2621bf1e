//! Graphviz DOT format output for relationship summaries.

use super::{via_label, Diagram, Layout};
use crate::relations::{Cardinality, Table};

/// Generate DOT output. Tables are HTML-like record labels; each
/// relationship is a single edge whose ends carry crow's-foot markers.
pub fn to_dot(diagram: &Diagram, layout: Layout) -> String {
    let mut output = String::new();

    output.push_str("digraph ERSummary {\n");
    output.push_str("  graph [pad=\"0.5\", nodesep=\"1\", ranksep=\"1.5\"];\n");

    let rankdir = match layout {
        Layout::LR => "LR",
        Layout::TB => "TB",
    };
    output.push_str(&format!("  rankdir={};\n", rankdir));

    output.push_str("  node [shape=none, margin=0];\n");
    output.push_str("  edge [dir=both];\n\n");

    for table in &diagram.tables {
        output.push_str(&format!(
            "  {} [label=<{}>];\n",
            escape_dot_id(&table.name),
            generate_table_label(table)
        ));
    }

    if !diagram.relationships.is_empty() {
        output.push('\n');
    }

    for rel in &diagram.relationships {
        let label = via_label(rel);
        let style = if rel.is_indirect() { ", style=dashed" } else { "" };
        output.push_str(&format!(
            "  {} -> {} [arrowtail={}, arrowhead={}, taillabel=\"{}\", headlabel=\"{}\", label=\"{}\"{}];\n",
            escape_dot_id(&rel.from.name),
            escape_dot_id(&rel.to.name),
            arrow_shape(rel.from_cardinality),
            arrow_shape(rel.to_cardinality),
            rel.from_cardinality,
            rel.to_cardinality,
            escape_dot_string(&label),
            style
        ));
    }

    output.push_str("}\n");
    output
}

/// Graphviz arrow shape for one end: crow for many, tee for one, with an
/// odot when the side is optional
fn arrow_shape(card: Cardinality) -> &'static str {
    match (card.is_required(), card.is_many()) {
        (false, false) => "teeodot",
        (true, false) => "teetee",
        (false, true) => "crowodot",
        (true, true) => "crowtee",
    }
}

fn generate_table_label(table: &Table) -> String {
    let mut html = String::new();

    html.push_str("<TABLE BORDER=\"0\" CELLBORDER=\"1\" CELLSPACING=\"0\" CELLPADDING=\"4\">");
    html.push_str(&format!(
        "<TR><TD BGCOLOR=\"#4a5568\" COLSPAN=\"3\"><FONT COLOR=\"white\"><B>{}</B></FONT></TD></TR>",
        escape_html(&table.name)
    ));

    for col in &table.columns {
        let key_marker = match (col.is_primary_key, col.is_foreign_key) {
            (true, true) => "PK, FK",
            (true, false) => "PK",
            (false, true) => "FK",
            (false, false) => "",
        };

        html.push_str("<TR>");
        html.push_str(&format!(
            "<TD ALIGN=\"LEFT\">{}</TD>",
            escape_html(&col.name)
        ));
        html.push_str(&format!(
            "<TD ALIGN=\"LEFT\"><FONT COLOR=\"#666666\">{}</FONT></TD>",
            escape_html(&col.data_type)
        ));
        html.push_str(&format!("<TD ALIGN=\"CENTER\">{}</TD>", key_marker));
        html.push_str("</TR>");
    }

    html.push_str("</TABLE>");
    html
}

/// Escape a string for use in DOT HTML labels
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn escape_dot_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape a string for use as a DOT node ID
fn escape_dot_id(s: &str) -> String {
    if s.chars().all(|c| c.is_alphanumeric() || c == '_') && !s.is_empty() {
        s.to_string()
    } else {
        format!("\"{}\"", escape_dot_string(s))
    }
}
