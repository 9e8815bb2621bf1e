//! Relationship inference between a chosen subset of tables.
//!
//! This module provides:
//! - The data model shared with metadata sources and diagram emitters
//! - An inverted FK graph over the whole schema with a name → node index
//! - An all-pairs shortest-path index (Floyd-Warshall)
//! - Common-connector and direct-path resolvers that refuse to route
//!   through other focus tables
//! - Cardinality synthesis from FK column nullability and uniqueness

mod ancestor;
mod cardinality;
mod direct;
mod error;
mod graph;
mod model;
mod paths;

pub use error::InferError;
pub use graph::{FocusSet, NodeIndex, RelationGraph};
pub use model::*;
pub use paths::PathIndex;

use ancestor::find_common_ancestor;
use cardinality::CardinalitySynthesizer;
use direct::find_direct_path;
use graph::NodeId;

use ahash::AHashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Graph, indexes and lookups for one schema, built once and read-only
/// afterwards.
#[derive(Debug)]
pub struct RelationshipEngine {
    graph: RelationGraph,
    index: NodeIndex,
    paths: PathIndex,
    synthesizer: CardinalitySynthesizer,
}

impl RelationshipEngine {
    pub fn new(metadata: &SchemaMetadata) -> Result<Self, InferError> {
        let start = Instant::now();
        let (graph, index) = RelationGraph::build(&metadata.foreign_keys)?;
        let paths = PathIndex::compute(&graph)?;
        let synthesizer = CardinalitySynthesizer::new(metadata);

        info!(
            tables = graph.len(),
            edges = graph.edge_count(),
            foreign_keys = metadata.foreign_keys.len(),
            elapsed = ?start.elapsed(),
            "built relationship graph"
        );

        Ok(Self {
            graph,
            index,
            paths,
            synthesizer,
        })
    }

    pub fn graph(&self) -> &RelationGraph {
        &self.graph
    }

    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    pub fn paths(&self) -> &PathIndex {
        &self.paths
    }

    /// Focus set for a list of table names. Names without FK metadata are
    /// left out.
    pub fn focus_set(&self, focus: &[String]) -> FocusSet {
        FocusSet::new(focus.iter().filter_map(|name| self.index.get(name)))
    }

    /// Relationships between every pair of focus tables.
    ///
    /// Duplicate names are ignored after their first occurrence. Each pair
    /// yields at most one relationship, oriented from the table listed first.
    pub fn relationships(&self, focus: &[String]) -> Vec<Relationship> {
        let focus = dedup_names(focus);

        for name in &focus {
            match self.index.get(name) {
                None => {
                    warn!(table = %name, "table has no foreign key metadata; it will have no relationships")
                }
                Some(id) if self.graph.has_self_reference(id) => {
                    debug!(table = %name, "self-reference ignored")
                }
                Some(_) => {}
            }
        }

        let focus_set = self.focus_set(&focus);
        let mut relationships = Vec::new();

        for (i, a) in focus.iter().enumerate() {
            for b in &focus[i + 1..] {
                if let Some(rel) = self.relationship(a, b, &focus_set) {
                    relationships.push(rel);
                }
            }
        }

        info!(
            focus = focus.len(),
            relationships = relationships.len(),
            "inferred relationships"
        );
        relationships
    }

    /// Relationship between `a` and `b`, oriented from `a`.
    ///
    /// A common connector outside the focus set takes precedence; otherwise
    /// a direct FK chain in either direction is used.
    pub fn relationship(&self, a: &str, b: &str, focus: &FocusSet) -> Option<Relationship> {
        let node_a = self.index.get(a)?;
        let node_b = self.index.get(b)?;
        if node_a == node_b {
            return None;
        }

        if let Some(found) = find_common_ancestor(node_a, node_b, &self.graph, &self.paths, focus) {
            let connector_to_a = reversed_names(&self.graph, &found.path_from_a);
            let connector_to_b = reversed_names(&self.graph, &found.path_from_b);
            debug!(
                a,
                b,
                connector = self.graph.name(found.connector),
                distance = found.distance,
                "resolved through connector"
            );
            return self
                .synthesizer
                .through_connector(a, b, &connector_to_a, &connector_to_b);
        }

        let Some(direct) = find_direct_path(node_a, node_b, &self.paths, focus) else {
            debug!(a, b, "no path between tables");
            return None;
        };

        let fk_path = self.graph.names_of(&direct.fk_path);
        debug!(a, b, orientation = ?direct.orientation, hops = fk_path.len() - 1, "resolved direct path");
        self.synthesizer
            .along_path(&fk_path)
            .map(|rel| rel.oriented_from(a))
    }
}

/// Infer the relationships between the focus tables of a schema
pub fn infer_relationships(
    metadata: &SchemaMetadata,
    focus: &[String],
) -> Result<Vec<Relationship>, InferError> {
    if metadata.foreign_keys.is_empty() {
        info!("schema has no foreign keys");
        return Ok(Vec::new());
    }
    let engine = RelationshipEngine::new(metadata)?;
    Ok(engine.relationships(focus))
}

fn reversed_names(graph: &RelationGraph, path: &[NodeId]) -> Vec<String> {
    path.iter().rev().map(|&id| graph.name(id).to_string()).collect()
}

fn dedup_names(names: &[String]) -> Vec<String> {
    let mut seen = AHashSet::new();
    names
        .iter()
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}
