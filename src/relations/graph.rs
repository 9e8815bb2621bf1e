//! Relationship graph built from foreign key constraints.
//!
//! Edges run parent → child, the opposite of the FK declaration. A path
//! `A → … → C` therefore means C reaches A through a chain of foreign keys,
//! which is what the common-descendant search needs.

use super::error::{InferError, Result};
use super::model::ForeignKeyConstraint;
use ahash::{AHashMap, AHashSet};
use std::collections::BTreeSet;
use std::fmt;

/// Stable handle of a table within one graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({})", self.0)
    }
}

/// Inverted FK edge: `parent` is referenced by `child`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
}

/// Immutable lookup from table name to node handle
#[derive(Debug, Default, Clone)]
pub struct NodeIndex {
    by_name: AHashMap<String, NodeId>,
}

impl NodeIndex {
    pub fn get(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// Arena of table nodes with parent → child adjacency
#[derive(Debug)]
pub struct RelationGraph {
    names: Vec<String>,
    edges: Vec<Edge>,
    children: Vec<Vec<NodeId>>,
    self_referencing: Vec<bool>,
}

impl RelationGraph {
    /// Build the graph and its node index from every FK in the schema.
    ///
    /// Node ids follow lexicographic table-name order. Self-references
    /// register the table but add no edge; repeated constraints between the
    /// same ordered pair collapse into one edge.
    pub fn build(foreign_keys: &[ForeignKeyConstraint]) -> Result<(Self, NodeIndex)> {
        for fk in foreign_keys {
            if fk.from_table.is_empty() {
                return Err(InferError::EmptyTableName {
                    constraint: fk.constraint_name.clone(),
                    side: "referencing",
                });
            }
            if fk.to_table.is_empty() {
                return Err(InferError::EmptyTableName {
                    constraint: fk.constraint_name.clone(),
                    side: "referenced",
                });
            }
        }

        let distinct: BTreeSet<&str> = foreign_keys
            .iter()
            .flat_map(|fk| [fk.from_table.as_str(), fk.to_table.as_str()])
            .collect();

        let names: Vec<String> = distinct.into_iter().map(str::to_string).collect();
        let by_name: AHashMap<String, NodeId> = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), NodeId(i as u32)))
            .collect();

        let n = names.len();
        let mut edges = Vec::new();
        let mut seen: AHashSet<Edge> = AHashSet::new();
        let mut children: Vec<Vec<NodeId>> = vec![Vec::new(); n];
        let mut self_referencing = vec![false; n];

        for fk in foreign_keys {
            let (Some(&child), Some(&parent)) = (
                by_name.get(fk.from_table.as_str()),
                by_name.get(fk.to_table.as_str()),
            ) else {
                continue;
            };

            if child == parent {
                self_referencing[child.index()] = true;
                continue;
            }

            let edge = Edge { parent, child };
            if seen.insert(edge) {
                edges.push(edge);
                children[parent.index()].push(child);
            }
        }

        let graph = Self {
            names,
            edges,
            children,
            self_referencing,
        };
        Ok((graph, NodeIndex { by_name }))
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Table name of a node
    pub fn name(&self, id: NodeId) -> &str {
        &self.names[id.index()]
    }

    /// Map a node path to table names
    pub fn names_of(&self, path: &[NodeId]) -> Vec<String> {
        path.iter().map(|&id| self.name(id).to_string()).collect()
    }

    /// All nodes in id order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.names.len()).map(|i| NodeId(i as u32))
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Tables that hold an FK to `id`
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.children[id.index()]
    }

    pub fn has_edge(&self, parent: NodeId, child: NodeId) -> bool {
        self.children[parent.index()].contains(&child)
    }

    /// Whether the table has an FK to itself
    pub fn has_self_reference(&self, id: NodeId) -> bool {
        self.self_referencing[id.index()]
    }
}

/// The focus tables present in the graph
#[derive(Debug, Default, Clone)]
pub struct FocusSet {
    members: AHashSet<NodeId>,
}

impl FocusSet {
    pub fn new(members: impl IntoIterator<Item = NodeId>) -> Self {
        Self {
            members: members.into_iter().collect(),
        }
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Whether a focus table sits strictly between the endpoints of `path`
    pub fn leaks(&self, path: &[NodeId]) -> bool {
        path.len() > 2 && path[1..path.len() - 1].iter().any(|id| self.contains(*id))
    }
}
