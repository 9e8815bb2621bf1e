//! All-pairs shortest paths over the relationship graph (Floyd-Warshall).

use super::error::{InferError, Result};
use super::graph::{NodeId, RelationGraph};
use thiserror::Error;

/// Weight of every FK edge
pub const EDGE_WEIGHT: i64 = 1;

/// A node whose distance to itself became negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("negative cycle through {node}")]
pub struct NegativeCycle {
    pub node: NodeId,
}

/// Distance matrix plus successor matrix for path reconstruction
#[derive(Debug, Clone)]
pub struct PathIndex {
    n: usize,
    dist: Vec<Option<i64>>,
    next: Vec<Option<NodeId>>,
}

impl PathIndex {
    /// Compute the index for a relationship graph with unit edge weights
    pub fn compute(graph: &RelationGraph) -> Result<Self> {
        let edges = graph
            .edges()
            .iter()
            .map(|e| (e.parent, e.child, EDGE_WEIGHT));

        Self::from_weighted_edges(graph.len(), edges).map_err(|cycle| InferError::NegativeCycle {
            table: graph.name(cycle.node).to_string(),
        })
    }

    /// Floyd-Warshall over `node_count` nodes.
    ///
    /// Updates only on strict improvement, so among equally short paths the
    /// one through the lowest intermediate id is kept. Parallel edges keep the
    /// lightest weight.
    pub fn from_weighted_edges<I>(node_count: usize, edges: I) -> std::result::Result<Self, NegativeCycle>
    where
        I: IntoIterator<Item = (NodeId, NodeId, i64)>,
    {
        let n = node_count;
        let mut dist: Vec<Option<i64>> = vec![None; n * n];
        let mut next: Vec<Option<NodeId>> = vec![None; n * n];

        for i in 0..n {
            dist[i * n + i] = Some(0);
            next[i * n + i] = Some(NodeId(i as u32));
        }

        for (u, v, w) in edges {
            let cell = u.index() * n + v.index();
            if dist[cell].map_or(true, |d| w < d) {
                dist[cell] = Some(w);
                next[cell] = Some(v);
            }
        }

        for k in 0..n {
            for i in 0..n {
                let Some(ik) = dist[i * n + k] else {
                    continue;
                };
                for j in 0..n {
                    let Some(kj) = dist[k * n + j] else {
                        continue;
                    };
                    let candidate = ik.saturating_add(kj);
                    let cell = i * n + j;
                    if dist[cell].map_or(true, |d| candidate < d) {
                        dist[cell] = Some(candidate);
                        next[cell] = next[i * n + k];
                    }
                }
            }
        }

        if let Some(i) = (0..n).find(|&i| dist[i * n + i].is_some_and(|d| d < 0)) {
            return Err(NegativeCycle {
                node: NodeId(i as u32),
            });
        }

        Ok(Self { n, dist, next })
    }

    pub fn node_count(&self) -> usize {
        self.n
    }

    /// Whether `v` is reachable from `u`. Every node reaches itself.
    pub fn is_reachable(&self, u: NodeId, v: NodeId) -> bool {
        self.distance(u, v).is_some()
    }

    /// Length of the shortest path from `u` to `v`
    pub fn distance(&self, u: NodeId, v: NodeId) -> Option<i64> {
        if u.index() >= self.n || v.index() >= self.n {
            return None;
        }
        self.dist[u.index() * self.n + v.index()]
    }

    /// Shortest path from `u` to `v`, endpoints inclusive. `path(u, u)` is `[u]`.
    pub fn path(&self, u: NodeId, v: NodeId) -> Option<Vec<NodeId>> {
        self.distance(u, v)?;

        let mut path = vec![u];
        let mut current = u;
        while current != v {
            current = self.next[current.index() * self.n + v.index()]?;
            path.push(current);
            if path.len() > self.n {
                return None;
            }
        }
        Some(path)
    }
}
