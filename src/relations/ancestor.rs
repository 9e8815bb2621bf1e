//! Common-ancestor search: the nearest table outside the focus set that holds
//! FK chains to both tables of a pair (typically a junction table).

use super::graph::{FocusSet, NodeId, RelationGraph};
use super::paths::PathIndex;

/// Connector table shared by two focus tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonAncestor {
    pub connector: NodeId,
    /// Inverted-graph path from the first table to the connector
    pub path_from_a: Vec<NodeId>,
    /// Inverted-graph path from the second table to the connector
    pub path_from_b: Vec<NodeId>,
    /// distance(a → connector) + distance(b → connector)
    pub distance: i64,
}

/// Find the connector for the pair `(a, b)`.
///
/// Candidates lie outside the focus set, are reachable from both tables, and
/// neither path may pass through another focus table. The candidate with the
/// smallest combined distance wins; nodes are scanned in id order (which is
/// table-name order) and only a strictly shorter candidate replaces the
/// current best, so ties go to the lexicographically smallest name.
pub fn find_common_ancestor(
    a: NodeId,
    b: NodeId,
    graph: &RelationGraph,
    paths: &PathIndex,
    focus: &FocusSet,
) -> Option<CommonAncestor> {
    let mut best: Option<CommonAncestor> = None;

    for candidate in graph.nodes() {
        if candidate == a || candidate == b || focus.contains(candidate) {
            continue;
        }

        let (Some(path_from_a), Some(path_from_b)) =
            (paths.path(a, candidate), paths.path(b, candidate))
        else {
            continue;
        };

        if focus.leaks(&path_from_a) || focus.leaks(&path_from_b) {
            continue;
        }

        let distance = (path_from_a.len() + path_from_b.len() - 2) as i64;
        if best.as_ref().map_or(true, |current| distance < current.distance) {
            best = Some(CommonAncestor {
                connector: candidate,
                path_from_a,
                path_from_b,
                distance,
            });
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::graph::NodeIndex;
    use crate::relations::model::ForeignKeyConstraint;

    fn fk(from: &str, to: &str) -> ForeignKeyConstraint {
        ForeignKeyConstraint {
            from_table: from.to_string(),
            from_column: format!("{}_id", to),
            to_table: to.to_string(),
            to_column: "id".to_string(),
            constraint_name: String::new(),
        }
    }

    fn setup(fks: &[ForeignKeyConstraint]) -> (RelationGraph, NodeIndex, PathIndex) {
        let (graph, index) = RelationGraph::build(fks).unwrap();
        let paths = PathIndex::compute(&graph).unwrap();
        (graph, index, paths)
    }

    fn focus_of(index: &NodeIndex, names: &[&str]) -> FocusSet {
        FocusSet::new(names.iter().filter_map(|n| index.get(n)))
    }

    #[test]
    fn test_junction_table_is_found() {
        let (graph, index, paths) = setup(&[
            fk("order_items", "orders"),
            fk("order_items", "products"),
        ]);
        let focus = focus_of(&index, &["orders", "products"]);
        let orders = index.get("orders").unwrap();
        let products = index.get("products").unwrap();

        let found = find_common_ancestor(orders, products, &graph, &paths, &focus).unwrap();

        assert_eq!(graph.name(found.connector), "order_items");
        assert_eq!(graph.names_of(&found.path_from_a), vec!["orders", "order_items"]);
        assert_eq!(graph.names_of(&found.path_from_b), vec!["products", "order_items"]);
        assert_eq!(found.distance, 2);
    }

    #[test]
    fn test_nearest_connector_wins() {
        // audit_log reaches both only through order_items
        let (graph, index, paths) = setup(&[
            fk("order_items", "orders"),
            fk("order_items", "products"),
            fk("audit_log", "order_items"),
        ]);
        let focus = focus_of(&index, &["orders", "products"]);

        let found = find_common_ancestor(
            index.get("orders").unwrap(),
            index.get("products").unwrap(),
            &graph,
            &paths,
            &focus,
        )
        .unwrap();

        assert_eq!(graph.name(found.connector), "order_items");
    }

    #[test]
    fn test_tie_breaks_by_name() {
        let (graph, index, paths) = setup(&[
            fk("wishlist", "users"),
            fk("wishlist", "products"),
            fk("reviews", "users"),
            fk("reviews", "products"),
        ]);
        let focus = focus_of(&index, &["users", "products"]);

        let found = find_common_ancestor(
            index.get("users").unwrap(),
            index.get("products").unwrap(),
            &graph,
            &paths,
            &focus,
        )
        .unwrap();

        assert_eq!(graph.name(found.connector), "reviews");
    }

    #[test]
    fn test_paths_through_other_focus_tables_are_rejected() {
        // shipments → orders → customers, shipments → carriers
        let (graph, index, paths) = setup(&[
            fk("orders", "customers"),
            fk("shipments", "orders"),
            fk("shipments", "carriers"),
        ]);
        let focus = focus_of(&index, &["customers", "carriers", "orders"]);

        let found = find_common_ancestor(
            index.get("customers").unwrap(),
            index.get("carriers").unwrap(),
            &graph,
            &paths,
            &focus,
        );

        assert!(found.is_none());
    }

    #[test]
    fn test_focus_tables_are_never_connectors() {
        let (graph, index, paths) = setup(&[fk("orders", "customers")]);
        let focus = focus_of(&index, &["orders", "customers"]);

        let found = find_common_ancestor(
            index.get("orders").unwrap(),
            index.get("customers").unwrap(),
            &graph,
            &paths,
            &focus,
        );

        assert!(found.is_none());
    }
}
