//! Relationship inference through the public library API.

use ersummary::relations::{
    column_key, infer_relationships, Cardinality, ColumnInfo, ForeignKeyConstraint, InferError,
    RelationshipEngine, SchemaMetadata,
};

fn fk(from: &str, col: &str, to: &str) -> ForeignKeyConstraint {
    ForeignKeyConstraint {
        from_table: from.to_string(),
        from_column: col.to_string(),
        to_table: to.to_string(),
        to_column: "id".to_string(),
        constraint_name: format!("{}_{}_fkey", from, col),
    }
}

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn schema(fks: Vec<ForeignKeyConstraint>, cols: &[(&str, &str, bool, bool)]) -> SchemaMetadata {
    let mut meta = SchemaMetadata::new("public");
    meta.foreign_keys = fks;
    for &(table, column, nullable, unique) in cols {
        meta.columns.insert(
            column_key(table, column),
            ColumnInfo {
                is_nullable: nullable,
                has_sole_unique_constraint: unique,
            },
        );
    }
    meta
}

fn shop(order_nullable: bool, product_nullable: bool) -> SchemaMetadata {
    schema(
        vec![
            fk("orders", "customer_id", "customers"),
            fk("order_items", "order_id", "orders"),
            fk("order_items", "product_id", "products"),
        ],
        &[
            ("orders", "customer_id", false, false),
            ("order_items", "order_id", order_nullable, false),
            ("order_items", "product_id", product_nullable, false),
        ],
    )
}

#[test]
fn test_customers_and_orders() {
    let rels = infer_relationships(&shop(false, false), &names(&["customers", "orders"])).unwrap();

    assert_eq!(rels.len(), 1);
    let rel = &rels[0];
    assert_eq!(rel.from.name, "customers");
    assert_eq!(rel.to.name, "orders");
    assert_eq!(rel.from_cardinality, Cardinality::EXACTLY_ONE);
    assert_eq!(rel.to_cardinality, Cardinality::REQUIRED_MANY);
    assert_eq!(rel.path, names(&["customers", "orders"]));
}

#[test]
fn test_orientation_follows_focus_order() {
    let rels = infer_relationships(&shop(false, false), &names(&["orders", "customers"])).unwrap();

    assert_eq!(rels[0].from.name, "orders");
    assert_eq!(rels[0].from_cardinality, Cardinality::REQUIRED_MANY);
    assert_eq!(rels[0].to_cardinality, Cardinality::EXACTLY_ONE);
    assert_eq!(rels[0].path, names(&["orders", "customers"]));
}

#[test]
fn test_direct_cardinality_from_nullability_and_uniqueness() {
    let cases = [
        (false, false, Cardinality::REQUIRED_MANY),
        (true, false, Cardinality::OPTIONAL_MANY),
        (false, true, Cardinality::EXACTLY_ONE),
        (true, true, Cardinality::OPTIONAL_ONE),
    ];

    for (nullable, unique, expected) in cases {
        let meta = schema(
            vec![fk("profiles", "user_id", "users")],
            &[("profiles", "user_id", nullable, unique)],
        );
        let rels = infer_relationships(&meta, &names(&["profiles", "users"])).unwrap();

        assert_eq!(rels[0].from_cardinality, expected);
        assert_eq!(rels[0].to_cardinality, Cardinality::EXACTLY_ONE);
    }
}

#[test]
fn test_junction_table_connects_orders_and_products() {
    for (order_nullable, product_nullable) in [(false, false), (true, false), (false, true), (true, true)] {
        let meta = shop(order_nullable, product_nullable);
        let rels = infer_relationships(&meta, &names(&["orders", "products"])).unwrap();

        assert_eq!(rels.len(), 1);
        let rel = &rels[0];
        assert_eq!(rel.path, names(&["orders", "order_items", "products"]));
        assert_eq!(rel.via(), &["order_items".to_string()]);

        let min = if !order_nullable && !product_nullable { 1 } else { 0 };
        assert_eq!(rel.from_cardinality, Cardinality::new(min, None));
        assert_eq!(rel.to_cardinality, Cardinality::new(min, None));
    }
}

#[test]
fn test_focus_table_in_the_middle_suppresses_pair() {
    let meta = schema(
        vec![
            fk("invoices", "order_id", "orders"),
            fk("orders", "customer_id", "customers"),
        ],
        &[],
    );

    let rels = infer_relationships(&meta, &names(&["invoices", "orders", "customers"])).unwrap();
    let pairs: Vec<(String, String)> = rels
        .iter()
        .map(|r| (r.from.name.clone(), r.to.name.clone()))
        .collect();

    assert_eq!(
        pairs,
        vec![
            ("invoices".to_string(), "orders".to_string()),
            ("orders".to_string(), "customers".to_string()),
        ]
    );
}

#[test]
fn test_multi_hop_chain_outside_focus() {
    let meta = schema(
        vec![
            fk("invoices", "order_id", "orders"),
            fk("orders", "customer_id", "customers"),
        ],
        &[
            ("invoices", "order_id", false, true),
            ("orders", "customer_id", false, false),
        ],
    );

    let rels = infer_relationships(&meta, &names(&["customers", "invoices"])).unwrap();

    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].path, names(&["customers", "orders", "invoices"]));
    assert_eq!(rels[0].from_cardinality, Cardinality::OPTIONAL_MANY);
    assert_eq!(rels[0].to_cardinality, Cardinality::OPTIONAL_MANY);
}

#[test]
fn test_self_reference_adds_no_edge() {
    let meta = schema(
        vec![
            fk("categories", "parent_id", "categories"),
            fk("products", "category_id", "categories"),
        ],
        &[("products", "category_id", true, false)],
    );

    let engine = RelationshipEngine::new(&meta).unwrap();
    let categories = engine.index().get("categories").unwrap();
    assert!(!engine.graph().has_edge(categories, categories));
    assert!(engine.graph().has_self_reference(categories));
    assert_eq!(engine.graph().edge_count(), 1);

    let rels = engine.relationships(&names(&["categories", "products"]));
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].to_cardinality, Cardinality::OPTIONAL_MANY);
}

#[test]
fn test_equal_connectors_break_ties_by_name() {
    let meta = schema(
        vec![
            fk("wishlist", "user_id", "users"),
            fk("wishlist", "product_id", "products"),
            fk("carts", "user_id", "users"),
            fk("carts", "product_id", "products"),
        ],
        &[],
    );

    let rels = infer_relationships(&meta, &names(&["users", "products"])).unwrap();
    assert_eq!(rels[0].path, names(&["users", "carts", "products"]));
}

#[test]
fn test_nearest_connector_wins() {
    let meta = schema(
        vec![
            fk("reviews", "author_id", "authors"),
            fk("review_votes", "review_id", "reviews"),
            fk("review_votes", "book_id", "books"),
            fk("book_authors", "author_id", "authors"),
            fk("book_authors", "book_id", "books"),
        ],
        &[],
    );

    let rels = infer_relationships(&meta, &names(&["authors", "books"])).unwrap();
    assert_eq!(rels[0].path, names(&["authors", "book_authors", "books"]));
}

#[test]
fn test_unrelated_and_unknown_tables() {
    let meta = schema(
        vec![
            fk("orders", "customer_id", "customers"),
            fk("posts", "author_id", "authors"),
        ],
        &[],
    );

    let rels = infer_relationships(&meta, &names(&["orders", "posts", "audit_log"])).unwrap();
    assert!(rels.is_empty());
}

#[test]
fn test_at_most_one_relationship_per_pair() {
    let meta = schema(
        vec![
            fk("messages", "sender_id", "users"),
            fk("messages", "recipient_id", "users"),
            fk("messages", "thread_id", "threads"),
            fk("threads", "owner_id", "users"),
        ],
        &[],
    );

    let rels = infer_relationships(&meta, &names(&["users", "messages", "threads"])).unwrap();
    let mut pairs: Vec<(String, String)> = rels
        .iter()
        .map(|r| {
            let mut pair = [r.from.name.clone(), r.to.name.clone()];
            pair.sort();
            (pair[0].clone(), pair[1].clone())
        })
        .collect();
    let total = pairs.len();
    pairs.sort();
    pairs.dedup();
    assert_eq!(pairs.len(), total);
}

#[test]
fn test_inference_is_idempotent_and_order_independent() {
    let meta = shop(false, true);
    let focus = names(&["customers", "orders", "products"]);

    let first = infer_relationships(&meta, &focus).unwrap();
    let second = infer_relationships(&meta, &focus).unwrap();
    assert_eq!(first, second);

    let mut shuffled = meta.clone();
    shuffled.foreign_keys.reverse();
    assert_eq!(infer_relationships(&shuffled, &focus).unwrap(), first);
}

#[test]
fn test_empty_focus_and_single_table() {
    let meta = shop(false, false);

    assert!(infer_relationships(&meta, &[]).unwrap().is_empty());
    assert!(infer_relationships(&meta, &names(&["orders"])).unwrap().is_empty());
}

#[test]
fn test_empty_table_name_is_a_typed_error() {
    let mut meta = shop(false, false);
    meta.foreign_keys.push(fk("orders", "warehouse_id", ""));

    let err = RelationshipEngine::new(&meta).unwrap_err();
    assert_eq!(
        err,
        InferError::EmptyTableName {
            constraint: "orders_warehouse_id_fkey".to_string(),
            side: "referenced",
        }
    );
}
