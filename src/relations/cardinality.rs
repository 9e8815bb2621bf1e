//! Cardinality synthesis from FK column metadata.
//!
//! Paths handed to the synthesizer are already in FK direction: the first
//! table holds the foreign key.

use super::model::{
    Cardinality, ColumnInfo, ForeignKeyConstraint, Relationship, SchemaMetadata, TableRef,
};
use ahash::AHashMap;
use std::collections::BTreeMap;
use tracing::debug;

/// Turns FK paths into relationships with bounded cardinality
#[derive(Debug)]
pub struct CardinalitySynthesizer {
    schema: String,
    /// First declared constraint per ordered (child, parent) pair
    foreign_keys: AHashMap<(String, String), ForeignKeyConstraint>,
    columns: BTreeMap<String, ColumnInfo>,
}

impl CardinalitySynthesizer {
    pub fn new(metadata: &SchemaMetadata) -> Self {
        let mut foreign_keys: AHashMap<(String, String), ForeignKeyConstraint> = AHashMap::new();
        for fk in &metadata.foreign_keys {
            foreign_keys
                .entry((fk.from_table.clone(), fk.to_table.clone()))
                .or_insert_with(|| fk.clone());
        }

        Self {
            schema: metadata.schema.clone(),
            foreign_keys,
            columns: metadata.columns.clone(),
        }
    }

    /// Constraint from `child` to `parent`, if one was declared
    pub fn foreign_key(&self, child: &str, parent: &str) -> Option<&ForeignKeyConstraint> {
        self.foreign_keys
            .get(&(child.to_string(), parent.to_string()))
    }

    /// Relationship for a single FK: the referencing side is bounded by the
    /// column's nullability (min) and sole uniqueness (max); the referenced
    /// side is always exactly one.
    pub fn direct(&self, fk: &ForeignKeyConstraint) -> Relationship {
        let info = self.columns.get(&fk.source_key());
        let from_cardinality = match info {
            Some(info) => Cardinality::new(
                if info.is_nullable { 0 } else { 1 },
                if info.has_sole_unique_constraint {
                    Some(1)
                } else {
                    None
                },
            ),
            None => {
                debug!(column = %fk.source_key(), "no column info, assuming nullable and non-unique");
                Cardinality::OPTIONAL_MANY
            }
        };

        Relationship {
            from: self.table_ref(&fk.from_table),
            to: self.table_ref(&fk.to_table),
            from_cardinality,
            to_cardinality: Cardinality::EXACTLY_ONE,
            path: vec![fk.from_table.clone(), fk.to_table.clone()],
        }
    }

    /// Relationship along an FK-direction path. Returns `None` for paths with
    /// fewer than two tables.
    ///
    /// A single hop uses the declared constraint; when it only exists in the
    /// opposite order it is computed that way and swapped back. Longer chains
    /// are left unconstrained (`0..*` on both sides).
    pub fn along_path(&self, path: &[String]) -> Option<Relationship> {
        if path.len() < 2 {
            return None;
        }

        let first = &path[0];
        let last = &path[path.len() - 1];

        if path.len() == 2 {
            if let Some(fk) = self.foreign_key(first, last) {
                return Some(self.direct(fk));
            }
            if let Some(fk) = self.foreign_key(last, first) {
                return Some(self.direct(fk).swapped());
            }
        }

        Some(Relationship {
            from: self.table_ref(first),
            to: self.table_ref(last),
            from_cardinality: Cardinality::OPTIONAL_MANY,
            to_cardinality: Cardinality::OPTIONAL_MANY,
            path: path.to_vec(),
        })
    }

    /// Combine the half relationships `connector → a` and `connector → b`
    /// into `a ↔ b`.
    ///
    /// Both sides default to `0..*`. When every connector row is guaranteed to
    /// reference both tables (both FK-side minimums are 1) the combined
    /// minimums become 1. Maximums are never tightened.
    pub fn through_connector(
        &self,
        a: &str,
        b: &str,
        connector_to_a: &[String],
        connector_to_b: &[String],
    ) -> Option<Relationship> {
        let half_a = self.along_path(connector_to_a)?;
        let half_b = self.along_path(connector_to_b)?;

        let min = if half_a.from_cardinality.is_required() && half_b.from_cardinality.is_required() {
            1
        } else {
            0
        };

        let mut path: Vec<String> = connector_to_a.iter().rev().cloned().collect();
        path.extend(connector_to_b.iter().skip(1).cloned());

        Some(Relationship {
            from: self.table_ref(a),
            to: self.table_ref(b),
            from_cardinality: Cardinality::new(min, None),
            to_cardinality: Cardinality::new(min, None),
            path,
        })
    }

    fn table_ref(&self, name: &str) -> TableRef {
        TableRef::new(self.schema.clone(), name)
    }
}
