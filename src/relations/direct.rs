//! Direct-path fallback for pairs without a common connector.

use super::graph::{FocusSet, NodeId};
use super::paths::PathIndex;

/// Which table of the pair holds the FK chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The first table references the second, directly or transitively
    Forward,
    /// The second table references the first
    Reverse,
}

/// FK chain between two focus tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectPath {
    /// Tables in FK direction: referencing table first
    pub fk_path: Vec<NodeId>,
    pub orientation: Orientation,
}

/// Try `b → a` then `a → b` in the inverted graph and return the first chain
/// whose intermediate tables are all outside the focus set.
pub fn find_direct_path(a: NodeId, b: NodeId, paths: &PathIndex, focus: &FocusSet) -> Option<DirectPath> {
    try_direction(b, a, paths, focus, Orientation::Forward)
        .or_else(|| try_direction(a, b, paths, focus, Orientation::Reverse))
}

fn try_direction(
    parent: NodeId,
    child: NodeId,
    paths: &PathIndex,
    focus: &FocusSet,
    orientation: Orientation,
) -> Option<DirectPath> {
    if parent == child {
        return None;
    }

    let mut path = paths.path(parent, child)?;
    if focus.leaks(&path) {
        return None;
    }

    // Inverted graph runs parent → child; FK direction is child → parent.
    path.reverse();
    Some(DirectPath {
        fk_path: path,
        orientation,
    })
}
