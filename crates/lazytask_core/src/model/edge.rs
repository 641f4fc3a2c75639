//! Ordered containment link between two nodes.
//!
//! # Invariants
//! - At most one edge exists per `(parent, child)` pair.
//! - `priority` is finite; higher sorts earlier within the parent.
//! - `seq` is assigned once at creation and survives priority updates.

use crate::model::node::NodeId;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One `(parent, child, priority)` record of the relation graph.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub parent: NodeId,
    pub child: NodeId,
    /// Sort key within `parent`; higher = earlier.
    pub priority: f64,
    /// Edge-creation sequence, used as the tie-breaker for equal priorities.
    pub seq: u64,
}

impl Edge {
    /// Display ordering inside one parent: descending priority, then
    /// ascending creation sequence.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .total_cmp(&self.priority)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

#[cfg(test)]
mod tests {
    use super::Edge;
    use std::cmp::Ordering;
    use uuid::Uuid;

    fn edge(priority: f64, seq: u64) -> Edge {
        Edge {
            parent: Uuid::nil(),
            child: Uuid::new_v4(),
            priority,
            seq,
        }
    }

    #[test]
    fn higher_priority_sorts_first() {
        assert_eq!(edge(50.0, 9).display_cmp(&edge(40.0, 1)), Ordering::Less);
    }

    #[test]
    fn equal_priority_falls_back_to_creation_order() {
        assert_eq!(edge(10.0, 1).display_cmp(&edge(10.0, 2)), Ordering::Less);
        assert_eq!(edge(10.0, 3).display_cmp(&edge(10.0, 2)), Ordering::Greater);
    }
}
