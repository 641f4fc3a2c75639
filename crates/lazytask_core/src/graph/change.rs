//! Primitive store mutations and their inverses.
//!
//! Every tracked write is expressed as a `Change`. Applying a change returns
//! the change that reverts it, which is what the document-level undo facility
//! records. Applying that inverse during undo yields the redo step.

use crate::graph::store::Store;
use crate::graph::{GraphError, GraphResult};
use crate::model::edge::Edge;
use crate::model::node::{Node, NodeId};
use crate::undo::UndoFacility;
use log::error;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Change {
    InsertNode(Node),
    RemoveNode(NodeId),
    /// Replaces title/notes/completion of an existing node.
    ReplaceNode(Node),
    /// Inserts an edge, or replaces the edge for the same pair.
    PutEdge(Edge),
    RemoveEdge { parent: NodeId, child: NodeId },
}

impl Change {
    /// Applies this change and returns its inverse.
    ///
    /// Validation happens before any write, so a failed apply leaves the
    /// store untouched.
    pub(crate) fn apply(self, store: &mut Store) -> GraphResult<Change> {
        let inverse = match self {
            Self::InsertNode(node) => {
                if store.contains(node.id) {
                    return Err(GraphError::DuplicateNode(node.id));
                }
                let id = node.id;
                store.put_node(node);
                Self::RemoveNode(id)
            }
            Self::RemoveNode(id) => {
                if id == store.root_id() {
                    return Err(GraphError::RootProtected(id));
                }
                if !store.edges_touching(id).is_empty() {
                    return Err(GraphError::NodeStillLinked(id));
                }
                let node = store.take_node(id).ok_or(GraphError::NodeNotFound(id))?;
                Self::InsertNode(node)
            }
            Self::ReplaceNode(node) => {
                let current = store
                    .node(node.id)
                    .ok_or(GraphError::NodeNotFound(node.id))?;
                let id = node.id;
                if current.is_root != node.is_root {
                    return Err(GraphError::RootProtected(id));
                }
                let previous = store.put_node(node).ok_or(GraphError::NodeNotFound(id))?;
                Self::ReplaceNode(previous)
            }
            Self::PutEdge(edge) => {
                if !edge.priority.is_finite() {
                    return Err(GraphError::InvalidPriority(edge.priority));
                }
                for endpoint in [edge.parent, edge.child] {
                    if !store.contains(endpoint) {
                        return Err(GraphError::NodeNotFound(endpoint));
                    }
                }
                if edge.child == store.root_id() {
                    return Err(GraphError::RootProtected(edge.child));
                }
                match store.put_edge(edge) {
                    Some(previous) => Self::PutEdge(previous),
                    None => Self::RemoveEdge {
                        parent: edge.parent,
                        child: edge.child,
                    },
                }
            }
            Self::RemoveEdge { parent, child } => {
                let previous = store
                    .take_edge(parent, child)
                    .ok_or(GraphError::EdgeNotFound { parent, child })?;
                Self::PutEdge(previous)
            }
        };
        store.mark_changed();
        Ok(inverse)
    }
}

/// Registers `inverse` on the document-level facility.
///
/// When fired, the step applies the inverse and registers the resulting
/// re-inverse, so the same closure shape serves undo and redo.
pub(crate) fn register_inverse(facility: &mut dyn UndoFacility<Store>, inverse: Change) {
    facility.register_undo(Box::new(
        move |store: &mut Store, facility: &mut dyn UndoFacility<Store>| {
            match inverse.apply(store) {
                Ok(reverse) => register_inverse(facility, reverse),
                Err(err) => error!(
                    "event=undo_apply module=graph status=error error_code=inverse_rejected error={err}"
                ),
            }
        },
    ));
}

#[cfg(test)]
mod tests {
    use super::Change;
    use crate::graph::store::Store;
    use crate::graph::GraphError;
    use crate::model::edge::Edge;
    use crate::model::node::Node;

    #[test]
    fn put_edge_inverse_of_fresh_link_is_remove() {
        let mut store = Store::new();
        let node = Node::new("a");
        let id = node.id;
        Change::InsertNode(node).apply(&mut store).unwrap();

        let edge = Edge {
            parent: store.root_id(),
            child: id,
            priority: 5.0,
            seq: 1,
        };
        let inverse = Change::PutEdge(edge).apply(&mut store).unwrap();
        assert_eq!(
            inverse,
            Change::RemoveEdge {
                parent: store.root_id(),
                child: id
            }
        );
        assert!(store.has_changes());
    }

    #[test]
    fn remove_node_refuses_while_linked() {
        let mut store = Store::new();
        let node = Node::new("a");
        let id = node.id;
        Change::InsertNode(node).apply(&mut store).unwrap();
        Change::PutEdge(Edge {
            parent: store.root_id(),
            child: id,
            priority: 0.0,
            seq: 1,
        })
        .apply(&mut store)
        .unwrap();

        let err = Change::RemoveNode(id).apply(&mut store).unwrap_err();
        assert_eq!(err, GraphError::NodeStillLinked(id));
        assert!(store.contains(id));
    }

    #[test]
    fn put_edge_rejects_nan_priority_without_writing() {
        let mut store = Store::new();
        let node = Node::new("a");
        let id = node.id;
        Change::InsertNode(node).apply(&mut store).unwrap();

        let err = Change::PutEdge(Edge {
            parent: store.root_id(),
            child: id,
            priority: f64::NAN,
            seq: 1,
        })
        .apply(&mut store)
        .unwrap_err();
        assert!(matches!(err, GraphError::InvalidPriority(_)));
        assert_eq!(store.edge_count(), 0);
    }
}
