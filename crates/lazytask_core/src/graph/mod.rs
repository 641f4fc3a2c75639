//! Node store and relation graph.
//!
//! # Responsibility
//! - Own node lifetime (arena keyed by `NodeId`) and edge lifetime (edge
//!   table keyed by `(parent, child)`).
//! - Route every mutation through invertible changes so the document-level
//!   undo facility records it automatically.
//!
//! # Invariants
//! - At most one edge per `(parent, child)` pair.
//! - No edge references a missing node; deletion removes referencing edges
//!   before the node itself.
//! - Exactly one root node exists and it is never deleted.

use crate::model::node::NodeId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub(crate) mod change;
pub mod document;
pub mod store;

pub use document::Document;
pub use store::Store;

/// Result type used by graph operations.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors from node store and relation graph operations.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    /// Referenced node does not exist.
    NodeNotFound(NodeId),
    /// A node with this id already exists.
    DuplicateNode(NodeId),
    /// The root node cannot be deleted or re-linked as a child.
    RootProtected(NodeId),
    /// Node removal was attempted while edges still reference it.
    NodeStillLinked(NodeId),
    /// Referenced edge does not exist.
    EdgeNotFound { parent: NodeId, child: NodeId },
    /// An edge references a node that is no longer in the store.
    DanglingEdge { parent: NodeId, child: NodeId },
    /// Priority is NaN or infinite.
    InvalidPriority(f64),
    /// Snapshot has no root node.
    MissingRoot,
    /// Snapshot has more than one root node.
    MultipleRoots { first: NodeId, second: NodeId },
}

impl Display for GraphError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "node not found: {id}"),
            Self::DuplicateNode(id) => write!(f, "node already exists: {id}"),
            Self::RootProtected(id) => write!(f, "root node cannot be modified this way: {id}"),
            Self::NodeStillLinked(id) => {
                write!(f, "node still referenced by edges: {id}")
            }
            Self::EdgeNotFound { parent, child } => {
                write!(f, "edge not found: {parent} -> {child}")
            }
            Self::DanglingEdge { parent, child } => {
                write!(f, "edge references a missing node: {parent} -> {child}")
            }
            Self::InvalidPriority(value) => write!(f, "priority must be finite, got {value}"),
            Self::MissingRoot => write!(f, "store has no root node"),
            Self::MultipleRoots { first, second } => {
                write!(f, "store has more than one root node: {first}, {second}")
            }
        }
    }
}

impl Error for GraphError {}
