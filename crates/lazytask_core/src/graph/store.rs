//! Node arena and edge table.
//!
//! # Responsibility
//! - Hold nodes addressed by stable ids and edges keyed by `(parent, child)`.
//! - Answer ordering and membership queries.
//!
//! # Invariants
//! - `parents` mirrors `edges` as `(child, parent)` pairs.
//! - Raw mutators are crate-private; callers mutate through `Document`.
//! - Child listing is deterministic: `priority DESC, seq ASC`.

use crate::graph::{GraphError, GraphResult};
use crate::model::edge::Edge;
use crate::model::node::{Node, NodeId};
use log::error;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

const ID_MIN: Uuid = Uuid::nil();
const ID_MAX: Uuid = Uuid::from_u128(u128::MAX);

/// In-memory node store plus relation graph for one document.
#[derive(Debug, Clone)]
pub struct Store {
    nodes: HashMap<NodeId, Node>,
    edges: BTreeMap<(NodeId, NodeId), Edge>,
    parents: BTreeSet<(NodeId, NodeId)>,
    root: NodeId,
    next_seq: u64,
    has_changes: bool,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store holding only a fresh root node.
    pub fn new() -> Self {
        let root = Node::root();
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            nodes,
            edges: BTreeMap::new(),
            parents: BTreeSet::new(),
            root: root_id,
            next_seq: 1,
            has_changes: false,
        }
    }

    /// Rebuilds a store from persisted rows.
    ///
    /// # Errors
    /// - `MissingRoot` / `MultipleRoots` when root cardinality is not one.
    /// - `DuplicateNode` when two rows share an id.
    /// - `DanglingEdge` when an edge endpoint is absent.
    /// - `InvalidPriority` when a priority is not finite.
    pub fn from_parts(nodes: Vec<Node>, edges: Vec<Edge>) -> GraphResult<Self> {
        let mut root = None;
        let mut arena = HashMap::with_capacity(nodes.len());
        for node in nodes {
            if node.is_root {
                if let Some(first) = root {
                    return Err(GraphError::MultipleRoots {
                        first,
                        second: node.id,
                    });
                }
                root = Some(node.id);
            }
            let id = node.id;
            if arena.insert(id, node).is_some() {
                return Err(GraphError::DuplicateNode(id));
            }
        }
        let root = root.ok_or(GraphError::MissingRoot)?;

        let mut store = Self {
            nodes: arena,
            edges: BTreeMap::new(),
            parents: BTreeSet::new(),
            root,
            next_seq: 1,
            has_changes: false,
        };
        for edge in edges {
            if !store.contains(edge.parent) || !store.contains(edge.child) {
                return Err(GraphError::DanglingEdge {
                    parent: edge.parent,
                    child: edge.child,
                });
            }
            if !edge.priority.is_finite() {
                return Err(GraphError::InvalidPriority(edge.priority));
            }
            store.next_seq = store.next_seq.max(edge.seq + 1);
            store.put_edge(edge);
        }
        Ok(store)
    }

    /// Id of the hidden root node.
    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Iterates nodes in arbitrary order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Iterates edges grouped by parent.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    /// Returns the edge for `(parent, child)`, if linked.
    pub fn find_edge(&self, parent: NodeId, child: NodeId) -> Option<Edge> {
        self.edges.get(&(parent, child)).copied()
    }

    /// Edges below `parent` in display order.
    pub fn ordered_edges(&self, parent: NodeId) -> Vec<Edge> {
        let mut edges = self
            .edges
            .range((parent, ID_MIN)..=(parent, ID_MAX))
            .map(|(_, edge)| *edge)
            .collect::<Vec<_>>();
        edges.sort_by(Edge::display_cmp);
        edges
    }

    /// Children of `parent` in display order.
    ///
    /// # Errors
    /// - `DanglingEdge` when an edge points at a missing child. This means a
    ///   cascade delete was skipped somewhere and is logged as an error.
    pub fn ordered_children(&self, parent: NodeId) -> GraphResult<Vec<&Node>> {
        self.ordered_edges(parent)
            .into_iter()
            .map(|edge| {
                self.nodes.get(&edge.child).ok_or_else(|| {
                    error!(
                        "event=graph_consistency module=graph status=error parent={} child={}",
                        edge.parent, edge.child
                    );
                    GraphError::DanglingEdge {
                        parent: edge.parent,
                        child: edge.child,
                    }
                })
            })
            .collect()
    }

    /// Child ids of `parent` in display order.
    pub fn ordered_child_ids(&self, parent: NodeId) -> Vec<NodeId> {
        self.ordered_edges(parent)
            .into_iter()
            .map(|edge| edge.child)
            .collect()
    }

    /// Priorities of `parent`'s children in display order.
    pub fn child_priorities(&self, parent: NodeId) -> Vec<f64> {
        self.ordered_edges(parent)
            .into_iter()
            .map(|edge| edge.priority)
            .collect()
    }

    /// Every parent that currently contains `child`.
    pub fn parents_of(&self, child: NodeId) -> Vec<NodeId> {
        self.parents
            .range((child, ID_MIN)..=(child, ID_MAX))
            .map(|(_, parent)| *parent)
            .collect()
    }

    /// Every edge where `node` is either endpoint.
    pub fn edges_touching(&self, node: NodeId) -> Vec<Edge> {
        let mut touching = self
            .edges
            .range((node, ID_MIN)..=(node, ID_MAX))
            .map(|(_, edge)| *edge)
            .collect::<Vec<_>>();
        for parent in self.parents_of(node) {
            if parent == node {
                continue;
            }
            if let Some(edge) = self.find_edge(parent, node) {
                touching.push(edge);
            }
        }
        touching
    }

    /// Whether the store changed since it was created, loaded or saved.
    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    pub(crate) fn mark_changed(&mut self) {
        self.has_changes = true;
    }

    pub(crate) fn mark_saved(&mut self) {
        self.has_changes = false;
    }

    pub(crate) fn allocate_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    pub(crate) fn put_node(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id, node)
    }

    pub(crate) fn take_node(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub(crate) fn put_edge(&mut self, edge: Edge) -> Option<Edge> {
        self.parents.insert((edge.child, edge.parent));
        self.edges.insert((edge.parent, edge.child), edge)
    }

    pub(crate) fn take_edge(&mut self, parent: NodeId, child: NodeId) -> Option<Edge> {
        self.parents.remove(&(child, parent));
        self.edges.remove(&(parent, child))
    }
}
