//! Tracked document: store plus document-level undo facility.
//!
//! # Responsibility
//! - Expose node and edge commands that record their inverse automatically.
//! - Implement cascade delete as explicit edge removals followed by node
//!   removal.
//! - Expose the internal undo surface consumed by `run_undoable`.
//!
//! # Invariants
//! - Every successful write marks the store as having pending changes.
//! - A command that fails validation performs no write.

use crate::graph::change::{register_inverse, Change};
use crate::graph::store::Store;
use crate::graph::{GraphError, GraphResult};
use crate::model::edge::Edge;
use crate::model::node::{normalize_title, Node, NodeId};
use crate::undo::{UndoFacility, UndoStack};
use log::{debug, warn};
use std::fmt::{Debug, Formatter};

/// Document-level undo facility type.
pub type DocumentUndo = Box<dyn UndoFacility<Store>>;

/// One editable task graph with its own undo history.
pub struct Document {
    store: Store,
    undo: Option<DocumentUndo>,
    commits: u64,
    open_groups: usize,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Creates an empty document with a linear document-level undo stack.
    pub fn new() -> Self {
        Self::with_store(Store::new(), Some(Box::new(UndoStack::new())))
    }

    /// Creates a document without undo tracking.
    pub fn untracked() -> Self {
        Self::with_store(Store::new(), None)
    }

    pub fn with_store(store: Store, undo: Option<DocumentUndo>) -> Self {
        Self {
            store,
            undo,
            commits: 0,
            open_groups: 0,
        }
    }

    /// Read access to nodes and edges.
    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn root_id(&self) -> NodeId {
        self.store.root_id()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.store.node(id)
    }

    pub fn find_edge(&self, parent: NodeId, child: NodeId) -> Option<Edge> {
        self.store.find_edge(parent, child)
    }

    pub fn ordered_children(&self, parent: NodeId) -> GraphResult<Vec<&Node>> {
        self.store.ordered_children(parent)
    }

    pub fn ordered_child_ids(&self, parent: NodeId) -> Vec<NodeId> {
        self.store.ordered_child_ids(parent)
    }

    pub fn has_changes(&self) -> bool {
        self.store.has_changes()
    }

    /// Swaps in a freshly loaded store and forgets document-level history.
    pub fn replace_store(&mut self, store: Store) {
        self.store = store;
        if let Some(undo) = self.undo.as_deref_mut() {
            undo.clear();
        }
    }

    pub(crate) fn mark_saved(&mut self) {
        self.store.mark_saved();
    }

    fn commit(&mut self, change: Change) -> GraphResult<()> {
        let inverse = change.apply(&mut self.store)?;
        self.commits += 1;
        if let Some(undo) = self.undo.as_deref_mut() {
            register_inverse(undo, inverse);
        }
        Ok(())
    }

    /// Adds a node to the arena without linking it anywhere.
    ///
    /// # Errors
    /// - `DuplicateNode` when the id is already present.
    /// - `RootProtected` when `node.is_root` is set.
    pub fn insert_node(&mut self, node: Node) -> GraphResult<NodeId> {
        if node.is_root {
            return Err(GraphError::RootProtected(node.id));
        }
        let id = node.id;
        self.commit(Change::InsertNode(node))?;
        Ok(id)
    }

    /// Sets a node title after normalization.
    pub fn set_title(&mut self, id: NodeId, title: impl Into<String>) -> GraphResult<()> {
        let title = normalize_title(title.into());
        self.update_node(id, |node| node.title = title)
    }

    pub fn set_notes(&mut self, id: NodeId, notes: impl Into<String>) -> GraphResult<()> {
        let notes = notes.into();
        self.update_node(id, |node| node.notes = notes)
    }

    /// Sets or clears the completion timestamp.
    pub fn set_completed(&mut self, id: NodeId, completed_at: Option<i64>) -> GraphResult<()> {
        self.update_node(id, |node| node.completed_at = completed_at)
    }

    fn update_node(&mut self, id: NodeId, edit: impl FnOnce(&mut Node)) -> GraphResult<()> {
        let mut node = self
            .store
            .node(id)
            .cloned()
            .ok_or(GraphError::NodeNotFound(id))?;
        edit(&mut node);
        if self.store.node(id) == Some(&node) {
            return Ok(());
        }
        self.commit(Change::ReplaceNode(node))
    }

    /// Deletes a node: first every edge that references it, then the node.
    ///
    /// Children that lose their last parent stay in the arena; callers that
    /// want subtree deletion walk the subtree themselves.
    ///
    /// # Errors
    /// - `RootProtected` for the root node.
    /// - `NodeNotFound` when the node is absent.
    pub fn delete_node(&mut self, id: NodeId) -> GraphResult<Node> {
        if id == self.store.root_id() {
            return Err(GraphError::RootProtected(id));
        }
        let node = self
            .store
            .node(id)
            .cloned()
            .ok_or(GraphError::NodeNotFound(id))?;
        for edge in self.store.edges_touching(id) {
            self.commit(Change::RemoveEdge {
                parent: edge.parent,
                child: edge.child,
            })?;
        }
        self.commit(Change::RemoveNode(id))?;
        debug!("event=node_delete module=graph status=ok node={id}");
        Ok(node)
    }

    /// Links `child` under `parent`, or updates the priority of an existing
    /// link. The creation sequence of an existing link is preserved.
    ///
    /// # Errors
    /// - `NodeNotFound` when either endpoint is absent.
    /// - `RootProtected` when `child` is the root.
    /// - `InvalidPriority` for NaN/infinite priorities.
    pub fn add_or_update_edge(
        &mut self,
        parent: NodeId,
        child: NodeId,
        priority: f64,
    ) -> GraphResult<Edge> {
        let edge = match self.store.find_edge(parent, child) {
            Some(existing) if existing.priority == priority => return Ok(existing),
            Some(existing) => Edge {
                priority,
                ..existing
            },
            None => {
                for endpoint in [parent, child] {
                    if !self.store.contains(endpoint) {
                        return Err(GraphError::NodeNotFound(endpoint));
                    }
                }
                Edge {
                    parent,
                    child,
                    priority,
                    seq: self.store.allocate_seq(),
                }
            }
        };
        self.commit(Change::PutEdge(edge))?;
        Ok(edge)
    }

    /// Unlinks `child` from `parent`. A missing link is a logged no-op.
    pub fn remove_edge(&mut self, parent: NodeId, child: NodeId) -> GraphResult<Option<Edge>> {
        let Some(edge) = self.store.find_edge(parent, child) else {
            warn!(
                "event=edge_remove module=graph status=skipped reason=absent parent={parent} child={child}"
            );
            return Ok(None);
        };
        self.commit(Change::RemoveEdge { parent, child })?;
        Ok(Some(edge))
    }

    /// Whether a document-level undo facility is attached.
    pub fn is_tracked(&self) -> bool {
        self.undo.is_some()
    }

    /// Read access to the document-level undo facility.
    pub fn undo_manager(&self) -> Option<&dyn UndoFacility<Store>> {
        self.undo.as_deref()
    }

    pub(crate) fn begin_undo_group(&mut self) {
        if let Some(undo) = self.undo.as_deref_mut() {
            undo.begin_group();
            self.open_groups += 1;
        }
    }

    pub(crate) fn end_undo_group(&mut self) {
        if let Some(undo) = self.undo.as_deref_mut() {
            undo.end_group();
            self.open_groups = self.open_groups.saturating_sub(1);
        }
    }

    /// Whether a transaction is currently collecting document changes.
    pub fn undo_group_open(&self) -> bool {
        self.open_groups > 0
    }

    /// Number of successful tracked writes since creation.
    pub(crate) fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Reverts the most recent document-level group.
    pub fn undo(&mut self) {
        if let Some(undo) = self.undo.as_deref_mut() {
            undo.undo(&mut self.store);
        }
    }

    /// Reverts the most recent document-level group and forgets it, so the
    /// reverted changes cannot be redone.
    pub(crate) fn rollback_last_group(&mut self) {
        if let Some(undo) = self.undo.as_deref_mut() {
            undo.undo(&mut self.store);
            undo.discard_redo();
        }
    }

    /// Re-applies the most recent document-level redo group.
    pub fn redo(&mut self) {
        if let Some(undo) = self.undo.as_deref_mut() {
            undo.redo(&mut self.store);
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document")
            .field("nodes", &self.store.node_count())
            .field("edges", &self.store.edge_count())
            .field("has_changes", &self.store.has_changes())
            .field("tracked", &self.undo.is_some())
            .finish()
    }
}
