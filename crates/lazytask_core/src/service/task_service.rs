//! Task gesture service.
//!
//! # Responsibility
//! - Translate UI gestures (new item, drag-drop, keyboard nudge, delete,
//!   duplicate, edits) into undoable document transactions.
//! - Answer the ordering queries the UI needs to preview a drop.
//!
//! # Invariants
//! - Every mutating command runs through `run_undoable` exactly once.
//! - Actions capture generated ids and timestamps before they run, so a
//!   redo re-run reproduces the same nodes.
//! - Precondition violations (empty or out-of-range selections) are logged
//!   no-ops, not errors.
//! - A child is never detached from its last parent; deletion is the way
//!   to remove an item from the graph.

use crate::graph::{Document, GraphError, GraphResult};
use crate::model::node::{now_epoch_ms, Node, NodeId};
use crate::ordering::{
    clamped_edge_bounds, edge_bounds, insert_priority, plan_fits, rearrange_priorities,
    respaced_priorities, PriorityAssignment,
};
use crate::selection::selection_after_delete;
use crate::session::Session;
use crate::undo::run_undoable;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// Keyboard nudge direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NudgeDirection {
    Up,
    Down,
}

/// Errors from task service operations.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Referenced node does not exist.
    NodeNotFound(NodeId),
    /// Insertion edge is beyond the parent's child count.
    EdgeOutOfRange { edge: usize, count: usize },
    /// Child index is beyond the parent's child count.
    IndexOutOfRange { index: usize, count: usize },
    /// Detaching would leave the child without any parent.
    LastParent { parent: NodeId, child: NodeId },
    /// Graph-level failure.
    Graph(GraphError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "task not found: {id}"),
            Self::EdgeOutOfRange { edge, count } => {
                write!(f, "insertion point {edge} out of range for {count} children")
            }
            Self::IndexOutOfRange { index, count } => {
                write!(f, "child index {index} out of range for {count} children")
            }
            Self::LastParent { parent, child } => write!(
                f,
                "cannot detach {child} from {parent}: it is the only parent"
            ),
            Self::Graph(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Graph(err) => Some(err),
            _ => None,
        }
    }
}

impl From<GraphError> for ServiceError {
    fn from(value: GraphError) -> Self {
        match value {
            GraphError::NodeNotFound(id) => Self::NodeNotFound(id),
            other => Self::Graph(other),
        }
    }
}

/// Gesture-level facade over one [`Session`].
pub struct TaskService {
    session: Session,
}

impl TaskService {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    pub fn into_session(self) -> Session {
        self.session
    }

    pub fn document(&self) -> &Document {
        self.session.document()
    }

    pub fn root_id(&self) -> NodeId {
        self.document().root_id()
    }

    /// Children of `parent` in display order.
    pub fn ordered_children(&self, parent: NodeId) -> Result<Vec<&Node>, ServiceError> {
        self.ensure_exists(parent)?;
        Ok(self.document().ordered_children(parent)?)
    }

    /// Child ids of `parent` in display order.
    pub fn ordered_child_ids(&self, parent: NodeId) -> Result<Vec<NodeId>, ServiceError> {
        self.ensure_exists(parent)?;
        Ok(self.document().ordered_child_ids(parent))
    }

    /// Priority a new child at `edge` would receive, without respacing.
    pub fn compute_insert_priority(
        &self,
        parent: NodeId,
        edge: usize,
    ) -> Result<Option<f64>, ServiceError> {
        self.ensure_exists(parent)?;
        let priorities = self.document().store().child_priorities(parent);
        Ok(insert_priority(&priorities, edge, self.spacing()))
    }

    /// Priorities a move of `sources` to `target_edge` would assign.
    pub fn compute_rearrange_priorities(
        &self,
        parent: NodeId,
        sources: &[usize],
        target_edge: usize,
    ) -> Result<Vec<PriorityAssignment>, ServiceError> {
        self.ensure_exists(parent)?;
        let priorities = self.document().store().child_priorities(parent);
        Ok(rearrange_priorities(
            &priorities,
            sources,
            target_edge,
            self.spacing(),
        ))
    }

    /// Creates a task under `parent` at insertion point `edge`.
    pub fn new_item(
        &mut self,
        parent: NodeId,
        edge: usize,
        title: impl Into<String>,
    ) -> Result<NodeId, ServiceError> {
        self.ensure_edge_in_range(parent, edge)?;
        let node = Node::new(title);
        let id = node.id;
        let placement = self.placement();

        self.run(
            "New Item",
            Rc::new(move |doc: &mut Document| {
                doc.insert_node(node.clone())?;
                let priority = placement.insert_priority(doc, parent, edge)?;
                doc.add_or_update_edge(parent, id, priority)?;
                Ok(())
            }),
        )?;
        info!("event=task_create module=service status=ok parent={parent} node={id} edge={edge}");
        Ok(id)
    }

    /// Adds an existing task to `parent` at `edge`. If it is already a
    /// child there, it is moved to `edge` instead.
    pub fn attach(&mut self, parent: NodeId, child: NodeId, edge: usize) -> Result<(), ServiceError> {
        self.ensure_exists(child)?;
        if let Some(index) = self.child_index(parent, child)? {
            return self.move_selection(parent, &[index], edge);
        }
        self.ensure_edge_in_range(parent, edge)?;
        let placement = self.placement();

        self.run(
            "Attach",
            Rc::new(move |doc: &mut Document| {
                let priority = placement.insert_priority(doc, parent, edge)?;
                doc.add_or_update_edge(parent, child, priority)?;
                Ok(())
            }),
        )
    }

    /// Removes `child` from `parent` only. Missing links are logged no-ops.
    pub fn detach(&mut self, parent: NodeId, child: NodeId) -> Result<(), ServiceError> {
        self.ensure_exists(parent)?;
        self.ensure_exists(child)?;
        let store = self.document().store();
        if store.find_edge(parent, child).is_none() {
            warn!("event=task_detach module=service status=skipped reason=not_linked parent={parent} child={child}");
            return Ok(());
        }
        if store.parents_of(child).len() == 1 {
            return Err(ServiceError::LastParent { parent, child });
        }

        self.run(
            "Detach",
            Rc::new(move |doc: &mut Document| {
                doc.remove_edge(parent, child)?;
                Ok(())
            }),
        )
    }

    /// Moves the children at `sources` (display indices, any order, need not
    /// be contiguous) to insertion point `target_edge`.
    pub fn move_selection(
        &mut self,
        parent: NodeId,
        sources: &[usize],
        target_edge: usize,
    ) -> Result<(), ServiceError> {
        if self
            .compute_rearrange_priorities(parent, sources, target_edge)?
            .is_empty()
        {
            debug!("event=task_move module=service status=noop parent={parent} target_edge={target_edge}");
            return Ok(());
        }
        let sources = sources.to_vec();
        let placement = self.placement();

        self.run(
            "Move",
            Rc::new(move |doc: &mut Document| {
                placement.rearrange(doc, parent, &sources, target_edge)
            }),
        )
    }

    /// Moves one child a single slot up or down.
    pub fn nudge(
        &mut self,
        parent: NodeId,
        index: usize,
        direction: NudgeDirection,
    ) -> Result<(), ServiceError> {
        let count = self.ordered_child_ids(parent)?.len();
        if index >= count {
            warn!("event=task_nudge module=service status=skipped reason=index_out_of_range index={index} count={count}");
            return Ok(());
        }
        let target_edge = match direction {
            NudgeDirection::Up if index == 0 => return Ok(()),
            NudgeDirection::Up => index - 1,
            NudgeDirection::Down if index + 1 == count => return Ok(()),
            NudgeDirection::Down => index + 2,
        };
        self.move_selection(parent, &[index], target_edge)
    }

    /// Deletes the children at `indices` and returns the id that should be
    /// selected next.
    ///
    /// Deleted tasks disappear from every parent. Descendants left without
    /// any parent are deleted with them.
    pub fn delete_items(
        &mut self,
        parent: NodeId,
        indices: &[usize],
        moving_down: bool,
    ) -> Result<Option<NodeId>, ServiceError> {
        let ordered = self.ordered_child_ids(parent)?;
        if indices.is_empty() || indices.iter().any(|index| *index >= ordered.len()) {
            warn!(
                "event=task_delete module=service status=skipped reason=invalid_selection count={}",
                ordered.len()
            );
            return Ok(None);
        }
        let next = selection_after_delete(&ordered, indices, moving_down);
        let doomed = indices
            .iter()
            .map(|index| ordered[*index])
            .collect::<Vec<_>>();

        self.run(
            "Delete",
            Rc::new(move |doc: &mut Document| {
                for id in &doomed {
                    if doc.store().contains(*id) {
                        delete_with_orphans(doc, *id)?;
                    }
                }
                Ok(())
            }),
        )?;
        Ok(next)
    }

    /// Copies the child at `index` right below itself. The copy shares the
    /// original's children.
    pub fn duplicate(&mut self, parent: NodeId, index: usize) -> Result<NodeId, ServiceError> {
        let ordered = self.ordered_child_ids(parent)?;
        let original_id = *ordered.get(index).ok_or(ServiceError::IndexOutOfRange {
            index,
            count: ordered.len(),
        })?;
        let original = self
            .document()
            .node(original_id)
            .ok_or(ServiceError::NodeNotFound(original_id))?;
        let copy = original.duplicate();
        let copy_id = copy.id;
        let placement = self.placement();

        self.run(
            "Duplicate",
            Rc::new(move |doc: &mut Document| {
                let shared_children = doc.store().ordered_edges(original_id);
                doc.insert_node(copy.clone())?;
                let priority = placement.insert_priority(doc, parent, index + 1)?;
                doc.add_or_update_edge(parent, copy_id, priority)?;
                for edge in shared_children {
                    doc.add_or_update_edge(copy_id, edge.child, edge.priority)?;
                }
                Ok(())
            }),
        )?;
        Ok(copy_id)
    }

    pub fn rename(&mut self, id: NodeId, title: impl Into<String>) -> Result<(), ServiceError> {
        self.ensure_exists(id)?;
        let title = title.into();
        self.run(
            "Rename",
            Rc::new(move |doc: &mut Document| doc.set_title(id, title.clone())),
        )
    }

    pub fn set_notes(&mut self, id: NodeId, notes: impl Into<String>) -> Result<(), ServiceError> {
        self.ensure_exists(id)?;
        let notes = notes.into();
        self.run(
            "Edit Notes",
            Rc::new(move |doc: &mut Document| doc.set_notes(id, notes.clone())),
        )
    }

    /// Flips completion; returns whether the task is now completed.
    pub fn toggle_completed(&mut self, id: NodeId) -> Result<bool, ServiceError> {
        let node = self
            .document()
            .node(id)
            .ok_or(ServiceError::NodeNotFound(id))?;
        let (label, completed_at) = if node.is_completed() {
            ("Mark Open", None)
        } else {
            ("Mark Completed", Some(now_epoch_ms()))
        };
        self.run(
            label,
            Rc::new(move |doc: &mut Document| doc.set_completed(id, completed_at)),
        )?;
        Ok(completed_at.is_some())
    }

    pub fn undo(&mut self) {
        self.session.undo();
    }

    pub fn redo(&mut self) {
        self.session.redo();
    }

    fn run(
        &mut self,
        label: &str,
        action: Rc<dyn Fn(&mut Document) -> GraphResult<()>>,
    ) -> Result<(), ServiceError> {
        let (document, host) = self.session.parts_mut();
        run_undoable(document, host, label, action).map_err(Into::into)
    }

    fn spacing(&self) -> f64 {
        self.session.config().priority_spacing
    }

    fn placement(&self) -> Placement {
        Placement {
            spacing: self.spacing(),
            respace: self.session.config().respace_on_collision,
        }
    }

    fn ensure_exists(&self, id: NodeId) -> Result<(), ServiceError> {
        if self.document().store().contains(id) {
            Ok(())
        } else {
            Err(ServiceError::NodeNotFound(id))
        }
    }

    fn ensure_edge_in_range(&self, parent: NodeId, edge: usize) -> Result<(), ServiceError> {
        let count = self.ordered_child_ids(parent)?.len();
        if edge > count {
            return Err(ServiceError::EdgeOutOfRange { edge, count });
        }
        Ok(())
    }

    fn child_index(&self, parent: NodeId, child: NodeId) -> Result<Option<usize>, ServiceError> {
        Ok(self
            .ordered_child_ids(parent)?
            .iter()
            .position(|id| *id == child))
    }
}

/// Ordering parameters captured by actions.
#[derive(Debug, Clone, Copy)]
struct Placement {
    spacing: f64,
    respace: bool,
}

impl Placement {
    /// Midpoint priority for `edge`, respacing the parent first when the
    /// gap has collapsed.
    fn insert_priority(&self, doc: &mut Document, parent: NodeId, edge: usize) -> GraphResult<f64> {
        let priorities = doc.store().child_priorities(parent);
        let bounds = clamped_edge_bounds(&priorities, edge, self.spacing);
        if bounds.has_room() || !self.respace {
            return Ok(bounds.midpoint());
        }

        respace_children(doc, parent, self.spacing)?;
        let priorities = doc.store().child_priorities(parent);
        Ok(clamped_edge_bounds(&priorities, edge, self.spacing).midpoint())
    }

    fn rearrange(
        &self,
        doc: &mut Document,
        parent: NodeId,
        sources: &[usize],
        target_edge: usize,
    ) -> GraphResult<()> {
        let mut plan = self.plan(doc, parent, sources, target_edge);
        if self.respace && !plan.fits {
            respace_children(doc, parent, self.spacing)?;
            plan = self.plan(doc, parent, sources, target_edge);
        }

        for assignment in plan.assignments {
            let child = plan.ids[assignment.index];
            doc.add_or_update_edge(parent, child, assignment.priority)?;
        }
        Ok(())
    }

    fn plan(
        &self,
        doc: &Document,
        parent: NodeId,
        sources: &[usize],
        target_edge: usize,
    ) -> RearrangePlan {
        let edges = doc.store().ordered_edges(parent);
        let priorities = edges.iter().map(|edge| edge.priority).collect::<Vec<_>>();
        let assignments = rearrange_priorities(&priorities, sources, target_edge, self.spacing);
        let fits = edge_bounds(&priorities, target_edge, self.spacing)
            .map_or(true, |bounds| plan_fits(&assignments, bounds));
        RearrangePlan {
            ids: edges.iter().map(|edge| edge.child).collect(),
            assignments,
            fits,
        }
    }
}

struct RearrangePlan {
    ids: Vec<NodeId>,
    assignments: Vec<PriorityAssignment>,
    fits: bool,
}

/// Rewrites every child priority of `parent` to an even layout, keeping the
/// current display order.
fn respace_children(doc: &mut Document, parent: NodeId, spacing: f64) -> GraphResult<()> {
    let ids = doc.store().ordered_child_ids(parent);
    let priorities = respaced_priorities(ids.len(), spacing);
    for (child, priority) in ids.into_iter().zip(priorities) {
        doc.add_or_update_edge(parent, child, priority)?;
    }
    info!("event=priority_respace module=service status=ok parent={parent}");
    Ok(())
}

/// Deletes `id`, then every former child that no longer has a parent.
fn delete_with_orphans(doc: &mut Document, id: NodeId) -> GraphResult<()> {
    let children = doc.store().ordered_child_ids(id);
    doc.delete_node(id)?;
    for child in children {
        if doc.store().contains(child) && doc.store().parents_of(child).is_empty() {
            delete_with_orphans(doc, child)?;
        }
    }
    Ok(())
}
