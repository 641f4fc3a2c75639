//! Grouped undo/redo facilities and the two-tier undo bridge.
//!
//! # Responsibility
//! - Define one minimal facility contract shared by the host (session-level)
//!   and the document-level undo stacks.
//! - Provide a linear reference facility and the `run_undoable` bridge that
//!   keeps both stacks in lockstep.
//!
//! # Invariants
//! - Callbacks registered in one group fire LIFO.
//! - A callback registered while undoing lands on the redo stack, and one
//!   registered while redoing lands on the undo stack.
//! - Groups opened by the bridge are closed on every path, including errors.

pub mod coordinator;
pub mod stack;

pub use coordinator::{run_undoable, UndoableAction};
pub use stack::UndoStack;

/// One registered undo step.
///
/// The facility passes itself back so the step can register its inverse,
/// which is how redo entries come into existence.
pub type UndoAction<C> = Box<dyn FnOnce(&mut C, &mut dyn UndoFacility<C>)>;

/// Grouped undo/redo capability over state of type `C`.
pub trait UndoFacility<C> {
    /// Opens a group. Nested groups fold into the outermost one.
    fn begin_group(&mut self);
    /// Closes the innermost open group.
    fn end_group(&mut self);
    /// Records one step in the currently collecting group.
    fn register_undo(&mut self, action: UndoAction<C>);
    /// Names the currently collecting group.
    fn set_label(&mut self, label: &str);
    /// Reverts the most recent undo group.
    fn undo(&mut self, ctx: &mut C);
    /// Re-applies the most recent redo group.
    fn redo(&mut self, ctx: &mut C);
    /// Whether registrations outside an explicit group coalesce automatically.
    fn groups_automatically(&self) -> bool;
    fn set_groups_automatically(&mut self, enabled: bool);
    /// Number of closed groups available to undo.
    fn undo_depth(&self) -> usize;
    /// Number of closed groups available to redo.
    fn redo_depth(&self) -> usize;
    fn undo_label(&self) -> Option<&str>;
    fn redo_label(&self) -> Option<&str>;
    fn is_undoing(&self) -> bool;
    fn is_redoing(&self) -> bool;
    /// Forgets the most recent redo group without running it.
    ///
    /// Returns whether a group was dropped.
    fn discard_redo(&mut self) -> bool;
    /// Drops every undo and redo group.
    fn clear(&mut self);
}
