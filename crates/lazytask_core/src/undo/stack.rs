//! Linear grouped undo facility.
//!
//! # Responsibility
//! - Keep closed undo/redo groups as two LIFO stacks.
//! - Route registrations made while undoing to the redo stack and vice versa.
//! - Optionally coalesce ungrouped registrations into one pending group, the
//!   way a host event loop would.
//!
//! # Invariants
//! - Nested groups fold into the outermost open group.
//! - Empty groups are discarded on close.
//! - A fresh registration outside undo/redo clears the redo stack.
//! - `undo`/`redo` are refused while a group is open or another undo/redo
//!   is running.

use crate::undo::{UndoAction, UndoFacility};
use log::{debug, warn};
use std::fmt::{Debug, Formatter};

struct UndoGroup<C> {
    label: Option<String>,
    actions: Vec<UndoAction<C>>,
}

impl<C> UndoGroup<C> {
    fn new(label: Option<String>) -> Self {
        Self {
            label,
            actions: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Undoing,
    Redoing,
}

/// Reference [`UndoFacility`] backed by two vectors of groups.
pub struct UndoStack<C> {
    undo: Vec<UndoGroup<C>>,
    redo: Vec<UndoGroup<C>>,
    open: Option<UndoGroup<C>>,
    depth: usize,
    pending_auto: bool,
    phase: Phase,
    groups_automatically: bool,
    levels: usize,
}

impl<C> Default for UndoStack<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> UndoStack<C> {
    /// Creates a stack that makes every ungrouped registration its own group.
    pub fn new() -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            open: None,
            depth: 0,
            pending_auto: false,
            phase: Phase::Idle,
            groups_automatically: false,
            levels: 0,
        }
    }

    /// Creates a stack that coalesces ungrouped registrations until
    /// [`UndoStack::flush_pending`] runs.
    pub fn grouping_by_event() -> Self {
        let mut stack = Self::new();
        stack.groups_automatically = true;
        stack
    }

    /// Caps the number of undo groups kept; `0` means unlimited.
    pub fn with_levels(mut self, levels: usize) -> Self {
        self.levels = levels;
        self
    }

    /// Closes the pending automatic group, if any.
    ///
    /// Hosts call this at the end of each event-loop turn.
    pub fn flush_pending(&mut self) {
        if self.depth == 0 && self.open.is_some() {
            self.close_open();
        }
    }

    /// Whether an automatic group is collecting registrations.
    pub fn has_pending_group(&self) -> bool {
        self.depth == 0 && self.pending_auto && self.open.is_some()
    }

    fn close_open(&mut self) {
        self.pending_auto = false;
        if let Some(group) = self.open.take() {
            self.push_closed(group);
        }
    }

    fn push_closed(&mut self, group: UndoGroup<C>) {
        if group.actions.is_empty() {
            return;
        }
        match self.phase {
            Phase::Undoing => self.redo.push(group),
            Phase::Redoing => self.undo.push(group),
            Phase::Idle => {
                self.undo.push(group);
                self.redo.clear();
            }
        }
        if self.levels > 0 && self.undo.len() > self.levels {
            let excess = self.undo.len() - self.levels;
            self.undo.drain(..excess);
        }
    }

    fn ready_for_replay(&mut self, operation: &str) -> bool {
        if self.phase != Phase::Idle {
            warn!("event=undo_replay module=undo status=rejected operation={operation} reason=reentrant");
            return false;
        }
        if self.depth > 0 {
            warn!("event=undo_replay module=undo status=rejected operation={operation} reason=group_open");
            return false;
        }
        self.flush_pending();
        true
    }
}

impl<C: 'static> UndoStack<C> {
    fn replay(&mut self, ctx: &mut C, group: UndoGroup<C>, phase: Phase) {
        self.phase = phase;
        self.open = Some(UndoGroup::new(group.label));
        self.depth = 1;
        for action in group.actions.into_iter().rev() {
            action(&mut *ctx, &mut *self);
        }
        self.depth = 0;
        self.close_open();
        self.phase = Phase::Idle;
    }
}

impl<C: 'static> UndoFacility<C> for UndoStack<C> {
    fn begin_group(&mut self) {
        if self.depth == 0 && self.pending_auto && !self.groups_automatically {
            self.close_open();
        }
        if self.open.is_none() {
            self.open = Some(UndoGroup::new(None));
            self.pending_auto = false;
        }
        self.depth += 1;
    }

    fn end_group(&mut self) {
        if self.depth == 0 {
            warn!("event=undo_group module=undo status=rejected reason=no_open_group");
            return;
        }
        self.depth -= 1;
        if self.depth == 0 && !self.pending_auto {
            self.close_open();
        }
    }

    fn register_undo(&mut self, action: UndoAction<C>) {
        match self.open.as_mut() {
            Some(group) => group.actions.push(action),
            None if self.groups_automatically => {
                let mut group = UndoGroup::new(None);
                group.actions.push(action);
                self.open = Some(group);
                self.pending_auto = true;
            }
            None => {
                debug!("event=undo_register module=undo status=ok grouping=implicit_single");
                let mut group = UndoGroup::new(None);
                group.actions.push(action);
                self.push_closed(group);
            }
        }
    }

    fn set_label(&mut self, label: &str) {
        match self.open.as_mut() {
            Some(group) => group.label = Some(label.to_string()),
            None => warn!("event=undo_label module=undo status=rejected reason=no_open_group"),
        }
    }

    fn undo(&mut self, ctx: &mut C) {
        if !self.ready_for_replay("undo") {
            return;
        }
        match self.undo.pop() {
            Some(group) => self.replay(ctx, group, Phase::Undoing),
            None => debug!("event=undo module=undo status=skipped reason=empty"),
        }
    }

    fn redo(&mut self, ctx: &mut C) {
        if !self.ready_for_replay("redo") {
            return;
        }
        match self.redo.pop() {
            Some(group) => self.replay(ctx, group, Phase::Redoing),
            None => debug!("event=redo module=undo status=skipped reason=empty"),
        }
    }

    fn groups_automatically(&self) -> bool {
        self.groups_automatically
    }

    fn set_groups_automatically(&mut self, enabled: bool) {
        self.groups_automatically = enabled;
    }

    fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    fn undo_label(&self) -> Option<&str> {
        self.undo.last().and_then(|group| group.label.as_deref())
    }

    fn redo_label(&self) -> Option<&str> {
        self.redo.last().and_then(|group| group.label.as_deref())
    }

    fn is_undoing(&self) -> bool {
        self.phase == Phase::Undoing
    }

    fn is_redoing(&self) -> bool {
        self.phase == Phase::Redoing
    }

    fn discard_redo(&mut self) -> bool {
        self.redo.pop().is_some()
    }

    fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        if self.depth == 0 {
            self.open = None;
            self.pending_auto = false;
        }
    }
}

impl<C> Debug for UndoStack<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UndoStack")
            .field("undo_depth", &self.undo.len())
            .field("redo_depth", &self.redo.len())
            .field("open_depth", &self.depth)
            .field("phase", &self.phase)
            .field("groups_automatically", &self.groups_automatically)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::UndoStack;
    use crate::undo::UndoFacility;

    fn push_value(stack: &mut dyn UndoFacility<Vec<i32>>, value: i32) {
        stack.register_undo(Box::new(
            move |log: &mut Vec<i32>, stack: &mut dyn UndoFacility<Vec<i32>>| {
                log.retain(|entry| *entry != value);
                stack.register_undo(Box::new(
                    move |log: &mut Vec<i32>, stack: &mut dyn UndoFacility<Vec<i32>>| {
                        log.push(value);
                        push_value(stack, value);
                    },
                ));
            },
        ));
    }

    #[test]
    fn group_fires_lifo_and_moves_to_redo() {
        let mut stack = UndoStack::<Vec<i32>>::new();
        let mut order = Vec::new();

        stack.begin_group();
        for value in [1, 2, 3] {
            stack.register_undo(Box::new(
                move |log: &mut Vec<i32>, _: &mut dyn UndoFacility<Vec<i32>>| log.push(value),
            ));
        }
        stack.set_label("Three");
        stack.end_group();

        assert_eq!(stack.undo_depth(), 1);
        assert_eq!(stack.undo_label(), Some("Three"));
        stack.undo(&mut order);
        assert_eq!(order, vec![3, 2, 1]);
        assert_eq!(stack.undo_depth(), 0);
        // Steps that register nothing leave no redo group behind.
        assert_eq!(stack.redo_depth(), 0);
    }

    #[test]
    fn registrations_during_undo_become_redo_group() {
        let mut stack = UndoStack::<Vec<i32>>::new();
        let mut log = vec![7];
        stack.begin_group();
        push_value(&mut stack, 7);
        stack.set_label("Add 7");
        stack.end_group();

        stack.undo(&mut log);
        assert!(log.is_empty());
        assert_eq!(stack.redo_depth(), 1);
        assert_eq!(stack.redo_label(), Some("Add 7"));

        stack.redo(&mut log);
        assert_eq!(log, vec![7]);
        assert_eq!(stack.undo_depth(), 1);
        assert_eq!(stack.redo_depth(), 0);
    }

    #[test]
    fn nested_groups_fold_into_outermost() {
        let mut stack = UndoStack::<Vec<i32>>::new();
        stack.begin_group();
        stack.begin_group();
        push_value(&mut stack, 1);
        stack.end_group();
        push_value(&mut stack, 2);
        stack.end_group();

        assert_eq!(stack.undo_depth(), 1);
    }

    #[test]
    fn empty_group_is_discarded() {
        let mut stack = UndoStack::<Vec<i32>>::new();
        stack.begin_group();
        stack.end_group();
        assert_eq!(stack.undo_depth(), 0);
    }

    #[test]
    fn new_registration_clears_redo() {
        let mut stack = UndoStack::<Vec<i32>>::new();
        let mut log = vec![1];
        push_value(&mut stack, 1);
        stack.undo(&mut log);
        assert_eq!(stack.redo_depth(), 1);

        push_value(&mut stack, 2);
        assert_eq!(stack.redo_depth(), 0);
    }

    #[test]
    fn automatic_grouping_coalesces_until_flush() {
        let mut stack = UndoStack::<Vec<i32>>::grouping_by_event();
        push_value(&mut stack, 1);
        push_value(&mut stack, 2);
        assert!(stack.has_pending_group());
        assert_eq!(stack.undo_depth(), 0);

        stack.flush_pending();
        assert_eq!(stack.undo_depth(), 1);
    }

    #[test]
    fn explicit_group_nests_into_pending_group_only_when_grouping_automatically() {
        let mut coalescing = UndoStack::<Vec<i32>>::grouping_by_event();
        push_value(&mut coalescing, 1);
        coalescing.begin_group();
        push_value(&mut coalescing, 2);
        coalescing.end_group();
        coalescing.flush_pending();
        assert_eq!(coalescing.undo_depth(), 1);

        let mut suspended = UndoStack::<Vec<i32>>::grouping_by_event();
        push_value(&mut suspended, 1);
        suspended.set_groups_automatically(false);
        suspended.begin_group();
        push_value(&mut suspended, 2);
        suspended.end_group();
        assert_eq!(suspended.undo_depth(), 2);
    }

    #[test]
    fn undo_is_refused_while_group_open() {
        let mut stack = UndoStack::<Vec<i32>>::new();
        let mut log = vec![1];
        push_value(&mut stack, 1);
        stack.begin_group();
        stack.undo(&mut log);
        assert_eq!(log, vec![1]);
        stack.end_group();
        stack.undo(&mut log);
        assert!(log.is_empty());
    }

    #[test]
    fn discard_redo_drops_only_the_latest_redo_group() {
        let mut stack = UndoStack::<Vec<i32>>::new();
        let mut log = vec![1, 2];
        push_value(&mut stack, 1);
        push_value(&mut stack, 2);
        stack.undo(&mut log);
        stack.undo(&mut log);
        assert_eq!(stack.redo_depth(), 2);

        assert!(stack.discard_redo());
        assert_eq!(stack.redo_depth(), 1);
        stack.redo(&mut log);
        assert_eq!(log, vec![2]);
        assert_eq!(stack.redo_depth(), 0);
        assert!(!stack.discard_redo());
    }

    #[test]
    fn level_limit_drops_oldest_groups() {
        let mut stack = UndoStack::<Vec<i32>>::new().with_levels(2);
        for value in 0..5 {
            push_value(&mut stack, value);
        }
        assert_eq!(stack.undo_depth(), 2);
    }
}
