//! Two-tier undo bridge.
//!
//! `run_undoable` executes one action inside a group on the host facility
//! and a group on the document facility, then registers on the host a step
//! that delegates to the document facility. Undoing that step registers a
//! redo step that re-runs the whole transaction, so every undo is paired
//! with exactly one redo registration and the two stacks keep equal depth.
//!
//! # Invariants
//! - Group nesting is open-host, open-document, mutate, close-document,
//!   close-host, on success and on error.
//! - A host step is registered only when the action recorded document
//!   changes; otherwise the host step would undo an unrelated group.
//! - A failed action is rolled back before its groups close, so no
//!   half-applied priority survives, and the rollback leaves no redo entry.
//! - A call made from inside another transaction's action runs inline; the
//!   outer transaction's single host step already covers it.

use crate::graph::{Document, GraphResult};
use crate::undo::UndoFacility;
use log::{debug, error, warn};
use std::rc::Rc;

/// Re-runnable document mutation.
///
/// Actions must capture every generated id and timestamp up front so a
/// redo re-run reproduces the same state.
pub type UndoableAction = Rc<dyn Fn(&mut Document) -> GraphResult<()>>;

/// Runs `action` as one undoable transaction on both facilities.
///
/// When the host facility is `None` or the document is untracked, `action`
/// runs immediately and cannot be undone.
///
/// # Errors
/// Returns the action's error after rolling back whatever it recorded.
pub fn run_undoable(
    document: &mut Document,
    external: Option<&mut dyn UndoFacility<Document>>,
    action_name: &str,
    action: UndoableAction,
) -> GraphResult<()> {
    if document.undo_group_open() {
        debug!("event=run_undoable module=undo status=nested action={action_name}");
        return action(document);
    }
    let external = match external {
        Some(external) if document.is_tracked() => external,
        _ => {
            debug!("event=run_undoable module=undo status=degraded action={action_name}");
            return action(document);
        }
    };

    let coalescing = external.groups_automatically();
    external.set_groups_automatically(false);
    external.begin_group();
    document.begin_undo_group();

    let commits_before = document.commit_count();
    let outcome = action(document);
    document.end_undo_group();
    let recorded = document.commit_count() > commits_before;

    match &outcome {
        Ok(()) if recorded => register_bridge(external, Rc::from(action_name), action),
        Ok(()) => debug!("event=run_undoable module=undo status=noop action={action_name}"),
        Err(err) => {
            warn!(
                "event=run_undoable module=undo status=error action={action_name} rolled_back={recorded} error={err}"
            );
            if recorded {
                document.rollback_last_group();
            }
        }
    }

    external.set_label(action_name);
    external.end_group();
    external.set_groups_automatically(coalescing);
    outcome
}

fn register_bridge(
    external: &mut dyn UndoFacility<Document>,
    action_name: Rc<str>,
    action: UndoableAction,
) {
    external.register_undo(Box::new(
        move |document: &mut Document, external: &mut dyn UndoFacility<Document>| {
            document.undo();
            external.set_label(&action_name);
            external.register_undo(Box::new(
                move |document: &mut Document, external: &mut dyn UndoFacility<Document>| {
                    if let Err(err) = run_undoable(document, Some(external), &action_name, action)
                    {
                        error!(
                            "event=redo module=undo status=error action={action_name} error={err}"
                        );
                    }
                },
            ));
        },
    ));
}
