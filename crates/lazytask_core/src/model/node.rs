//! Task item model.
//!
//! # Responsibility
//! - Define the canonical item record addressed by stable ids.
//! - Provide completion helpers and title normalization.
//!
//! # Invariants
//! - `id` is stable and never reused for another node.
//! - Exactly one node per store has `is_root = true`.
//! - `title` is trimmed and never blank.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Stable identifier for every task item.
pub type NodeId = Uuid;

/// Title assigned when the caller provides a blank one.
pub const UNTITLED_TASK: &str = "Untitled task";

/// Canonical task item record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Stable id used for edges, selection and persistence.
    pub id: NodeId,
    pub title: String,
    /// Free-form notes body.
    pub notes: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds of completion, `None` while open.
    pub completed_at: Option<i64>,
    /// Hidden ancestor of every user-visible node.
    pub is_root: bool,
}

impl Node {
    /// Creates an open, non-root node with a generated id.
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(Uuid::new_v4(), title, now_epoch_ms())
    }

    /// Creates an open, non-root node with caller-provided identity.
    ///
    /// Used by load and redo paths where identity already exists.
    pub fn with_id(id: NodeId, title: impl Into<String>, created_at: i64) -> Self {
        Self {
            id,
            title: normalize_title(title.into()),
            notes: String::new(),
            created_at,
            completed_at: None,
            is_root: false,
        }
    }

    /// Creates the hidden root node of a store.
    pub fn root() -> Self {
        let mut node = Self::with_id(Uuid::new_v4(), "Root", now_epoch_ms());
        node.is_root = true;
        node
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Returns a copy with a fresh id and timestamp, keeping content.
    pub fn duplicate(&self) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: self.title.clone(),
            notes: self.notes.clone(),
            created_at: now_epoch_ms(),
            completed_at: self.completed_at,
            is_root: false,
        }
    }
}

/// Trims a title and substitutes [`UNTITLED_TASK`] when blank.
pub fn normalize_title(value: String) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return UNTITLED_TASK.to_string();
    }
    if trimmed.len() == value.len() {
        return value;
    }
    trimmed.to_string()
}

/// Current wall clock as Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| elapsed.as_millis() as i64)
}

#[cfg(test)]
mod tests {
    use super::{normalize_title, Node, UNTITLED_TASK};

    #[test]
    fn blank_title_becomes_untitled() {
        assert_eq!(normalize_title("   ".to_string()), UNTITLED_TASK);
        assert_eq!(Node::new("").title, UNTITLED_TASK);
    }

    #[test]
    fn title_is_trimmed() {
        assert_eq!(normalize_title("  buy milk \n".to_string()), "buy milk");
    }

    #[test]
    fn duplicate_gets_fresh_identity() {
        let mut original = Node::new("Write report");
        original.notes = "draft in docs/".to_string();
        let copy = original.duplicate();

        assert_ne!(copy.id, original.id);
        assert_eq!(copy.title, original.title);
        assert_eq!(copy.notes, original.notes);
        assert!(!copy.is_root);
    }
}
