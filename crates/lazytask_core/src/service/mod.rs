//! Core use-case services.
//!
//! # Responsibility
//! - Turn UI gestures into undoable document transactions.
//! - Keep hosts decoupled from graph, ordering and undo details.

pub mod task_service;
