//! Core domain logic for LazyTask.
//! This crate is the single source of truth for task graph invariants.

pub mod config;
pub mod db;
pub mod graph;
pub mod logging;
pub mod model;
pub mod ordering;
pub mod repo;
pub mod selection;
pub mod service;
pub mod session;
pub mod undo;

pub use config::{ConfigError, CoreConfig};
pub use graph::{Document, GraphError, GraphResult, Store};
pub use logging::{default_log_level, init_logging, init_logging_with_config, logging_status};
pub use model::edge::Edge;
pub use model::node::{Node, NodeId};
pub use repo::document_repo::{
    DocumentRepoError, DocumentRepoResult, DocumentRepository, SqliteDocumentRepository,
};
pub use service::task_service::{NudgeDirection, ServiceError, TaskService};
pub use session::{Session, SessionError};
pub use undo::{run_undoable, UndoAction, UndoFacility, UndoStack, UndoableAction};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
