//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the snapshot load/save contract used by sessions.
//! - Isolate SQLite query details from graph and service code.
//!
//! # Invariants
//! - Persisted snapshots always satisfy the store's graph invariants.
//! - Repository APIs return semantic errors (`InvalidData`, `Graph`) in
//!   addition to DB transport errors.

pub mod document_repo;
