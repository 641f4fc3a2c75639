//! Domain model for task items and their ordered containment links.
//!
//! # Responsibility
//! - Define the canonical item record (`Node`) and link record (`Edge`).
//! - Keep identity, timestamps and completion state in one place.
//!
//! # Invariants
//! - Every item is identified by a stable `NodeId`.
//! - Containment is expressed only through `Edge` records, never through
//!   references stored on the item itself.

pub mod edge;
pub mod node;
