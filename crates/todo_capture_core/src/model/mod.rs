//! Domain model for captured todos.
//!
//! # Responsibility
//! - Define the canonical record persisted by the store.
//! - Keep wire naming compatible with existing `todos` files.
//!
//! # Invariants
//! - Every todo is identified by a stable `TodoId`.
//! - Removal is a hard delete; there is no tombstone state.

pub mod todo;
