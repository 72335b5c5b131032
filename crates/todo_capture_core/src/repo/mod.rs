//! Durable storage contracts and the JSON file implementation.
//!
//! # Responsibility
//! - Define the load/save contract the store depends on.
//! - Isolate file layout and atomic-write details from the store.
//!
//! # Invariants
//! - Saves replace the whole collection; readers never observe a partial file.
//! - Loads never hand back a record that fails `Todo::validate()`.

pub mod todo_repo;
