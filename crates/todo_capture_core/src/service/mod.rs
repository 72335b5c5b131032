//! Core use-case services.
//!
//! # Responsibility
//! - Own the durable todo collection and its mutation rules.
//! - Keep boundary layers decoupled from storage details.

pub mod todo_service;
