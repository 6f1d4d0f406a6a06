//! Entry collections and their durable representation.
//!
//! # Responsibility
//! - Hold the active and trash collections as one copyable state value.
//! - Define the persistence contract and its JSON/in-memory implementations.
//!
//! # Invariants
//! - Persistence always covers the whole state; there are no partial writes.
//! - A missing store is empty; a malformed store is an error.

pub mod entry_store;
pub mod json_store;
pub mod memory_store;
pub mod state;
