//! Domain model for classified text entries.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//!
//! # Invariants
//! - Every entry is identified by a stable `EntryId`.
//! - Permanent removal is only reachable from the trash collection.

pub mod entry;
