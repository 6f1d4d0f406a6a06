//! Text classification entry points.
//!
//! # Responsibility
//! - Decide the category of submitted text without state or I/O.

pub mod classifier;
