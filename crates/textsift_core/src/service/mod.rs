//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate classification and store calls into use-case level APIs.
//! - Keep CLI and other front ends decoupled from storage details.

pub mod lifecycle;
