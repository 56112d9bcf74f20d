//! Business logic
//!
//! The enrichment pipeline and the handbook subsystem it resolves against.

pub mod handbooks;
pub mod pipeline;
