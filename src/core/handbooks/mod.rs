//! Handbooks: locally cached reference tables
//!
//! Translate opaque backend codes into business names and codes. Tables
//! live in an injected in-memory store, persist as one JSON file each, and
//! resync wholesale from the registry service when missing or corrupt.

pub mod files;
pub mod overrides;
pub mod resolver;
pub mod store;
pub mod sync;

pub use overrides::{referred_org_overrides, OrganizationIdentity};
pub use store::HandbookStore;
pub use sync::{ensure_handbooks, ensure_table, SyncOutcome, DEFAULT_TABLES};
