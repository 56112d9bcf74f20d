//! Result type alias for Hygeia operations

use super::errors::HygeiaError;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, HygeiaError>;
