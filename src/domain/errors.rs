//! Domain error types
//!
//! One top-level error for the whole crate, with per-subsystem enums nested
//! inside it. Errors never expose third-party types; adapters translate
//! transport failures into these variants at the boundary.

use thiserror::Error;

/// Main Hygeia error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum HygeiaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Clinical backend errors
    #[error("Clinical backend error: {0}")]
    Clinical(#[from] ClinicalError),

    /// Address-normalization service errors
    #[error("Address service error: {0}")]
    Address(#[from] AddressError),

    /// Reference-data registry errors
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Local durable-state write/read failures (credential file, handbook files)
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl HygeiaError {
    /// Whether this error is the expected "no matching record" business
    /// outcome rather than a defect.
    pub fn is_not_found(&self) -> bool {
        matches!(self, HygeiaError::Clinical(ClinicalError::RecordNotFound(_)))
    }
}

/// Clinical-backend-specific errors
///
/// Errors raised while talking to the hospital information system.
#[derive(Debug, Error)]
pub enum ClinicalError {
    /// Failed to reach the backend at the transport level
    #[error("Failed to connect to clinical backend: {0}")]
    ConnectionFailed(String),

    /// Credential acquisition or validation failed; no partial credential exists
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The backend answered, but with an unexpected shape or status for a
    /// mandatory field
    #[error("Invalid response from clinical backend: {0}")]
    InvalidResponse(String),

    /// Search yielded no matching record (expected business outcome)
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Timeout
    #[error("Request timeout: {0}")]
    Timeout(String),
}

/// Address-normalization-service errors
///
/// Only protocol failures live here. A 404 or an unparseable search result
/// is an expected miss (`None`), not an error.
#[derive(Debug, Error)]
pub enum AddressError {
    /// Token endpoint returned a missing/empty/non-string token
    #[error("Address service token unavailable: {0}")]
    TokenUnavailable(String),

    /// Failed to reach the address service
    #[error("Failed to connect to address service: {0}")]
    ConnectionFailed(String),
}

/// Reference-data registry errors
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Download of the registry archive failed
    #[error("Registry download failed: {0}")]
    DownloadFailed(String),

    /// Downloaded archive is not a valid single-file archive
    #[error("Registry archive invalid: {0}")]
    ArchiveInvalid(String),

    /// Extracted payload does not match the catalog descriptor
    #[error("Registry payload invalid: {0}")]
    FormatInvalid(String),

    /// Registry code is not present in the catalog
    #[error("Unknown registry code: {0}")]
    UnknownCode(String),
}

// Conversion from std::io::Error
impl From<std::io::Error> for HygeiaError {
    fn from(err: std::io::Error) -> Self {
        HygeiaError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for HygeiaError {
    fn from(err: serde_json::Error) -> Self {
        HygeiaError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for HygeiaError {
    fn from(err: toml::de::Error) -> Self {
        HygeiaError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hygeia_error_display() {
        let err = HygeiaError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_clinical_error_conversion() {
        let clinical = ClinicalError::AuthenticationFailed("login rejected".to_string());
        let err: HygeiaError = clinical.into();
        assert!(matches!(err, HygeiaError::Clinical(_)));
    }

    #[test]
    fn test_not_found_classification() {
        let err: HygeiaError = ClinicalError::RecordNotFound("card 2941".to_string()).into();
        assert!(err.is_not_found());

        let err: HygeiaError = ClinicalError::InvalidResponse("no data key".to_string()).into();
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_address_error_conversion() {
        let err: HygeiaError = AddressError::TokenUnavailable("empty token".to_string()).into();
        assert!(matches!(err, HygeiaError::Address(_)));
        assert!(err.to_string().contains("token unavailable"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: HygeiaError = io_err.into();
        assert!(matches!(err, HygeiaError::Io(_)));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = HygeiaError::Persistence("disk full".to_string());
        let _: &dyn std::error::Error = &err;

        let err = RegistryError::UnknownCode("F999".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
