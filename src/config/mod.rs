//! Configuration management
//!
//! TOML-backed configuration with environment substitution, HYGEIA_*
//! overrides, and secret-wrapped credentials.

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    AddressServiceConfig, ApplicationConfig, ClinicalConfig, Environment, HygeiaConfig,
    InstitutionConfig, LoggingConfig, RegistryConfig, RetryConfig, SearchConfig, StorageConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};

impl HygeiaConfig {
    /// Load configuration from a TOML file
    ///
    /// Convenience wrapper around [`loader::load_config`].
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        loader::load_config(path)
    }
}
