//! Configuration schema types
//!
//! The root structure maps to `hygeia.toml`. Every section validates itself;
//! `HygeiaConfig::validate` walks them all.

use crate::config::SecretString;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

/// Runtime environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    Production,
}

/// Main Hygeia configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HygeiaConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: Environment,

    /// Clinical backend connection, authentication and search vocabulary
    pub clinical: ClinicalConfig,

    /// Address-normalization service endpoints
    pub address: AddressServiceConfig,

    /// Reference-data registry service
    pub registry: RegistryConfig,

    /// Local durable state (credential file, handbook directory)
    #[serde(default)]
    pub storage: StorageConfig,

    /// Static identity of the institution running this adapter, substituted
    /// for the referring organization on same-institution referrals
    pub institution: InstitutionConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HygeiaConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.clinical.validate(&self.environment)?;
        self.address.validate()?;
        self.registry.validate()?;
        self.storage.validate()?;
        self.institution.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Retry configuration for upstream calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first)
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier applied per attempt
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Clinical backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicalConfig {
    /// Base URL of the backend's RPC-style dispatch endpoint
    pub base_url: String,

    /// Origin header sent with every call
    pub origin_url: String,

    /// Referer header sent with every call
    pub referer_url: String,

    /// Principal used for the login step
    pub login: String,

    /// Secret for the login step
    pub password: SecretString,

    /// Opaque pre-shared payload for the final acquisition step
    pub session_payload: SecretString,

    /// Permutation header value for the final acquisition step
    pub session_permutation: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Verify TLS certificates
    #[serde(default = "default_true")]
    pub tls_verify: bool,

    /// Retry behavior for backend calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Search vocabulary constants
    pub search: SearchConfig,
}

impl ClinicalConfig {
    fn validate(&self, environment: &Environment) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("clinical.base_url must not be empty".to_string());
        }
        if self.login.trim().is_empty() {
            return Err("clinical.login must not be empty".to_string());
        }
        if self.password.expose_secret().is_empty() {
            return Err("clinical.password must not be empty".to_string());
        }
        if self.session_payload.expose_secret().is_empty() {
            return Err("clinical.session_payload must not be empty".to_string());
        }
        if *environment == Environment::Production {
            if !self.base_url.starts_with("https://") {
                return Err("clinical.base_url must use https in production".to_string());
            }
            if !self.tls_verify {
                return Err("clinical.tls_verify must be enabled in production".to_string());
            }
        }
        self.search.validate()
    }
}

/// Backend search vocabulary
///
/// These are opaque dictionary identifiers specific to one backend
/// installation; they parameterize search calls instead of being hard-coded
/// at call sites.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Payment-type dictionary id included in patient listings
    pub pay_type_id: String,

    /// Measurement-unit dictionary id
    #[serde(default = "default_okei_id")]
    pub okei_id: String,

    /// Building dictionary id scoping the search
    pub lpu_building_id: String,

    /// Grouping-codes year
    pub ksg_year: String,

    /// Start of the discharge-date search window, DD.MM.YYYY
    pub period_start_date: String,

    #[serde(default = "default_one")]
    pub search_type_id: String,

    #[serde(default = "default_one")]
    pub date_type: String,

    /// Department-name prefixes identifying a day-hospital stay
    #[serde(default = "default_day_hospital_prefixes")]
    pub day_hospital_prefixes: Vec<String>,

    /// Care-condition name looked up for ordinary inpatient stays
    #[serde(default = "default_inpatient_condition")]
    pub inpatient_condition_name: String,

    /// Care-condition name looked up for day-hospital stays
    #[serde(default = "default_day_hospital_condition")]
    pub day_hospital_condition_name: String,
}

impl SearchConfig {
    fn validate(&self) -> Result<(), String> {
        if self.period_start_date.trim().is_empty() {
            return Err("clinical.search.period_start_date must not be empty".to_string());
        }
        if self.day_hospital_prefixes.iter().any(|p| p.trim().is_empty()) {
            return Err("clinical.search.day_hospital_prefixes must not contain empty prefixes".to_string());
        }
        Ok(())
    }
}

/// Address-normalization service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddressServiceConfig {
    /// Token endpoint URL
    pub token_url: String,

    /// Base URL of the search API
    pub api_base_url: String,

    /// Fixed query template sent to the token endpoint
    #[serde(default = "default_token_query_template")]
    pub token_query_template: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl AddressServiceConfig {
    fn validate(&self) -> Result<(), String> {
        if self.token_url.trim().is_empty() {
            return Err("address.token_url must not be empty".to_string());
        }
        if self.api_base_url.trim().is_empty() {
            return Err("address.api_base_url must not be empty".to_string());
        }
        Ok(())
    }
}

/// Reference-data registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URL of the registry download service
    pub base_url: String,

    /// Archive download timeout in seconds; registries are large, so this
    /// exceeds the regular call timeout
    #[serde(default = "default_registry_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl RegistryConfig {
    fn validate(&self) -> Result<(), String> {
        if self.base_url.trim().is_empty() {
            return Err("registry.base_url must not be empty".to_string());
        }
        Ok(())
    }
}

/// Local durable state paths
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// File the session credential is persisted to
    #[serde(default = "default_credential_path")]
    pub credential_path: String,

    /// Directory holding one JSON file per handbook
    #[serde(default = "default_handbooks_dir")]
    pub handbooks_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            credential_path: default_credential_path(),
            handbooks_dir: default_handbooks_dir(),
        }
    }
}

impl StorageConfig {
    fn validate(&self) -> Result<(), String> {
        if self.credential_path.trim().is_empty() {
            return Err("storage.credential_path must not be empty".to_string());
        }
        if self.handbooks_dir.trim().is_empty() {
            return Err("storage.handbooks_dir must not be empty".to_string());
        }
        Ok(())
    }
}

/// Static identity of the institution running the adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstitutionConfig {
    pub name: String,
    pub short_name: String,
    pub code: String,
    pub token: String,
}

impl InstitutionConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("institution.name must not be empty".to_string());
        }
        if self.code.trim().is_empty() {
            return Err("institution.code must not be empty".to_string());
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write JSON logs to a local rolling file
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for local log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation policy: daily or hourly
    #[serde(default = "default_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        if self.local_enabled && self.local_path.trim().is_empty() {
            return Err("logging.local_path must not be empty when local logging is enabled".to_string());
        }
        let valid_rotations = ["daily", "hourly"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_retries() -> usize {
    3
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10_000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_registry_timeout_seconds() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_okei_id() -> String {
    "100".to_string()
}

fn default_one() -> String {
    "1".to_string()
}

fn default_day_hospital_prefixes() -> Vec<String> {
    vec!["ДС".to_string()]
}

fn default_inpatient_condition() -> String {
    "стационарно".to_string()
}

fn default_day_hospital_condition() -> String {
    "в дневном стационаре".to_string()
}

fn default_token_query_template() -> String {
    "https://fias.nalog.ru/Search?objectId=0&addressType=2&fullName=".to_string()
}

fn default_credential_path() -> String {
    "state/credential.json".to_string()
}

fn default_handbooks_dir() -> String {
    "handbooks".to_string()
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}
