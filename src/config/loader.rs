//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::HygeiaConfig;
use crate::config::secret::secret_string;
use crate::domain::errors::HygeiaError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into HygeiaConfig
/// 4. Applies environment variable overrides (HYGEIA_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if:
/// - File cannot be read
/// - TOML parsing fails
/// - Environment variable substitution fails
/// - Configuration validation fails
pub fn load_config(path: impl AsRef<Path>) -> Result<HygeiaConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(HygeiaError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        HygeiaError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: HygeiaConfig = toml::from_str(&contents)
        .map_err(|e| HygeiaError::Configuration(format!("Failed to parse TOML: {}", e)))?;

    apply_env_overrides(&mut config);

    config.validate().map_err(|e| {
        HygeiaError::Configuration(format!("Configuration validation failed: {}", e))
    })?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are left untouched.
///
/// # Errors
///
/// Returns an error if a referenced environment variable is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid substitution pattern");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        let trimmed = line.trim_start();

        if trimmed.starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{}}}", var_name);
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(HygeiaError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the HYGEIA_* prefix
///
/// Variables follow the pattern HYGEIA_<SECTION>_<KEY>, for example
/// HYGEIA_CLINICAL_BASE_URL or HYGEIA_STORAGE_HANDBOOKS_DIR.
fn apply_env_overrides(config: &mut HygeiaConfig) {
    // Application overrides
    if let Ok(val) = std::env::var("HYGEIA_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Clinical backend overrides
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_BASE_URL") {
        config.clinical.base_url = val;
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_ORIGIN_URL") {
        config.clinical.origin_url = val;
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_REFERER_URL") {
        config.clinical.referer_url = val;
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_LOGIN") {
        config.clinical.login = val;
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_PASSWORD") {
        config.clinical.password = secret_string(val);
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_SESSION_PAYLOAD") {
        config.clinical.session_payload = secret_string(val);
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_SESSION_PERMUTATION") {
        config.clinical.session_permutation = val;
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_TLS_VERIFY") {
        config.clinical.tls_verify = val.parse().unwrap_or(true);
    }
    if let Ok(val) = std::env::var("HYGEIA_CLINICAL_TIMEOUT_SECONDS") {
        if let Ok(seconds) = val.parse() {
            config.clinical.timeout_seconds = seconds;
        }
    }

    // Address service overrides
    if let Ok(val) = std::env::var("HYGEIA_ADDRESS_TOKEN_URL") {
        config.address.token_url = val;
    }
    if let Ok(val) = std::env::var("HYGEIA_ADDRESS_API_BASE_URL") {
        config.address.api_base_url = val;
    }

    // Registry overrides
    if let Ok(val) = std::env::var("HYGEIA_REGISTRY_BASE_URL") {
        config.registry.base_url = val;
    }

    // Storage overrides
    if let Ok(val) = std::env::var("HYGEIA_STORAGE_CREDENTIAL_PATH") {
        config.storage.credential_path = val;
    }
    if let Ok(val) = std::env::var("HYGEIA_STORAGE_HANDBOOKS_DIR") {
        config.storage.handbooks_dir = val;
    }

    // Logging overrides
    if let Ok(val) = std::env::var("HYGEIA_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("HYGEIA_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
