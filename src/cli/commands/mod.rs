//! CLI command implementations
//!
//! Exit codes shared by the commands:
//! 0 success, 2 record not found, 3 upstream failure, 4 authentication
//! failure, 5 configuration or environment failure.

pub mod fetch;
pub mod init;
pub mod list;
pub mod sync;
pub mod validate;

use crate::adapters::address::AddressNormalizer;
use crate::adapters::clinical::session::{FileCredentialStore, SessionManager};
use crate::adapters::http::HttpExecutor;
use crate::adapters::registry::RegistryClient;
use crate::config::HygeiaConfig;
use crate::core::handbooks::HandbookStore;
use crate::domain::{ClinicalError, HygeiaError};
use std::path::PathBuf;

/// Exit code for one command outcome
pub(crate) fn exit_code_for(error: &HygeiaError) -> i32 {
    match error {
        HygeiaError::Clinical(ClinicalError::RecordNotFound(_)) => 2,
        HygeiaError::Clinical(ClinicalError::AuthenticationFailed(_)) => 4,
        HygeiaError::Clinical(_) | HygeiaError::Address(_) | HygeiaError::Registry(_) => 3,
        _ => 5,
    }
}

/// Everything a command needs, assembled from configuration
pub(crate) struct Services {
    pub config: HygeiaConfig,
    pub http: HttpExecutor,
    pub handbooks: HandbookStore,
    pub registry: RegistryClient,
    pub normalizer: AddressNormalizer,
    pub session_manager: SessionManager<FileCredentialStore>,
    pub handbooks_dir: PathBuf,
}

impl Services {
    pub fn from_config_path(config_path: &str) -> anyhow::Result<Self> {
        let config = HygeiaConfig::from_file(config_path)?;

        let http = HttpExecutor::new(
            config.clinical.timeout_seconds,
            config.clinical.tls_verify,
            config.clinical.retry.clone(),
        )
        .map_err(|e| anyhow::anyhow!("failed to build HTTP executor: {e}"))?;

        let registry = RegistryClient::new(config.registry.clone());
        let normalizer = AddressNormalizer::new(config.address.clone());
        let session_manager = SessionManager::new(
            config.clinical.clone(),
            FileCredentialStore::new(&config.storage.credential_path),
        );
        let handbooks_dir = PathBuf::from(&config.storage.handbooks_dir);

        Ok(Self {
            config,
            http,
            handbooks: HandbookStore::new(),
            registry,
            normalizer,
            session_manager,
            handbooks_dir,
        })
    }
}
