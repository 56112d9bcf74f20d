//! Handbook synchronization
//!
//! Startup routine that makes sure every expected table is in memory:
//! load from the local file first, and when the file is missing or corrupt,
//! download registry-coded tables from the registry service and persist
//! them. Downloads for different tables run concurrently and fail
//! independently; the outcome is counted, not used to abort startup.
//!
//! Tables sourced from the clinical backend itself (`referred_by`,
//! `referred_organizations`) have no download path here; their absence is a
//! logged degradation.

use crate::adapters::http::HttpExecutor;
use crate::adapters::registry::{descriptor_for_storage_key, RegistryClient};
use crate::core::handbooks::files::{load_handbook, save_handbook};
use crate::core::handbooks::store::HandbookStore;
use crate::domain::Result;
use futures::future::join_all;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Storage keys expected in memory before the pipeline runs
pub const DEFAULT_TABLES: &[&str] = &[
    "insurance_companies",
    "medical_organizations",
    "gender",
    "medical_care_conditions",
    "medical_care_forms",
    "referred_by",
    "referred_organizations",
];

/// Counted outcome of one sync run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SyncOutcome {
    pub loaded_from_disk: usize,
    pub downloaded: usize,
    pub failed: usize,
}

/// Ensure the expected tables are present in the store
///
/// Never fails as a whole: per-table failures are isolated and counted.
pub async fn ensure_handbooks(
    store: &HandbookStore,
    http: &HttpExecutor,
    registry: &RegistryClient,
    handbooks_dir: &Path,
    expected: &[&str],
) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();
    let mut to_download = Vec::new();

    for &name in expected {
        match load_handbook(handbooks_dir, name).await {
            Ok(table) => {
                store.replace(name, table);
                outcome.loaded_from_disk += 1;
            }
            Err(e) => {
                tracing::warn!(handbook = name, error = %e, "Handbook not usable from file");
                if descriptor_for_storage_key(name).is_some() {
                    to_download.push(name);
                } else {
                    tracing::warn!(
                        handbook = name,
                        "No download path for this handbook, lookups against it will miss"
                    );
                    outcome.failed += 1;
                }
            }
        }
    }

    if !to_download.is_empty() {
        tracing::info!(count = to_download.len(), "Downloading missing handbooks");

        let downloads = to_download.iter().map(|&name| async move {
            let result = fetch_and_cache(store, http, registry, handbooks_dir, name).await;
            (name, result)
        });

        for (name, result) in join_all(downloads).await {
            match result {
                Ok(_) => outcome.downloaded += 1,
                Err(e) => {
                    tracing::error!(handbook = name, error = %e, "Handbook download failed");
                    outcome.failed += 1;
                }
            }
        }
    }

    tracing::info!(
        loaded_from_disk = outcome.loaded_from_disk,
        downloaded = outcome.downloaded,
        failed = outcome.failed,
        in_memory = store.len(),
        "Handbook synchronization finished"
    );
    outcome
}

/// Make one table available, downloading it if it is not in memory
///
/// The self-healing path used mid-pipeline when a lookup finds its table
/// missing.
pub async fn ensure_table(
    store: &HandbookStore,
    http: &HttpExecutor,
    registry: &RegistryClient,
    handbooks_dir: &Path,
    storage_key: &str,
) -> Result<Arc<Value>> {
    if let Some(table) = store.get(storage_key) {
        return Ok(table);
    }

    tracing::info!(handbook = storage_key, "Table missing, fetching on demand");
    fetch_and_cache(store, http, registry, handbooks_dir, storage_key).await
}

/// Download one registry-coded table, store it, and persist it
async fn fetch_and_cache(
    store: &HandbookStore,
    http: &HttpExecutor,
    registry: &RegistryClient,
    handbooks_dir: &Path,
    storage_key: &str,
) -> Result<Arc<Value>> {
    let descriptor = descriptor_for_storage_key(storage_key).ok_or_else(|| {
        crate::domain::RegistryError::UnknownCode(format!(
            "no registry code for handbook '{storage_key}'"
        ))
    })?;

    let table = registry.fetch_table(http, descriptor.code).await?;

    // Memory first: a failed persist degrades the next start, not this run.
    store.replace(storage_key, table.clone());

    if let Err(e) = save_handbook(handbooks_dir, storage_key, &table).await {
        tracing::error!(handbook = storage_key, error = %e, "Handbook persist failed");
    }

    Ok(store
        .get(storage_key)
        .expect("table was just inserted into the store"))
}
