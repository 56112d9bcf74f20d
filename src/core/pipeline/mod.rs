//! Event enrichment pipeline
//!
//! Builds one hospitalization record from many dependent backend calls.
//! The search seeds the record; the enrichment steps then run in a fixed
//! order because later steps consume identifiers earlier steps populate
//! (the policy step needs person/server ids from the demographics step,
//! the referral step needs the episode id).
//!
//! Hard failures (authentication, malformed mandatory responses, not-found)
//! abort the run. Soft misses (reference lookups, address normalization)
//! only degrade the record: the field stays unset and the pipeline
//! finishes. A record with unset optional fields is a valid result.
//!
//! Each step owns a disjoint set of fields and only adds or overwrites its
//! own, so any step can be re-run without corrupting the others' work.

pub mod address;
pub mod demographics;
pub mod insurance;
pub mod operations;
pub mod policy;
pub mod referral;

pub use referral::generate_referral_id;

use crate::adapters::address::AddressNormalizer;
use crate::adapters::clinical::search::find_hospitalization;
use crate::adapters::clinical::session::Credential;
use crate::adapters::http::HttpExecutor;
use crate::adapters::registry::RegistryClient;
use crate::config::{ClinicalConfig, InstitutionConfig};
use crate::core::handbooks::HandbookStore;
use crate::domain::{EventCriteria, HospitalizationRecord, Result};
use serde_json::Value;
use std::path::Path;

/// Everything one enrichment run needs
///
/// The credential is obtained once, before the run, and stays immutable for
/// its duration.
pub struct EnrichmentContext<'a> {
    pub http: &'a HttpExecutor,
    pub session: &'a Credential,
    pub clinical: &'a ClinicalConfig,
    pub institution: &'a InstitutionConfig,
    pub handbooks: &'a HandbookStore,
    pub normalizer: &'a AddressNormalizer,
    pub registry: &'a RegistryClient,
    pub handbooks_dir: &'a Path,
}

/// Search for one episode and run the full enrichment over it
pub async fn collect_record(
    criteria: &EventCriteria,
    ctx: &EnrichmentContext<'_>,
) -> Result<HospitalizationRecord> {
    tracing::info!(card_number = %criteria.card_number, "Collecting hospitalization record");

    let record = find_hospitalization(criteria, ctx.session, ctx.http, ctx.clinical).await?;
    let record = enrich(record, ctx).await?;

    tracing::info!(
        card_number = %criteria.card_number,
        event_id = %record.hospitalization.id,
        complete = record.is_complete(),
        "Record collection finished"
    );
    Ok(record)
}

/// Run the enrichment steps over a seed record, in order
pub async fn enrich(
    mut record: HospitalizationRecord,
    ctx: &EnrichmentContext<'_>,
) -> Result<HospitalizationRecord> {
    demographics::apply(&mut record, ctx).await?;
    tracing::debug!("Step 1/6: demographics applied");

    policy::apply(&mut record, ctx).await?;
    tracing::debug!("Step 2/6: policy type resolved");

    address::apply(&mut record, ctx).await;
    tracing::debug!("Step 3/6: addresses normalized");

    insurance::apply(&mut record, ctx).await;
    tracing::debug!("Step 4/6: insurer codes resolved");

    referral::apply(&mut record, ctx).await?;
    tracing::debug!("Step 5/6: referral enriched");

    operations::apply(&mut record, ctx).await;
    tracing::debug!("Step 6/6: operations attached");

    Ok(record)
}

/// Read one payload field as a string, tolerating numeric values
pub(crate) fn field_str(payload: &Value, key: &str) -> Option<String> {
    match payload.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
