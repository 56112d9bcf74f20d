//! Address-normalization step
//!
//! Normalizes the registration and actual addresses. When both free-text
//! values are equal and non-empty, the service is asked once and the result
//! is copied to both sub-records; otherwise the two lookups run
//! concurrently and fail independently — one address missing its result
//! never blocks the other.
//!
//! This step is entirely soft: every failure is logged and leaves the
//! affected address un-normalized.

use crate::adapters::address::AddressNormalizer;
use crate::adapters::http::HttpExecutor;
use crate::core::pipeline::EnrichmentContext;
use crate::domain::record::Address;
use crate::domain::HospitalizationRecord;

pub async fn apply(record: &mut HospitalizationRecord, ctx: &EnrichmentContext<'_>) {
    let personal = &mut record.personal;

    let same_source = match (&personal.registration_address, &personal.actual_address) {
        (Some(reg), Some(actual)) => {
            let reg = reg.source.trim();
            let actual = actual.source.trim();
            !reg.is_empty() && reg == actual
        }
        _ => false,
    };

    if same_source {
        tracing::debug!("Registration and actual addresses match, one lookup");
        normalize_into(
            ctx.normalizer,
            ctx.http,
            personal.registration_address.as_mut(),
            "registration",
        )
        .await;

        if let (Some(reg), Some(actual)) = (
            personal.registration_address.as_ref(),
            personal.actual_address.as_mut(),
        ) {
            if let (Some(full_address), Some(area_code)) =
                (reg.full_address.clone(), reg.area_code.clone())
            {
                actual.set_normalized(full_address, area_code);
            }
        }
        return;
    }

    tracing::debug!("Addresses differ, independent lookups");
    let (registration_address, actual_address) = (
        personal.registration_address.as_mut(),
        personal.actual_address.as_mut(),
    );
    tokio::join!(
        normalize_into(ctx.normalizer, ctx.http, registration_address, "registration"),
        normalize_into(ctx.normalizer, ctx.http, actual_address, "actual"),
    );
}

/// Normalize one address in place; misses and failures leave it untouched
async fn normalize_into(
    normalizer: &AddressNormalizer,
    http: &HttpExecutor,
    address: Option<&mut Address>,
    kind: &str,
) {
    let Some(address) = address else {
        tracing::debug!(kind = kind, "No address to normalize");
        return;
    };

    match normalizer.normalize(http, &address.source).await {
        Ok(Some(normalized)) => {
            tracing::info!(kind = kind, area_code = %normalized.area_code, "Address normalized");
            address.set_normalized(normalized.full_address, normalized.area_code);
        }
        Ok(None) => {
            tracing::warn!(kind = kind, "Address did not normalize, leaving it as reported");
        }
        Err(e) => {
            tracing::warn!(kind = kind, error = %e, "Address normalization failed");
        }
    }
}
