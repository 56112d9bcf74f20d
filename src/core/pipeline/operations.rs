//! Operations step
//!
//! Attaches the episode's operation entries (raw, unmodeled) by fetching
//! the service grid and keeping the operation-class entries. A grid an
//! episode cannot produce is a soft miss: the list stays empty.

use crate::adapters::clinical::calls::{filter_operations, load_service_grid};
use crate::core::pipeline::EnrichmentContext;
use crate::domain::HospitalizationRecord;

pub async fn apply(record: &mut HospitalizationRecord, ctx: &EnrichmentContext<'_>) {
    let event_id = &record.service.event_id;

    match load_service_grid(ctx.http, ctx.clinical, ctx.session, event_id).await {
        Ok(services) => {
            record.operations = filter_operations(&services);
            tracing::info!(
                event_id = %event_id,
                operations = record.operations.len(),
                "Operations attached"
            );
        }
        Err(e) => {
            tracing::warn!(event_id = %event_id, error = %e, "Service grid unavailable, no operations attached");
        }
    }
}
