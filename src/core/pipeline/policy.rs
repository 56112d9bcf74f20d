//! Policy-type step
//!
//! Fetches the person edit panel (needs both person and server ids, which
//! the demographics step confirmed) and sets the policy-type identifier on
//! the insurance block and the correlation ids.

use crate::adapters::clinical::calls::load_person_edit_panel;
use crate::core::pipeline::{field_str, EnrichmentContext};
use crate::domain::{HospitalizationRecord, Result};

pub async fn apply(record: &mut HospitalizationRecord, ctx: &EnrichmentContext<'_>) -> Result<()> {
    let payload = load_person_edit_panel(
        ctx.http,
        ctx.clinical,
        ctx.session,
        &record.service.person_id,
        &record.service.server_id,
    )
    .await?;

    let policy_type_id = field_str(&payload, "PolisType_id");
    if policy_type_id.is_none() {
        tracing::warn!(
            person_id = %record.service.person_id,
            "Person edit panel carries no policy-type id"
        );
    }

    record.service.policy_type_id = policy_type_id.clone();
    record.insurance.get_or_insert_with(Default::default).policy_type_id = policy_type_id;

    Ok(())
}
