//! Demographics step
//!
//! Fetches the person detail panel and fills the personal block: gender,
//! contacts, social fields, both free-text addresses, the server person id,
//! and the insurance skeleton — all from one payload. Fields missing from
//! the payload stay absent; only the call itself failing is an error.

use crate::adapters::clinical::calls::load_person_panel;
use crate::core::pipeline::{field_str, EnrichmentContext};
use crate::domain::record::Address;
use crate::domain::{HospitalizationRecord, Insurance, Result};

pub async fn apply(record: &mut HospitalizationRecord, ctx: &EnrichmentContext<'_>) -> Result<()> {
    let person_id = record.service.person_id.clone();
    let payload = load_person_panel(ctx.http, ctx.clinical, ctx.session, &person_id).await?;

    let personal = &mut record.personal;
    personal.gender_id = field_str(&payload, "Sex_id");
    personal.gender_name = field_str(&payload, "Sex_Name");
    personal.phone = field_str(&payload, "Person_Phone");
    personal.snils = field_str(&payload, "Person_Snils");
    personal.job = field_str(&payload, "Person_Job");
    personal.social_status = field_str(&payload, "SocStatus_Name");

    personal.registration_address = field_str(&payload, "Person_RAddress").map(Address::new);
    if personal.registration_address.is_none() {
        tracing::debug!(person_id = %person_id, "No registration address in person panel");
    }

    personal.actual_address = field_str(&payload, "Person_PAddress").map(Address::new);
    if personal.actual_address.is_none() {
        tracing::debug!(person_id = %person_id, "No actual address in person panel");
    }

    record.service.server_pid = field_str(&payload, "Server_pid");

    // Insurance skeleton from the same payload; every field is optional, so
    // a payload without insurer data yields an empty block.
    let insurance: Insurance = serde_json::from_value(payload).unwrap_or_default();
    record.insurance = Some(insurance);

    tracing::info!(person_id = %person_id, "Demographics applied");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insurance_skeleton_tolerates_missing_fields() {
        let payload = json!({"Sex_id": "2"});
        let insurance: Insurance = serde_json::from_value(payload).unwrap_or_default();
        assert!(insurance.company_name.is_none());
        assert!(insurance.policy_number.is_none());
    }
}
