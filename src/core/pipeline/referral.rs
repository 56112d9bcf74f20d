//! Referral-enrichment step
//!
//! Completes the record with who sent the patient here and under which care
//! classification:
//!
//! - a synthetic referral id, derived from the hospitalization id alone so
//!   re-runs always regenerate the same value
//! - the referral date from the admission edit form — an episode without
//!   one is an upstream data-integrity failure and aborts the step
//! - the referring-entity type name and the referring organization's
//!   identity (manual override table first, bulk registry by token second,
//!   the institution's own static identity when the episode was referred
//!   from inside)
//! - the care-setting classification from a department-name heuristic and
//!   the care-form classification from the referral's type code, both
//!   mapped to registry codes; the care-form code `2` is remapped to `3`
//!   before lookup (the backend's vocabulary predates the registry's)
//!
//! Apart from the referral date, every facet here degrades softly.

use crate::adapters::clinical::calls::{load_referral_form, load_ward_movements};
use crate::core::handbooks::resolver::{resolve_entry, resolve_organization};
use crate::core::pipeline::{field_str, EnrichmentContext};
use crate::domain::record::Referral;
use crate::domain::{ClinicalError, HospitalizationRecord, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Referral type code: the institution itself sent the patient
const REFERRED_BY_SAME_ORG: &str = "1";
/// Referral type code: another organization sent the patient
const REFERRED_BY_OTHER_ORG: &str = "2";

/// Care-form code remap applied before the registry lookup
const CARE_FORM_REMAP: (&str, &str) = ("2", "3");

/// Derive the synthetic referral identifier
///
/// Pure and deterministic: the same hospitalization id always yields the
/// same referral id, and only the hospitalization id feeds the derivation.
pub fn generate_referral_id(hospitalization_id: &str) -> String {
    let digest = Sha256::digest(format!("hospital-referral:{hospitalization_id}").as_bytes());
    let mut id = String::with_capacity(16);
    for byte in &digest[..8] {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

pub async fn apply(record: &mut HospitalizationRecord, ctx: &EnrichmentContext<'_>) -> Result<()> {
    let event_id = record.service.event_id.clone();

    let form = load_referral_form(ctx.http, ctx.clinical, ctx.session, &event_id).await?;
    let movements = load_ward_movements(ctx.http, ctx.clinical, ctx.session, &event_id).await?;

    let mut referral = Referral {
        id: generate_referral_id(&record.hospitalization.id),
        ..Default::default()
    };

    // A referral without a date cannot be reported downstream at all.
    let date = field_str(&form, "EvnPS_setDate").ok_or_else(|| {
        tracing::error!(event_id = %event_id, "Referral form carries no referral date");
        ClinicalError::InvalidResponse(format!("referral for episode {event_id} has no date"))
    })?;
    referral.date = Some(date);

    let referred_by_id = field_str(&form, "PrehospDirect_id");

    if let Some(id) = &referred_by_id {
        referral.entity_type_name = entity_type_name(ctx, id);
        if referral.entity_type_name.is_none() {
            tracing::warn!(referred_by_id = %id, "Referring-entity type did not resolve");
        }
    }

    match referred_by_id.as_deref() {
        Some(REFERRED_BY_SAME_ORG) => {
            // The institution referred the patient to itself; no registry
            // lookup, its configured identity is authoritative.
            referral.org_name = Some(ctx.institution.name.clone());
            referral.org_short_name = Some(ctx.institution.short_name.clone());
            referral.org_code = Some(ctx.institution.code.clone());
            referral.org_token = Some(ctx.institution.token.clone());
        }
        Some(REFERRED_BY_OTHER_ORG) => {
            resolve_external_org(ctx, &form, &mut referral);
        }
        other => {
            tracing::warn!(event_id = %event_id, referred_by_id = ?other, "Unrecognized referral type");
        }
    }

    apply_care_setting(ctx, record, &movements, &mut referral);
    apply_care_form(ctx, &form, &mut referral);

    record.referral = Some(referral);
    tracing::info!(event_id = %event_id, "Referral enriched");
    Ok(())
}

/// Resolve the referring-entity type name from its handbook
///
/// Entries there are either plain strings or objects with a `name` field,
/// depending on how the table was produced.
fn entity_type_name(ctx: &EnrichmentContext<'_>, referred_by_id: &str) -> Option<String> {
    let entry = resolve_entry(ctx.handbooks, "referred_by", referred_by_id)?;
    match &entry {
        Value::String(name) => Some(name.clone()),
        other => field_str(other, "name"),
    }
}

/// Two-tier lookup for an external referring organization
fn resolve_external_org(ctx: &EnrichmentContext<'_>, form: &Value, referral: &mut Referral) {
    let Some(org_ref_id) = field_str(form, "Org_did") else {
        tracing::warn!("Referral form names no referring organization");
        return;
    };

    // The backend's own organization table gives us the display name and
    // the registry token to resolve the identity with.
    let Some(backend_entry) = resolve_entry(ctx.handbooks, "referred_organizations", &org_ref_id)
    else {
        tracing::warn!(org_ref_id = %org_ref_id, "Referring organization unknown to the backend table");
        return;
    };

    let org_name = field_str(&backend_entry, "name").unwrap_or_default();
    let org_token = field_str(&backend_entry, "token").unwrap_or_default();

    match resolve_organization(ctx.handbooks, &org_name, &org_token) {
        Some(identity) => {
            referral.org_name = Some(identity.name);
            referral.org_short_name = Some(identity.short_name);
            referral.org_code = Some(identity.code);
            referral.org_token = Some(identity.token);
        }
        None => {
            tracing::warn!(
                org_name = %org_name,
                org_token = %org_token,
                "Referring organization resolved neither via override nor registry"
            );
        }
    }
}

/// Classify the care setting (inpatient vs day hospital) and map it to its
/// registry code
///
/// The heuristic is configured text matching on the department name: a name
/// starting with one of the day-hospital prefixes means a day-hospital
/// stay. The department comes from the first ward movement, falling back to
/// the seed record's department.
fn apply_care_setting(
    ctx: &EnrichmentContext<'_>,
    record: &HospitalizationRecord,
    movements: &[Value],
    referral: &mut Referral,
) {
    let department = movements
        .first()
        .and_then(|movement| field_str(movement, "LpuSection_Name"))
        .or_else(|| record.hospitalization.department.clone());

    let Some(department) = department else {
        tracing::warn!("No department name available, care setting stays unset");
        return;
    };

    let search = &ctx.clinical.search;
    let is_day_hospital = search
        .day_hospital_prefixes
        .iter()
        .any(|prefix| department.starts_with(prefix.as_str()));
    let condition_name = if is_day_hospital {
        &search.day_hospital_condition_name
    } else {
        &search.inpatient_condition_name
    };

    referral.care_condition_name = Some(condition_name.clone());
    referral.care_condition_id = resolve_entry(ctx.handbooks, "medical_care_conditions", condition_name)
        .as_ref()
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| field_str(entry, "IDUMP"));

    if referral.care_condition_id.is_none() {
        tracing::warn!(condition = %condition_name, "Care condition has no registry code");
    }
}

/// Map the referral's raw type code to the care-form registry entry
fn apply_care_form(ctx: &EnrichmentContext<'_>, form: &Value, referral: &mut Referral) {
    let Some(raw_code) = field_str(form, "PrehospType_id") else {
        tracing::warn!("Referral form carries no care-form code");
        return;
    };

    let code = if raw_code == CARE_FORM_REMAP.0 {
        CARE_FORM_REMAP.1.to_string()
    } else {
        raw_code
    };

    let name = resolve_entry(ctx.handbooks, "medical_care_forms", &code)
        .as_ref()
        .and_then(Value::as_array)
        .and_then(|entries| entries.first())
        .and_then(|entry| field_str(entry, "FRMMPNAME"));

    if name.is_none() {
        tracing::warn!(code = %code, "Care form has no registry entry");
    }

    referral.care_form_id = Some(code);
    referral.care_form_name = name;
}
