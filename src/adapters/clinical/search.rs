//! Hospitalization search
//!
//! Two entry points against the backend's `(Search, searchData)` call: a
//! card-number lookup producing the seed record for the enrichment pipeline,
//! and a by-name listing that keeps only episodes with confirmed operations.

use crate::adapters::clinical::calls::{filter_operations, load_service_grid};
use crate::adapters::clinical::session::Credential;
use crate::adapters::clinical::{classify_fetch_error, rpc_request};
use crate::adapters::http::{FetchRequest, HttpExecutor};
use crate::config::ClinicalConfig;
use crate::domain::{
    ClinicalError, EventCriteria, HospitalizationRecord, PatientCriteria, Result,
};
use serde_json::Value;

/// Locate one hospitalization episode by card number
///
/// Takes the first element of the backend's result list as canonical and
/// builds the seed record from it.
///
/// # Errors
///
/// - `ClinicalError::RecordNotFound` when the result list is empty
/// - `ClinicalError::InvalidResponse` when the expected list-valued field is
///   absent from the response
/// - `ClinicalError::ServerError` / `ConnectionFailed` on upstream failure
pub async fn find_hospitalization(
    criteria: &EventCriteria,
    session: &Credential,
    http: &HttpExecutor,
    config: &ClinicalConfig,
) -> Result<HospitalizationRecord> {
    tracing::debug!(card_number = %criteria.card_number, "Searching for a hospitalization");

    let mut request = rpc_request(config, "Search", "searchData")
        .cookies(session.tokens())
        .form_field("SearchFormType", "EvnPS")
        .form_field("EvnPS_NumCard", &criteria.card_number);

    if let Some(surname) = &criteria.surname {
        request = request.form_field("Person_Surname", surname);
    }
    if let Some(given_name) = &criteria.given_name {
        request = request.form_field("Person_Firname", given_name);
    }
    if let Some(patronymic) = &criteria.patronymic {
        request = request.form_field("Person_Secname", patronymic);
    }
    if let Some(birth_date) = &criteria.birth_date {
        request = request.form_field("Person_Birthday", birth_date);
    }

    let rows = search_rows(http, &request, &criteria.card_number).await?;

    let first = rows.into_iter().next().ok_or_else(|| {
        tracing::warn!(card_number = %criteria.card_number, "No hospitalization matched");
        ClinicalError::RecordNotFound(format!(
            "no hospitalization with card number '{}'",
            criteria.card_number
        ))
    })?;

    let record = seed_record(&first).map_err(|e| {
        tracing::error!(
            card_number = %criteria.card_number,
            error = %e,
            "Search hit does not carry the mandatory record fields"
        );
        ClinicalError::InvalidResponse(format!(
            "search hit for card '{}' is missing mandatory fields: {e}",
            criteria.card_number
        ))
    })?;

    tracing::info!(
        card_number = %criteria.card_number,
        event_id = %record.hospitalization.id,
        "Seed record built from search hit"
    );
    Ok(record)
}

/// List a patient's hospitalizations, keeping only those with operations
///
/// Searches by surname (plus optional name fields) over the configured
/// discharge-date window, then probes the service grid of every hit. A
/// failed probe excludes that episode and is counted, never propagated.
///
/// # Errors
///
/// `ClinicalError::RecordNotFound` when the search is empty or no episode
/// has confirmed operations.
pub async fn list_hospitalizations_with_operations(
    criteria: &PatientCriteria,
    session: &Credential,
    http: &HttpExecutor,
    config: &ClinicalConfig,
) -> Result<Vec<Value>> {
    let window_end = chrono::Local::now().format("%d.%m.%Y").to_string();
    let search = &config.search;

    let mut request = rpc_request(config, "Search", "searchData")
        .cookies(session.tokens())
        .form_field("SearchFormType", "EvnPS")
        .form_field("Person_Surname", &criteria.surname)
        .form_field("PayType_id", &search.pay_type_id)
        .form_field("Okei_id", &search.okei_id)
        .form_field("Date_Type", &search.date_type)
        .form_field("LpuBuilding_cid", &search.lpu_building_id)
        .form_field(
            "EvnSection_disDate_Range",
            format!("{} - {}", search.period_start_date, window_end),
        )
        .form_field("Ksg_Year", &search.ksg_year)
        .form_field("SearchType_id", &search.search_type_id);

    if let Some(given_name) = &criteria.given_name {
        request = request.form_field("Person_Firname", given_name);
    }
    if let Some(patronymic) = &criteria.patronymic {
        request = request.form_field("Person_Secname", patronymic);
    }
    if let Some(birth_date) = &criteria.birth_date {
        request = request.form_field("Person_Birthday", birth_date);
    }

    let rows = search_rows(http, &request, &criteria.surname).await?;
    tracing::info!(surname = %criteria.surname, found = rows.len(), "Hospitalizations found");

    if rows.is_empty() {
        return Err(ClinicalError::RecordNotFound(format!(
            "no hospitalizations for '{}'",
            criteria.surname
        ))
        .into());
    }

    let mut confirmed = Vec::new();
    let mut probe_failures = 0usize;

    // Sequential on purpose: the backend throttles bursts from one session.
    for row in rows {
        let Some(event_id) = row.get("EvnPS_id").map(value_to_string) else {
            tracing::warn!("Search row without an episode id, skipping");
            continue;
        };

        match load_service_grid(http, config, session, &event_id).await {
            Ok(services) => {
                let operations = filter_operations(&services);
                if !operations.is_empty() {
                    confirmed.push(row);
                }
            }
            Err(e) => {
                probe_failures += 1;
                tracing::warn!(
                    event_id = %event_id,
                    error = %e,
                    "Could not confirm operations, excluding the episode"
                );
            }
        }
    }

    tracing::info!(
        surname = %criteria.surname,
        confirmed = confirmed.len(),
        probe_failures = probe_failures,
        "Operations filter applied"
    );

    if confirmed.is_empty() {
        return Err(ClinicalError::RecordNotFound(format!(
            "hospitalizations exist for '{}', but none with confirmed operations",
            criteria.surname
        ))
        .into());
    }

    Ok(confirmed)
}

/// Issue one search call and unwrap its `data` list
async fn search_rows(
    http: &HttpExecutor,
    request: &FetchRequest,
    subject: &str,
) -> Result<Vec<Value>> {
    let response = http.fetch(request).await.map_err(classify_fetch_error)?;

    if !response.is_success() {
        return Err(ClinicalError::ServerError {
            status: response.status,
            message: format!("searchData for '{subject}'"),
        }
        .into());
    }

    let data = response
        .json
        .as_ref()
        .and_then(|json| json.get("data"))
        .and_then(Value::as_array);

    match data {
        Some(rows) => Ok(rows.clone()),
        None => {
            tracing::error!(
                subject = subject,
                body = response.text_preview(),
                "Search response has no 'data' list"
            );
            Err(ClinicalError::InvalidResponse(format!(
                "search response for '{subject}' has no 'data' list"
            ))
            .into())
        }
    }
}

/// Build the seed record from one raw search row
///
/// The same row feeds three blocks; each block picks its own fields from the
/// backend vocabulary.
fn seed_record(row: &Value) -> serde_json::Result<HospitalizationRecord> {
    Ok(HospitalizationRecord {
        personal: serde_json::from_value(row.clone())?,
        hospitalization: serde_json::from_value(row.clone())?,
        insurance: None,
        referral: None,
        service: serde_json::from_value(row.clone())?,
        operations: Vec::new(),
        diagnoses: Vec::new(),
    })
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
