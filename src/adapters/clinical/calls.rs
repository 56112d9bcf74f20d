//! Per-call request builders and response-shape guards
//!
//! One function per backend call the pipeline depends on. Each function
//! owns the call's `(controller, method)` pair and form vocabulary, checks
//! the response against that call's shape contract, and converts violations
//! into `ClinicalError::InvalidResponse` right at the boundary instead of
//! letting malformed payloads drift into business logic.

use crate::adapters::clinical::{classify_fetch_error, rpc_request};
use crate::adapters::http::{FetchResponse, HttpExecutor};
use crate::adapters::clinical::session::Credential;
use crate::config::ClinicalConfig;
use crate::domain::{ClinicalError, Result};
use serde_json::{json, Value};

/// Service-class marker identifying an operation entry in the service grid
pub const OPERATION_CLASS_MARKER: &str = "EvnUslugaOper";

/// Person detail panel: demographics, contacts, addresses, insurer fields
///
/// Contract: JSON body that is a non-empty list; the first element is the
/// person payload.
pub async fn load_person_panel(
    http: &HttpExecutor,
    config: &ClinicalConfig,
    session: &Credential,
    person_id: &str,
) -> Result<Value> {
    let request = rpc_request(config, "Common", "loadPersonData")
        .cookies(session.tokens())
        .form_field("Person_id", person_id)
        .form_field("LoadShort", "true")
        .form_field("mode", "PersonInfoPanel");

    let response = http.fetch(&request).await.map_err(classify_fetch_error)?;
    require_first_of_list(&response, "loadPersonData", person_id)
}

/// Person edit panel: carries the policy-type identifier
///
/// Contract: JSON body that is a non-empty list.
pub async fn load_person_edit_panel(
    http: &HttpExecutor,
    config: &ClinicalConfig,
    session: &Credential,
    person_id: &str,
    server_id: &str,
) -> Result<Value> {
    let request = rpc_request(config, "Person", "getPersonEditWindow")
        .cookies(session.tokens())
        .form_field("person_id", person_id)
        .form_field("server_id", server_id)
        .form_field("attrObjects", "true")
        .form_field(
            "mode",
            json!([{"object": "PersonEditWindow", "identField": "Person_id"}]).to_string(),
        );

    let response = http.fetch(&request).await.map_err(classify_fetch_error)?;
    require_first_of_list(&response, "getPersonEditWindow", person_id)
}

/// Admission/referral edit form for one episode
///
/// Contract: JSON body that is a non-empty list; the first element holds the
/// referral facets (referring entity type, referring organization token,
/// referral date, care-form type code).
pub async fn load_referral_form(
    http: &HttpExecutor,
    config: &ClinicalConfig,
    session: &Credential,
    event_id: &str,
) -> Result<Value> {
    let request = rpc_request(config, "EvnPS", "loadEvnPSEditForm")
        .cookies(session.tokens())
        .form_field("EvnPS_id", event_id)
        .form_field("archiveRecord", "0")
        .form_field("delDocsView", "0")
        .form_field(
            "attrObjects",
            json!([{"object": "EvnPSEditWindow", "identField": "EvnPS_id"}]).to_string(),
        );

    let response = http.fetch(&request).await.map_err(classify_fetch_error)?;
    require_first_of_list(&response, "loadEvnPSEditForm", event_id)
}

/// Ward-movement grid for one episode
///
/// Contract: JSON body that is a list (possibly empty — an episode fresh
/// from admission has no movements yet).
pub async fn load_ward_movements(
    http: &HttpExecutor,
    config: &ClinicalConfig,
    session: &Credential,
    event_id: &str,
) -> Result<Vec<Value>> {
    let request = rpc_request(config, "EvnSection", "loadEvnSectionGrid")
        .cookies(session.tokens())
        .form_field("EvnPS_id", event_id);

    let response = http.fetch(&request).await.map_err(classify_fetch_error)?;
    require_list(&response, "loadEvnSectionGrid", event_id)
}

/// Service grid for one episode (operations, procedures, bed-day services)
///
/// Contract: JSON body that is a list.
pub async fn load_service_grid(
    http: &HttpExecutor,
    config: &ClinicalConfig,
    session: &Credential,
    event_id: &str,
) -> Result<Vec<Value>> {
    let request = rpc_request(config, "EvnUsluga", "loadEvnUslugaGrid")
        .cookies(session.tokens())
        .form_field("pid", event_id)
        .form_field("parent", "EvnPS");

    let response = http.fetch(&request).await.map_err(classify_fetch_error)?;
    require_list(&response, "loadEvnUslugaGrid", event_id)
}

/// Keep only service entries whose class marks them as operations
pub fn filter_operations(entries: &[Value]) -> Vec<Value> {
    entries
        .iter()
        .filter(|entry| {
            entry
                .get("EvnClass_SysNick")
                .and_then(Value::as_str)
                .is_some_and(|nick| nick.contains(OPERATION_CLASS_MARKER))
        })
        .cloned()
        .collect()
}

/// Shape guard: success status plus a JSON list body
fn require_list(response: &FetchResponse, call: &str, subject: &str) -> Result<Vec<Value>> {
    if !response.is_success() {
        return Err(ClinicalError::ServerError {
            status: response.status,
            message: format!("{call} for {subject}"),
        }
        .into());
    }

    match response.json.as_ref().and_then(Value::as_array) {
        Some(list) => Ok(list.clone()),
        None => {
            tracing::error!(
                call = call,
                subject = subject,
                body = response.text_preview(),
                "Expected a JSON list, got something else"
            );
            Err(ClinicalError::InvalidResponse(format!(
                "{call} for {subject} did not return a list"
            ))
            .into())
        }
    }
}

/// Shape guard: success status plus a non-empty JSON list body
fn require_first_of_list(response: &FetchResponse, call: &str, subject: &str) -> Result<Value> {
    let list = require_list(response, call, subject)?;
    list.into_iter().next().ok_or_else(|| {
        tracing::error!(call = call, subject = subject, "Expected a non-empty list");
        ClinicalError::InvalidResponse(format!("{call} for {subject} returned an empty list")).into()
    })
}
