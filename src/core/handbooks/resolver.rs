//! Reference resolution
//!
//! Lookups against the handbook store. Two layers: generic table access
//! with defensive unwrapping of the `data` envelope the registry adapter
//! produces, and the organization-identity resolution with its defined
//! fallback order (manual overrides before the bulk registry).
//!
//! Every miss here is soft: callers get `None`, a warning is logged, and
//! processing continues with the field unset.

use crate::core::handbooks::overrides::{referred_org_overrides, OrganizationIdentity};
use crate::core::handbooks::store::HandbookStore;
use serde_json::{Map, Value};

/// Length the registry code is truncated to for override entries
const ORG_CODE_LEN: usize = 8;

/// Unwrap a table into its key → entries mapping
///
/// Handles the shapes a table can legitimately or illegitimately take:
/// a `data`-enveloped object (unwrapped), a plain object (returned as-is),
/// an envelope whose `data` is not an object (logged, `None`), or a
/// non-object table (logged, `None`).
pub fn payload_of<'a>(table: &'a Value, name: &str) -> Option<&'a Map<String, Value>> {
    let object = match table.as_object() {
        Some(object) => object,
        None => {
            tracing::warn!(handbook = name, "Table content is not an object");
            return None;
        }
    };

    match object.get("data") {
        None => Some(object),
        Some(Value::Object(data)) => Some(data),
        Some(_) => {
            tracing::warn!(handbook = name, "Table 'data' field is not an object");
            None
        }
    }
}

/// Look one entry up by key
///
/// `None` when the table is absent, malformed, or the key is missing.
pub fn resolve_entry(store: &HandbookStore, table_name: &str, key: &str) -> Option<Value> {
    let table = match store.get(table_name) {
        Some(table) => table,
        None => {
            tracing::warn!(handbook = table_name, "Table is not loaded");
            return None;
        }
    };

    let entry = payload_of(&table, table_name)?.get(key).cloned();
    if entry.is_none() {
        tracing::warn!(handbook = table_name, key = key, "No entry for key");
    }
    entry
}

/// Resolve a referring organization's identity
///
/// Order: the curated override table by exact name first, then the bulk
/// medical-organization registry by token. The override wins because the
/// registry's free-text names are unreliable for these organizations.
pub fn resolve_organization(
    store: &HandbookStore,
    org_name: &str,
    org_token: &str,
) -> Option<OrganizationIdentity> {
    if let Some(identity) = referred_org_overrides().get(org_name) {
        tracing::debug!(org_name = org_name, "Organization resolved via manual override");
        return Some(OrganizationIdentity {
            code: identity.code.chars().take(ORG_CODE_LEN).collect(),
            ..identity.clone()
        });
    }

    let entry = resolve_entry(store, "medical_organizations", org_token)?;
    let first = entry.as_array().and_then(|list| list.first())?;

    let identity = OrganizationIdentity {
        name: first.get("NAM_MOP").and_then(Value::as_str)?.to_string(),
        short_name: first
            .get("NAM_MOK")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        code: stringify(first.get("IDMO")?),
        token: org_token.to_string(),
    };

    tracing::debug!(
        org_name = org_name,
        org_token = org_token,
        code = %identity.code,
        "Organization resolved via registry"
    );
    Some(identity)
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
