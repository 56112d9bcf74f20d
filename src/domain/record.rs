//! Hospitalization record model
//!
//! The aggregate produced by one pipeline run. The blocks deserialize
//! straight from the clinical backend's field vocabulary (`EvnPS_id`,
//! `Person_Surname`, ...) via serde aliases, and serialize under the crate's
//! own snake_case names. Unknown upstream fields are ignored.
//!
//! The backend is loose about scalar types (the same field may arrive as a
//! string or a number between calls), so identifier-ish fields deserialize
//! through a coercing helper.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// One postal address attached to a patient
///
/// `full_address` and `area_code` are either both present (normalization
/// succeeded) or both absent. [`Address::set_normalized`] is the only way
/// to populate them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Free-text address as reported by the backend
    pub source: String,

    /// Canonical address from the normalization service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_address: Option<String>,

    /// Administrative-division code from the normalization service
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area_code: Option<String>,
}

impl Address {
    /// Create an address holding only the backend's free-text value
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            full_address: None,
            area_code: None,
        }
    }

    /// Set both normalization results at once
    pub fn set_normalized(&mut self, full_address: String, area_code: String) {
        self.full_address = Some(full_address);
        self.area_code = Some(area_code);
    }

    /// Whether normalization results are present
    pub fn is_normalized(&self) -> bool {
        self.full_address.is_some() && self.area_code.is_some()
    }
}

/// Patient identity block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Personal {
    /// Patient identifier in the backend
    #[serde(alias = "Person_id", deserialize_with = "stringish")]
    pub id: String,

    #[serde(alias = "Person_Surname")]
    pub surname: String,

    #[serde(alias = "Person_Firname")]
    pub given_name: String,

    #[serde(default, alias = "Person_Secname")]
    pub patronymic: Option<String>,

    /// DD.MM.YYYY, as the backend reports it
    #[serde(alias = "Person_Birthdate")]
    pub birth_date: String,

    #[serde(default, deserialize_with = "opt_stringish")]
    pub gender_id: Option<String>,

    #[serde(default)]
    pub gender_name: Option<String>,

    #[serde(default, alias = "Person_deadDT")]
    pub death_date: Option<String>,

    #[serde(default)]
    pub phone: Option<String>,

    /// National insurance number
    #[serde(default)]
    pub snils: Option<String>,

    #[serde(default)]
    pub job: Option<String>,

    #[serde(default)]
    pub social_status: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_address: Option<Address>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_address: Option<Address>,
}

/// Clinical-episode block
///
/// Sourced verbatim from the initial search hit and treated as immutable
/// afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hospitalization {
    /// Episode identifier in the backend
    #[serde(alias = "EvnPS_id", deserialize_with = "stringish")]
    pub id: String,

    #[serde(alias = "EvnPS_NumCard", deserialize_with = "stringish")]
    pub card_number: String,

    #[serde(alias = "EvnPS_setDate")]
    pub admission_date: String,

    #[serde(default, alias = "EvnPS_disDate")]
    pub discharge_date: Option<String>,

    #[serde(default, alias = "EvnPS_IsTransit", deserialize_with = "opt_stringish")]
    pub is_transit: Option<String>,

    #[serde(default, alias = "LpuSection_Name")]
    pub department: Option<String>,

    #[serde(default, alias = "LpuSectionProfile_Name")]
    pub profile: Option<String>,

    #[serde(default, alias = "Diag_Name")]
    pub diagnosis: Option<String>,

    #[serde(default, alias = "EvnPS_KoikoDni", deserialize_with = "opt_stringish")]
    pub bed_days: Option<String>,

    #[serde(default, alias = "PayType_Name")]
    pub pay_type: Option<String>,

    #[serde(default, alias = "LeaveType_Name")]
    pub discharge_type_name: Option<String>,

    #[serde(default, alias = "LeaveType_Code", deserialize_with = "opt_stringish")]
    pub discharge_type_code: Option<String>,

    #[serde(default, alias = "EvnSection_KSG", deserialize_with = "opt_stringish")]
    pub ksg: Option<String>,

    #[serde(default, alias = "EvnSection_KSGKPG", deserialize_with = "opt_stringish")]
    pub ksg_kpg: Option<String>,

    #[serde(default, alias = "EvnUslugaOperCount", deserialize_with = "opt_stringish")]
    pub operation_count: Option<String>,
}

/// Insurance block, assembled by the demographics step and completed by the
/// reference resolver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Insurance {
    #[serde(default, alias = "OrgSmo_Name")]
    pub company_name: Option<String>,

    #[serde(default, alias = "PolisType_id", deserialize_with = "opt_stringish")]
    pub policy_type_id: Option<String>,

    #[serde(default, alias = "Polis_Ser")]
    pub policy_series: Option<String>,

    #[serde(default, alias = "Polis_Num", deserialize_with = "opt_stringish")]
    pub policy_number: Option<String>,

    /// Insurer territory code, resolved from the insurers registry
    #[serde(default)]
    pub territory_code: Option<String>,

    /// Insurer company code, resolved from the insurers registry
    #[serde(default)]
    pub company_code: Option<String>,
}

/// Referral block
///
/// `id` is synthetic: derived deterministically from the hospitalization id,
/// never taken from upstream, so re-runs produce the same identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Referral {
    pub id: String,

    pub date: Option<String>,

    /// Name of the kind of entity that referred the patient
    pub entity_type_name: Option<String>,

    pub org_name: Option<String>,
    pub org_short_name: Option<String>,
    pub org_code: Option<String>,
    pub org_token: Option<String>,

    pub care_condition_id: Option<String>,
    pub care_condition_name: Option<String>,
    pub care_form_id: Option<String>,
    pub care_form_name: Option<String>,
}

/// Internal correlation identifiers required by later backend calls
///
/// Scratch state, not user-facing; `event_id` always equals
/// `Hospitalization::id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceIds {
    #[serde(alias = "EvnPS_id", deserialize_with = "stringish")]
    pub event_id: String,

    #[serde(alias = "Person_id", deserialize_with = "stringish")]
    pub person_id: String,

    #[serde(alias = "PersonEvn_id", deserialize_with = "stringish")]
    pub person_event_id: String,

    #[serde(alias = "Server_id", deserialize_with = "stringish")]
    pub server_id: String,

    #[serde(default, alias = "Server_pid", deserialize_with = "opt_stringish")]
    pub server_pid: Option<String>,

    #[serde(default, deserialize_with = "opt_stringish")]
    pub policy_type_id: Option<String>,
}

/// The aggregate produced by one collection run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HospitalizationRecord {
    pub personal: Personal,
    pub hospitalization: Hospitalization,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insurance: Option<Insurance>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral: Option<Referral>,

    pub service: ServiceIds,

    /// Raw operation entries, passed through unmodeled
    #[serde(default)]
    pub operations: Vec<Value>,

    /// Raw diagnosis entries, passed through unmodeled
    #[serde(default)]
    pub diagnoses: Vec<Value>,
}

impl HospitalizationRecord {
    /// Whether the mandatory blocks are populated and consistent
    ///
    /// Insurance and referral may legitimately stay absent when enrichment
    /// steps are skipped or soft-miss.
    pub fn is_complete(&self) -> bool {
        !self.hospitalization.id.is_empty()
            && !self.personal.id.is_empty()
            && !self.service.person_id.is_empty()
            && self.service.event_id == self.hospitalization.id
    }
}

/// Accept a string or a number where the backend is inconsistent
fn stringish<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

/// Optional variant of [`stringish`]; treats `null` as absent
fn opt_stringish<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected string, number or null, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn search_row() -> Value {
        json!({
            "EvnPS_id": "7002911",
            "EvnPS_NumCard": "2941",
            "EvnPS_setDate": "12.03.2025",
            "EvnPS_disDate": "21.03.2025",
            "Person_id": 180355,
            "Person_Surname": "Петрова",
            "Person_Firname": "Анна",
            "Person_Secname": "Юрьевна",
            "Person_Birthdate": "17.03.1986",
            "PersonEvn_id": "501220",
            "Server_id": "1",
            "LpuSection_Name": "Хирургическое отделение",
            "Diag_Name": "Острый аппендицит",
            "EvnPS_KoikoDni": 9,
            "PayType_Name": "ОМС",
            "UnknownUpstreamField": "ignored"
        })
    }

    #[test]
    fn test_blocks_deserialize_from_backend_vocabulary() {
        let row = search_row();

        let personal: Personal = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(personal.id, "180355");
        assert_eq!(personal.surname, "Петрова");
        assert_eq!(personal.patronymic.as_deref(), Some("Юрьевна"));

        let hosp: Hospitalization = serde_json::from_value(row.clone()).unwrap();
        assert_eq!(hosp.id, "7002911");
        assert_eq!(hosp.card_number, "2941");
        assert_eq!(hosp.bed_days.as_deref(), Some("9"));

        let service: ServiceIds = serde_json::from_value(row).unwrap();
        assert_eq!(service.event_id, "7002911");
        assert_eq!(service.person_id, "180355");
        assert_eq!(service.server_id, "1");
        assert!(service.server_pid.is_none());
    }

    #[test]
    fn test_record_completeness() {
        let row = search_row();
        let record = HospitalizationRecord {
            personal: serde_json::from_value(row.clone()).unwrap(),
            hospitalization: serde_json::from_value(row.clone()).unwrap(),
            insurance: None,
            referral: None,
            service: serde_json::from_value(row).unwrap(),
            operations: Vec::new(),
            diagnoses: Vec::new(),
        };
        assert!(record.is_complete());

        let mut broken = record;
        broken.service.event_id = "other".to_string();
        assert!(!broken.is_complete());
    }

    #[test]
    fn test_address_normalization_pairing() {
        let mut addr = Address::new("г. Москва, ул. Ленина, д. 1");
        assert!(!addr.is_normalized());

        addr.set_normalized("г Москва, ул Ленина, д. 1".to_string(), "45286560000".to_string());
        assert!(addr.is_normalized());
        assert_eq!(addr.area_code.as_deref(), Some("45286560000"));
    }

    #[test]
    fn test_insurance_skeleton_from_person_payload() {
        let payload = json!({
            "OrgSmo_Name": "АО МАКС-М",
            "Polis_Ser": "МС",
            "Polis_Num": 7701234567_i64
        });
        let insurance: Insurance = serde_json::from_value(payload).unwrap();
        assert_eq!(insurance.company_name.as_deref(), Some("АО МАКС-М"));
        assert_eq!(insurance.policy_number.as_deref(), Some("7701234567"));
        assert!(insurance.territory_code.is_none());
    }
}
