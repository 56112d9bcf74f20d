//! Shared fixtures for the integration suites

#![allow(dead_code)]

use hygeia::adapters::http::HttpExecutor;
use hygeia::config::{
    secret_string, AddressServiceConfig, ClinicalConfig, InstitutionConfig, RegistryConfig,
    RetryConfig, SearchConfig,
};
use hygeia::core::handbooks::HandbookStore;
use serde_json::json;

pub fn http() -> HttpExecutor {
    // One attempt: tests assert on exact hit counts.
    let retry = RetryConfig {
        max_retries: 1,
        initial_delay_ms: 1,
        max_delay_ms: 1,
        backoff_multiplier: 1.0,
    };
    HttpExecutor::new(5, true, retry).unwrap()
}

pub fn clinical_config(base_url: &str) -> ClinicalConfig {
    ClinicalConfig {
        base_url: format!("{base_url}/"),
        origin_url: base_url.to_string(),
        referer_url: format!("{base_url}/"),
        login: "adapter".to_string(),
        password: secret_string("secret-pw".to_string()),
        session_payload: secret_string("7|0|4|payload".to_string()),
        session_permutation: "A1B2C3D4".to_string(),
        timeout_seconds: 5,
        tls_verify: true,
        retry: RetryConfig {
            max_retries: 1,
            initial_delay_ms: 1,
            max_delay_ms: 1,
            backoff_multiplier: 1.0,
        },
        search: SearchConfig {
            pay_type_id: "3010101000000048".to_string(),
            okei_id: "100".to_string(),
            lpu_building_id: "3010101000000467".to_string(),
            ksg_year: "2025".to_string(),
            period_start_date: "01.01.2025".to_string(),
            search_type_id: "1".to_string(),
            date_type: "1".to_string(),
            day_hospital_prefixes: vec!["ДС".to_string()],
            inpatient_condition_name: "стационарно".to_string(),
            day_hospital_condition_name: "в дневном стационаре".to_string(),
        },
    }
}

pub fn address_config(base_url: &str) -> AddressServiceConfig {
    AddressServiceConfig {
        token_url: format!("{base_url}/aas/token"),
        api_base_url: format!("{base_url}/api"),
        token_query_template: "template".to_string(),
        timeout_seconds: 5,
    }
}

pub fn registry_config(base_url: &str) -> RegistryConfig {
    RegistryConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 5,
    }
}

pub fn institution() -> InstitutionConfig {
    InstitutionConfig {
        name: "ФГБУЗ \"Центральная медико-санитарная часть № 38\"".to_string(),
        short_name: "ЦМСЧ-38".to_string(),
        code: "470012".to_string(),
        token: "1.2.643.5.1.13.13.12.2.47.5110".to_string(),
    }
}

/// Store preloaded with every table the referral and insurance steps touch
pub fn loaded_handbooks() -> HandbookStore {
    let store = HandbookStore::new();
    store.replace(
        "referred_by",
        json!({
            "1": {"name": "самой медицинской организацией"},
            "2": {"name": "другой медицинской организацией"}
        }),
    );
    store.replace(
        "referred_organizations",
        json!({
            "55": {
                "name": "СПб ГБУЗ \"Городская больница № 40\"",
                "token": "1.2.643.5.1.13.13.12.2.78.1234"
            }
        }),
    );
    store.replace(
        "medical_organizations",
        json!({
            "code": "F032",
            "key_field": "OID_MO",
            "data": {
                "1.2.643.5.1.13.13.12.2.78.1234": [
                    {"NAM_MOP": "СПб ГБУЗ \"Городская больница № 40\"", "NAM_MOK": "ГБ № 40", "IDMO": "780040"}
                ]
            }
        }),
    );
    store.replace(
        "insurance_companies",
        json!({
            "code": "F002",
            "key_field": "nam_smop",
            "data": {
                "АО МАКС-М": [{"smocod": "77001", "TF_OKATO": "45000"}]
            }
        }),
    );
    store.replace(
        "medical_care_conditions",
        json!({
            "code": "V006",
            "key_field": "UMPNAME",
            "data": {
                "стационарно": [{"IDUMP": "1"}],
                "в дневном стационаре": [{"IDUMP": "2"}]
            }
        }),
    );
    store.replace(
        "medical_care_forms",
        json!({
            "code": "V014",
            "key_field": "IDFRMMP",
            "data": {
                "1": [{"FRMMPNAME": "плановая"}],
                "3": [{"FRMMPNAME": "неотложная"}]
            }
        }),
    );
    store
}

/// Seed record as the search step would build it
pub fn seed_record() -> hygeia::domain::HospitalizationRecord {
    let row = search_row();
    hygeia::domain::HospitalizationRecord {
        personal: serde_json::from_value(row.clone()).unwrap(),
        hospitalization: serde_json::from_value(row.clone()).unwrap(),
        insurance: None,
        referral: None,
        service: serde_json::from_value(row).unwrap(),
        operations: Vec::new(),
        diagnoses: Vec::new(),
    }
}

/// One search row for card 2941
pub fn search_row() -> serde_json::Value {
    json!({
        "EvnPS_id": "X",
        "EvnPS_NumCard": "2941",
        "EvnPS_setDate": "12.03.2025",
        "EvnPS_disDate": "21.03.2025",
        "Person_id": "180355",
        "Person_Surname": "Петрова",
        "Person_Firname": "Анна",
        "Person_Secname": "Юрьевна",
        "Person_Birthdate": "17.03.1986",
        "PersonEvn_id": "501220",
        "Server_id": "1",
        "LpuSection_Name": "Хирургическое отделение",
        "Diag_Name": "Острый аппендицит",
        "PayType_Name": "ОМС"
    })
}
