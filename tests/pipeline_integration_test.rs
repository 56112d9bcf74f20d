//! Full record collection against mocked upstreams

mod common;

use common::{
    address_config, clinical_config, http, institution, loaded_handbooks, registry_config,
    search_row,
};
use hygeia::adapters::address::AddressNormalizer;
use hygeia::adapters::clinical::session::Credential;
use hygeia::adapters::registry::RegistryClient;
use hygeia::core::pipeline::{collect_record, generate_referral_id, EnrichmentContext};
use hygeia::domain::EventCriteria;
use mockito::Matcher;
use serde_json::json;
use std::collections::BTreeMap;
use tempfile::TempDir;

fn session() -> Credential {
    let mut tokens = BTreeMap::new();
    tokens.insert("JSESSIONID".to_string(), "abc123".to_string());
    tokens.insert("login".to_string(), "adapter".to_string());
    Credential::from_tokens(tokens)
}

#[tokio::test]
async fn collects_and_enriches_one_record() {
    let mut backend = mockito::Server::new_async().await;
    let mut address = mockito::Server::new_async().await;

    backend
        .mock("POST", Matcher::Regex("c=Search&m=searchData".to_string()))
        .with_status(200)
        .with_header("content-type", "text/html; charset=windows-1251")
        .with_body(json!({"data": [search_row()]}).to_string())
        .expect(1)
        .create_async()
        .await;

    backend
        .mock("POST", Matcher::Regex("c=Common&m=loadPersonData".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "Sex_id": "2",
                "Sex_Name": "Женский",
                "Person_Phone": "+7 900 000-00-00",
                "Person_Snils": "123-456-789 00",
                "Person_Job": "не работает",
                "SocStatus_Name": "Прочие",
                "Person_RAddress": "г. Сосновый Бор, ул. Ленинградская, д. 7",
                "Person_PAddress": "г. Сосновый Бор, ул. Ленинградская, д. 7",
                "Server_pid": "11",
                "OrgSmo_Name": "АО МАКС-М",
                "Polis_Ser": "МС",
                "Polis_Num": "7701234567"
            }])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    backend
        .mock("POST", Matcher::Regex("c=Person&m=getPersonEditWindow".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"PolisType_id": "1"}]).to_string())
        .expect(1)
        .create_async()
        .await;

    backend
        .mock("POST", Matcher::Regex("c=EvnPS&m=loadEvnPSEditForm".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "EvnPS_setDate": "12.03.2025",
                "PrehospDirect_id": "2",
                "Org_did": "55",
                "PrehospType_id": "2"
            }])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    backend
        .mock("POST", Matcher::Regex("c=EvnSection&m=loadEvnSectionGrid".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"LpuSection_Name": "Хирургическое отделение"}]).to_string())
        .expect(1)
        .create_async()
        .await;

    backend
        .mock("POST", Matcher::Regex("c=EvnUsluga&m=loadEvnUslugaGrid".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([
                {"EvnClass_SysNick": "EvnUslugaOper", "Usluga_Name": "Аппендэктомия"},
                {"EvnClass_SysNick": "EvnUslugaPar", "Usluga_Name": "Осмотр"}
            ])
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    // Equal addresses: the address service must see exactly one token call
    // and one search call.
    let token_mock = address
        .mock("GET", Matcher::Regex("/aas/token".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"Token": "t-42"}"#)
        .expect(1)
        .create_async()
        .await;
    let search_mock = address
        .mock("GET", Matcher::Regex("/api/SearchAddressItem".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "full_name": "Ленинградская обл, г Сосновый Бор, ул Ленинградская, д. 7",
                "address_details": {"okato": "41454000000"}
            })
            .to_string(),
        )
        .expect(1)
        .create_async()
        .await;

    let clinical = clinical_config(&backend.url());
    let handbooks = loaded_handbooks();
    let normalizer = AddressNormalizer::new(address_config(&address.url()));
    let registry = RegistryClient::new(registry_config("http://127.0.0.1:1"));
    let institution = institution();
    let http = http();
    let session = session();
    let dir = TempDir::new().unwrap();

    let ctx = EnrichmentContext {
        http: &http,
        session: &session,
        clinical: &clinical,
        institution: &institution,
        handbooks: &handbooks,
        normalizer: &normalizer,
        registry: &registry,
        handbooks_dir: dir.path(),
    };

    let criteria = EventCriteria {
        card_number: "2941".to_string(),
        surname: Some("Петрова".to_string()),
        given_name: None,
        patronymic: None,
        birth_date: None,
    };

    let record = collect_record(&criteria, &ctx).await.unwrap();

    // Seed block, immutable from the search hit
    assert!(record.is_complete());
    assert_eq!(record.hospitalization.id, "X");
    assert_eq!(record.hospitalization.card_number, "2941");
    assert_eq!(record.service.event_id, "X");

    // Demographics
    assert_eq!(record.personal.gender_name.as_deref(), Some("Женский"));
    assert_eq!(record.service.server_pid.as_deref(), Some("11"));

    // Both addresses normalized identically from the single lookup
    let reg = record.personal.registration_address.as_ref().unwrap();
    let actual = record.personal.actual_address.as_ref().unwrap();
    assert_eq!(reg.area_code.as_deref(), Some("41454000000"));
    assert_eq!(reg.full_address, actual.full_address);
    assert_eq!(reg.area_code, actual.area_code);
    token_mock.assert_async().await;
    search_mock.assert_async().await;

    // Insurance: skeleton plus resolved registry codes
    let insurance = record.insurance.as_ref().unwrap();
    assert_eq!(insurance.policy_type_id.as_deref(), Some("1"));
    assert_eq!(insurance.territory_code.as_deref(), Some("45000"));
    assert_eq!(insurance.company_code.as_deref(), Some("77001"));

    // Referral: synthetic id, external organization via registry token,
    // care form remapped 2 -> 3
    let referral = record.referral.as_ref().unwrap();
    assert_eq!(referral.id, generate_referral_id("X"));
    assert_eq!(referral.date.as_deref(), Some("12.03.2025"));
    assert_eq!(
        referral.entity_type_name.as_deref(),
        Some("другой медицинской организацией")
    );
    assert_eq!(referral.org_short_name.as_deref(), Some("ГБ № 40"));
    assert_eq!(referral.org_code.as_deref(), Some("780040"));
    assert_eq!(referral.care_condition_id.as_deref(), Some("1"));
    assert_eq!(referral.care_form_id.as_deref(), Some("3"));
    assert_eq!(referral.care_form_name.as_deref(), Some("неотложная"));

    // Operations filtered from the service grid
    assert_eq!(record.operations.len(), 1);
    assert_eq!(record.operations[0]["Usluga_Name"], "Аппендэктомия");
}

#[tokio::test]
async fn empty_search_is_not_found_and_stops_the_pipeline() {
    let mut backend = mockito::Server::new_async().await;
    backend
        .mock("POST", Matcher::Regex("c=Search&m=searchData".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"data": []}"#)
        .expect(1)
        .create_async()
        .await;
    let person_panel = backend
        .mock("POST", Matcher::Regex("c=Common&m=loadPersonData".to_string()))
        .expect(0)
        .create_async()
        .await;

    let clinical = clinical_config(&backend.url());
    let handbooks = loaded_handbooks();
    let normalizer = AddressNormalizer::new(address_config("http://127.0.0.1:1"));
    let registry = RegistryClient::new(registry_config("http://127.0.0.1:1"));
    let institution = institution();
    let http = http();
    let session = session();
    let dir = TempDir::new().unwrap();

    let ctx = EnrichmentContext {
        http: &http,
        session: &session,
        clinical: &clinical,
        institution: &institution,
        handbooks: &handbooks,
        normalizer: &normalizer,
        registry: &registry,
        handbooks_dir: dir.path(),
    };

    let err = collect_record(&EventCriteria::for_card("9999"), &ctx)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    person_panel.assert_async().await;
}

#[tokio::test]
async fn same_institution_referral_uses_configured_identity() {
    let mut backend = mockito::Server::new_async().await;

    backend
        .mock("POST", Matcher::Regex("c=Search&m=searchData".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({"data": [search_row()]}).to_string())
        .create_async()
        .await;
    backend
        .mock("POST", Matcher::Regex("c=Common&m=loadPersonData".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"Sex_id": "2"}]).to_string())
        .create_async()
        .await;
    backend
        .mock("POST", Matcher::Regex("c=Person&m=getPersonEditWindow".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"PolisType_id": "1"}]).to_string())
        .create_async()
        .await;
    backend
        .mock("POST", Matcher::Regex("c=EvnPS&m=loadEvnPSEditForm".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!([{
                "EvnPS_setDate": "12.03.2025",
                "PrehospDirect_id": "1",
                "PrehospType_id": "1"
            }])
            .to_string(),
        )
        .create_async()
        .await;
    backend
        .mock("POST", Matcher::Regex("c=EvnSection&m=loadEvnSectionGrid".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!([{"LpuSection_Name": "ДС хирургии"}]).to_string())
        .create_async()
        .await;
    backend
        .mock("POST", Matcher::Regex("c=EvnUsluga&m=loadEvnUslugaGrid".to_string()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("[]")
        .create_async()
        .await;

    let clinical = clinical_config(&backend.url());
    let handbooks = loaded_handbooks();
    let normalizer = AddressNormalizer::new(address_config("http://127.0.0.1:1"));
    let registry = RegistryClient::new(registry_config("http://127.0.0.1:1"));
    let institution = institution();
    let http = http();
    let session = session();
    let dir = TempDir::new().unwrap();

    let ctx = EnrichmentContext {
        http: &http,
        session: &session,
        clinical: &clinical,
        institution: &institution,
        handbooks: &handbooks,
        normalizer: &normalizer,
        registry: &registry,
        handbooks_dir: dir.path(),
    };

    let record = collect_record(&EventCriteria::for_card("2941"), &ctx)
        .await
        .unwrap();

    let referral = record.referral.as_ref().unwrap();
    // Referred from inside: the configured identity, no registry lookup.
    assert_eq!(referral.org_short_name.as_deref(), Some("ЦМСЧ-38"));
    assert_eq!(referral.org_code.as_deref(), Some("470012"));
    // Day-hospital department prefix flips the care setting.
    assert_eq!(
        referral.care_condition_name.as_deref(),
        Some("в дневном стационаре")
    );
    assert_eq!(referral.care_condition_id.as_deref(), Some("2"));
    // Care form 1 passes through without remap.
    assert_eq!(referral.care_form_id.as_deref(), Some("1"));
    assert!(record.operations.is_empty());
}
