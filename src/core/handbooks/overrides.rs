//! Manual organization overrides
//!
//! A handful of referring organizations cannot be resolved through the bulk
//! medical-organization registry: their free-text names there are
//! inconsistent or ambiguous. This curated table, keyed by the exact
//! organization name the clinical backend reports, takes precedence over
//! the registry lookup.

use std::collections::HashMap;
use std::sync::OnceLock;

/// Resolved identity of a referring organization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationIdentity {
    pub name: String,
    pub short_name: String,
    pub code: String,
    pub token: String,
}

static OVERRIDES: OnceLock<HashMap<&'static str, OrganizationIdentity>> = OnceLock::new();

/// The curated override table
pub fn referred_org_overrides() -> &'static HashMap<&'static str, OrganizationIdentity> {
    OVERRIDES.get_or_init(|| {
        let mut map = HashMap::new();
        map.insert(
            "ГБУЗ ЛО \"Сосновоборская МБ\"",
            OrganizationIdentity {
                name: "ГБУЗ ЛО \"Сосновоборская межрайонная больница\"".to_string(),
                short_name: "Сосновоборская МБ".to_string(),
                code: "470046000912".to_string(),
                token: "1.2.643.5.1.13.13.12.2.47.4906".to_string(),
            },
        );
        map.insert(
            "ФГБУ \"НМИЦ им. В.А. Алмазова\"",
            OrganizationIdentity {
                name: "ФГБУ \"НМИЦ им. В.А. Алмазова\" Минздрава России".to_string(),
                short_name: "НМИЦ им. В.А. Алмазова".to_string(),
                code: "780086000321".to_string(),
                token: "1.2.643.5.1.13.13.12.2.78.8993".to_string(),
            },
        );
        map.insert(
            "Поликлиника ЦМСЧ-38",
            OrganizationIdentity {
                name: "ФГБУЗ \"Центральная медико-санитарная часть № 38\" ФМБА России".to_string(),
                short_name: "ЦМСЧ-38".to_string(),
                code: "470012000038".to_string(),
                token: "1.2.643.5.1.13.13.12.2.47.5110".to_string(),
            },
        );
        map
    })
}
