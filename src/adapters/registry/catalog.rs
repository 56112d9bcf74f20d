//! Registry catalog descriptors
//!
//! Each downloadable registry is described by its code plus the keys needed
//! to normalize the downloaded payload: which root field holds the entry
//! list, which entry field becomes the lookup key, and where the table lives
//! locally and in the in-memory store.

/// Descriptor for one downloadable registry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryDescriptor {
    /// Registry code at the download service
    pub code: &'static str,
    /// Field of the downloaded document holding the entry list
    pub root_key: &'static str,
    /// Entry field used as the lookup key
    pub key_field: &'static str,
    /// Key the table is stored under in the in-memory store
    pub storage_key: &'static str,
}

/// All registries this adapter knows how to download
pub const CATALOG: &[RegistryDescriptor] = &[
    // Insurance companies
    RegistryDescriptor {
        code: "F002",
        root_key: "insCompany",
        key_field: "nam_smop",
        storage_key: "insurance_companies",
    },
    // Medical organizations
    RegistryDescriptor {
        code: "F032",
        root_key: "zap",
        key_field: "OID_MO",
        storage_key: "medical_organizations",
    },
    // Care profiles
    RegistryDescriptor {
        code: "V002",
        root_key: "zap",
        key_field: "PRNAME",
        storage_key: "medical_care_profiles",
    },
    // Gender classifier
    RegistryDescriptor {
        code: "V005",
        root_key: "zap",
        key_field: "POLNAME",
        storage_key: "gender",
    },
    // Care conditions (inpatient / day hospital / ...)
    RegistryDescriptor {
        code: "V006",
        root_key: "zap",
        key_field: "UMPNAME",
        storage_key: "medical_care_conditions",
    },
    // Care forms (planned / emergency / urgent)
    RegistryDescriptor {
        code: "V014",
        root_key: "zap",
        key_field: "IDFRMMP",
        storage_key: "medical_care_forms",
    },
];

/// Look a descriptor up by registry code
pub fn descriptor_for(code: &str) -> Option<&'static RegistryDescriptor> {
    CATALOG.iter().find(|descriptor| descriptor.code == code)
}

/// Look a descriptor up by its in-memory storage key
pub fn descriptor_for_storage_key(storage_key: &str) -> Option<&'static RegistryDescriptor> {
    CATALOG
        .iter()
        .find(|descriptor| descriptor.storage_key == storage_key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_lookup() {
        let insurers = descriptor_for("F002").unwrap();
        assert_eq!(insurers.storage_key, "insurance_companies");
        assert_eq!(insurers.key_field, "nam_smop");

        assert!(descriptor_for("F999").is_none());
    }

    #[test]
    fn test_storage_key_lookup() {
        let forms = descriptor_for_storage_key("medical_care_forms").unwrap();
        assert_eq!(forms.code, "V014");
    }

    #[test]
    fn test_catalog_keys_are_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            for b in &CATALOG[i + 1..] {
                assert_ne!(a.code, b.code);
                assert_ne!(a.storage_key, b.storage_key);
            }
        }
    }
}
