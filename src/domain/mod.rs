//! Core domain types and models
//!
//! This module contains the domain model of Hygeia: the hospitalization
//! record aggregate, search criteria, and the error hierarchy.

pub mod criteria;
pub mod errors;
pub mod record;
pub mod result;

pub use criteria::{EventCriteria, PatientCriteria};
pub use errors::{AddressError, ClinicalError, HygeiaError, RegistryError};
pub use record::{
    Address, Hospitalization, HospitalizationRecord, Insurance, Personal, Referral, ServiceIds,
};
pub use result::Result;
