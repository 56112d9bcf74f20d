//! Search criteria value objects
//!
//! Inputs arrive pre-validated from the caller (route/CLI layer); these
//! types only carry them into the adapters.

use serde::{Deserialize, Serialize};

/// Criteria for locating one hospitalization episode
///
/// The card number is mandatory; name fields narrow the search when the
/// backend holds several episodes under the same card number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCriteria {
    pub card_number: String,

    #[serde(default)]
    pub surname: Option<String>,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub patronymic: Option<String>,

    /// DD.MM.YYYY
    #[serde(default)]
    pub birth_date: Option<String>,
}

impl EventCriteria {
    /// Criteria with only a card number
    pub fn for_card(card_number: impl Into<String>) -> Self {
        Self {
            card_number: card_number.into(),
            surname: None,
            given_name: None,
            patronymic: None,
            birth_date: None,
        }
    }
}

/// Criteria for listing a patient's hospitalizations by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientCriteria {
    pub surname: String,

    #[serde(default)]
    pub given_name: Option<String>,

    #[serde(default)]
    pub patronymic: Option<String>,

    /// DD.MM.YYYY
    #[serde(default)]
    pub birth_date: Option<String>,
}
