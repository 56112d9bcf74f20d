//! Clinical backend adapter
//!
//! Everything that talks to the hospital information system: the cookie
//! session lifecycle, the hospitalization search, and the per-call request
//! builders the enrichment pipeline uses.
//!
//! The backend exposes an RPC-style dispatch: every call goes to the same
//! base URL and is selected by a `(c, m)` query-parameter pair, with
//! form-encoded bodies and fixed Origin/Referer headers.

pub mod calls;
pub mod search;
pub mod session;

pub use session::{Credential, CredentialState, CredentialStore, FileCredentialStore, SessionManager};

use crate::adapters::http::{FetchError, FetchRequest};
use crate::config::ClinicalConfig;
use crate::domain::ClinicalError;

/// Translate a transport failure into the clinical domain
pub(crate) fn classify_fetch_error(e: FetchError) -> ClinicalError {
    match e {
        FetchError::Timeout(message) => ClinicalError::Timeout(message),
        FetchError::Transport(message) | FetchError::InvalidRequest(message) => {
            ClinicalError::ConnectionFailed(message)
        }
    }
}

/// Base request for one `(controller, method)` dispatch call
pub(crate) fn rpc_request(config: &ClinicalConfig, controller: &str, method: &str) -> FetchRequest {
    FetchRequest::post(&config.base_url)
        .query("c", controller)
        .query("m", method)
        .header("Origin", &config.origin_url)
        .header("Referer", &config.referer_url)
}
