//! Session credential lifecycle
//!
//! The backend authenticates with a set of named cookies acquired through a
//! three-step protocol. The credential behaves like a cache with a liveness
//! check: load the persisted artifact, probe it, and either reuse it or
//! replace it wholesale — a credential is never patched in place.
//!
//! The lifecycle is an explicit state machine (`Absent → Loaded →
//! Validated | Invalid`); re-acquisition runs all three steps or fails as a
//! unit, and nothing partial is ever persisted or returned.
//!
//! The credential is obtained once per request and not re-validated
//! mid-pipeline; if the backend expires it between steps, later calls
//! surface as invalid-response errors. Known limitation: callers restart
//! with a fresh credential.

use crate::adapters::clinical::{classify_fetch_error, rpc_request};
use crate::adapters::http::{FetchRequest, HttpExecutor};
use crate::config::ClinicalConfig;
use crate::domain::{ClinicalError, HygeiaError, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Cookie name carrying the authenticated principal
const PRINCIPAL_TOKEN: &str = "login";

/// Literal the login step must return for the backend to count it a success
const LOGIN_SUCCESS_MARKER: &str = "true";

/// The multi-token session artifact
///
/// An opaque mapping of cookie names to values plus the principal marker.
/// Treated as a value: replaced as a whole, never partially updated by
/// callers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential {
    tokens: BTreeMap<String, String>,
}

impl Credential {
    pub fn from_tokens(tokens: BTreeMap<String, String>) -> Self {
        Self { tokens }
    }

    /// Cookie map sent with every authenticated call
    pub fn tokens(&self) -> &BTreeMap<String, String> {
        &self.tokens
    }

    /// The authenticated principal, when the login step has run
    pub fn principal(&self) -> Option<&str> {
        self.tokens.get(PRINCIPAL_TOKEN).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn absorb(&mut self, cookies: BTreeMap<String, String>) {
        self.tokens.extend(cookies);
    }

    fn mark_principal(&mut self, login: &str) {
        self.tokens
            .insert(PRINCIPAL_TOKEN.to_string(), login.to_string());
    }
}

/// Lifecycle states of the credential cache
///
/// `Absent → Loaded → (Validated | Invalid)`; `Absent` and `Invalid` both
/// lead into full re-acquisition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    /// Nothing persisted
    Absent,
    /// Persisted artifact read back, not yet probed
    Loaded(Credential),
    /// Probe succeeded; safe to reuse
    Validated(Credential),
    /// Probe failed; the artifact must be replaced
    Invalid,
}

/// Durable storage for the session artifact
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Read the persisted credential; `None` when absent or unreadable
    async fn load(&self) -> Result<Option<Credential>>;

    /// Overwrite the persisted credential
    async fn save(&self, credential: &Credential) -> Result<()>;
}

/// Flat-JSON-file credential storage
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn load(&self) -> Result<Option<Credential>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "No persisted credential found");
                return Ok(None);
            }
            Err(e) => {
                return Err(HygeiaError::Persistence(format!(
                    "Failed to read credential file {}: {e}",
                    self.path.display()
                )))
            }
        };

        match serde_json::from_str::<Credential>(&contents) {
            Ok(credential) if !credential.is_empty() => Ok(Some(credential)),
            Ok(_) => {
                tracing::warn!(path = %self.path.display(), "Persisted credential is empty");
                Ok(None)
            }
            Err(e) => {
                // A corrupt file is the same as no file: re-acquisition replaces it.
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Persisted credential is unreadable, treating as absent"
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                HygeiaError::Persistence(format!(
                    "Failed to create credential directory {}: {e}",
                    parent.display()
                ))
            })?;
        }

        let contents = serde_json::to_string(credential)
            .map_err(|e| HygeiaError::Persistence(format!("Failed to encode credential: {e}")))?;

        tokio::fs::write(&self.path, contents).await.map_err(|e| {
            HygeiaError::Persistence(format!(
                "Failed to write credential file {}: {e}",
                self.path.display()
            ))
        })?;

        tracing::info!(path = %self.path.display(), "Credential persisted");
        Ok(())
    }
}

/// Keeps the pipeline authenticated against the clinical backend
pub struct SessionManager<S: CredentialStore> {
    config: ClinicalConfig,
    store: S,
}

impl<S: CredentialStore> SessionManager<S> {
    pub fn new(config: ClinicalConfig, store: S) -> Self {
        Self { config, store }
    }

    /// Produce a credential that passed a liveness probe this call
    ///
    /// Loads the persisted credential and probes it; on any probe failure a
    /// fresh credential is acquired through the full three-step protocol and
    /// persisted. The stale artifact is never returned.
    ///
    /// # Errors
    ///
    /// `ClinicalError::AuthenticationFailed` when any acquisition step fails;
    /// `HygeiaError::Persistence` when the new credential cannot be saved.
    pub async fn ensure_valid_session(&self, http: &HttpExecutor) -> Result<Credential> {
        let state = match self.store.load().await? {
            Some(credential) => CredentialState::Loaded(credential),
            None => CredentialState::Absent,
        };

        let state = match state {
            CredentialState::Loaded(credential) => {
                if self.probe(http, &credential).await {
                    CredentialState::Validated(credential)
                } else {
                    tracing::info!("Persisted credential failed the liveness probe");
                    CredentialState::Invalid
                }
            }
            other => other,
        };

        match state {
            CredentialState::Validated(credential) => {
                tracing::info!("Persisted credential is valid");
                Ok(credential)
            }
            CredentialState::Absent | CredentialState::Invalid => {
                tracing::info!("Acquiring a new credential");
                let credential = self.acquire(http).await?;
                self.store.save(&credential).await?;
                Ok(credential)
            }
            CredentialState::Loaded(_) => unreachable!("probe always resolves a loaded credential"),
        }
    }

    /// Lightweight authenticated probe
    ///
    /// Success is HTTP 200 plus a parseable, non-empty JSON body. Any other
    /// outcome counts as invalid; the probe is not repeated.
    async fn probe(&self, http: &HttpExecutor, credential: &Credential) -> bool {
        let request = rpc_request(&self.config, "Common", "getCurrentDateTime")
            .cookies(credential.tokens())
            .form_field("is_activerules", "true");

        match http.fetch(&request).await {
            Ok(response) => {
                response.status == 200
                    && response.json.as_ref().is_some_and(|json| !json.is_null())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Credential probe did not reach the backend");
                false
            }
        }
    }

    /// Acquire a fresh credential via the three-step protocol
    ///
    /// Each step depends on tokens from the previous one; any failure aborts
    /// the whole acquisition.
    async fn acquire(&self, http: &HttpExecutor) -> Result<Credential> {
        let mut credential = Credential::default();

        // Step 1: unauthenticated entry call for the initial token set
        let request = FetchRequest::get(&self.config.base_url)
            .query("c", "portal")
            .query("m", "promed")
            .query("from", "promed");
        let response = http.fetch(&request).await.map_err(classify_fetch_error)?;
        credential.absorb(response.set_cookies);
        tracing::debug!(tokens = credential.tokens().len(), "Initial session tokens received");

        // Step 2: login with the configured principal
        let password: &str = self.config.password.expose_secret().as_ref();
        let request = rpc_request(&self.config, "main", "index")
            .query("method", "Logon")
            .cookies(credential.tokens())
            .form_field("login", &self.config.login)
            .form_field("psw", password);
        let response = http.fetch(&request).await.map_err(classify_fetch_error)?;

        if response.status != 200 || !response.text.contains(LOGIN_SUCCESS_MARKER) {
            return Err(ClinicalError::AuthenticationFailed(format!(
                "login rejected (status {})",
                response.status
            ))
            .into());
        }
        credential.mark_principal(&self.config.login);
        tracing::info!(principal = %self.config.login, "Backend login accepted");

        // Step 3: protocol-specific dispatch call completing the token set
        let payload: &str = self.config.session_payload.expose_secret().as_ref();
        let request = FetchRequest::post(self.dispatch_url())
            .header("Content-Type", "text/x-gwt-rpc; charset=utf-8")
            .header("X-Gwt-Permutation", &self.config.session_permutation)
            .header("X-Gwt-Module-Base", self.module_base())
            .cookies(credential.tokens())
            .raw_body(payload);
        let response = http.fetch(&request).await.map_err(classify_fetch_error)?;

        if response.status != 200 {
            return Err(ClinicalError::AuthenticationFailed(format!(
                "session completion call failed (status {})",
                response.status
            ))
            .into());
        }
        credential.absorb(response.set_cookies);
        tracing::info!("Session credential acquired");

        Ok(credential)
    }

    fn dispatch_url(&self) -> String {
        resolve_endpoint(&self.config.base_url, "ermp/servlets/dispatch.servlet")
    }

    fn module_base(&self) -> String {
        resolve_endpoint(&self.config.base_url, "ermp/")
    }
}

/// Resolve a path relative to the backend base URL
fn resolve_endpoint(base_url: &str, path: &str) -> String {
    url::Url::parse(base_url)
        .and_then(|base| base.join(path))
        .map(String::from)
        .unwrap_or_else(|_| format!("{}/{path}", base_url.trim_end_matches('/')))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn credential_with(tokens: &[(&str, &str)]) -> Credential {
        Credential::from_tokens(
            tokens
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_principal_marker() {
        let mut credential = credential_with(&[("JSESSIONID", "abc")]);
        assert!(credential.principal().is_none());

        credential.mark_principal("adapter");
        assert_eq!(credential.principal(), Some("adapter"));
    }

    #[test]
    fn test_absorb_overwrites_existing_tokens() {
        let mut credential = credential_with(&[("JSESSIONID", "old")]);
        let mut incoming = BTreeMap::new();
        incoming.insert("JSESSIONID".to_string(), "new".to_string());
        incoming.insert("io".to_string(), "xyz".to_string());

        credential.absorb(incoming);
        assert_eq!(credential.tokens().get("JSESSIONID").unwrap(), "new");
        assert_eq!(credential.tokens().len(), 2);
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested/credential.json"));

        assert!(store.load().await.unwrap().is_none());

        let credential = credential_with(&[("JSESSIONID", "abc"), ("login", "adapter")]);
        store.save(&credential).await.unwrap();

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded, credential);
    }

    #[tokio::test]
    async fn test_file_store_treats_corrupt_file_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");
        tokio::fs::write(&path, "{not json").await.unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.load().await.unwrap().is_none());
    }

    #[test]
    fn test_endpoint_resolution() {
        assert_eq!(
            resolve_endpoint("https://backend.local/", "ermp/servlets/dispatch.servlet"),
            "https://backend.local/ermp/servlets/dispatch.servlet"
        );
        assert_eq!(
            resolve_endpoint("https://backend.local", "ermp/"),
            "https://backend.local/ermp/"
        );
    }

    #[tokio::test]
    async fn test_file_store_treats_empty_map_as_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credential.json");
        tokio::fs::write(&path, "{}").await.unwrap();

        let store = FileCredentialStore::new(&path);
        assert!(store.load().await.unwrap().is_none());
    }
}
