//! Reference-data registry adapter
//!
//! Registries arrive as compressed single-file archives from a government
//! download service. The client downloads one archive, verifies and extracts
//! its single member, parses the JSON document inside, and normalizes it
//! into a lookup mapping according to the registry's catalog descriptor:
//! entries are grouped under the value of the descriptor's key field, each
//! key holding the list of entries that share it.
//!
//! The normalized table is wrapped in an envelope carrying the fetch
//! parameters alongside the `data` payload; the resolver unwraps it.

pub mod catalog;

pub use catalog::{descriptor_for, descriptor_for_storage_key, RegistryDescriptor, CATALOG};

use crate::adapters::http::{FetchError, FetchRequest, HttpExecutor};
use crate::config::RegistryConfig;
use crate::domain::{RegistryError, Result};
use serde_json::{json, Map, Value};
use std::io::{Cursor, Read};
use std::time::Duration;

/// Magic bytes every valid archive starts with
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Client for the registry download service
pub struct RegistryClient {
    config: RegistryConfig,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Self {
        Self { config }
    }

    /// Download and normalize one registry table
    ///
    /// # Errors
    ///
    /// - `RegistryError::UnknownCode` when the code has no catalog descriptor
    /// - `RegistryError::DownloadFailed` on transport/status failure
    /// - `RegistryError::ArchiveInvalid` when the payload is not a single-file archive
    /// - `RegistryError::FormatInvalid` when the document inside does not match the descriptor
    pub async fn fetch_table(&self, http: &HttpExecutor, code: &str) -> Result<Value> {
        let descriptor =
            descriptor_for(code).ok_or_else(|| RegistryError::UnknownCode(code.to_string()))?;

        tracing::info!(code = code, "Downloading registry");

        let url = format!("{}/data/download", self.config.base_url.trim_end_matches('/'));
        let request = FetchRequest::get(url)
            .query("identifier", code)
            .query("format", "json")
            // Registry archives run to tens of megabytes; the regular call
            // timeout is far too tight.
            .timeout(Duration::from_secs(self.config.timeout_seconds));

        let response = http.fetch(&request).await.map_err(classify_fetch_error)?;

        if !response.is_success() {
            return Err(RegistryError::DownloadFailed(format!(
                "registry {code} download returned status {}",
                response.status
            ))
            .into());
        }

        let document = extract_single_file(&response.bytes, code)?;
        let table = normalize(&document, descriptor)?;

        tracing::info!(
            code = code,
            storage_key = descriptor.storage_key,
            "Registry downloaded and normalized"
        );
        Ok(table)
    }
}

fn classify_fetch_error(e: FetchError) -> RegistryError {
    RegistryError::DownloadFailed(e.to_string())
}

/// Extract the single member of the downloaded archive as text
fn extract_single_file(bytes: &[u8], code: &str) -> Result<String> {
    if !bytes.starts_with(ZIP_SIGNATURE) {
        return Err(RegistryError::ArchiveInvalid(format!(
            "registry {code} payload does not carry an archive signature"
        ))
        .into());
    }

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        RegistryError::ArchiveInvalid(format!("registry {code} archive unreadable: {e}"))
    })?;

    if archive.len() != 1 {
        return Err(RegistryError::ArchiveInvalid(format!(
            "registry {code} archive holds {} members, expected exactly one",
            archive.len()
        ))
        .into());
    }

    let mut member = archive.by_index(0).map_err(|e| {
        RegistryError::ArchiveInvalid(format!("registry {code} archive member unreadable: {e}"))
    })?;

    let mut contents = String::new();
    member.read_to_string(&mut contents).map_err(|e| {
        RegistryError::ArchiveInvalid(format!("registry {code} member is not text: {e}"))
    })?;

    Ok(contents)
}

/// Group the document's entry list into a key → entries mapping
fn normalize(document: &str, descriptor: &RegistryDescriptor) -> Result<Value> {
    let parsed: Value = serde_json::from_str(document).map_err(|e| {
        RegistryError::FormatInvalid(format!(
            "registry {} document is not JSON: {e}",
            descriptor.code
        ))
    })?;

    let entries = parsed
        .get(descriptor.root_key)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            RegistryError::FormatInvalid(format!(
                "registry {} document has no '{}' entry list",
                descriptor.code, descriptor.root_key
            ))
        })?;

    let mut data = Map::new();
    let mut keyless = 0usize;

    for entry in entries {
        let key = match entry.get(descriptor.key_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                keyless += 1;
                continue;
            }
        };

        data.entry(key)
            .or_insert_with(|| Value::Array(Vec::new()))
            .as_array_mut()
            .expect("entries are inserted as arrays")
            .push(entry.clone());
    }

    if keyless > 0 {
        tracing::warn!(
            code = descriptor.code,
            key_field = descriptor.key_field,
            skipped = keyless,
            "Entries without a usable key were skipped"
        );
    }

    Ok(json!({
        "code": descriptor.code,
        "key_field": descriptor.key_field,
        "data": Value::Object(data),
    }))
}

/// Test helper for building in-memory registry archives
#[cfg(test)]
pub(crate) mod tests_support {
    use std::io::{Cursor, Write};
    use zip::write::FileOptions;

    pub(crate) fn zip_document(document: &str) -> Vec<u8> {
        let mut buffer = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            writer
                .start_file("registry.json", FileOptions::default())
                .unwrap();
            writer.write_all(document.as_bytes()).unwrap();
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::zip_document;
    use super::*;

    #[test]
    fn test_extract_rejects_non_archive() {
        let err = extract_single_file(b"not a zip", "F002").unwrap_err();
        assert!(err.to_string().contains("signature"));
    }

    #[test]
    fn test_extract_single_member() {
        let bytes = zip_document(r#"{"insCompany": []}"#);
        let document = extract_single_file(&bytes, "F002").unwrap();
        assert_eq!(document, r#"{"insCompany": []}"#);
    }

    #[test]
    fn test_normalize_groups_by_key_field() {
        let descriptor = descriptor_for("F002").unwrap();
        let document = r#"{
            "insCompany": [
                {"nam_smop": "АО МАКС-М", "smocod": "77001", "TF_OKATO": "45000"},
                {"nam_smop": "АО МАКС-М", "smocod": "77002", "TF_OKATO": "45000"},
                {"nam_smop": "СОГАЗ-Мед", "smocod": "78004", "TF_OKATO": "40000"},
                {"smocod": "без имени"}
            ]
        }"#;

        let table = normalize(document, descriptor).unwrap();
        assert_eq!(table["code"], "F002");

        let data = table["data"].as_object().unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data["АО МАКС-М"].as_array().unwrap().len(), 2);
        assert_eq!(data["СОГАЗ-Мед"][0]["smocod"], "78004");
    }

    #[test]
    fn test_normalize_rejects_missing_root_key() {
        let descriptor = descriptor_for("F002").unwrap();
        let err = normalize(r#"{"zap": []}"#, descriptor).unwrap_err();
        assert!(err.to_string().contains("insCompany"));
    }

    #[tokio::test]
    async fn test_fetch_table_roundtrip() {
        let mut server = mockito::Server::new_async().await;
        let body = zip_document(r#"{"zap": [{"IDFRMMP": "1", "FRMMPNAME": "плановая"}]}"#);
        server
            .mock("GET", mockito::Matcher::Regex("/data/download".to_string()))
            .with_status(200)
            .with_header("content-type", "application/zip")
            .with_body(body)
            .create_async()
            .await;

        let client = RegistryClient::new(RegistryConfig {
            base_url: server.url(),
            timeout_seconds: 5,
        });
        let http = HttpExecutor::new(5, true, crate::config::RetryConfig::default()).unwrap();

        let table = client.fetch_table(&http, "V014").await.unwrap();
        assert_eq!(table["data"]["1"][0]["FRMMPNAME"], "плановая");
    }

    #[tokio::test]
    async fn test_fetch_table_unknown_code() {
        let client = RegistryClient::new(RegistryConfig {
            base_url: "http://registry.local".to_string(),
            timeout_seconds: 5,
        });
        let http = HttpExecutor::new(5, true, crate::config::RetryConfig::default()).unwrap();

        let err = client.fetch_table(&http, "F999").await.unwrap_err();
        assert!(err.to_string().contains("F999"));
    }
}
