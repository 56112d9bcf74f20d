//! Address-normalization service client
//!
//! Two-call protocol: an unauthenticated GET obtains a short-lived access
//! token, then a search GET carries the token in a `master-token` header and
//! the free-text address as a query parameter.
//!
//! Many real addresses simply do not resolve; a 404, any non-200, or a
//! missing nested field in an otherwise fine response is an expected miss
//! (`Ok(None)`), logged at warning level. Only the token protocol failing is
//! an error — without a token nothing can be normalized at all.

use crate::adapters::http::{FetchError, FetchRequest, HttpExecutor};
use crate::config::AddressServiceConfig;
use crate::domain::{AddressError, Result};
use serde_json::Value;

/// Canonical result of one normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedAddress {
    pub full_address: String,
    pub area_code: String,
}

/// Client for the address-normalization service
pub struct AddressNormalizer {
    config: AddressServiceConfig,
}

impl AddressNormalizer {
    pub fn new(config: AddressServiceConfig) -> Self {
        Self { config }
    }

    /// Normalize one free-text address
    ///
    /// Empty or whitespace-only input short-circuits to `None` without any
    /// network call.
    ///
    /// # Errors
    ///
    /// `AddressError::TokenUnavailable` when the token endpoint does not
    /// yield a usable token; transport failures as
    /// `AddressError::ConnectionFailed`. An unresolvable address is *not* an
    /// error.
    pub async fn normalize(
        &self,
        http: &HttpExecutor,
        address_text: &str,
    ) -> Result<Option<NormalizedAddress>> {
        let address_text = address_text.trim();
        if address_text.is_empty() {
            tracing::debug!("Empty address, skipping normalization");
            return Ok(None);
        }

        let token = self.fetch_token(http).await?;
        self.search(http, &token, address_text).await
    }

    /// Obtain the service access token
    async fn fetch_token(&self, http: &HttpExecutor) -> Result<String> {
        let request = FetchRequest::get(&self.config.token_url)
            .query("url", &self.config.token_query_template);

        let response = http.fetch(&request).await.map_err(classify_fetch_error)?;

        if !response.is_success() {
            return Err(AddressError::TokenUnavailable(format!(
                "token endpoint returned status {}",
                response.status
            ))
            .into());
        }

        match response.json.as_ref().and_then(|json| json.get("Token")) {
            Some(Value::String(token)) if !token.is_empty() => Ok(token.clone()),
            Some(other) => {
                tracing::error!(token = %other, "Token field is not a usable string");
                Err(AddressError::TokenUnavailable("token field is not a non-empty string".to_string()).into())
            }
            None => {
                tracing::error!(body = response.text_preview(), "Token field missing from response");
                Err(AddressError::TokenUnavailable("token field missing from response".to_string()).into())
            }
        }
    }

    /// Query the search endpoint for one address
    async fn search(
        &self,
        http: &HttpExecutor,
        token: &str,
        address_text: &str,
    ) -> Result<Option<NormalizedAddress>> {
        let url = format!(
            "{}/SearchAddressItem",
            self.config.api_base_url.trim_end_matches('/')
        );
        let request = FetchRequest::get(url)
            .header("accept", "application/json")
            .header("master-token", token)
            .query("search_string", address_text)
            .query("address_type", "1");

        let response = http.fetch(&request).await.map_err(classify_fetch_error)?;

        if response.status != 200 {
            tracing::warn!(
                status = response.status,
                address = preview(address_text),
                "Address did not resolve"
            );
            return Ok(None);
        }

        let Some(json) = response.json.as_ref() else {
            tracing::warn!(address = preview(address_text), "Address response is not JSON");
            return Ok(None);
        };

        let area_code = json
            .get("address_details")
            .and_then(|details| details.get("okato"))
            .map(|code| match code {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        let full_address = json.get("full_name").and_then(Value::as_str);

        match (full_address, area_code) {
            (Some(full_address), Some(area_code)) => Ok(Some(NormalizedAddress {
                full_address: full_address.to_string(),
                area_code,
            })),
            _ => {
                tracing::warn!(
                    address = preview(address_text),
                    body = response.text_preview(),
                    "Address response is missing the expected nested fields"
                );
                Ok(None)
            }
        }
    }
}

fn classify_fetch_error(e: FetchError) -> AddressError {
    AddressError::ConnectionFailed(e.to_string())
}

/// Bounded address excerpt for logs
fn preview(address: &str) -> &str {
    match address.char_indices().nth(60) {
        Some((idx, _)) => &address[..idx],
        None => address,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetryConfig;

    fn executor() -> HttpExecutor {
        HttpExecutor::new(5, true, RetryConfig::default()).unwrap()
    }

    fn normalizer(server_url: &str) -> AddressNormalizer {
        AddressNormalizer::new(AddressServiceConfig {
            token_url: format!("{server_url}/token"),
            api_base_url: format!("{server_url}/api"),
            token_query_template: "template".to_string(),
            timeout_seconds: 5,
        })
    }

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        // No server at all: an empty address must not reach the network.
        let normalizer = normalizer("http://127.0.0.1:1");
        let result = normalizer.normalize(&executor(), "   ").await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let token_mock = server
            .mock("GET", mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Token": ""}"#)
            .create_async()
            .await;

        let normalizer = normalizer(&server.url());
        let err = normalizer
            .normalize(&executor(), "г. Москва")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("token"));
        token_mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_unresolvable_address_is_a_miss() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex("/token".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Token": "t-123"}"#)
            .create_async()
            .await;
        server
            .mock("GET", mockito::Matcher::Regex("/api/SearchAddressItem".to_string()))
            .with_status(404)
            .create_async()
            .await;

        let normalizer = normalizer(&server.url());
        let result = normalizer
            .normalize(&executor(), "несуществующий адрес")
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_successful_normalization() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", mockito::Matcher::Regex("/token".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Token": "t-123"}"#)
            .create_async()
            .await;
        server
            .mock("GET", mockito::Matcher::Regex("/api/SearchAddressItem".to_string()))
            .match_header("master-token", "t-123")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"full_name": "г Москва, ул Ленина, д. 1", "address_details": {"okato": "45286560000"}}"#)
            .create_async()
            .await;

        let normalizer = normalizer(&server.url());
        let result = normalizer
            .normalize(&executor(), "Москва Ленина 1")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(result.full_address, "г Москва, ул Ленина, д. 1");
        assert_eq!(result.area_code, "45286560000");
    }
}
