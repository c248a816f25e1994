//! Gemini `generateContent` transport (API key authentication).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::auth::ApiKey;
use crate::config::Config;
use crate::error::Error;
use crate::Result;

use super::super::request::RequestPayload;
use super::Transport;

/// Gemini API client using API key authentication.
#[derive(Clone)]
pub struct GeminiTransport {
    url: Url,
    model: String,
    client: Client,
}

impl std::fmt::Debug for GeminiTransport {
    // the URL carries the key
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiTransport")
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl GeminiTransport {
    /// Create a transport for `config.model` at `config.endpoint`.
    ///
    /// Fails when the endpoint is not a valid URL or the HTTP client cannot
    /// be initialized.
    pub fn new(api_key: &ApiKey, config: &Config) -> Result<Self> {
        let url = build_url(&config.endpoint, &config.model, api_key)?;

        let mut builder = Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder.build()?;

        Ok(Self {
            url,
            model: config.model.clone(),
            client,
        })
    }
}

/// `{endpoint}/{model}:generateContent?key={key}`
fn build_url(endpoint: &str, model: &str, api_key: &ApiKey) -> Result<Url> {
    let raw = format!("{}/{}:generateContent", endpoint.trim_end_matches('/'), model);
    let mut url = Url::parse(&raw)
        .map_err(|e| Error::Config(format!("Invalid endpoint {:?}: {}", endpoint, e)))?;
    url.query_pairs_mut().append_pair("key", api_key.expose());
    Ok(url)
}

/// reqwest errors quote the request URL, which carries the key.
fn redact(err: reqwest::Error) -> Error {
    Error::Http(err.without_url())
}

#[async_trait]
impl Transport for GeminiTransport {
    async fn send(&self, payload: &RequestPayload) -> Result<String> {
        debug!(
            model = %self.model,
            prompt_chars = payload.text().len(),
            structured = payload.is_structured(),
            "Sending generateContent request"
        );

        // `.json()` sets Content-Type: application/json
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        let body = response.text().await.map_err(redact)?;

        if !status.is_success() {
            return Err(Error::Transport {
                status: status.as_u16(),
                body,
            });
        }

        debug!(status = status.as_u16(), body_chars = body.len(), "Received response");
        Ok(body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url() {
        let key = ApiKey::new("abc123");
        let url = build_url(crate::config::GEMINI_API_URL, "gemini-2.5-flash-lite", &key).unwrap();
        assert_eq!(
            url.as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash-lite:generateContent?key=abc123"
        );
    }

    #[test]
    fn test_build_url_encodes_key_and_trims_slash() {
        let key = ApiKey::new("a&b=c");
        let url = build_url("http://localhost:8080/v1beta/models/", "m", &key).unwrap();
        assert_eq!(url.path(), "/v1beta/models/m:generateContent");
        assert_eq!(url.query(), Some("key=a%26b%3Dc"));
    }

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let key = ApiKey::new("k");
        assert!(matches!(build_url("not a url", "m", &key), Err(Error::Config(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let config = Config::default();
        let transport = GeminiTransport::new(&ApiKey::new("secret-key"), &config).unwrap();
        let debug = format!("{:?}", transport);
        assert!(!debug.contains("secret-key"));
        assert_eq!(transport.model(), config.model);
    }

    #[tokio::test]
    async fn test_connection_failure_is_recoverable() {
        let config = Config {
            endpoint: "http://127.0.0.1:9/v1beta/models".to_string(),
            request_timeout_secs: Some(5),
            ..Config::default()
        };
        let transport = GeminiTransport::new(&ApiKey::new("k"), &config).unwrap();
        let payload = crate::chat::RequestBuilder::plain().build_request("hi", "", "");

        let err = transport.send(&payload).await.unwrap_err();
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_connection_failure_does_not_reveal_key() {
        let config = Config {
            endpoint: "http://127.0.0.1:9/v1beta/models".to_string(),
            request_timeout_secs: Some(5),
            ..Config::default()
        };
        let transport = GeminiTransport::new(&ApiKey::new("SECRETKEY123"), &config).unwrap();
        let payload = crate::chat::RequestBuilder::plain().build_request("hi", "", "");

        let err = transport.send(&payload).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
        assert!(!err.to_string().contains("SECRETKEY123"));
        assert!(!format!("{:?}", err).contains("SECRETKEY123"));
    }
}
