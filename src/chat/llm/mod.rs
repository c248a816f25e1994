//! Transport abstraction for the remote model.
//!
//! This module provides:
//! - [`Transport`] trait, the only seam between the chat loop and the network
//! - [`GeminiTransport`], the `generateContent` client over `reqwest`
//!
//! Transports return the raw response body. Extraction is left to
//! [`crate::chat::response`] so that malformed bodies are classified the same
//! way regardless of where they came from.

use async_trait::async_trait;

use crate::Result;

use super::request::RequestPayload;

pub mod gemini;

pub use gemini::GeminiTransport;

/// Sends one request and returns the response body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `payload` and wait for the complete response body.
    ///
    /// Non-success statuses are errors.
    async fn send(&self, payload: &RequestPayload) -> Result<String>;

    /// Model the requests are addressed to.
    fn model(&self) -> &str;
}

/// Scripted transport for testing.
#[cfg(test)]
pub struct FakeTransport {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String>>>,
    requests: std::sync::Mutex<Vec<RequestPayload>>,
}

#[cfg(test)]
impl FakeTransport {
    /// Create with predefined outcomes, returned in order.
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create with bodies that each carry `text` at the usual path.
    pub fn with_texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(Self::body_for(t))).collect())
    }

    /// A well-formed `generateContent` body holding `text`.
    pub fn body_for(text: &str) -> String {
        serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": text}], "role": "model"}}]
        })
        .to_string()
    }

    /// Payloads received so far.
    pub fn requests(&self) -> Vec<RequestPayload> {
        self.requests.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Transport for FakeTransport {
    async fn send(&self, payload: &RequestPayload) -> Result<String> {
        self.requests.lock().unwrap().push(payload.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(crate::error::Error::Parse("No more fake responses".to_string())))
    }

    fn model(&self) -> &str {
        "fake-model"
    }
}
