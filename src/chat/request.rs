//! Request assembly for `generateContent`.

use serde::Serialize;
use serde_json::{json, Value};

use super::response::LineType;
use crate::Result;

/// Body of a `generateContent` call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestPayload {
    pub contents: Vec<Content>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One content block.
#[derive(Debug, Clone, Serialize)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// One text part.
#[derive(Debug, Clone, Serialize)]
pub struct Part {
    pub text: String,
}

/// Output constraints for structured mode.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_mime_type: String,
    pub response_schema: Value,
}

impl RequestPayload {
    /// The flat prompt text carried by the request.
    pub fn text(&self) -> &str {
        self.contents
            .first()
            .and_then(|c| c.parts.first())
            .map(|p| p.text.as_str())
            .unwrap_or_default()
    }

    pub fn is_structured(&self) -> bool {
        self.generation_config.is_some()
    }

    /// Compact JSON encoding of the payload.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl GenerationConfig {
    /// Array of `{lineType, lineContent}` objects, both fields required.
    pub fn typed_lines() -> Self {
        let line_types: Vec<&str> = LineType::ALL.iter().map(LineType::as_str).collect();

        Self {
            response_mime_type: "application/json".to_string(),
            response_schema: json!({
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "lineType": {
                            "type": "STRING",
                            "enum": line_types
                        },
                        "lineContent": {
                            "type": "STRING"
                        }
                    },
                    "required": ["lineType", "lineContent"],
                    "propertyOrdering": ["lineType", "lineContent"]
                }
            }),
        }
    }
}

/// Builds request payloads in plain or structured mode.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestBuilder {
    structured: bool,
}

impl RequestBuilder {
    pub fn new(structured: bool) -> Self {
        Self { structured }
    }

    /// Prose responses.
    pub fn plain() -> Self {
        Self::new(false)
    }

    /// Typed-line responses; read them with
    /// [`extract_structured_lines`](super::response::extract_structured_lines).
    pub fn structured() -> Self {
        Self::new(true)
    }

    pub fn is_structured(&self) -> bool {
        self.structured
    }

    /// Concatenate `prompt`, `directive` and `history` in that order, with
    /// nothing in between, and wrap the result as the single text part.
    pub fn build_request(&self, prompt: &str, directive: &str, history: &str) -> RequestPayload {
        let mut text = String::with_capacity(prompt.len() + directive.len() + history.len());
        text.push_str(prompt);
        text.push_str(directive);
        text.push_str(history);

        RequestPayload {
            contents: vec![Content {
                parts: vec![Part { text }],
            }],
            generation_config: self.structured.then(GenerationConfig::typed_lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_is_exact_concatenation() {
        let cases = [
            ("hello", "\n\nRULES", "\nuser:hello"),
            ("", "", ""),
            ("quote \" and \\ backslash", "\t", "\nmodel:ünïcödé ✓"),
            ("a", "", "b"),
        ];

        for (prompt, directive, history) in cases {
            let payload = RequestBuilder::plain().build_request(prompt, directive, history);
            let json = payload.to_json().unwrap();
            let parsed: Value = serde_json::from_str(&json).unwrap();

            assert_eq!(
                parsed["contents"][0]["parts"][0]["text"],
                format!("{}{}{}", prompt, directive, history)
            );
        }
    }

    #[test]
    fn test_plain_shape() {
        let payload = RequestBuilder::plain().build_request("p", "d", "h");
        let parsed: Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();

        assert_eq!(parsed, json!({"contents": [{"parts": [{"text": "pdh"}]}]}));
        assert!(!payload.is_structured());
    }

    #[test]
    fn test_empty_prompt_is_still_sent() {
        let payload = RequestBuilder::plain().build_request("", "", "");
        let json = payload.to_json().unwrap();
        assert_eq!(json, r#"{"contents":[{"parts":[{"text":""}]}]}"#);
    }

    #[test]
    fn test_structured_mode_attaches_schema() {
        let payload = RequestBuilder::structured().build_request("p", "d", "h");
        let parsed: Value = serde_json::from_str(&payload.to_json().unwrap()).unwrap();

        let config = &parsed["generationConfig"];
        assert_eq!(config["responseMimeType"], "application/json");

        let schema = &config["responseSchema"];
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(
            schema["items"]["properties"]["lineType"]["enum"],
            json!(["text", "code", "quote", "heading", "subheading"])
        );
        assert_eq!(schema["items"]["properties"]["lineContent"]["type"], "STRING");
        assert_eq!(schema["items"]["required"], json!(["lineType", "lineContent"]));
        assert_eq!(parsed["contents"][0]["parts"][0]["text"], "pdh");
    }
}
