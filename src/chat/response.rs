//! Response extraction.
//!
//! Responses are navigated as [`serde_json::Value`] and every node's kind is
//! checked before descending, so a missing candidate or a non-string text
//! node becomes [`Error::Schema`] instead of a panic.

use std::fmt;

use serde_json::{Map, Value};

use crate::error::Error;
use crate::Result;

/// Parse `body` as JSON.
fn parse(body: &str) -> Result<Value> {
    serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))
}

fn object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| Error::Schema(format!("`{}` is not an object", path)))
}

fn field<'a>(value: &'a Value, key: &str, path: &str) -> Result<&'a Value> {
    object(value, path)?
        .get(key)
        .ok_or_else(|| Error::Schema(format!("`{}` has no `{}`", path, key)))
}

fn first<'a>(value: &'a Value, path: &str) -> Result<&'a Value> {
    value
        .as_array()
        .ok_or_else(|| Error::Schema(format!("`{}` is not an array", path)))?
        .first()
        .ok_or_else(|| Error::Schema(format!("`{}` is empty", path)))
}

/// Extract `candidates[0].content.parts[0].text` from a `generateContent`
/// response body.
pub fn extract_text(body: &str) -> Result<String> {
    let root = parse(body)?;

    text_at_path(&root).map_err(|err| match (err, blocked_reason(&root)) {
        (Error::Schema(msg), Some(reason)) => Error::Schema(format!("{} ({})", msg, reason)),
        (err, _) => err,
    })
}

fn text_at_path(root: &Value) -> Result<String> {
    let candidates = field(root, "candidates", "$")?;
    let candidate = first(candidates, "candidates")?;
    let content = field(candidate, "content", "candidates[0]")?;
    let parts = field(content, "parts", "candidates[0].content")?;
    let part = first(parts, "candidates[0].content.parts")?;
    let text = field(part, "text", "candidates[0].content.parts[0]")?;

    text.as_str()
        .map(str::to_owned)
        .ok_or_else(|| Error::Schema("`candidates[0].content.parts[0].text` is not a string".to_string()))
}

/// Why the service returned no text, when it says so.
fn blocked_reason(root: &Value) -> Option<String> {
    if let Some(reason) = root
        .pointer("/promptFeedback/blockReason")
        .and_then(Value::as_str)
    {
        return Some(format!("prompt blocked: {}", reason));
    }

    root.pointer("/candidates/0/finishReason")
        .and_then(Value::as_str)
        .map(|reason| format!("finish reason: {}", reason))
}

/// Kind of a structured output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineType {
    Text,
    Code,
    Quote,
    Heading,
    Subheading,
}

impl LineType {
    pub const ALL: [LineType; 5] = [
        LineType::Text,
        LineType::Code,
        LineType::Quote,
        LineType::Heading,
        LineType::Subheading,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LineType::Text => "text",
            LineType::Code => "code",
            LineType::Quote => "quote",
            LineType::Heading => "heading",
            LineType::Subheading => "subheading",
        }
    }

    /// Unrecognized names read as [`LineType::Text`].
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == name)
            .unwrap_or(LineType::Text)
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One typed line of a structured response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredLine {
    pub line_type: LineType,
    pub content: String,
}

impl StructuredLine {
    fn from_value(value: &Value) -> Self {
        let line_type = value
            .get("lineType")
            .and_then(Value::as_str)
            .map(LineType::from_name)
            .unwrap_or(LineType::Text);

        let content = value
            .get("lineContent")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        Self { line_type, content }
    }
}

/// Lines of a structured response, in array order.
///
/// Elements are converted on demand and [`iter`](Self::iter) can be called
/// any number of times.
#[derive(Debug, Clone)]
pub struct StructuredLines {
    items: Vec<Value>,
}

impl StructuredLines {
    pub fn iter(&self) -> impl Iterator<Item = StructuredLine> + '_ {
        self.items.iter().map(StructuredLine::from_value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Line contents joined with newlines, as kept in the transcript.
    pub fn plain_text(&self) -> String {
        self.iter()
            .map(|line| line.content)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Read the typed lines produced in structured mode.
///
/// `body` is the model's text (the value returned by [`extract_text`]),
/// which must be a JSON array.
pub fn extract_structured_lines(body: &str) -> Result<StructuredLines> {
    match parse(body)? {
        Value::Array(items) => Ok(StructuredLines { items }),
        other => Err(Error::Schema(format!(
            "structured output must be an array, got {}",
            kind(&other)
        ))),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
