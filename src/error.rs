//! Error types for AskAI

use thiserror::Error;

/// Result type alias for AskAI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in AskAI
#[derive(Error, Debug)]
pub enum Error {
    #[error("API key not available: {0}")]
    MissingKey(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Gemini API error ({status}): {body}")]
    Transport { status: u16, body: String },

    #[error("Response is not valid JSON: {0}")]
    Parse(String),

    #[error("Unexpected response shape: {0}")]
    Schema(String),

    #[error("Out of memory while growing conversation history")]
    Allocation,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// Whether a chat turn that failed with this error may be followed by
    /// another turn. Anything else ends the session.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Transport { .. } | Error::Http(_) | Error::Parse(_) | Error::Schema(_)
        )
    }
}

impl From<std::collections::TryReserveError> for Error {
    fn from(_: std::collections::TryReserveError) -> Self {
        Error::Allocation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(Error::Parse("x".into()).is_recoverable());
        assert!(Error::Schema("x".into()).is_recoverable());
        assert!(Error::Transport { status: 500, body: String::new() }.is_recoverable());
        assert!(!Error::MissingKey("x".into()).is_recoverable());
        assert!(!Error::Allocation.is_recoverable());
    }

    #[test]
    fn test_transport_display() {
        let err = Error::Transport { status: 429, body: "quota".to_string() };
        assert_eq!(err.to_string(), "Gemini API error (429): quota");
    }
}
