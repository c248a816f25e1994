//! API key management
//!
//! This module provides:
//! - [`ApiKey`], a secret that never shows up in logs
//! - [`ApiKeyProvider`], resolving the key from the environment, the key
//!   file or a first-run prompt

mod api_key;

pub use api_key::{
    load_key, save_key, ApiKey, ApiKeyProvider, KeyPrompt, TerminalKeyPrompt, API_KEY_ENV,
};
