//! AskAI - terminal chat client for the Gemini API
//!
//! This library provides the conversation pipeline (history, request
//! assembly, response extraction), API key resolution and the interactive
//! chat loop used by the `askai` binary.

pub mod auth;
pub mod chat;
pub mod config;
pub mod error;
pub mod ui;

pub use error::{Error, Result};
