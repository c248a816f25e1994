//! Chat module — the conversation pipeline.
//!
//! This module contains:
//! - Conversation history (turns, windowed serialization)
//! - Request assembly for `generateContent`
//! - Type-checked response extraction, plain and structured
//! - Transport trait and the Gemini implementation
//! - The interactive chat loop

mod history;
mod loop_impl;
pub mod prompt;
mod request;
mod response;

pub mod llm;

// Re-exports for convenience
pub use history::{ConversationHistory, HistoryLimit, Role, Turn, DEFAULT_MAX_TURNS};
pub use llm::{GeminiTransport, Transport};
pub use loop_impl::{ChatLoop, LoopState, TurnOutcome};
pub use request::{Content, GenerationConfig, Part, RequestBuilder, RequestPayload};
pub use response::{
    extract_structured_lines, extract_text, LineType, StructuredLine, StructuredLines,
};
