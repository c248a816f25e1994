//! Conversation transcript.
//!
//! The whole transcript is resent with every request, so the history offers
//! a windowed serialization in addition to the full one. Storage itself is
//! append-only.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Result;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    text: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of this turn's `"\n{role}:{text}"` fragment.
    fn serialized_len(&self) -> usize {
        2 + self.role.as_str().len() + self.text.len()
    }

    fn write_to(&self, out: &mut String) {
        out.push('\n');
        out.push_str(self.role.as_str());
        out.push(':');
        out.push_str(&self.text);
    }
}

/// Limits on the part of the transcript that is resent.
///
/// Both limits apply when set. `None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLimit {
    #[serde(default)]
    pub max_turns: Option<usize>,

    #[serde(default)]
    pub max_chars: Option<usize>,
}

/// Default window, in turns.
pub const DEFAULT_MAX_TURNS: usize = 40;

impl Default for HistoryLimit {
    fn default() -> Self {
        Self {
            max_turns: Some(DEFAULT_MAX_TURNS),
            max_chars: None,
        }
    }
}

impl HistoryLimit {
    /// No window at all: the full transcript is resent.
    pub fn unbounded() -> Self {
        Self {
            max_turns: None,
            max_chars: None,
        }
    }
}

/// Append-only, ordered list of turns.
#[derive(Debug, Clone, Default)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn at the end.
    ///
    /// Fails only when memory for the new turn cannot be reserved, in which
    /// case the history is left as it was.
    pub fn append(&mut self, role: Role, text: &str) -> Result<()> {
        let mut owned = String::new();
        owned.try_reserve_exact(text.len())?;
        owned.push_str(text);

        self.turns.try_reserve(1)?;
        self.turns.push(Turn { role, text: owned });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    /// Every turn in order as `"\n{role}:{text}"` fragments.
    pub fn serialize(&self) -> String {
        Self::render(&self.turns)
    }

    /// Like [`serialize`](Self::serialize), but only the most recent turns
    /// that fit `limit`.
    pub fn serialize_window(&self, limit: &HistoryLimit) -> String {
        Self::render(self.window(limit))
    }

    /// Most recent suffix of the transcript that satisfies `limit`.
    pub fn window(&self, limit: &HistoryLimit) -> &[Turn] {
        let max_turns = limit.max_turns.unwrap_or(usize::MAX);
        let max_chars = limit.max_chars.unwrap_or(usize::MAX);

        let mut chars = 0usize;
        let mut start = self.turns.len();

        for (i, turn) in self.turns.iter().enumerate().rev() {
            if self.turns.len() - i > max_turns {
                break;
            }
            let len = turn.serialized_len();
            if chars.saturating_add(len) > max_chars {
                break;
            }
            chars += len;
            start = i;
        }

        &self.turns[start..]
    }

    fn render(turns: &[Turn]) -> String {
        let capacity = turns.iter().map(Turn::serialized_len).sum();
        let mut out = String::with_capacity(capacity);
        for turn in turns {
            turn.write_to(&mut out);
        }
        out
    }
}
