//! Chat loop - read, ask, display, remember

use std::io::{BufRead, Write};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Error;
use crate::ui::{self, Typewriter};
use crate::Result;

use super::history::{ConversationHistory, HistoryLimit, Role};
use super::llm::Transport;
use super::prompt::{directive_for, HISTORY_HEADER, WINDOWED_HISTORY_HEADER};
use super::request::{RequestBuilder, RequestPayload};
use super::response::{extract_structured_lines, extract_text};

/// Where the loop is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    AwaitingInput,
    Terminated,
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// A response was displayed and recorded.
    Answered,
    /// The request or its response failed; the session goes on.
    Failed,
    /// Blank input, nothing sent.
    Skipped,
    /// Stop token or end of input.
    Stopped,
}

/// A model reply ready for display.
struct Reply {
    display: String,
    transcript: String,
}

/// The chat loop drives one conversation until the stop token.
pub struct ChatLoop<T: Transport> {
    transport: T,
    builder: RequestBuilder,
    history: ConversationHistory,
    limit: HistoryLimit,
    history_header: bool,
    stop_token: String,
    username: String,
    typewriter: Typewriter,
    show_spinner: bool,
    state: LoopState,
}

impl<T: Transport> ChatLoop<T> {
    /// Create a chat loop with settings from `config`.
    pub fn new(transport: T, config: &Config) -> Self {
        Self {
            transport,
            builder: RequestBuilder::new(config.structured),
            history: ConversationHistory::new(),
            limit: config.history,
            history_header: config.history_header,
            stop_token: config.stop_token.clone(),
            username: "You".to_string(),
            typewriter: Typewriter::new(config.typewriter.clone()),
            show_spinner: false,
            state: LoopState::AwaitingInput,
        }
    }

    /// Name shown in the input prompt.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Show a spinner while waiting for the model.
    pub fn with_spinner(mut self, show: bool) -> Self {
        self.show_spinner = show;
        self
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run until the stop token or end of input.
    ///
    /// Only unrecoverable errors (I/O on the terminal, allocation) end the
    /// loop early.
    pub async fn run<R, W, E>(&mut self, input: &mut R, out: &mut W, err: &mut E) -> Result<()>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        info!("Chat session started with model {}", self.transport.model());

        while self.state == LoopState::AwaitingInput {
            self.step(input, out, err).await?;
        }

        info!("Chat session ended after {} turns", self.history.len());
        Ok(())
    }

    /// Read one line and act on it.
    pub async fn step<R, W, E>(&mut self, input: &mut R, out: &mut W, err: &mut E) -> Result<TurnOutcome>
    where
        R: BufRead,
        W: Write,
        E: Write,
    {
        if self.state == LoopState::Terminated {
            return Ok(TurnOutcome::Stopped);
        }

        write!(out, "\n{} : ", self.username)?;
        out.flush()?;

        // raw bytes: a non-UTF-8 terminal must not end the session
        let mut raw = Vec::new();
        if input.read_until(b'\n', &mut raw)? == 0 {
            debug!("End of input");
            writeln!(out)?;
            self.state = LoopState::Terminated;
            return Ok(TurnOutcome::Stopped);
        }

        let line = String::from_utf8_lossy(&raw);
        if let std::borrow::Cow::Owned(_) = line {
            warn!("Input was not valid UTF-8; invalid bytes replaced");
        }
        let prompt = strip_line_ending(&line);

        if prompt == self.stop_token {
            writeln!(out, "Exiting AskAI CLI. Goodbye!")?;
            self.state = LoopState::Terminated;
            return Ok(TurnOutcome::Stopped);
        }

        if prompt.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }

        self.ask(prompt, out, err).await
    }

    /// Send `prompt` with the transcript and display the answer.
    pub async fn ask<W, E>(&mut self, prompt: &str, out: &mut W, err: &mut E) -> Result<TurnOutcome>
    where
        W: Write,
        E: Write,
    {
        self.history.append(Role::User, prompt)?;
        let payload = self.build_request(prompt);

        match self.exchange(&payload).await {
            Ok(reply) => {
                writeln!(out)?;
                self.typewriter.type_out(out, &reply.display).await?;
                writeln!(out)?;

                self.history.append(Role::Model, &reply.transcript)?;
                Ok(TurnOutcome::Answered)
            }
            Err(e @ Error::Schema(_)) => {
                warn!("Response had no usable text: {}", e);
                writeln!(err, "Warning: {}", e)?;
                Ok(TurnOutcome::Failed)
            }
            Err(e) if e.is_recoverable() => {
                warn!("Request failed: {}", e);
                writeln!(err, "Error: {}", e)?;
                Ok(TurnOutcome::Failed)
            }
            Err(e) => Err(e),
        }
    }

    fn build_request(&self, prompt: &str) -> RequestPayload {
        let turns = self.history.window(&self.limit);
        let window = self.history.serialize_window(&self.limit);
        let history = if !self.history_header {
            window
        } else if turns.len() < self.history.len() {
            format!("{}{}", WINDOWED_HISTORY_HEADER, window)
        } else {
            format!("{}{}", HISTORY_HEADER, window)
        };

        self.builder
            .build_request(prompt, directive_for(self.builder.is_structured()), &history)
    }

    async fn exchange(&self, payload: &RequestPayload) -> Result<Reply> {
        let spinner = self.show_spinner.then(|| ui::spinner("Asking Gemini..."));
        let body = self.transport.send(payload).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let text = extract_text(&body?)?;

        if !self.builder.is_structured() {
            return Ok(Reply {
                display: text.clone(),
                transcript: text,
            });
        }

        let lines = extract_structured_lines(&text)?;
        debug!("Structured response with {} lines", lines.len());
        Ok(Reply {
            display: ui::render_structured(&lines),
            transcript: lines.plain_text(),
        })
    }
}

/// Drop the trailing `\n` or `\r\n`, nothing else.
fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}
