use std::io::{self, Write};
use std::time::Duration;

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use terminal_size::{Width, Height, terminal_size};

use crate::chat::{LineType, StructuredLines};
use crate::config::TypewriterConfig;

pub fn print_welcome(model: &str, structured: bool, stop_token: &str) {
    let (width, _) = terminal_size().unwrap_or((Width(80), Height(24)));
    let width = (width.0 as usize).min(80);

    let line = "─".repeat(width);
    println!("{}", line.black().bold());

    let name = "AskAI Chat".yellow().bold();
    let version = format!("v{}", env!("CARGO_PKG_VERSION")).black().bold();
    println!("  {} {}", name, version);

    let mode = if structured { "structured" } else { "plain text" };
    let info = format!("  {}  •  {}", model, mode).cyan();
    println!("{}", info);

    println!("{}", line.black().bold());
    println!(
        "Welcome to AskAI Chat. Get answers to your question. (type \"{}\" and press enter to exit )",
        stop_token
    );
}

pub fn print_setup_header() {
    println!("{}", "--- AskAI CLI Setup ---".yellow().bold());
}

pub fn print_success(msg: &str) {
    println!("  {} {}", "✓".green().bold(), msg.green());
}

pub fn print_error(msg: &str) {
    eprintln!("  {} {}", "❌".red().bold(), msg.red());
}

/// Name shown in the input prompt: `$USER`, then the login name, then "You".
pub fn username() -> String {
    std::env::var("USER")
        .ok()
        .filter(|u| !u.is_empty())
        .unwrap_or_else(|| {
            let name = whoami::username();
            if name.is_empty() { "You".to_string() } else { name }
        })
}

/// Spinner shown while a request is in flight. Hidden when stderr is not a
/// terminal.
pub fn spinner(msg: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(&["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"])
        .template("{spinner:.green} {msg}")
    {
        spinner.set_style(style);
    }
    spinner.set_message(msg.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

/// Prints text character by character with short pauses.
#[derive(Debug, Clone)]
pub struct Typewriter {
    config: TypewriterConfig,
}

impl Typewriter {
    pub fn new(config: TypewriterConfig) -> Self {
        Self { config }
    }

    /// Pause to take after the character at `index`, if any.
    fn pause_after(&self, index: usize) -> Option<Duration> {
        let every = |n: usize| n != 0 && index % n == 0;

        if every(self.config.chunk_chars) {
            Some(Duration::from_millis(self.config.pause_ms))
        } else if every(self.config.long_chunk_chars) {
            Some(Duration::from_millis(self.config.long_pause_ms))
        } else {
            None
        }
    }

    pub async fn type_out<W: Write>(&self, out: &mut W, text: &str) -> io::Result<()> {
        if !self.config.enabled {
            out.write_all(text.as_bytes())?;
            return out.flush();
        }

        let mut buf = [0u8; 4];
        for (index, ch) in text.chars().enumerate() {
            out.write_all(ch.encode_utf8(&mut buf).as_bytes())?;
            if let Some(pause) = self.pause_after(index) {
                out.flush()?;
                tokio::time::sleep(pause).await;
            }
        }
        out.flush()
    }
}

/// Lay out typed lines for the terminal.
///
/// Headings become `=== Title ===` banners, subheadings `--- Title ---`,
/// quotes get a `> ` prefix and runs of code lines share one fenced block.
pub fn render_structured(lines: &StructuredLines) -> String {
    let mut out = String::new();
    let mut in_code = false;

    for line in lines.iter() {
        if in_code && line.line_type != LineType::Code {
            out.push_str("```\n");
            in_code = false;
        }

        match line.line_type {
            LineType::Heading => {
                out.push_str(&format!("\n=== {} ===\n", line.content));
            }
            LineType::Subheading => {
                out.push_str(&format!("--- {} ---\n", line.content));
            }
            LineType::Code => {
                if !in_code {
                    out.push_str("```\n");
                    in_code = true;
                }
                out.push_str(&line.content);
                out.push('\n');
            }
            LineType::Quote => {
                out.push_str(&format!("> {}\n", line.content));
            }
            LineType::Text => {
                out.push_str(&line.content);
                out.push('\n');
            }
        }
    }

    if in_code {
        out.push_str("```\n");
    }
    out
}
