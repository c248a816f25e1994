//! AskAI CLI entry point

use clap::Parser;
use tracing_subscriber::EnvFilter;
use anyhow::Result;

use askai::auth::ApiKeyProvider;
use askai::chat::{ChatLoop, GeminiTransport};
use askai::config::{self, Config};
use askai::{ui, Error};

#[derive(Parser)]
#[command(name = "askai")]
#[command(about = "AskAI - chat with Gemini from your terminal")]
#[command(version)]
struct Cli {
    /// Model to use (overrides settings.json)
    #[arg(short, long)]
    model: Option<String>,

    /// Ask for typed lines (headings, code, quotes) instead of prose
    #[arg(short, long)]
    structured: bool,

    /// Print responses immediately
    #[arg(long)]
    no_typewriter: bool,

    /// Resend at most this many turns of history
    #[arg(long)]
    max_turns: Option<usize>,

    /// Resend at most this many characters of history
    #[arg(long)]
    max_chars: Option<usize>,

    /// Resend the whole history every turn
    #[arg(long, conflicts_with_all = ["max_turns", "max_chars"])]
    unbounded_history: bool,

    /// Do not prefix the history with its explanatory header
    #[arg(long)]
    no_history_header: bool,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Apply command line overrides on top of the settings file.
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if self.structured {
            config.structured = true;
        }
        if self.no_typewriter {
            config.typewriter.enabled = false;
        }
        if self.unbounded_history {
            config.history = askai::chat::HistoryLimit::unbounded();
        }
        if self.max_turns.is_some() || self.max_chars.is_some() {
            config.history.max_turns = self.max_turns;
            config.history.max_chars = self.max_chars;
        }
        if self.no_history_header {
            config.history_header = false;
        }
        if self.timeout.is_some() {
            config.request_timeout_secs = self.timeout;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "askai=debug" } else { "askai=warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = ctrlc::set_handler(|| {
        println!("\nExiting AskAI CLI. Goodbye!");
        std::process::exit(0);
    }) {
        tracing::warn!("Could not install Ctrl+C handler: {}", e);
    }

    let mut config = config::load()?;
    cli.apply(&mut config);

    let api_key = match ApiKeyProvider::from_defaults().resolve() {
        Ok(key) => key,
        Err(e @ Error::MissingKey(_)) => {
            ui::print_error(&e.to_string());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let transport = GeminiTransport::new(&api_key, &config)?;

    ui::print_welcome(&config.model, config.structured, &config.stop_token);

    let mut chat = ChatLoop::new(transport, &config)
        .with_username(ui::username())
        .with_spinner(true);

    let stdin = std::io::stdin();
    let mut input = stdin.lock();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();

    chat.run(&mut input, &mut stdout, &mut stderr).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_overrides() {
        let cli = Cli::parse_from(["askai", "-m", "gemini-2.0-flash", "-s", "--no-typewriter", "--max-turns", "6"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.model, "gemini-2.0-flash");
        assert!(config.structured);
        assert!(!config.typewriter.enabled);
        assert_eq!(config.history.max_turns, Some(6));
        assert_eq!(config.history.max_chars, None);
    }

    #[test]
    fn test_unbounded_history_flag() {
        let cli = Cli::parse_from(["askai", "--unbounded-history", "--no-history-header"]);
        let mut config = Config::default();
        cli.apply(&mut config);

        assert_eq!(config.history.max_turns, None);
        assert!(!config.history_header);
    }

    #[test]
    fn test_unbounded_conflicts_with_limits() {
        assert!(Cli::try_parse_from(["askai", "--unbounded-history", "--max-turns", "3"]).is_err());
    }
}
