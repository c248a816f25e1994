//! API key resolution and storage
//!
//! Looks for the key in `$GEMINI_API_KEY`, then in `~/.askai-cli/config`,
//! and finally asks for it on the terminal, saving the answer for next time.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::Error;
use crate::Result;

/// Environment variable checked first.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Secret Gemini API key. Formatting never reveals it.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building requests only.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Source of a key typed in by the user.
pub trait KeyPrompt {
    /// Ask for the key. Errors mean no input could be read.
    fn prompt_key(&mut self) -> Result<String>;
}

/// Masked terminal prompt for first-run setup.
#[derive(Debug, Default)]
pub struct TerminalKeyPrompt;

impl KeyPrompt for TerminalKeyPrompt {
    fn prompt_key(&mut self) -> Result<String> {
        use inquire::{Password, PasswordDisplayMode};

        crate::ui::print_setup_header();

        Password::new("Please enter your Gemini API Key:")
            .without_confirmation()
            .with_display_mode(PasswordDisplayMode::Masked)
            .prompt()
            .map_err(|e| Error::MissingKey(format!("could not read API key from input: {}", e)))
    }
}

/// Resolves the API key: environment, then key file, then prompt.
pub struct ApiKeyProvider<P: KeyPrompt> {
    env_var: String,
    key_path: PathBuf,
    prompt: P,
}

impl ApiKeyProvider<TerminalKeyPrompt> {
    /// Provider using `$GEMINI_API_KEY`, `~/.askai-cli/config` and the terminal.
    pub fn from_defaults() -> Self {
        Self::new(API_KEY_ENV, crate::config::key_path(), TerminalKeyPrompt)
    }
}

impl<P: KeyPrompt> ApiKeyProvider<P> {
    pub fn new(env_var: impl Into<String>, key_path: impl Into<PathBuf>, prompt: P) -> Self {
        Self {
            env_var: env_var.into(),
            key_path: key_path.into(),
            prompt,
        }
    }

    pub fn key_path(&self) -> &Path {
        &self.key_path
    }

    /// Resolve the key, first success wins. Never retries.
    pub fn resolve(&mut self) -> Result<ApiKey> {
        if let Some(key) = self.from_env() {
            info!("Using API key from ${}", self.env_var);
            return Ok(key);
        }

        match load_key(&self.key_path) {
            Ok(Some(key)) => {
                info!("Using API key from {:?}", self.key_path);
                return Ok(key);
            }
            Ok(None) => debug!("No stored API key at {:?}", self.key_path),
            Err(e) => warn!("Could not read {:?}: {}", self.key_path, e),
        }

        let entered = self.prompt.prompt_key()?;
        let entered = entered.trim();
        if entered.is_empty() {
            return Err(Error::MissingKey("empty API key entered".to_string()));
        }

        let key = ApiKey::new(entered);
        match save_key(&self.key_path, &key) {
            Ok(()) => crate::ui::print_success(&format!(
                "API Key saved to {} for future use.",
                self.key_path.display()
            )),
            Err(e) => warn!("Could not save API key to {:?}: {}", self.key_path, e),
        }

        Ok(key)
    }

    fn from_env(&self) -> Option<ApiKey> {
        std::env::var(&self.env_var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(ApiKey::new)
    }
}

/// Read the key from the first line of `path`.
///
/// Returns `None` when the file is missing or its first line is empty.
pub fn load_key(path: &Path) -> Result<Option<ApiKey>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)?;
    let key = content.lines().next().unwrap_or_default().trim();

    if key.is_empty() {
        return Ok(None);
    }
    Ok(Some(ApiKey::new(key)))
}

/// Write the key to `path`, readable by the owner only.
pub fn save_key(path: &Path, key: &ApiKey) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(key.expose().as_bytes())?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }

    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedPrompt(Option<&'static str>);

    impl KeyPrompt for FixedPrompt {
        fn prompt_key(&mut self) -> Result<String> {
            self.0
                .take()
                .map(str::to_string)
                .ok_or_else(|| Error::MissingKey("no input".to_string()))
        }
    }

    fn provider(env_var: &str, path: PathBuf, answer: Option<&'static str>) -> ApiKeyProvider<FixedPrompt> {
        ApiKeyProvider::new(env_var, path, FixedPrompt(answer))
    }

    #[test]
    fn test_env_var_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "from-file").unwrap();
        std::env::set_var("ASKAI_TEST_KEY_ENV_WINS", "from-env");

        let key = provider("ASKAI_TEST_KEY_ENV_WINS", path, None).resolve().unwrap();
        assert_eq!(key.expose(), "from-env");
    }

    #[test]
    fn test_blank_env_var_falls_through_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "from-file\n").unwrap();
        std::env::set_var("ASKAI_TEST_KEY_ENV_BLANK", "  ");

        let key = provider("ASKAI_TEST_KEY_ENV_BLANK", path, None).resolve().unwrap();
        assert_eq!(key.expose(), "from-file");
    }

    #[test]
    fn test_key_file_first_line_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "abc123\r\nsecond line\n").unwrap();

        assert_eq!(load_key(&path).unwrap().unwrap().expose(), "abc123");
    }

    #[test]
    fn test_empty_key_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        fs::write(&path, "\n").unwrap();
        assert!(load_key(&path).unwrap().is_none());

        let key = provider("ASKAI_TEST_KEY_UNSET_1", path.clone(), Some("typed"))
            .resolve()
            .unwrap();
        assert_eq!(key.expose(), "typed");
        assert_eq!(fs::read_to_string(&path).unwrap(), "typed");
    }

    #[test]
    fn test_prompt_persists_key_privately() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".askai-cli").join("config");

        let key = provider("ASKAI_TEST_KEY_UNSET_2", path.clone(), Some("  new-key\n"))
            .resolve()
            .unwrap();
        assert_eq!(key.expose(), "new-key");
        assert_eq!(fs::read_to_string(&path).unwrap(), "new-key");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let file_mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
            assert_eq!(file_mode, 0o600);
            let dir_mode = fs::metadata(path.parent().unwrap()).unwrap().permissions().mode() & 0o777;
            assert_eq!(dir_mode, 0o700);
        }

        // second run reads the stored key without prompting
        let again = provider("ASKAI_TEST_KEY_UNSET_2", path, None).resolve().unwrap();
        assert_eq!(again, key);
    }

    #[test]
    fn test_unreadable_input_is_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let err = provider("ASKAI_TEST_KEY_UNSET_3", dir.path().join("config"), None)
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey(_)));
    }

    #[test]
    fn test_empty_input_is_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let err = provider("ASKAI_TEST_KEY_UNSET_4", path.clone(), Some("   "))
            .resolve()
            .unwrap_err();
        assert!(matches!(err, Error::MissingKey(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_key_is_never_formatted() {
        let key = ApiKey::new("super-secret");
        assert!(!format!("{:?}", key).contains("super-secret"));
        assert!(!format!("{}", key).contains("super-secret"));
    }
}
