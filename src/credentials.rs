//! Username/password resolution.
//!
//! Values come from an ordered list of [`CredentialSource`]s: normally the
//! `.ancestry.properties` file first, then the terminal. For each field the
//! first non-empty answer wins.

use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::GedcomError;

/// Conventional properties file name, looked up in the working directory.
pub const DEFAULT_PROPERTIES_FILE: &str = ".ancestry.properties";

/// Site login for one run. Never written anywhere.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials from raw values.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The two values a source can supply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialField {
    Username,
    Password,
}

impl CredentialField {
    /// Key in the properties file, also used as the prompt text.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Password => "password",
        }
    }
}

/// Something that may know a username or password.
pub trait CredentialSource {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Returns the value for `field`, `None` when this source has nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when the source exists but cannot be read.
    fn lookup(&mut self, field: CredentialField) -> Result<Option<String>, GedcomError>;
}

/// Asks each source in turn for each field.
///
/// # Errors
///
/// Propagates source errors, and returns [`GedcomError::Configuration`] when no
/// source supplied a non-empty value for a field.
pub fn resolve_credentials(
    sources: &mut [&mut dyn CredentialSource],
) -> Result<Credentials, GedcomError> {
    let username = resolve_field(sources, CredentialField::Username)?;
    let password = resolve_field(sources, CredentialField::Password)?;
    Ok(Credentials { username, password })
}

fn resolve_field(
    sources: &mut [&mut dyn CredentialSource],
    field: CredentialField,
) -> Result<String, GedcomError> {
    for source in sources.iter_mut() {
        if let Some(value) = source.lookup(field)?.filter(|value| !value.is_empty()) {
            debug!(source = source.name(), field = field.key(), "credential resolved");
            return Ok(value);
        }
    }
    Err(GedcomError::configuration(format!(
        "no {} available",
        field.key()
    )))
}

/// `username`/`password` keys read from a Java-style properties file.
#[derive(Debug, Clone, Default)]
pub struct PropertiesFile {
    values: HashMap<String, String>,
}

impl PropertiesFile {
    /// Reads `path`. A missing file is reported and yields an empty source.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Io`] if the file exists but cannot be read, or
    /// [`GedcomError::Configuration`] if it cannot be parsed.
    pub fn load(path: &Path) -> Result<Self, GedcomError> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                debug!(path = %path.display(), "loaded credentials file");
                Self::parse(&text)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                warn!(
                    path = %path.display(),
                    "Cannot find configuration file; will prompt for Ancestry.com credentials"
                );
                Ok(Self::default())
            }
            Err(error) => Err(GedcomError::io(path.to_path_buf(), error)),
        }
    }

    /// Parses properties text with Java properties rules.
    ///
    /// Backslash escapes, `\uXXXX` sequences and trailing-backslash line
    /// continuations are decoded. Values are trimmed; later keys override
    /// earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`GedcomError::Configuration`] if the text is not valid
    /// properties syntax.
    pub fn parse(text: &str) -> Result<Self, GedcomError> {
        let values = java_properties::read(text.as_bytes())
            .map_err(|e| GedcomError::configuration(format!("malformed properties: {e}")))?
            .into_iter()
            .map(|(key, value)| (key, value.trim().to_string()))
            .collect();
        Ok(Self { values })
    }

    /// Raw lookup by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl CredentialSource for PropertiesFile {
    fn name(&self) -> &'static str {
        "properties"
    }

    fn lookup(&mut self, field: CredentialField) -> Result<Option<String>, GedcomError> {
        Ok(self.get(field.key()).map(str::to_string))
    }
}

/// Reads missing values from the controlling terminal.
///
/// The username is echoed; the password is read without echo.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompt;

impl TerminalPrompt {
    fn require_terminal() -> Result<(), GedcomError> {
        if io::stdin().is_terminal() {
            Ok(())
        } else {
            Err(GedcomError::configuration(
                "cannot read credentials from the console: no interactive terminal",
            ))
        }
    }
}

impl CredentialSource for TerminalPrompt {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn lookup(&mut self, field: CredentialField) -> Result<Option<String>, GedcomError> {
        Self::require_terminal()?;
        let prompt = format!("{}: ", field.key());
        let console = PathBuf::from("<console>");
        let value = match field {
            CredentialField::Username => {
                let mut stderr = io::stderr();
                stderr
                    .write_all(prompt.as_bytes())
                    .and_then(|()| stderr.flush())
                    .map_err(|e| GedcomError::io(console.clone(), e))?;
                let mut line = String::new();
                io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .map_err(|e| GedcomError::io(console, e))?;
                line.trim_end_matches(['\r', '\n']).to_string()
            }
            CredentialField::Password => {
                rpassword::prompt_password(prompt).map_err(|e| GedcomError::io(console, e))?
            }
        };
        Ok(Some(value))
    }
}

/// In-memory values, for tests and embedding.
#[derive(Debug, Clone, Default)]
pub struct FixedCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl FixedCredentials {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Self {
        Self {
            username: username.map(str::to_string),
            password: password.map(str::to_string),
        }
    }
}

impl CredentialSource for FixedCredentials {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn lookup(&mut self, field: CredentialField) -> Result<Option<String>, GedcomError> {
        Ok(match field {
            CredentialField::Username => self.username.clone(),
            CredentialField::Password => self.password.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Fails the test if consulted; proves earlier sources short-circuit.
    struct Unreachable;

    impl CredentialSource for Unreachable {
        fn name(&self) -> &'static str {
            "unreachable"
        }

        fn lookup(&mut self, field: CredentialField) -> Result<Option<String>, GedcomError> {
            panic!("{} should not be requested", field.key());
        }
    }

    /// Stands in for a terminal that is not attached.
    struct NoTerminal;

    impl CredentialSource for NoTerminal {
        fn name(&self) -> &'static str {
            "no-terminal"
        }

        fn lookup(&mut self, _field: CredentialField) -> Result<Option<String>, GedcomError> {
            Err(GedcomError::configuration("cannot read from the console"))
        }
    }

    #[test]
    fn test_parse_properties_separators_and_comments() {
        let props = PropertiesFile::parse(
            "# Ancestry login\n\
             ! another comment\n\
             \n\
             username = jane@example.com\n\
             password:hunter2 \n\
             other value with spaces\n",
        )
        .unwrap();
        assert_eq!(props.get("username"), Some("jane@example.com"));
        assert_eq!(props.get("password"), Some("hunter2"));
        assert_eq!(props.get("other"), Some("value with spaces"));
        assert_eq!(props.get("#"), None);
    }

    #[test]
    fn test_parse_properties_value_may_contain_equals() {
        let props = PropertiesFile::parse("password=a=b:c\n").unwrap();
        assert_eq!(props.get("password"), Some("a=b:c"));
    }

    #[test]
    fn test_parse_properties_decodes_escapes() {
        let props =
            PropertiesFile::parse("password=a\\\\b\nusername=x\\=y\nother=caf\\u00e9\\:1\n")
                .unwrap();
        assert_eq!(props.get("password"), Some("a\\b"));
        assert_eq!(props.get("username"), Some("x=y"));
        assert_eq!(props.get("other"), Some("caf\u{e9}:1"));
    }

    #[test]
    fn test_parse_properties_joins_continuation_lines() {
        let props = PropertiesFile::parse("password=abc\\\n    def\nusername=jane\n").unwrap();
        assert_eq!(props.get("password"), Some("abcdef"));
        assert_eq!(props.get("username"), Some("jane"));
        assert_eq!(props.get("def"), None);
    }

    #[test]
    fn test_parse_properties_key_without_value_is_empty() {
        let props = PropertiesFile::parse("username\n").unwrap();
        assert_eq!(props.get("username"), Some(""));
    }

    #[test]
    fn test_load_missing_file_is_empty_source() {
        let temp_dir = TempDir::new().unwrap();
        let mut props = PropertiesFile::load(&temp_dir.path().join("absent.properties")).unwrap();
        assert_eq!(props.lookup(CredentialField::Username).unwrap(), None);
    }

    #[test]
    fn test_load_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(DEFAULT_PROPERTIES_FILE);
        std::fs::write(&path, "username=jane\npassword=pw\n").unwrap();
        let mut file = PropertiesFile::load(&path).unwrap();
        let creds = resolve_credentials(&mut [&mut file]).unwrap();
        assert_eq!(creds, Credentials::new("jane", "pw"));
    }

    #[test]
    fn test_file_values_skip_prompt() {
        let mut file = PropertiesFile::parse("username=jane\npassword=pw\n").unwrap();
        let mut prompt = Unreachable;
        let creds = resolve_credentials(&mut [&mut file, &mut prompt]).unwrap();
        assert_eq!(creds.username(), "jane");
        assert_eq!(creds.password(), "pw");
    }

    #[test]
    fn test_empty_file_value_falls_through_to_next_source() {
        let mut file = PropertiesFile::parse("username=jane\npassword=\n").unwrap();
        let mut fixed = FixedCredentials::new(Some("ignored"), Some("typed"));
        let creds = resolve_credentials(&mut [&mut file, &mut fixed]).unwrap();
        assert_eq!(creds.username(), "jane");
        assert_eq!(creds.password(), "typed");
    }

    #[test]
    fn test_missing_value_without_terminal_is_configuration_error() {
        let mut file = PropertiesFile::parse("username=jane\n").unwrap();
        let mut terminal = NoTerminal;
        let result = resolve_credentials(&mut [&mut file, &mut terminal]);
        assert!(matches!(result, Err(GedcomError::Configuration { .. })));
    }

    #[test]
    fn test_no_sources_is_configuration_error() {
        let result = resolve_credentials(&mut []);
        assert!(matches!(result, Err(GedcomError::Configuration { .. })));
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", Credentials::new("jane", "hunter2"));
        assert!(rendered.contains("jane"));
        assert!(!rendered.contains("hunter2"));
    }
}
