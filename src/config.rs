//! Configuration file for the notarization workflow.
//!
//! The file is ini-style. Values are taken verbatim up to the end of the
//! line; surrounding quotes are optional. Section names are case-sensitive,
//! keys are not.
//!
//! ```ini
//! [developer]
//! username = dev@example.com
//! password = abcd-efgh-ijkl-mnop
//! identity = Developer ID Application: Example (TEAMID1234)
//!
//! [app]
//! app_name = Example
//! app_path = dist/Example.app
//! dmg_path = dist/Example.dmg
//! bundle_id = com.example.app
//! ```
//!
//! Keys are not checked at load time. Each accessor reports
//! [`NotaryError::MissingConfig`] when the key it reads is absent, so a
//! missing key surfaces at the first operation that needs it.

use crate::error::{NotaryError, Result};
use ini::{Ini, ParseOption};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration file looked up in the current directory by default.
pub const DEFAULT_CONFIG_FILE: &str = "notarize.cfg";

/// Seconds between altool status checks.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 59;

/// Status checks before giving up on an altool request (about two hours).
pub const DEFAULT_MAX_POLLS: u32 = 120;

#[derive(Debug, Clone, Default)]
pub struct NotaryConfig {
    pub developer: DeveloperSection,
    pub app: AppSection,
    pub notarization: NotarizationSettings,
    pub build: Option<BuildSettings>,
}

/// `[developer]` section: Apple account and signing identity.
#[derive(Debug, Clone, Default)]
pub struct DeveloperSection {
    pub username: Option<String>,
    pub password: Option<String>,
    pub identity: Option<String>,
    pub team_id: Option<String>,
}

/// `[app]` section: what gets notarized.
#[derive(Debug, Clone, Default)]
pub struct AppSection {
    pub app_name: Option<String>,
    pub app_path: Option<String>,
    pub dmg_path: Option<String>,
    pub bundle_id: Option<String>,
}

/// `[notarization]` section.
#[derive(Debug, Clone)]
pub struct NotarizationSettings {
    pub backend: Backend,
    pub poll_interval_secs: u64,
    /// Zero polls forever.
    pub max_polls: u32,
}

impl Default for NotarizationSettings {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }
}

impl NotarizationSettings {
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Poll ceiling, `None` when polling is unbounded.
    #[must_use]
    pub fn poll_limit(&self) -> Option<u32> {
        (self.max_polls > 0).then_some(self.max_polls)
    }
}

/// `[build]` section: command that produces the disk image.
///
/// Written as a shell-style command line, e.g.
/// `command = ./make_dmg.sh "{app_path}" {dmg_path}`.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub command: Vec<String>,
}

/// Which notarization tool to drive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Backend {
    /// `xcrun notarytool submit --wait`: one blocking call returns the verdict.
    #[default]
    NotaryTool,

    /// `xcrun altool`: upload, then poll the request status.
    AlTool,
}

impl Backend {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotaryTool => "notarytool",
            Self::AlTool => "altool",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared by the config file and `--backend`, so both accept the same
/// spellings.
impl FromStr for Backend {
    type Err = NotaryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "notarytool" => Ok(Self::NotaryTool),
            "altool" => Ok(Self::AlTool),
            other => Err(NotaryError::InvalidConfig(format!(
                "Unknown notarization backend '{other}' (expected 'notarytool' or 'altool')"
            ))),
        }
    }
}

fn require<'a>(
    value: &'a Option<String>,
    section: &'static str,
    key: &'static str,
) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or(NotaryError::MissingConfig { section, key })
}

/// Expand `~` in a configured path, failing when HOME is unavailable.
fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::tilde(path).to_string();

    // shellexpand leaves ~ untouched when HOME is unset
    if path.starts_with('~') && expanded.starts_with('~') {
        return Err(NotaryError::InvalidConfig(format!(
            "Could not expand ~ in '{path}' (HOME is not set). Use an absolute path instead."
        )));
    }

    Ok(PathBuf::from(expanded))
}

fn parse_number<T: FromStr>(section: &str, key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| {
        NotaryError::InvalidConfig(format!(
            "[{section}] {key} must be a non-negative whole number, got '{value}'"
        ))
    })
}

/// Drop one pair of matching quotes wrapping the whole value.
fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}

fn parse_command(value: &str) -> Result<Vec<String>> {
    shell_words::split(value)
        .map_err(|e| NotaryError::InvalidConfig(format!("[build] command: {e}")))
}

impl NotaryConfig {
    /// Read and parse a configuration file.
    ///
    /// A file that does not exist loads as an empty configuration; the
    /// first accessor that needs a key then reports it missing.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read_to_string(path).await {
            Ok(content) => content.parse(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Configuration file {} not found", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Store one `key = value` pair. Unknown sections and keys are ignored.
    ///
    /// The build command keeps its quotes for shell-style splitting.
    fn set(&mut self, section: &str, key: &str, raw: &str) -> Result<()> {
        let value = unquote(raw);
        let text = Some(value.to_string());

        match (section, key) {
            ("developer", "username") => self.developer.username = text,
            ("developer", "password") => self.developer.password = text,
            ("developer", "identity") => self.developer.identity = text,
            ("developer", "team_id") => self.developer.team_id = text,
            ("app", "app_name") => self.app.app_name = text,
            ("app", "app_path") => self.app.app_path = text,
            ("app", "dmg_path") => self.app.dmg_path = text,
            ("app", "bundle_id") => self.app.bundle_id = text,
            ("notarization", "backend") => self.notarization.backend = value.parse()?,
            ("notarization", "poll_interval_secs") => {
                self.notarization.poll_interval_secs = parse_number(section, key, value)?;
            }
            ("notarization", "max_polls") => {
                self.notarization.max_polls = parse_number(section, key, value)?;
            }
            ("build", "command") => {
                self.build = Some(BuildSettings {
                    command: parse_command(raw)?,
                });
            }
            _ => {}
        }

        Ok(())
    }

    pub fn username(&self) -> Result<&str> {
        require(&self.developer.username, "developer", "username")
    }

    pub fn password(&self) -> Result<&str> {
        require(&self.developer.password, "developer", "password")
    }

    pub fn identity(&self) -> Result<&str> {
        require(&self.developer.identity, "developer", "identity")
    }

    /// Team passed to notarytool. Falls back to the signing identity.
    pub fn team_id(&self) -> Result<&str> {
        match self.developer.team_id.as_deref() {
            Some(team) => Ok(team),
            None => self.identity(),
        }
    }

    pub fn app_name(&self) -> Result<&str> {
        require(&self.app.app_name, "app", "app_name")
    }

    pub fn app_path(&self) -> Result<PathBuf> {
        expand_path(require(&self.app.app_path, "app", "app_path")?)
    }

    pub fn dmg_path(&self) -> Result<PathBuf> {
        expand_path(require(&self.app.dmg_path, "app", "dmg_path")?)
    }

    pub fn bundle_id(&self) -> Result<&str> {
        require(&self.app.bundle_id, "app", "bundle_id")
    }

    /// Human-readable rendering with the password masked.
    #[must_use]
    pub fn summary(&self) -> String {
        fn show(value: Option<&str>) -> &str {
            value.unwrap_or("<not set>")
        }

        let password = self.developer.password.as_ref().map(|_| "********");
        let build = self
            .build
            .as_ref()
            .map(|b| shell_words::join(&b.command))
            .unwrap_or_else(|| "<not set>".to_string());
        let max_polls = match self.notarization.poll_limit() {
            Some(limit) => limit.to_string(),
            None => "unlimited".to_string(),
        };

        format!(
            "[developer]\n\
             \x20 username: {}\n\
             \x20 password: {}\n\
             \x20 identity: {}\n\
             \x20 team_id:  {}\n\
             [app]\n\
             \x20 app_name:  {}\n\
             \x20 app_path:  {}\n\
             \x20 dmg_path:  {}\n\
             \x20 bundle_id: {}\n\
             [notarization]\n\
             \x20 backend:       {}\n\
             \x20 poll_interval: {}s\n\
             \x20 max_polls:     {}\n\
             [build]\n\
             \x20 command: {}",
            show(self.developer.username.as_deref()),
            show(password),
            show(self.developer.identity.as_deref()),
            show(self.developer.team_id.as_deref()),
            show(self.app.app_name.as_deref()),
            show(self.app.app_path.as_deref()),
            show(self.app.dmg_path.as_deref()),
            show(self.app.bundle_id.as_deref()),
            self.notarization.backend,
            self.notarization.poll_interval_secs,
            max_polls,
            build,
        )
    }
}

impl FromStr for NotaryConfig {
    type Err = NotaryError;

    fn from_str(s: &str) -> Result<Self> {
        // values are taken as written: no escapes, quotes handled in `set`
        let options = ParseOption {
            enabled_quote: false,
            enabled_escape: false,
            ..ParseOption::default()
        };
        let ini = Ini::load_from_str_opt(s, options)?;

        let mut config = Self::default();
        for (section, properties) in ini.iter() {
            let Some(section) = section else {
                continue;
            };
            for (key, value) in properties.iter() {
                config.set(section, &key.to_ascii_lowercase(), value)?;
            }
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = "
[developer]
username = dev@example.com
password = abcd-efgh
identity = Developer ID Application: Example (TEAM123)

[app]
app_name = Example
app_path = dist/Example.app
dmg_path = dist/Example.dmg
bundle_id = com.example.app
";

    #[test]
    fn parses_unquoted_ini_values() {
        let config: NotaryConfig = FULL.parse().unwrap();
        assert_eq!(config.username().unwrap(), "dev@example.com");
        assert_eq!(config.password().unwrap(), "abcd-efgh");
        assert_eq!(
            config.identity().unwrap(),
            "Developer ID Application: Example (TEAM123)"
        );
        assert_eq!(config.app_name().unwrap(), "Example");
        assert_eq!(config.app_path().unwrap(), PathBuf::from("dist/Example.app"));
        assert_eq!(config.dmg_path().unwrap(), PathBuf::from("dist/Example.dmg"));
        assert_eq!(config.bundle_id().unwrap(), "com.example.app");
        assert!(config.build.is_none());
    }

    #[test]
    fn quoted_values_are_unwrapped() {
        let config: NotaryConfig =
            "[developer]\nusername = \"dev@example.com\"\nidentity = 'Developer ID'\n"
                .parse()
                .unwrap();
        assert_eq!(config.username().unwrap(), "dev@example.com");
        assert_eq!(config.identity().unwrap(), "Developer ID");
    }

    #[test]
    fn keys_are_case_insensitive_and_comments_skipped() {
        let config: NotaryConfig = "
; notarization settings
[developer]
# account
UserName = dev@example.com
PASSWORD = abcd-efgh
"
        .parse()
        .unwrap();
        assert_eq!(config.username().unwrap(), "dev@example.com");
        assert_eq!(config.password().unwrap(), "abcd-efgh");
    }

    #[test]
    fn notarization_defaults_apply() {
        let config: NotaryConfig = FULL.parse().unwrap();
        assert_eq!(config.notarization.backend, Backend::NotaryTool);
        assert_eq!(config.notarization.poll_interval(), Duration::from_secs(59));
        assert_eq!(config.notarization.poll_limit(), Some(DEFAULT_MAX_POLLS));
    }

    #[test]
    fn missing_key_fails_only_when_read() {
        let config: NotaryConfig = "[app]\napp_path = App.app\n".parse().unwrap();
        assert_eq!(config.app_path().unwrap(), PathBuf::from("App.app"));

        match config.dmg_path() {
            Err(NotaryError::MissingConfig { section, key }) => {
                assert_eq!(section, "app");
                assert_eq!(key, "dmg_path");
            }
            other => panic!("expected MissingConfig, got {other:?}"),
        }
        assert!(matches!(
            config.username(),
            Err(NotaryError::MissingConfig {
                section: "developer",
                key: "username"
            })
        ));
    }

    #[test]
    fn empty_file_loads() {
        let config: NotaryConfig = "".parse().unwrap();
        assert!(config.bundle_id().is_err());
    }

    #[test]
    fn team_id_falls_back_to_identity() {
        let config: NotaryConfig = FULL.parse().unwrap();
        assert_eq!(
            config.team_id().unwrap(),
            "Developer ID Application: Example (TEAM123)"
        );

        let with_team = FULL.replace("[app]", "team_id = TEAM123\n\n[app]");
        let config: NotaryConfig = with_team.parse().unwrap();
        assert_eq!(config.team_id().unwrap(), "TEAM123");
    }

    #[test]
    fn notarization_and_build_sections() {
        let text = format!(
            "{FULL}\n[notarization]\nbackend = altool\npoll_interval_secs = 5\nmax_polls = 0\n\n\
             [build]\ncommand = ./make_dmg.sh \"{{app_name}} Installer\" {{dmg_path}}\n"
        );
        let config: NotaryConfig = text.parse().unwrap();
        assert_eq!(config.notarization.backend, Backend::AlTool);
        assert_eq!(config.notarization.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.notarization.poll_limit(), None);
        assert_eq!(
            config.build.unwrap().command,
            vec!["./make_dmg.sh", "{app_name} Installer", "{dmg_path}"]
        );
    }

    #[test]
    fn backend_spelling_matches_command_line() {
        for spelling in ["altool", "Altool", "ALTOOL"] {
            let config: NotaryConfig = format!("[notarization]\nbackend = {spelling}\n")
                .parse()
                .unwrap();
            assert_eq!(config.notarization.backend, Backend::AlTool);
            assert_eq!(spelling.parse::<Backend>().unwrap(), Backend::AlTool);
        }

        let result = "[notarization]\nbackend = transporter\n".parse::<NotaryConfig>();
        assert!(matches!(result, Err(NotaryError::InvalidConfig(_))));
        assert!("transporter".parse::<Backend>().is_err());
    }

    #[test]
    fn bad_numbers_are_invalid() {
        let result = "[notarization]\npoll_interval_secs = soon\n".parse::<NotaryConfig>();
        match result {
            Err(NotaryError::InvalidConfig(message)) => {
                assert!(message.contains("poll_interval_secs"));
            }
            other => panic!("expected InvalidConfig, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_command_quote_is_invalid() {
        let result = "[build]\ncommand = hdiutil create 'App.dmg\n".parse::<NotaryConfig>();
        assert!(matches!(result, Err(NotaryError::InvalidConfig(_))));
    }

    #[test]
    fn syntax_errors_fail_at_load() {
        let result = "[developer\nusername = dev".parse::<NotaryConfig>();
        assert!(matches!(result, Err(NotaryError::ConfigParse(_))));
    }

    #[test]
    fn summary_masks_password() {
        let config: NotaryConfig = FULL.parse().unwrap();
        let summary = config.summary();
        assert!(summary.contains("dev@example.com"));
        assert!(summary.contains("********"));
        assert!(!summary.contains("abcd-efgh"));
        assert!(summary.contains("command: <not set>"));
    }

    #[tokio::test]
    async fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        tokio::fs::write(&path, FULL).await.unwrap();

        let config = NotaryConfig::load(&path).await.unwrap();
        assert_eq!(config.bundle_id().unwrap(), "com.example.app");
    }

    #[tokio::test]
    async fn missing_file_loads_empty_and_fails_on_first_read() {
        let dir = tempfile::tempdir().unwrap();
        let config = NotaryConfig::load(&dir.path().join("absent.cfg"))
            .await
            .unwrap();

        assert!(config.build.is_none());
        assert!(matches!(
            config.dmg_path(),
            Err(NotaryError::MissingConfig {
                section: "app",
                key: "dmg_path"
            })
        ));
    }
}
