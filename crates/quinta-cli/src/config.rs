//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use quinta_domain::Domain;
use quinta_engine::{EngineConfig, DEFAULT_CONCURRENCY};
use quinta_sources::live::DEFAULT_TIMEOUT_SECS;
use quinta_sources::{AuthConfig, DateRange, LiveSourceConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Domains to report on, in display order
    #[serde(default = "default_domains")]
    pub domains: Vec<String>,

    /// Impersonation settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// Search analytics date range
    #[serde(default)]
    pub search: DateRange,

    /// Run settings
    #[serde(default)]
    pub engine: EngineSettings,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,
}

/// Run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Maximum number of domains fetched at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Abort the whole run on the first source failure
    #[serde(default)]
    pub fail_fast: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Global CLI settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl Config {
    /// Get the default configuration file path.
    pub fn path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".quinta").join("config.toml"))
    }

    /// Load configuration from the default path, or defaults if there is no file.
    pub fn load() -> Result<Self> {
        let path = Self::path()?;

        if path.exists() {
            Self::from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path, falling back to the default path.
    ///
    /// An explicit path must exist.
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::load(),
        }
    }

    /// Read configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write configuration to a TOML file.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Parse the configured domain list.
    pub fn domains(&self) -> Result<Vec<Domain>> {
        parse_domains(&self.domains)
    }

    /// Engine settings for a run.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            concurrency: self.engine.concurrency,
            fail_fast: self.engine.fail_fast,
        }
    }

    /// Settings for the live metric source.
    pub fn live_source_config(&self) -> LiveSourceConfig {
        LiveSourceConfig {
            auth: self.auth.clone(),
            search_range: self.search.clone(),
            timeout_secs: self.engine.timeout_secs,
            ..Default::default()
        }
    }
}

/// Parse domain names, rejecting blanks.
pub fn parse_domains(names: &[String]) -> Result<Vec<Domain>> {
    names
        .iter()
        .map(|name| {
            Domain::parse(name).ok_or_else(|| CliError::InvalidInput(format!("Invalid domain '{}'", name)))
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            domains: default_domains(),
            auth: AuthConfig::default(),
            search: DateRange::default(),
            engine: EngineSettings::default(),
            settings: Settings::default(),
        }
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            fail_fast: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
        }
    }
}

fn default_domains() -> Vec<String> {
    [
        "rossfenning.co.uk",
        "avengerpenguin.com",
        "traditionalmead.uk",
        "codesnips.pro",
        "historyofsound.com",
        "wonkypaedia.org",
    ]
    .iter()
    .map(|d| d.to_string())
    .collect()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.domains.len(), 6);
        assert_eq!(config.domains[0], "rossfenning.co.uk");
        assert!(config.settings.color);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            domains = ["example.com"]

            [engine]
            fail_fast = true

            [search]
            start_date = "2024-01-01"
            "#,
        )
        .unwrap();

        assert_eq!(config.domains, ["example.com"]);
        assert!(config.engine.fail_fast);
        assert_eq!(config.engine.concurrency, DEFAULT_CONCURRENCY);
        assert_eq!(config.search.start_date, "2024-01-01");
        assert_eq!(config.search.end_date, DateRange::default().end_date);
        assert_eq!(config.auth, AuthConfig::default());
        assert_eq!(config.settings.format, OutputFormat::Table);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.domains = vec!["example.com".into()];
        config.engine.timeout_secs = 5;
        config.settings.format = OutputFormat::Json;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(Some(&path)).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.live_source_config().timeout_secs, 5);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let result = Config::load_from(Some(&dir.path().join("absent.toml")));
        assert!(matches!(result, Err(CliError::Io(_))));
    }

    #[test]
    fn test_invalid_toml_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "domains = 42").unwrap();
        assert!(matches!(Config::from_file(&path), Err(CliError::Toml(_))));
    }

    #[test]
    fn test_parse_domains() {
        let domains = parse_domains(&["a.com".into(), " b.org ".into()]).unwrap();
        assert_eq!(domains[1].as_str(), "b.org");
        assert!(parse_domains(&["  ".into()]).is_err());
    }
}
