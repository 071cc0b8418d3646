use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name looked up in the target directory.
pub const CONFIG_FILE: &str = ".pr-feedback.toml";

const DEFAULT_API_URL: &str = "https://api.github.com";
const DEFAULT_PROGRAM: &str = "gh";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-feedback.toml.
///
/// All fields are optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub gh: GhConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GH_TOKEN / GITHUB_TOKEN, then `gh auth token`.
    pub token: Option<String>,
    /// REST API base URL, for GitHub Enterprise hosts.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GhConfig {
    /// Path or name of the gh binary.
    pub program: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl Config {
    /// Load configuration from .pr-feedback.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Resolve the GitHub token from the config file or the environment.
    /// `None` means the caller should ask gh for one.
    pub fn github_token(&self) -> Option<String> {
        self.github
            .token
            .clone()
            .or_else(|| non_empty_env("GH_TOKEN"))
            .or_else(|| non_empty_env("GITHUB_TOKEN"))
    }

    pub fn api_url(&self) -> String {
        self.github
            .api_url
            .clone()
            .or_else(|| non_empty_env("GITHUB_API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }

    pub fn gh_program(&self) -> PathBuf {
        self.gh
            .program
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM))
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github.token.is_none());
        assert!(config.github.api_url.is_none());
        assert_eq!(config.gh_program(), PathBuf::from("gh"));
        assert_eq!(config.output.color, ColorChoice::Auto);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "abc"
api_url = "https://ghe.example.com/api/v3"

[gh]
program = "/opt/bin/gh"

[output]
color = "never"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token().as_deref(), Some("abc"));
        assert_eq!(config.api_url(), "https://ghe.example.com/api/v3");
        assert_eq!(config.gh_program(), PathBuf::from("/opt/bin/gh"));
        assert_eq!(config.output.color, ColorChoice::Never);
    }

    #[test]
    fn test_rejects_unknown_color() {
        let result: Result<Config, _> = toml::from_str("[output]\ncolor = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gh]\nprogram = \"gh-dev\"").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.gh_program(), PathBuf::from("gh-dev"));
    }

    #[test]
    fn test_load_from_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[github\ntoken = ").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load_from(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }
}
