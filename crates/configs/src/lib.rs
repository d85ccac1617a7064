//! # configs
//!
//! Layered settings for the rusty-forum client:
//! defaults, then `rusty-forum.toml` (or the file named by `FORUM_CONFIG`),
//! then `FORUM__SECTION__KEY` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use config::{Config, Environment, File};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "rusty-forum";
pub const CONFIG_PATH_ENV: &str = "FORUM_CONFIG";
const ENV_PREFIX: &str = "FORUM";
const ENV_SEPARATOR: &str = "__";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    /// `0` leaves requests without a client-side deadline.
    pub request_timeout_secs: u64,
    pub user_agent: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "https://forum-api.dicoding.dev/v1".to_string(),
            request_timeout_secs: 30,
            user_agent: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VotingSettings {
    /// How long an optimistic vote may wait for the server. `0` waits forever.
    pub timeout_secs: u64,
}

impl Default for VotingSettings {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Where the access token is kept between runs. Empty keeps it in memory.
    pub token_path: String,
    /// Token supplied up front instead of logging in.
    pub token: Option<SecretString>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            token_path: ".rusty-forum/token".to_string(),
            token: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub filter: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub voting: VotingSettings,
    pub session: SessionSettings,
    pub log: LogSettings,
}

impl Settings {
    /// Reads `.env`, then layers the config file and the environment over the defaults.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        let path = std::env::var(CONFIG_PATH_ENV).ok().filter(|p| !p.is_empty());
        Self::load_from(path.as_deref(), Self::environment())
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator(ENV_SEPARATOR)
            .separator(ENV_SEPARATOR)
            .try_parsing(true)
    }

    /// An explicit `path` must exist; the default file is optional.
    fn load_from(path: Option<&str>, environment: Environment) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::with_name(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let settings: Settings = Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!(base_url = %settings.api.base_url, "configuration loaded");
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(ConfigError::Invalid("api.base_url must not be empty".to_string()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http(s) URL, got {base_url:?}"
            )));
        }
        Ok(())
    }

    pub fn vote_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.voting.timeout_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        non_zero_secs(self.api.request_timeout_secs)
    }

    /// The configured token with surrounding whitespace removed, if non-blank.
    pub fn token(&self) -> Option<SecretString> {
        let token = self.session.token.as_ref()?.expose_secret().trim();
        (!token.is_empty()).then(|| SecretString::from(token.to_string()))
    }

    pub fn token_path(&self) -> Option<PathBuf> {
        let path = self.session.token_path.trim();
        (!path.is_empty()).then(|| PathBuf::from(path))
    }
}

fn non_zero_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::environment().source(Some(map))
    }

    fn write_config(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forum.toml");
        std::fs::write(&path, contents).unwrap();
        let path = path.to_string_lossy().into_owned();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();

        assert_eq!(settings.api.base_url, "https://forum-api.dicoding.dev/v1");
        assert_eq!(settings.vote_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(settings.token_path(), Some(PathBuf::from(".rusty-forum/token")));
        assert!(settings.token().is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_file_then_environment() {
        let (_dir, path) = write_config(
            r#"
            [api]
            base_url = "http://localhost:5000/v1"

            [voting]
            timeout_secs = 5

            [log]
            json = true
            "#,
        );

        let settings = Settings::load_from(
            Some(&path),
            env(&[("FORUM__VOTING__TIMEOUT_SECS", "0"), ("FORUM__SESSION__TOKEN", " abc ")]),
        )
        .unwrap();

        assert_eq!(settings.api.base_url, "http://localhost:5000/v1");
        assert_eq!(settings.api.request_timeout_secs, 30);
        assert!(settings.log.json);
        assert_eq!(settings.vote_timeout(), None);
        assert_eq!(settings.token().unwrap().expose_secret(), "abc");
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let error = Settings::load_from(None, env(&[("FORUM__API__BASE_URL", "")])).unwrap_err();
        assert!(matches!(error, ConfigError::Invalid(_)), "{error}");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let error = Settings::load_from(Some("/definitely/not/here/forum"), env(&[])).unwrap_err();
        assert!(matches!(error, ConfigError::Load(_)));
    }

    #[test]
    fn test_empty_token_path_means_memory_only() {
        let settings =
            Settings::load_from(None, env(&[("FORUM__SESSION__TOKEN_PATH", "")])).unwrap();
        assert_eq!(settings.token_path(), None);
    }

    #[test]
    fn test_blank_token_is_ignored() {
        let settings = Settings::load_from(None, env(&[("FORUM__SESSION__TOKEN", "   ")])).unwrap();
        assert!(settings.session.token.is_some());
        assert!(settings.token().is_none());
    }

    #[test]
    fn test_token_is_redacted_in_debug() {
        let mut settings = Settings::default();
        settings.session.token = Some(SecretString::from("very-secret".to_string()));
        assert!(!format!("{settings:?}").contains("very-secret"));
    }
}
