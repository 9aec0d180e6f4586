use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use thiserror::Error;
use tracing::warn;

pub const DEFAULT_API_SECRET_KEY: &str = "dev-secret-key";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 12000;
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_MAX_FORMATS: usize = 50;
pub const DEFAULT_YT_DLP_PATH: &str = "yt-dlp";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_SECRET_KEY must be set when APP_ENV=production")]
    MissingProductionSecret,

    #[error("invalid origin in ALLOWED_ORIGINS: {0}. Use values like https://example.com")]
    InvalidOrigin(String),
}

/// Immutable service settings, resolved once at startup and shared read-only.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_secret_key: String,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub max_formats: usize,
    pub yt_dlp_path: PathBuf,
    /// Empty means any origin is allowed.
    pub allowed_origins: Vec<String>,
    pub production: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_secret_key: DEFAULT_API_SECRET_KEY.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            max_formats: DEFAULT_MAX_FORMATS,
            yt_dlp_path: PathBuf::from(DEFAULT_YT_DLP_PATH),
            allowed_origins: Vec::new(),
            production: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves the configuration through `lookup`, so callers other than the
    /// process environment (tests, the CLI) can supply values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).and_then(|value| non_empty(&value).map(ToString::to_string));
        let defaults = Self::default();

        let production = read("APP_ENV")
            .is_some_and(|value| value.eq_ignore_ascii_case("production"));

        let api_secret_key = match read("API_SECRET_KEY") {
            Some(key) => key,
            None if production => return Err(ConfigError::MissingProductionSecret),
            None => defaults.api_secret_key,
        };

        let port = read_parsed::<u16>(&read, "PORT")
            .filter(|port| *port > 0)
            .unwrap_or(defaults.port);
        let request_timeout = read_parsed::<u64>(&read, "REQUEST_TIMEOUT")
            .filter(|seconds| *seconds > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.request_timeout);
        let max_formats = read_parsed::<usize>(&read, "MAX_FORMATS")
            .filter(|value| *value > 0)
            .unwrap_or(defaults.max_formats);

        let allowed_origins = read("ALLOWED_ORIGINS")
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|origin| !origin.is_empty())
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        Ok(Self {
            api_secret_key,
            host: read("HOST").unwrap_or(defaults.host),
            port,
            request_timeout,
            max_formats,
            yt_dlp_path: read("YT_DLP_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.yt_dlp_path),
            allowed_origins,
            production,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn uses_default_secret(&self) -> bool {
        self.api_secret_key == DEFAULT_API_SECRET_KEY
    }
}

/// Loads `.env` from the working directory or one of its parents into the
/// process environment. Variables already set are not overridden.
///
/// Returns `Ok(None)` when there is no such file.
pub fn load_env_file() -> Result<Option<PathBuf>, dotenvy::Error> {
    missing_is_none(dotenvy::dotenv())
}

pub fn load_env_file_from(path: &Path) -> Result<Option<PathBuf>, dotenvy::Error> {
    missing_is_none(dotenvy::from_path(path).map(|()| path.to_path_buf()))
}

fn missing_is_none(loaded: Result<PathBuf, dotenvy::Error>) -> Result<Option<PathBuf>, dotenvy::Error> {
    match loaded {
        Ok(path) => Ok(Some(path)),
        Err(error) if error.not_found() => Ok(None),
        Err(error) => Err(error),
    }
}

fn read_parsed<T: std::str::FromStr>(read: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = read(name)?;
    match raw.parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {name}={raw:?}; using the default");
            None
        }
    }
}

pub(crate) fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn resolve(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Config::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = resolve(&[]).unwrap();
        assert_eq!(config.api_secret_key, DEFAULT_API_SECRET_KEY);
        assert_eq!(config.port, 12000);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_formats, 50);
        assert_eq!(config.bind_addr(), "0.0.0.0:12000");
        assert!(config.uses_default_secret());
        assert!(config.allowed_origins.is_empty());
    }

    #[test]
    fn overrides_are_read_and_trimmed() {
        let config = resolve(&[
            ("API_SECRET_KEY", " s3cret "),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("REQUEST_TIMEOUT", "5"),
            ("MAX_FORMATS", "3"),
            ("YT_DLP_PATH", "/opt/bin/yt-dlp"),
            ("ALLOWED_ORIGINS", "https://a.example, ,https://b.example"),
        ])
        .unwrap();

        assert_eq!(config.api_secret_key, "s3cret");
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_formats, 3);
        assert_eq!(config.yt_dlp_path, PathBuf::from("/opt/bin/yt-dlp"));
        assert_eq!(
            config.allowed_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
    }

    #[test]
    fn invalid_or_zero_numbers_fall_back() {
        let config = resolve(&[
            ("PORT", "not-a-port"),
            ("REQUEST_TIMEOUT", "0"),
            ("MAX_FORMATS", "-4"),
        ])
        .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.request_timeout, Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS));
        assert_eq!(config.max_formats, DEFAULT_MAX_FORMATS);
    }

    #[test]
    fn env_file_is_loaded_into_the_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(&path, "MEDIA_SCRAPER_TEST_ENV_FILE=from-file\n").unwrap();

        assert_eq!(load_env_file_from(&path).unwrap(), Some(path.clone()));
        assert_eq!(
            std::env::var("MEDIA_SCRAPER_TEST_ENV_FILE").as_deref(),
            Ok("from-file")
        );
    }

    #[test]
    fn missing_env_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_env_file_from(&dir.path().join(".env")).unwrap(), None);
    }

    #[test]
    fn production_requires_a_secret() {
        assert_eq!(
            resolve(&[("APP_ENV", "production")]).unwrap_err(),
            ConfigError::MissingProductionSecret
        );
        let config = resolve(&[("APP_ENV", "Production"), ("API_SECRET_KEY", "k")]).unwrap();
        assert!(config.production);
        assert!(!config.uses_default_secret());
    }
}
