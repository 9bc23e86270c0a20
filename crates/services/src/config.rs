//! Endpoint and storage configuration.
//!
//! Resolution order per key: environment variable, then the TOML file named
//! by `TOEIC_CONFIG_PATH`, then the built-in default.

use serde::Deserialize;
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_BASE_URL: &str = "https://lotrinh.onrender.com/api";
pub const DEFAULT_PRACTICE_BASE_URL: &str = "https://lotrinh-1.onrender.com/api";
pub const DEFAULT_THEORY_BASE_URL: &str = "https://btl-d39f.onrender.com/api";
pub const DEFAULT_DB_URL: &str = "sqlite://toeic.sqlite3";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const CONFIG_PATH_KEY: &str = "TOEIC_CONFIG_PATH";
const API_KEY: &str = "TOEIC_API_BASE_URL";
const PRACTICE_KEY: &str = "TOEIC_PRACTICE_BASE_URL";
const THEORY_KEY: &str = "TOEIC_THEORY_BASE_URL";
const PROGRESS_KEY: &str = "TOEIC_PROGRESS_BASE_URL";
const DB_KEY: &str = "TOEIC_DB_URL";
const TIMEOUT_KEY: &str = "TOEIC_HTTP_TIMEOUT_SECS";

/// Optional file overlay; every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileOverlay {
    api_base_url: Option<String>,
    practice_base_url: Option<String>,
    theory_base_url: Option<String>,
    progress_base_url: Option<String>,
    db_url: Option<String>,
    http_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Courses, lessons and auth.
    pub api_base_url: String,
    pub practice_base_url: String,
    pub theory_base_url: String,
    /// User lessons and study stats.
    pub progress_base_url: String,
    /// Local store for the signed-in identity.
    pub db_url: String,
    pub http_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_owned(),
            practice_base_url: DEFAULT_PRACTICE_BASE_URL.to_owned(),
            theory_base_url: DEFAULT_THEORY_BASE_URL.to_owned(),
            progress_base_url: DEFAULT_API_BASE_URL.to_owned(),
            db_url: DEFAULT_DB_URL.to_owned(),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// Read the process environment (and the optional TOML file).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unreadable files, bad URLs or bad numbers.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration through `lookup` instead of the real environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unreadable files, bad URLs or bad numbers.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let overlay = match non_empty(lookup(CONFIG_PATH_KEY)) {
            Some(path) => {
                let overlay = read_overlay(&path)?;
                info!(%path, "loaded config file");
                overlay
            }
            None => FileOverlay::default(),
        };
        Self::resolve(&lookup, overlay)
    }

    fn resolve<F>(lookup: &F, file: FileOverlay) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let pick = |key: &str, from_file: Option<String>, default: &str| {
            non_empty(lookup(key))
                .or_else(|| non_empty(from_file))
                .unwrap_or_else(|| default.to_owned())
        };

        let api_base_url = base_url(
            API_KEY,
            pick(API_KEY, file.api_base_url, DEFAULT_API_BASE_URL),
        )?;
        let practice_base_url = base_url(
            PRACTICE_KEY,
            pick(PRACTICE_KEY, file.practice_base_url, DEFAULT_PRACTICE_BASE_URL),
        )?;
        let theory_base_url = base_url(
            THEORY_KEY,
            pick(THEORY_KEY, file.theory_base_url, DEFAULT_THEORY_BASE_URL),
        )?;
        let progress_base_url = base_url(
            PROGRESS_KEY,
            pick(PROGRESS_KEY, file.progress_base_url, &api_base_url),
        )?;
        let db_url = pick(DB_KEY, file.db_url, DEFAULT_DB_URL);

        let timeout_secs = match non_empty(lookup(TIMEOUT_KEY)) {
            Some(raw) => parse_timeout(&raw)?,
            None => file.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidNumber {
                key: TIMEOUT_KEY,
                value: "0".into(),
            });
        }

        Ok(Self {
            api_base_url,
            practice_base_url,
            theory_base_url,
            progress_base_url,
            db_url,
            http_timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn read_overlay(path: &str) -> Result<FileOverlay, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::File {
        path: path.to_owned(),
        message: e.to_string(),
    })?;
    parse_overlay(path, &raw)
}

fn parse_overlay(path: &str, raw: &str) -> Result<FileOverlay, ConfigError> {
    toml::from_str(raw).map_err(|e| ConfigError::File {
        path: path.to_owned(),
        message: e.to_string(),
    })
}

fn base_url(key: &'static str, value: String) -> Result<String, ConfigError> {
    let parsed = Url::parse(&value).map_err(|_| ConfigError::InvalidUrl {
        key,
        value: value.clone(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl { key, value });
    }
    Ok(value.trim_end_matches('/').to_owned())
}

fn parse_timeout(raw: &str) -> Result<u64, ConfigError> {
    raw.parse::<u64>().map_err(|_| ConfigError::InvalidNumber {
        key: TIMEOUT_KEY,
        value: raw.to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_hosted_services() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.progress_base_url, config.api_base_url);
    }

    #[test]
    fn env_overrides_and_trims_trailing_slash() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY, "http://127.0.0.1:8080/api/"),
            (TIMEOUT_KEY, "5"),
        ]))
        .unwrap();
        assert_eq!(config.api_base_url, "http://127.0.0.1:8080/api");
        assert_eq!(config.progress_base_url, "http://127.0.0.1:8080/api");
        assert_eq!(config.http_timeout, Duration::from_secs(5));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(THEORY_KEY, "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { key: THEORY_KEY, .. }));

        let err = AppConfig::from_lookup(lookup(&[(TIMEOUT_KEY, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));

        let err = AppConfig::from_lookup(lookup(&[(TIMEOUT_KEY, "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { .. }));
    }

    #[test]
    fn env_wins_over_file() {
        let overlay = parse_overlay(
            "test.toml",
            r#"
                api_base_url = "https://file.example.com/api"
                db_url = "sqlite://from-file.sqlite3"
                http_timeout_secs = 12
            "#,
        )
        .unwrap();
        let config = AppConfig::resolve(
            &lookup(&[(API_KEY, "https://env.example.com/api")]),
            overlay,
        )
        .unwrap();
        assert_eq!(config.api_base_url, "https://env.example.com/api");
        assert_eq!(config.db_url, "sqlite://from-file.sqlite3");
        assert_eq!(config.http_timeout, Duration::from_secs(12));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = AppConfig::from_lookup(lookup(&[(
            CONFIG_PATH_KEY,
            "/definitely/not/here/toeic.toml",
        )]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::File { .. }));
    }
}
