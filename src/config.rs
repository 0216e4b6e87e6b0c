use std::time::Duration;

use thiserror::Error;
use url::Url;

pub const API_URL: &str = "STOCKSIM_API_URL";
pub const TOKEN: &str = "STOCKSIM_TOKEN";
pub const TIMEOUT_SECS: &str = "STOCKSIM_TIMEOUT_SECS";
pub const HOT_LIMIT: &str = "STOCKSIM_HOT_LIMIT";
pub const LOCALE: &str = "STOCKSIM_LOCALE";

const REQUIRED: [&str; 1] = [API_URL];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    #[error("{key} is not a valid URL: {value}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
}

/// Runtime settings, read from the environment (`.env` included) once at startup
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub api_url: Url,
    pub token: Option<String>,
    pub timeout: Duration,
    pub hot_limit: usize,
    pub locale: String,
}

impl Config {
    /// `api_url` from the command line wins over the environment
    pub fn from_env(api_url: Option<&str>) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), api_url)
    }

    fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
        api_url: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let raw_url = match api_url {
            Some(url) => url.trim().to_string(),
            None => get(API_URL).ok_or_else(|| ConfigError::Missing(REQUIRED.to_vec()))?,
        };
        let api_url = Url::parse(&raw_url)
            .ok()
            .filter(|url| matches!(url.scheme(), "http" | "https"))
            .ok_or(ConfigError::InvalidUrl {
                key: API_URL,
                value: raw_url,
            })?;

        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            let Some(value) = get(key) else {
                return Ok(default);
            };
            value
                .parse::<u64>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or(ConfigError::InvalidNumber { key, value })
        };

        Ok(Self {
            api_url,
            token: get(TOKEN),
            timeout: Duration::from_secs(number(TIMEOUT_SECS, 10)?),
            hot_limit: usize::try_from(number(HOT_LIMIT, 20)?).unwrap_or(usize::MAX),
            locale: get(LOCALE).unwrap_or_else(|| "en".to_string()),
        })
    }
}

#[must_use]
pub fn missing_required_env() -> Vec<&'static str> {
    REQUIRED
        .into_iter()
        .filter(|key| {
            std::env::var(key)
                .ok()
                .is_none_or(|value| value.trim().is_empty())
        })
        .collect()
}

/// Printed when startup configuration is incomplete
pub fn print_config_guide() {
    eprintln!(
        "{}",
        indoc::indoc! {"
            Configuration error: the backend address is not set

            Set the following environment variable:
              STOCKSIM_API_URL=<backend base url, e.g. http://localhost:8000/api>

            Optional:
              STOCKSIM_TOKEN         bearer token for account actions (favorites, trades)
              STOCKSIM_TIMEOUT_SECS  request timeout in seconds (default 10)
              STOCKSIM_HOT_LIMIT     rows fetched for the market list (default 20)
              STOCKSIM_LOCALE        interface language: en / zh-CN
              STOCKSIM_LOG           log filter, e.g. error,stocksim=info
              STOCKSIM_DATA_DIR      directory for log files

            Tip: put these in a .env file in the working directory.
            Run `stocksim doctor` to check the environment.
        "}
    );
}

#[cfg(test)]
mod tests {
    use super::{Config, ConfigError, API_URL, HOT_LIMIT, LOCALE, TIMEOUT_SECS, TOKEN};
    use std::collections::HashMap;
    use std::time::Duration;

    fn load(vars: &[(&str, &str)], api_url: Option<&str>) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned(), api_url)
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[(API_URL, "http://localhost:8000/api")], None).expect("config");
        assert_eq!(config.api_url.as_str(), "http://localhost:8000/api");
        assert_eq!(config.token, None);
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.hot_limit, 20);
        assert_eq!(config.locale, "en");
    }

    #[test]
    fn missing_api_url_is_reported() {
        assert_eq!(load(&[], None), Err(ConfigError::Missing(vec![API_URL])));
        assert_eq!(
            load(&[(API_URL, "   ")], None),
            Err(ConfigError::Missing(vec![API_URL]))
        );
    }

    #[test]
    fn command_line_url_overrides_environment() {
        let config = load(
            &[(API_URL, "http://env.example")],
            Some("https://flag.example/v1"),
        )
        .expect("config");
        assert_eq!(config.api_url.host_str(), Some("flag.example"));
    }

    #[test]
    fn rejects_non_http_url() {
        let err = load(&[(API_URL, "ftp://example.com")], None).expect_err("invalid");
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn reads_optional_values() {
        let config = load(
            &[
                (API_URL, "http://localhost"),
                (TOKEN, " secret "),
                (TIMEOUT_SECS, "3"),
                (HOT_LIMIT, "50"),
                (LOCALE, "zh-CN"),
            ],
            None,
        )
        .expect("config");
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.hot_limit, 50);
        assert_eq!(config.locale, "zh-CN");
    }

    #[test]
    fn zero_timeout_is_invalid() {
        let err = load(&[(API_URL, "http://localhost"), (TIMEOUT_SECS, "0")], None)
            .expect_err("invalid");
        assert_eq!(
            err,
            ConfigError::InvalidNumber {
                key: TIMEOUT_SECS,
                value: "0".to_string()
            }
        );
    }
}
