// Application configuration
// Every setting comes from the environment and has a default

use crate::types::Language;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_JUDGE_URL: &str = "https://judge0-ce.p.rapidapi.com";
pub const DEFAULT_JUDGE_HOST: &str = "judge0-ce.p.rapidapi.com";
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1200;
pub const DEFAULT_MAX_POLLS: u32 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?} ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Polling behaviour of the orchestrator for one submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay before every status fetch
    pub interval: Duration,
    /// Maximum number of status fetches per submission
    pub max_attempts: u32,
    /// End polling early on statuses 4..=14 instead of waiting out the budget
    pub stop_on_error_status: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            max_attempts: DEFAULT_MAX_POLLS,
            stop_on_error_status: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JudgeConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub api_host: String,
    pub request_timeout: Duration,
    pub poll: PollPolicy,
    pub language: Language,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_JUDGE_URL.to_string(),
            api_key: None,
            api_host: DEFAULT_JUDGE_HOST.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll: PollPolicy::default(),
            language: Language::default(),
        }
    }
}

impl JudgeConfig {
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn with_poll(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub judge: JudgeConfig,
    pub catalog_path: Option<PathBuf>,
    pub redis_url: Option<String>,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let max_attempts: u32 = parse_var(&get, "JUDGE_MAX_POLLS", DEFAULT_MAX_POLLS)?;
        if max_attempts == 0 {
            return Err(ConfigError::Invalid {
                var: "JUDGE_MAX_POLLS",
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        let poll = PollPolicy {
            interval: Duration::from_millis(parse_var(
                &get,
                "JUDGE_POLL_INTERVAL_MS",
                DEFAULT_POLL_INTERVAL_MS,
            )?),
            max_attempts,
            stop_on_error_status: parse_var(&get, "JUDGE_STOP_ON_ERROR_STATUS", false)?,
        };

        let judge = JudgeConfig {
            base_url: get("JUDGE0_API_URL")
                .unwrap_or_else(|| DEFAULT_JUDGE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            api_key: get("JUDGE0_API_KEY"),
            api_host: get("JUDGE0_API_HOST").unwrap_or_else(|| DEFAULT_JUDGE_HOST.to_string()),
            request_timeout: Duration::from_secs(parse_var(
                &get,
                "JUDGE_REQUEST_TIMEOUT_SECS",
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )?),
            poll,
            language: parse_var(&get, "JUDGE_LANGUAGE", Language::default())?,
        };

        Ok(Self {
            judge,
            catalog_path: get("CATALOG_PATH").map(PathBuf::from),
            redis_url: get("REDIS_URL"),
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }
}

fn parse_var<T, G>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::Invalid {
                var,
                reason: e.to_string(),
                value,
            }),
        },
        None => Ok(default),
    }
}
