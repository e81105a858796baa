use std::{path::PathBuf, str::FromStr, time::Duration};

use tracing::level_filters::LevelFilter;
use url::Url;

use crate::error::ConfigError;

const DEFAULT_QUESTIONS_PATH: &str = "questions.json";
const DEFAULT_POLL_TIMEOUT_SECS: u32 = 100;
const DEFAULT_POLL_INTERVAL_SECS: u64 = 1;
const DEFAULT_STALE_AFTER_SECS: i64 = 10;
const MAX_STALE_AFTER_SECS: i64 = 365 * 24 * 60 * 60;

/// Runtime settings, read from the process environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub token: String,
    pub questions_path: PathBuf,
    pub poll_timeout: u32,
    pub poll_interval: Duration,
    pub stale_after: chrono::Duration,
    pub api_url: Option<Url>,
    pub log_level: LevelFilter,
}

impl Settings {
    /// Reads settings from the environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup("TELOXIDE_TOKEN")
            .or_else(|| lookup("TOKEN"))
            .filter(|token| !token.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let questions_path = lookup("QUESTIONS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_QUESTIONS_PATH));

        let poll_timeout = parse_or(&lookup, "POLL_TIMEOUT_SECS", DEFAULT_POLL_TIMEOUT_SECS)?;
        let poll_interval = Duration::from_secs(parse_or(
            &lookup,
            "POLL_INTERVAL_SECS",
            DEFAULT_POLL_INTERVAL_SECS,
        )?);
        let stale_after = stale_threshold(&lookup)?;
        let api_url = lookup("TELEGRAM_API_URL")
            .map(|raw| parse::<Url>("TELEGRAM_API_URL", raw))
            .transpose()?;
        let log_level = parse_or(&lookup, "LOG_LEVEL", LevelFilter::INFO)?;

        Ok(Self {
            token,
            questions_path,
            poll_timeout,
            poll_interval,
            stale_after,
            api_url,
            log_level,
        })
    }
}

/// Non-negative, at most a year.
fn stale_threshold<F>(lookup: &F) -> Result<chrono::Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: i64 = parse_or(lookup, "STALE_AFTER_SECS", DEFAULT_STALE_AFTER_SECS)?;
    (0..=MAX_STALE_AFTER_SECS)
        .contains(&secs)
        .then(|| chrono::Duration::try_seconds(secs))
        .flatten()
        .ok_or_else(|| ConfigError::Invalid {
            var: "STALE_AFTER_SECS",
            value: secs.to_string(),
        })
}

fn parse_or<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(var) {
        Some(raw) => parse(var, raw),
        None => Ok(default),
    }
}

fn parse<T: FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { var, value: raw })
}
