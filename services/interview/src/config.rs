//! Application Configuration Module
//!
//! Loads the interview service settings from environment variables. The
//! websocket service reuses this and adds its own bind address.

use interview_core::SettleStrategy;
use interview_core::events::SessionTarget;
use interview_core::question::KeywordClassifier;
use secrecy::{ExposeSecret, SecretString};
use std::env;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_VAPI_BASE_URL: &str = "https://api.vapi.ai";
pub const DEFAULT_SETTLE_MS: u64 = 500;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment.
#[derive(Debug)]
pub struct Config {
    pub vapi_api_key: SecretString,
    pub vapi_base_url: String,
    pub assistant_id: Option<String>,
    pub settle: SettleStrategy,
    pub question_keywords: Option<Vec<String>>,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `VAPI_API_KEY`: Your Vapi private key. Required.
    /// *   `VAPI_ASSISTANT_ID`: (Optional) The assistant to interview with. Can also be given on the command line.
    /// *   `VAPI_BASE_URL`: (Optional) Defaults to "https://api.vapi.ai".
    /// *   `RESTART_SETTLE_MS`: (Optional) Delay between stopping and restarting a call. Defaults to 500.
    /// *   `RESTART_SETTLE_MODE`: (Optional) "fixed" waits the full delay, "ack" restarts as soon as the old call ends. Defaults to "fixed".
    /// *   `QUESTION_KEYWORDS`: (Optional) Comma-separated words that mark a coding question.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. This is useful for local development and is ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let vapi_api_key = lookup("VAPI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingVar("VAPI_API_KEY".to_string()))?;

        let vapi_base_url =
            lookup("VAPI_BASE_URL").unwrap_or_else(|| DEFAULT_VAPI_BASE_URL.to_string());
        let assistant_id = lookup("VAPI_ASSISTANT_ID").filter(|id| !id.trim().is_empty());

        let settle_ms = match lookup("RESTART_SETTLE_MS") {
            Some(value) => value.trim().parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue(
                    "RESTART_SETTLE_MS".to_string(),
                    format!("'{}' is not a number of milliseconds", value),
                )
            })?,
            None => DEFAULT_SETTLE_MS,
        };
        let delay = Duration::from_millis(settle_ms);
        let mode = lookup("RESTART_SETTLE_MODE").unwrap_or_else(|| "fixed".to_string());
        let settle = match mode.trim().to_lowercase().as_str() {
            "fixed" => SettleStrategy::Fixed(delay),
            "ack" => SettleStrategy::TeardownAck { timeout: delay },
            _ => {
                return Err(ConfigError::InvalidValue(
                    "RESTART_SETTLE_MODE".to_string(),
                    format!("'{}' is not one of 'fixed' or 'ack'", mode),
                ));
            }
        };

        let question_keywords = lookup("QUESTION_KEYWORDS").map(|value| {
            value
                .split(',')
                .map(|word| word.trim().to_string())
                .filter(|word| !word.is_empty())
                .collect::<Vec<_>>()
        });

        // Configure logging level from RUST_LOG, with a sensible default.
        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            vapi_api_key: SecretString::from(vapi_api_key),
            vapi_base_url,
            assistant_id,
            settle,
            question_keywords,
            log_level,
        })
    }

    /// The assistant to call: `preferred` if given, else `VAPI_ASSISTANT_ID`.
    pub fn session_target(&self, preferred: Option<String>) -> Result<SessionTarget, ConfigError> {
        preferred
            .or_else(|| self.assistant_id.clone())
            .map(SessionTarget::new)
            .ok_or_else(|| ConfigError::MissingVar("VAPI_ASSISTANT_ID".to_string()))
    }

    pub fn classifier(&self) -> KeywordClassifier {
        match &self.question_keywords {
            Some(words) if !words.is_empty() => KeywordClassifier::new(words.iter().map(String::as_str)),
            _ => KeywordClassifier::default(),
        }
    }

    pub fn vapi_config(&self) -> vapi_realtime::Config {
        vapi_realtime::Config::builder()
            .with_base_url(&self.vapi_base_url)
            .with_api_key(self.vapi_api_key.expose_secret())
            .build()
    }
}
