//! Configuration types for the review watcher.
//!
//! Secrets come from the environment and are held in [`Credentials`].
//! Everything else lives in [`Config`], which may be overridden from an
//! optional `review-watch.json` file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, WatchError};

/// The default config file name.
const CONFIG_FILE_NAME: &str = "review-watch.json";

/// The default environment file name.
const ENV_FILE_NAME: &str = ".env";

/// Environment variable holding the review API token.
pub const PRACTICUM_TOKEN_VAR: &str = "PRACTICUM_TOKEN";

/// Environment variable holding the chat bot token.
pub const TELEGRAM_TOKEN_VAR: &str = "TELEGRAM_TOKEN";

/// Environment variable holding the destination chat id.
pub const CHAT_ID_VAR: &str = "TG_CHAT_ID";

/// Wait between two poll cycles.
pub const RETRY_PERIOD: Duration = Duration::from_secs(600);

/// Default review API endpoint.
fn default_endpoint() -> String {
    "https://practicum.yandex.ru/api/user_api/homework_statuses/".to_string()
}

/// Default Telegram Bot API base URL.
fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

/// Default request timeout in seconds.
const fn default_request_timeout() -> u64 {
    30
}

/// Default log file path.
fn default_log_file() -> String {
    "log.txt".to_string()
}

// ============================================================================
// Credentials
// ============================================================================

/// The three secrets the watcher needs before it may start polling.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Token sent to the review API as `Authorization: OAuth <token>`.
    pub practicum_token: String,
    /// Chat bot token.
    pub telegram_token: String,
    /// Destination chat id.
    pub chat_id: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("practicum_token", &"***")
            .field("telegram_token", &"***")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl Credentials {
    /// Reads the credentials from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::MissingCredentials` naming every variable that is
    /// unset or blank.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads the credentials through an arbitrary variable lookup.
    ///
    /// Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        tracing::info!("Checking required credentials");

        let mut missing = Vec::new();
        let mut read = |name: &str| match lookup(name) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(name.to_string());
                String::new()
            }
        };

        let practicum_token = read(PRACTICUM_TOKEN_VAR);
        let telegram_token = read(TELEGRAM_TOKEN_VAR);
        let chat_id = read(CHAT_ID_VAR);

        if !missing.is_empty() {
            return Err(WatchError::missing_credentials(missing));
        }

        Ok(Self {
            practicum_token,
            telegram_token,
            chat_id,
        })
    }
}

/// Loads `KEY=value` pairs from an environment file into the process environment.
///
/// Variables that are already set keep their values. With no explicit path,
/// `.env` is searched for in the current directory and its parents, and its
/// absence is not an error. Returns the file that was loaded.
///
/// # Errors
///
/// Returns `WatchError::EnvFile` if an explicit file is missing, or if any
/// file found cannot be parsed.
pub fn load_env_file(path: Option<&Path>) -> Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenv::from_path(path).map(|()| path.to_path_buf()),
        None => dotenv::dotenv(),
    };

    match loaded {
        Ok(loaded) => Ok(Some(loaded)),
        Err(e) if path.is_none() && e.not_found() => Ok(None),
        Err(e) => Err(WatchError::env_file(
            path.map_or_else(|| PathBuf::from(ENV_FILE_NAME), Path::to_path_buf),
            e.to_string(),
        )),
    }
}

// ============================================================================
// Config
// ============================================================================

/// Non-secret settings for the watcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Review API endpoint queried every cycle.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Base URL of the Telegram Bot API.
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,

    /// Timeout for each outbound HTTP request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Append-only log file written alongside stdout.
    #[serde(default = "default_log_file")]
    pub log_file: String,

    /// Wait between cycles. Fixed in production; tests shorten it.
    #[serde(skip, default = "retry_period")]
    pub retry_period: Duration,
}

const fn retry_period() -> Duration {
    RETRY_PERIOD
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            telegram_api_url: default_telegram_api_url(),
            request_timeout_secs: default_request_timeout(),
            log_file: default_log_file(),
            retry_period: RETRY_PERIOD,
        }
    }
}

impl Config {
    /// Loads configuration from the current working directory.
    ///
    /// Looks for `review-watch.json` in the current directory and falls back
    /// to defaults when it is absent.
    pub fn load() -> Result<Self> {
        let current_dir = std::env::current_dir().map_err(|e| {
            WatchError::config_parse(
                "<current directory>",
                format!("cannot determine current directory: {e}"),
            )
        })?;
        Self::load_from_file(&current_dir.join(CONFIG_FILE_NAME))
    }

    /// Loads configuration from a specific file path.
    ///
    /// If the file does not exist, returns default configuration.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::ConfigParseError` if the file exists but is not
    /// valid JSON, and `WatchError::ConfigValidationError` if a value is
    /// out of range.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let config = Self::default();
                config.validate()?;
                return Ok(config);
            }
            Err(e) => {
                return Err(WatchError::config_parse(
                    path,
                    format!("failed to read file: {e}"),
                ));
            }
        };

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| WatchError::config_parse(path, e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.trim().is_empty() {
            return Err(WatchError::config_validation(
                "endpoint must not be empty",
                "Provide the review API URL in your review-watch.json",
            ));
        }

        if self.telegram_api_url.trim().is_empty() {
            return Err(WatchError::config_validation(
                "telegramApiUrl must not be empty",
                "Remove telegramApiUrl from review-watch.json to use the default",
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(WatchError::config_validation(
                "requestTimeoutSecs must be greater than 0",
                "Set requestTimeoutSecs to at least 1 second in your review-watch.json",
            ));
        }

        if self.log_file.trim().is_empty() {
            return Err(WatchError::config_validation(
                "logFile must not be empty",
                "Provide a log file path in your review-watch.json",
            ));
        }

        Ok(())
    }

    /// Returns the request timeout as a `Duration`.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Overrides the wait between cycles.
    #[must_use]
    pub const fn with_retry_period(mut self, retry_period: Duration) -> Self {
        self.retry_period = retry_period;
        self
    }
}
