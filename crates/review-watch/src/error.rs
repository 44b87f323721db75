//! Error types for the review watcher.
//!
//! This module defines the error hierarchy for every watcher operation,
//! including credential and configuration loading, the review API request,
//! payload validation, status formatting, and chat delivery.

use std::path::PathBuf;

/// A specialized `Result` type for review watcher operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that can occur while polling and notifying.
///
/// Variants are grouped by the stage that raises them. Runtime variants are
/// classified by [`WatchError::disposition`] into errors that must reach the
/// chat and errors that are only logged.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    // ========================================================================
    // Startup Errors
    // ========================================================================
    /// One or more required credentials are missing from the environment.
    #[error("Missing required environment variables: {}\n\nSuggestion: Export them or add them to the service environment", .names.join(", "))]
    MissingCredentials {
        /// Names of the missing variables.
        names: Vec<String>,
    },

    /// The environment file is missing, unreadable, or malformed.
    #[error("Cannot load environment file '{path}': {message}\n\nSuggestion: Use KEY=value lines in the .env file")]
    EnvFile {
        /// Path to the environment file.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// Invalid JSON syntax in the configuration file.
    #[error("Invalid JSON in config file '{path}': {message}\n\nSuggestion: Validate your review-watch.json with a JSON linter")]
    ConfigParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// Configuration validation failed.
    #[error("Invalid configuration: {message}\n\nSuggestion: {suggestion}")]
    ConfigValidationError {
        /// Description of the validation failure.
        message: String,
        /// Actionable suggestion for the user.
        suggestion: String,
    },

    // ========================================================================
    // Review API Errors
    // ========================================================================
    /// The review API could not be reached or answered with a non-OK status.
    #[error("Review API request failed ({reason}): endpoint = {endpoint}, headers = {headers}, params = {params}")]
    Connection {
        /// The requested URL.
        endpoint: String,
        /// Request headers with secrets masked.
        headers: String,
        /// Query parameters of the request.
        params: String,
        /// What went wrong.
        reason: String,
    },

    // ========================================================================
    // Payload Errors
    // ========================================================================
    /// A value in the payload has the wrong JSON type.
    #[error("Unexpected type for {what}: expected {expected}, found {found}")]
    UnexpectedType {
        /// Which part of the payload was inspected.
        what: String,
        /// The expected JSON type.
        expected: String,
        /// The JSON type actually received.
        found: String,
    },

    /// The response lacks one of its required top-level keys.
    ///
    /// Seen in normal operation before any submission exists, so it is
    /// suppressed rather than alerted.
    #[error("Empty response from review API: key '{missing}' is absent")]
    EmptyResponse {
        /// The first required key that was not found.
        missing: String,
    },

    /// A homework record lacks a required key.
    #[error("Key '{key}' is missing from homework record")]
    MissingKey {
        /// The missing key.
        key: String,
    },

    /// A homework record carries a status that has no verdict.
    #[error("Unknown homework status '{status}'")]
    UnknownStatus {
        /// The unrecognized status code.
        status: String,
    },

    // ========================================================================
    // Delivery Errors
    // ========================================================================
    /// The chat transport rejected or failed to deliver a message.
    #[error("Failed to deliver chat message: {message}")]
    Delivery {
        /// Description of the delivery failure.
        message: String,
    },
}

/// How a runtime failure is reported to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Logged only, never sent to the chat.
    Suppressed,
    /// Logged and sent to the chat once per distinct message.
    Surfaced,
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Suppressed => write!(f, "suppressed"),
            Self::Surfaced => write!(f, "surfaced"),
        }
    }
}

impl WatchError {
    /// Creates a new `MissingCredentials` error.
    #[must_use]
    pub fn missing_credentials<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MissingCredentials {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a new `EnvFile` error.
    #[must_use]
    pub fn env_file(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::EnvFile {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigParseError` with the given path and message.
    #[must_use]
    pub fn config_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ConfigParseError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Creates a new `ConfigValidationError` with the given message and suggestion.
    #[must_use]
    pub fn config_validation(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::ConfigValidationError {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Creates a new `Connection` error.
    #[must_use]
    pub fn connection(
        endpoint: impl Into<String>,
        headers: impl Into<String>,
        params: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            headers: headers.into(),
            params: params.into(),
            reason: reason.into(),
        }
    }

    /// Creates a new `UnexpectedType` error.
    #[must_use]
    pub fn unexpected_type(
        what: impl Into<String>,
        expected: impl Into<String>,
        found: impl Into<String>,
    ) -> Self {
        Self::UnexpectedType {
            what: what.into(),
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Creates a new `EmptyResponse` error.
    #[must_use]
    pub fn empty_response(missing: impl Into<String>) -> Self {
        Self::EmptyResponse {
            missing: missing.into(),
        }
    }

    /// Creates a new `MissingKey` error.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Creates a new `UnknownStatus` error.
    #[must_use]
    pub fn unknown_status(status: impl Into<String>) -> Self {
        Self::UnknownStatus {
            status: status.into(),
        }
    }

    /// Creates a new `Delivery` error.
    #[must_use]
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery {
            message: message.into(),
        }
    }

    /// Returns how this error should be reported when it ends a poll cycle.
    ///
    /// Empty responses carry nothing new to say and delivery failures mean the
    /// chat is unreachable, so both stay in the log.
    #[must_use]
    pub const fn disposition(&self) -> Disposition {
        match self {
            Self::EmptyResponse { .. } | Self::Delivery { .. } => Disposition::Suppressed,
            _ => Disposition::Surfaced,
        }
    }
}

/// Names the JSON type of a value for `UnexpectedType` messages.
pub(crate) const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
