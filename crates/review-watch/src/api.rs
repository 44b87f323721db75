//! Review API client.
//!
//! Performs the single GET request each poll cycle makes. The decoded body is
//! returned as raw JSON; shape checks live in [`crate::response`].

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::{Config, Credentials};
use crate::error::{Result, WatchError};

/// Source of review API responses.
///
/// Implemented by [`ApiClient`] for production and by in-memory fakes in tests.
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    /// Fetches every homework update newer than `from_date` (unix seconds).
    async fn fetch(&self, from_date: i64) -> Result<Value>;
}

/// HTTP client for the homework status endpoint.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl ApiClient {
    /// Creates a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns `WatchError::ConfigValidationError` if the HTTP client cannot
    /// be built.
    pub fn new(config: &Config, credentials: &Credentials) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| {
                WatchError::config_validation(
                    format!("cannot build HTTP client: {e}"),
                    "Check the TLS setup of the host",
                )
            })?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: credentials.practicum_token.clone(),
        })
    }

    /// Returns the endpoint this client queries.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn connection_error(&self, from_date: i64, reason: impl Into<String>) -> WatchError {
        WatchError::connection(
            &self.endpoint,
            masked_headers(),
            format!("from_date={from_date}"),
            reason,
        )
    }
}

/// Longest error body excerpt written to the log.
const MAX_BODY_EXCERPT: usize = 512;

/// Cuts `body` down to `MAX_BODY_EXCERPT` characters.
fn body_excerpt(body: &str) -> &str {
    body.char_indices()
        .nth(MAX_BODY_EXCERPT)
        .map_or(body, |(end, _)| &body[..end])
}

/// Headers as they appear in logs and errors.
fn masked_headers() -> &'static str {
    "Authorization: OAuth ***"
}

#[async_trait]
impl HomeworkSource for ApiClient {
    #[tracing::instrument(name = "fetch", skip(self))]
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        tracing::info!(
            endpoint = %self.endpoint,
            headers = masked_headers(),
            from_date,
            "Requesting homework statuses"
        );

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(|e| self.connection_error(from_date, e.to_string()))?;

        let status = response.status();
        if status != StatusCode::OK {
            // The body stays out of the error so repeated failures alert once.
            match response.text().await {
                Ok(body) => tracing::debug!(
                    %status,
                    body = body_excerpt(&body),
                    "Review API returned an error body"
                ),
                Err(e) => tracing::debug!(%status, error = %e, "Cannot read error body"),
            }
            return Err(self.connection_error(from_date, format!("unexpected status {status}")));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| self.connection_error(from_date, format!("undecodable body: {e}")))
    }
}
