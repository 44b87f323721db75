//! The poll-detect-notify loop.
//!
//! Each cycle fetches review statuses newer than the current poll window,
//! validates the payload, compares the most recent homework with what was
//! last reported, and notifies the chat when it changed. Failures never end
//! the loop: suppressed ones are logged, surfaced ones are logged and alerted
//! once per distinct message.

use std::future::Future;
use std::time::Duration;

use chrono::Utc;

use crate::api::HomeworkSource;
use crate::error::{Disposition, Result, WatchError};
use crate::notifier::Notifier;
use crate::response::{check_response, current_date};
use crate::verdict::HomeworkUpdate;

/// Prefix of every failure alert sent to the chat.
pub const ALERT_PREFIX: &str = "Сбой в работе программы";

// ============================================================================
// ReportState
// ============================================================================

/// What has already been said in the chat.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportState {
    /// Last homework name and status code that was notified.
    pub last_update: Option<(String, String)>,
    /// Last failure alert that was delivered.
    pub last_alert: Option<String>,
}

impl ReportState {
    /// Returns `true` if `update` differs from the last notified pair.
    #[must_use]
    pub fn is_new(&self, update: &HomeworkUpdate) -> bool {
        self.last_update
            .as_ref()
            .map_or(true, |(name, status)| {
                name != &update.name || status != update.status.code()
            })
    }

    /// Records `update` as notified.
    pub fn commit_update(&mut self, update: &HomeworkUpdate) {
        self.last_update = Some((update.name.clone(), update.status.code().to_string()));
    }
}

// ============================================================================
// CycleOutcome
// ============================================================================

/// Result of a single poll cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A changed status was delivered to the chat.
    Notified {
        /// The delivered notification.
        text: String,
    },
    /// The most recent homework matches what was last notified.
    Unchanged,
    /// The response carried no homework records.
    NoUpdates,
    /// A suppressed failure was logged without alerting.
    Suppressed {
        /// The logged failure.
        reason: String,
    },
    /// A surfaced failure was alerted in the chat.
    Alerted {
        /// The delivered alert.
        message: String,
    },
    /// A surfaced failure was logged but not alerted, because the same alert
    /// was already delivered or the alert itself could not be delivered.
    AlertSkipped {
        /// The alert that was not sent.
        message: String,
    },
}

// ============================================================================
// PollLoop
// ============================================================================

/// Orchestrates fetching, validation, diffing and notification.
pub struct PollLoop<S, N> {
    source: S,
    notifier: N,
    window: i64,
    report: ReportState,
    retry_period: Duration,
}

impl<S: HomeworkSource, N: Notifier> PollLoop<S, N> {
    /// Creates a loop whose first request asks for updates since now.
    pub fn new(source: S, notifier: N, retry_period: Duration) -> Self {
        Self::with_window(source, notifier, retry_period, Utc::now().timestamp())
    }

    /// Creates a loop starting from an explicit poll window.
    pub fn with_window(source: S, notifier: N, retry_period: Duration, window: i64) -> Self {
        Self {
            source,
            notifier,
            window,
            report: ReportState::default(),
            retry_period,
        }
    }

    /// Lower bound (unix seconds) of the next request.
    pub const fn window(&self) -> i64 {
        self.window
    }

    /// What has been reported so far.
    pub const fn report(&self) -> &ReportState {
        &self.report
    }

    /// Borrows the notifier.
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Runs cycles until `shutdown` resolves.
    ///
    /// The wait between cycles races `shutdown`; a cycle in flight is always
    /// finished first.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            window = self.window,
            retry_period_secs = self.retry_period.as_secs(),
            "Poll loop started"
        );
        tokio::pin!(shutdown);

        loop {
            let outcome = self.run_cycle().await;
            tracing::debug!(?outcome, window = self.window, "Cycle finished");

            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping poll loop");
                    break;
                }
                () = tokio::time::sleep(self.retry_period) => {}
            }
        }
    }

    /// Performs one cycle and applies the failure policy.
    #[tracing::instrument(name = "run_cycle", skip(self), fields(window = self.window))]
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        match self.poll().await {
            Ok(outcome) => {
                self.report.last_alert = None;
                outcome
            }
            Err(e) => self.handle_failure(&e).await,
        }
    }

    async fn poll(&mut self) -> Result<CycleOutcome> {
        let response = self.source.fetch(self.window).await?;
        self.window = current_date(&response).unwrap_or_else(|| Utc::now().timestamp());

        let homeworks = check_response(&response)?;
        let Some(latest) = homeworks.first() else {
            tracing::debug!("No new statuses");
            return Ok(CycleOutcome::NoUpdates);
        };

        let update = HomeworkUpdate::from_record(latest)?;
        if !self.report.is_new(&update) {
            tracing::debug!(name = %update.name, status = %update.status, "Status unchanged");
            return Ok(CycleOutcome::Unchanged);
        }

        let text = update.message();
        self.notifier.send(&text).await?;
        self.report.commit_update(&update);
        tracing::info!(name = %update.name, status = %update.status, "Status change notified");

        Ok(CycleOutcome::Notified { text })
    }

    async fn handle_failure(&mut self, error: &WatchError) -> CycleOutcome {
        match error.disposition() {
            Disposition::Suppressed => {
                tracing::error!(error = %error, disposition = %Disposition::Suppressed, "Cycle failed");
                CycleOutcome::Suppressed {
                    reason: error.to_string(),
                }
            }
            Disposition::Surfaced => {
                let message = format!("{ALERT_PREFIX}: {error}");
                tracing::error!(error = %error, disposition = %Disposition::Surfaced, "Cycle failed");

                if self.report.last_alert.as_deref() == Some(message.as_str()) {
                    tracing::debug!("Alert already delivered, skipping");
                    return CycleOutcome::AlertSkipped { message };
                }

                match self.notifier.send(&message).await {
                    Ok(()) => {
                        self.report.last_alert = Some(message.clone());
                        CycleOutcome::Alerted { message }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Alert could not be delivered");
                        CycleOutcome::AlertSkipped { message }
                    }
                }
            }
        }
    }
}
