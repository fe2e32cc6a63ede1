use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::types::types::{StatusReport, TransferError};

/// Polls `/process-status/{vendor}/{filename}` until the service reports a
/// terminal state or the session is cancelled.
///
/// Fixed-delay, not fixed-rate: the next tick is scheduled only after the
/// previous response has been handled, so a slow server never causes
/// overlapping status requests.
pub struct StatusPoller {
    client: Arc<Client>,
    base_url: String,
    interval: Duration,
    max_attempts: Option<u32>,
    transient_retries: u32,
    cancel_token: CancellationToken,
}

impl StatusPoller {
    pub fn new(
        client: Arc<Client>,
        base_url: impl Into<String>,
        interval: Duration,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            interval,
            max_attempts: None,
            transient_retries: 0,
            cancel_token,
        }
    }

    /// Bound the number of status checks. Unset, the loop runs until the
    /// server answers terminally — the upstream service has no bound either.
    pub fn with_max_attempts(mut self, attempts: Option<u32>) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Retry an individual failed tick this many times before giving up.
    /// Zero (the default) means one unreachable or malformed response ends
    /// the whole poll loop.
    pub fn with_transient_retries(mut self, retries: u32) -> Self {
        self.transient_retries = retries;
        self
    }

    /// Run the poll loop. Emits `(fraction, label)` through `on_sample` for
    /// every non-terminal tick.
    ///
    /// Cancellation is cooperative: a cancel wakes the inter-poll sleep
    /// immediately, while a tick already in flight finishes and has its
    /// result discarded.
    pub async fn poll_until_terminal(
        &self,
        vendor: &str,
        filename: &str,
        on_sample: impl Fn(f64, &str),
    ) -> Result<StatusReport, TransferError> {
        let url = format!("{}/process-status/{}/{}", self.base_url, vendor, filename);
        let mut attempts: u32 = 0;
        let mut failures_in_a_row: u32 = 0;

        loop {
            if self.cancel_token.is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            let outcome = self.query_status(&url).await;

            // A cancel that landed while the request was in flight wins.
            if self.cancel_token.is_cancelled() {
                return Err(TransferError::Cancelled);
            }

            match outcome {
                Ok(report) => {
                    failures_in_a_row = 0;
                    if report.is_terminal_error() {
                        let message = report
                            .error
                            .unwrap_or_else(|| "Processing failed".to_string());
                        return Err(TransferError::ProcessingFailed(message));
                    }
                    if report.is_terminal_success() {
                        log::info!("[poll] {}/{} reached terminal success", vendor, filename);
                        return Ok(report);
                    }
                    let label = if report.status.is_empty() {
                        "Processing"
                    } else {
                        report.status.as_str()
                    };
                    on_sample(report.progress.clamp(0.0, 1.0), label);
                }
                Err(e) => {
                    failures_in_a_row += 1;
                    if failures_in_a_row > self.transient_retries {
                        return Err(e);
                    }
                    log::warn!(
                        "[poll] tick failed ({}/{}), retrying: {}",
                        failures_in_a_row,
                        self.transient_retries,
                        e
                    );
                }
            }

            attempts += 1;
            if let Some(max) = self.max_attempts {
                if attempts >= max {
                    return Err(TransferError::PollBudgetExceeded(max));
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.cancel_token.cancelled() => return Err(TransferError::Cancelled),
            }
        }
    }

    async fn query_status(&self, url: &str) -> Result<StatusReport, TransferError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TransferError::PollUnreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::PollUnreachable(format!(
                "status endpoint returned {}",
                status
            )));
        }

        response
            .json::<StatusReport>()
            .await
            .map_err(|e| TransferError::PollUnreachable(e.to_string()))
    }
}
