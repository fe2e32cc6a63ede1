use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle phase of a transfer session.
///
/// Phases move strictly Idle → Uploading → Polling → {Completed | Failed};
/// Cancelled is reachable from Uploading or Polling only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    Idle,
    Uploading,
    Polling,
    Completed,
    Failed,
    Cancelled,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed | Phase::Cancelled)
    }
}

/// Status string the service reports when processing finished successfully.
pub const STATUS_COMPLETED: &str = "Completed!";

/// Status string the service reports when processing failed.
pub const STATUS_ERROR: &str = "Error";

/// Acknowledgment body of `POST /upload`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadAck {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "downloadUrl")]
    pub download_url: Option<String>,
}

/// Body of `GET /process-status/{vendor}/{filename}`.
#[derive(Debug, Clone, Deserialize)]
pub struct StatusReport {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default, rename = "downloadUrl")]
    pub download_url: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl StatusReport {
    /// The service signals completion either with the status sentinel or by
    /// the numeric progress reaching 1.0. Both checks must be kept — the
    /// upstream contract is ambiguous about which one it emits.
    pub fn is_terminal_success(&self) -> bool {
        self.status == STATUS_COMPLETED || self.progress >= 1.0
    }

    pub fn is_terminal_error(&self) -> bool {
        self.status == STATUS_ERROR || self.error.is_some()
    }
}

/// Ephemeral progress sample emitted by the upload channel or the poller.
/// Never persisted; only projected through the sink and handed to observers.
#[derive(Debug, Clone)]
pub struct ProgressSample {
    pub phase: Phase,
    /// Fraction of the *current phase* completed, 0.0–1.0.
    pub fraction: f64,
    /// Optional human label; empty means "use the default for this phase".
    pub label: String,
}

/// Terminal result of a successful session.
#[derive(Debug, Clone, Serialize)]
pub struct CompletedTransfer {
    pub vendor: String,
    pub filename: String,
    /// URL the converted artifact can be retrieved from.
    pub download_ref: String,
}

/// Configuration for one transfer session.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// Base URL of the conversion service.
    pub base_url: String,
    /// Share of the overall progress range the upload phase owns. The poll
    /// phase owns the remainder. Upload time is usually small next to server
    /// processing, but must still show visible early motion.
    pub upload_weight: f64,
    /// Fixed delay between status polls.
    pub poll_interval: Duration,
    /// Bound on the number of status polls. `None` polls until the server
    /// answers terminally, which is the upstream behavior.
    pub max_poll_attempts: Option<u32>,
    /// How many times an individual failed status tick is retried before the
    /// session fails. Zero means one bad tick ends the session.
    pub transient_poll_retries: u32,
}

impl TransferConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            upload_weight: 0.3,
            poll_interval: Duration::from_secs(1),
            max_poll_attempts: None,
            transient_poll_retries: 0,
        }
    }

    pub fn with_upload_weight(mut self, weight: f64) -> Self {
        self.upload_weight = weight.clamp(0.0, 1.0);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.max_poll_attempts = Some(attempts);
        self
    }

    pub fn with_transient_poll_retries(mut self, retries: u32) -> Self {
        self.transient_poll_retries = retries;
        self
    }
}

/// Errors a transfer can terminate with.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Missing file or empty vendor — rejected before any I/O.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport failure or non-success acknowledgment during upload.
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// The service reported an error while processing the file.
    #[error("processing failed: {0}")]
    ProcessingFailed(String),

    /// The status endpoint was unreachable or returned a malformed response.
    #[error("status check failed: {0}")]
    PollUnreachable(String),

    /// The configured poll bound ran out before a terminal status arrived.
    #[error("no terminal status after {0} polls")]
    PollBudgetExceeded(u32),

    /// Retrieving the converted artifact failed.
    #[error("artifact download failed: {0}")]
    DownloadFailed(String),

    #[error("disk error: {0}")]
    Disk(std::io::Error),

    #[error("transfer cancelled")]
    Cancelled,
}

impl TransferError {
    /// Message suitable for direct display: the server-supplied text where
    /// one exists, else a generic message for the error category.
    pub fn user_message(&self) -> String {
        match self {
            TransferError::InvalidInput(m)
            | TransferError::UploadFailed(m)
            | TransferError::ProcessingFailed(m)
            | TransferError::PollUnreachable(m)
            | TransferError::DownloadFailed(m)
                if !m.is_empty() =>
            {
                m.clone()
            }
            TransferError::InvalidInput(_) => "A file and a vendor name are required".to_string(),
            TransferError::UploadFailed(_) => "Upload failed".to_string(),
            TransferError::ProcessingFailed(_) => "Processing failed".to_string(),
            TransferError::PollUnreachable(_) => {
                "Could not reach the status endpoint".to_string()
            }
            TransferError::PollBudgetExceeded(n) => {
                format!("Processing did not finish after {} status checks", n)
            }
            TransferError::DownloadFailed(_) => "Artifact download failed".to_string(),
            TransferError::Disk(e) => e.to_string(),
            TransferError::Cancelled => "Transfer cancelled".to_string(),
        }
    }
}
