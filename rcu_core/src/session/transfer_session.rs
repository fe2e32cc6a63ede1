use std::path::Path;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

use crate::poller::status_poller::StatusPoller;
use crate::progress::notifier::ProgressNotifier;
use crate::progress::observer::ProgressObserver;
use crate::telemetry;
use crate::transport::upload_channel::UploadChannel;
use crate::types::types::{
    CompletedTransfer, Phase, ProgressSample, TransferConfig, TransferError,
};

/// Cloneable cancel surface for a running session.
///
/// Wraps the session's cancellation token; cancelling is idempotent and a
/// no-op once the session has reached a terminal phase.
#[derive(Clone)]
pub struct CancelHandle {
    token: CancellationToken,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }
}

/// Orchestrates one upload+conversion attempt.
///
/// Phases move strictly Idle → Uploading → Polling → {Completed | Failed};
/// Cancelled is reachable from Uploading or Polling. Whatever the exit path,
/// the poll token is cancelled and the notifier task is awaited before
/// `start` returns, so no poll loop or progress task outlives the session.
pub struct TransferSession {
    config: TransferConfig,
    client: Arc<Client>,
    phase: Arc<RwLock<Phase>>,
    cancel_token: CancellationToken,
    notifier: ProgressNotifier,
}

impl TransferSession {
    pub fn new(config: TransferConfig) -> Self {
        // Tuned HTTP client shared by the upload, the poll loop and telemetry.
        let client = Arc::new(
            Client::builder()
                .connect_timeout(std::time::Duration::from_secs(10))
                .tcp_nodelay(true)
                .build()
                .expect("failed to build HTTP client"),
        );
        let notifier = ProgressNotifier::new(config.upload_weight);
        Self {
            config,
            client,
            phase: Arc::new(RwLock::new(Phase::Idle)),
            cancel_token: CancellationToken::new(),
            notifier,
        }
    }

    /// Register a progress observer. Must be called before `start()`.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.notifier.add_observer(observer);
    }

    /// Handle for cancelling this session from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            token: self.cancel_token.clone(),
        }
    }

    /// Cancel the session. Idempotent; after a terminal phase it is a no-op.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    pub async fn current_phase(&self) -> Phase {
        *self.phase.read().await
    }

    /// Shared phase cell (for callers that outlive the session value).
    pub fn phase(&self) -> &Arc<RwLock<Phase>> {
        &self.phase
    }

    /// The session's HTTP client, for follow-up calls like artifact fetches.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Run the full transfer lifecycle: upload, then poll until terminal.
    ///
    /// Resolves with the download reference on success or the first typed
    /// failure otherwise. A session runs at most once, so at most one poll
    /// loop ever exists per session.
    pub async fn start(
        &mut self,
        file: &Path,
        vendor: &str,
    ) -> Result<CompletedTransfer, TransferError> {
        // Precondition checks — fail before any network I/O.
        let vendor = vendor.trim();
        if vendor.is_empty() {
            return Err(TransferError::InvalidInput(
                "vendor name must not be empty".to_string(),
            ));
        }
        if !file.is_file() {
            return Err(TransferError::InvalidInput(format!(
                "no such file: {}",
                file.display()
            )));
        }
        {
            let mut phase = self.phase.write().await;
            if *phase != Phase::Idle {
                return Err(TransferError::InvalidInput(
                    "session already started".to_string(),
                ));
            }
            *phase = Phase::Uploading;
        }

        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        // Progress channel: samples in, observer callbacks out.
        let (progress_tx, progress_rx) = mpsc::channel(256);

        // Take the notifier out so we can move it into the background task.
        // A fresh empty notifier is left in place so the field stays valid.
        let notifier = std::mem::replace(
            &mut self.notifier,
            ProgressNotifier::new(self.config.upload_weight),
        );
        let notifier_handle = tokio::spawn(async move {
            notifier.run(progress_rx).await;
        });

        let result = self.run_transfer(file, vendor, &filename, &progress_tx).await;

        // Release the poll token on every exit path, then close the channel
        // (or push the failure into it) so the notifier task can finish.
        self.cancel_token.cancel();
        let terminal_phase = match &result {
            Ok(_) => Phase::Completed,
            Err(TransferError::Cancelled) => Phase::Cancelled,
            Err(_) => Phase::Failed,
        };
        if let Err(e) = &result {
            let _ = progress_tx.try_send(Err(e.user_message()));
        }
        drop(progress_tx);
        let _ = notifier_handle.await;

        *self.phase.write().await = terminal_phase;

        result
    }

    async fn run_transfer(
        &self,
        file: &Path,
        vendor: &str,
        filename: &str,
        progress_tx: &mpsc::Sender<Result<ProgressSample, String>>,
    ) -> Result<CompletedTransfer, TransferError> {
        // Upload phase.
        let channel = UploadChannel::new(Arc::clone(&self.client), self.config.base_url.clone());
        let upload_tx = progress_tx.clone();
        let ack = channel
            .upload(file, vendor, move |fraction| {
                let _ = upload_tx.try_send(Ok(ProgressSample {
                    phase: Phase::Uploading,
                    fraction,
                    label: String::new(),
                }));
            })
            .await?;

        // A cancel that landed while the upload was in flight wins; the
        // acknowledgment is discarded.
        if self.cancel_token.is_cancelled() {
            return Err(TransferError::Cancelled);
        }

        if !ack.success {
            let message = ack
                .message
                .unwrap_or_else(|| "upload rejected".to_string());
            return Err(TransferError::UploadFailed(message));
        }

        // The acknowledgment pins the upload phase at its full weight.
        let _ = progress_tx.try_send(Ok(ProgressSample {
            phase: Phase::Uploading,
            fraction: 1.0,
            label: String::new(),
        }));

        *self.phase.write().await = Phase::Polling;
        log::info!("upload acknowledged for {}/{}, polling status", vendor, filename);

        // Poll phase.
        let poller = StatusPoller::new(
            Arc::clone(&self.client),
            self.config.base_url.clone(),
            self.config.poll_interval,
            self.cancel_token.clone(),
        )
        .with_max_attempts(self.config.max_poll_attempts)
        .with_transient_retries(self.config.transient_poll_retries);

        let poll_tx = progress_tx.clone();
        let report = poller
            .poll_until_terminal(vendor, filename, move |fraction, label| {
                let _ = poll_tx.try_send(Ok(ProgressSample {
                    phase: Phase::Polling,
                    fraction,
                    label: label.to_string(),
                }));
            })
            .await?;

        // Prefer the reference the service handed back; the /downloads path
        // is the documented fallback for completed files.
        let download_ref = report
            .download_url
            .or(ack.download_url)
            .unwrap_or_else(|| {
                format!("{}/downloads/{}/{}", self.config.base_url, vendor, filename)
            });

        // Best-effort: tell the service the file reached its terminal state.
        telemetry::report_file_status(
            &self.client,
            &self.config.base_url,
            vendor,
            filename,
            "completed",
        )
        .await;

        Ok(CompletedTransfer {
            vendor: vendor.to_string(),
            filename: filename.to_string(),
            download_ref,
        })
    }
}
