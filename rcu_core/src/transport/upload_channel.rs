use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Client};
use tokio_util::io::ReaderStream;

use crate::types::types::{TransferError, UploadAck};

/// Read buffer for the streamed upload body.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// Performs the multipart upload for one session.
///
/// The file part is streamed so the progress callback sees fractional byte
/// counts while the body goes out, instead of a single jump at the end.
pub struct UploadChannel {
    client: Arc<Client>,
    base_url: String,
}

impl UploadChannel {
    pub fn new(client: Arc<Client>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Upload `file` under `vendor`, reporting `bytes_sent / total_bytes`
    /// through `on_progress` as chunks are consumed.
    ///
    /// A non-2xx status and a transport-level error both surface as
    /// `UploadFailed`; the caller never needs to distinguish them. The
    /// acknowledgment is returned exactly as parsed — judging
    /// `success: false` is the caller's concern.
    pub async fn upload(
        &self,
        file: &Path,
        vendor: &str,
        on_progress: impl Fn(f64) + Send + Sync + 'static,
    ) -> Result<UploadAck, TransferError> {
        let handle = tokio::fs::File::open(file).await.map_err(TransferError::Disk)?;
        let total_bytes = handle
            .metadata()
            .await
            .map_err(TransferError::Disk)?
            .len();

        let filename = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "upload.bin".to_string());

        log::info!(
            "[upload] {}: sending {} bytes for vendor {}",
            filename,
            total_bytes,
            vendor
        );

        // Count every chunk as it is pulled off the reader. Without a usable
        // total no fraction can be computed and progress simply stays at its
        // last value until completion.
        let sent = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&sent);
        let stream = ReaderStream::with_capacity(handle, UPLOAD_CHUNK_SIZE).inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                let so_far =
                    counter.fetch_add(chunk.len() as u64, Ordering::Relaxed) + chunk.len() as u64;
                if total_bytes > 0 {
                    on_progress(so_far as f64 / total_bytes as f64);
                }
            }
        });

        let part = Part::stream_with_length(Body::wrap_stream(stream), total_bytes)
            .file_name(filename)
            .mime_str("application/octet-stream")
            .map_err(|e| TransferError::UploadFailed(e.to_string()))?;
        let form = Form::new()
            .text("vendor", vendor.to_string())
            .part("file", part);

        let response = self
            .client
            .post(format!("{}/upload", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| TransferError::UploadFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransferError::UploadFailed(format!(
                "upload returned status {}",
                status
            )));
        }

        response
            .json::<UploadAck>()
            .await
            .map_err(|e| TransferError::UploadFailed(e.to_string()))
    }
}
