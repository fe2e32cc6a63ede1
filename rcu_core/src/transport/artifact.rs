use std::path::Path;

use futures::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;

use crate::types::types::TransferError;

/// Write buffer for artifact downloads.
const WRITE_BUFFER_SIZE: usize = 256 * 1024;

/// Stream the converted artifact at `download_ref` into `output`.
/// Returns the number of bytes written.
pub async fn fetch_artifact(
    client: &Client,
    download_ref: &str,
    output: &Path,
) -> Result<u64, TransferError> {
    let response = client
        .get(download_ref)
        .send()
        .await
        .map_err(|e| TransferError::DownloadFailed(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TransferError::DownloadFailed(format!(
            "download returned status {}",
            status
        )));
    }

    let file = tokio::fs::File::create(output)
        .await
        .map_err(TransferError::Disk)?;
    let mut writer = tokio::io::BufWriter::with_capacity(WRITE_BUFFER_SIZE, file);
    let mut written: u64 = 0;

    let mut stream = response.bytes_stream();
    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| TransferError::DownloadFailed(e.to_string()))?;
        writer
            .write_all(&chunk)
            .await
            .map_err(TransferError::Disk)?;
        written += chunk.len() as u64;
    }
    writer.flush().await.map_err(TransferError::Disk)?;

    log::info!("[artifact] saved {} bytes to {}", written, output.display());

    Ok(written)
}
