//! Best-effort status notifications back to the service.
//!
//! These calls never affect a transfer's outcome: failures are logged at
//! `warn` and swallowed.

use reqwest::Client;
use serde_json::json;

/// POST `/update-file-status` with the file's new status.
pub async fn report_file_status(
    client: &Client,
    base_url: &str,
    vendor: &str,
    filename: &str,
    status: &str,
) {
    let body = json!({ "vendor": vendor, "filename": filename, "status": status });
    let result = client
        .post(format!("{}/update-file-status", base_url))
        .json(&body)
        .send()
        .await;
    match result {
        Ok(response) if !response.status().is_success() => {
            log::warn!("update-file-status returned {}", response.status());
        }
        Ok(_) => {}
        Err(e) => log::warn!("update-file-status failed: {}", e),
    }
}

/// POST `/update-download-status` once the artifact has been retrieved.
pub async fn report_download_status(client: &Client, base_url: &str, vendor: &str, filename: &str) {
    let body = json!({ "vendor": vendor, "filename": filename });
    let result = client
        .post(format!("{}/update-download-status", base_url))
        .json(&body)
        .send()
        .await;
    match result {
        Ok(response) if !response.status().is_success() => {
            log::warn!("update-download-status returned {}", response.status());
        }
        Ok(_) => {}
        Err(e) => log::warn!("update-download-status failed: {}", e),
    }
}
