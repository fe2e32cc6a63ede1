use crate::types::types::Phase;

/// Result of projecting session state into a displayable value.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    pub percent: u32,
    pub label: String,
}

/// Project internal session state into a single overall percent and label.
///
/// Pure and deterministic: the upload phase owns `upload_weight` of the 0–100
/// range, the poll phase owns the remainder. At the moment the upload is
/// acknowledged (upload fraction 1.0) the percent equals exactly
/// `upload_weight * 100`. Fractions and the weight are clamped to [0, 1].
pub fn project(
    phase: Phase,
    upload_fraction: f64,
    poll_fraction: f64,
    upload_weight: f64,
) -> ProgressView {
    let w = upload_weight.clamp(0.0, 1.0);
    let up = upload_fraction.clamp(0.0, 1.0);
    let poll = poll_fraction.clamp(0.0, 1.0);

    match phase {
        Phase::Idle => ProgressView {
            percent: 0,
            label: "Waiting".to_string(),
        },
        Phase::Uploading => ProgressView {
            percent: (up * w * 100.0).round() as u32,
            label: "Uploading file".to_string(),
        },
        Phase::Polling => ProgressView {
            percent: ((w + poll * (1.0 - w)) * 100.0).round() as u32,
            label: "Processing".to_string(),
        },
        Phase::Completed => ProgressView {
            percent: 100,
            label: "Processing completed".to_string(),
        },
        Phase::Failed => ProgressView {
            percent: ((up * w + poll * (1.0 - w)) * 100.0).round() as u32,
            label: "Failed".to_string(),
        },
        Phase::Cancelled => ProgressView {
            percent: ((up * w + poll * (1.0 - w)) * 100.0).round() as u32,
            label: "Cancelled".to_string(),
        },
    }
}
