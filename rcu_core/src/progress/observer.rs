use async_trait::async_trait;

use super::snapshot::ProgressSnapshot;

/// Trait for anything that wants to observe transfer progress.
///
/// The `ProgressNotifier` calls these methods on all registered observers
/// after projecting raw `ProgressSample`s into a `ProgressSnapshot`.
///
/// Lifecycle:
/// - `on_progress` is called for every sample the session emits.
/// - `on_complete` is called once when the transfer finishes successfully
///   (the progress channel closed without an error message).
/// - `on_error` is called once when the transfer fails or is cancelled (an
///   `Err(String)` was received on the progress channel).
#[async_trait]
pub trait ProgressObserver: Send + Sync + 'static {
    /// Called with the latest projected snapshot after each sample.
    async fn on_progress(&self, snapshot: &ProgressSnapshot);

    /// Called when the transfer completes successfully.
    async fn on_complete(&self, snapshot: &ProgressSnapshot);

    /// Called when the transfer fails or is cancelled.
    async fn on_error(&self, error: &str);
}
