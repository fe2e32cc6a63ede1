use tokio::sync::mpsc;

use super::observer::ProgressObserver;
use super::sink;
use super::snapshot::ProgressSnapshot;
use crate::types::types::{Phase, ProgressSample};

/// Consumes `Result<ProgressSample, String>` from the session channel,
/// projects samples through the sink, and fans out to all registered
/// observers.
///
/// # Lifecycle
///
/// | Channel message         | Observer method called          |
/// |-------------------------|---------------------------------|
/// | `Ok(ProgressSample)`    | `on_progress(&snapshot)`        |
/// | `Err(String)`           | `on_error(&msg)` then stops     |
/// | Channel closed (no err) | `on_complete(&final_snapshot)`  |
pub struct ProgressNotifier {
    observers: Vec<Box<dyn ProgressObserver>>,
    upload_weight: f64,
    upload_fraction: f64,
    poll_fraction: f64,
    /// Highest percent handed out so far; observers never see it go down.
    high_water: u32,
}

impl ProgressNotifier {
    pub fn new(upload_weight: f64) -> Self {
        Self {
            observers: Vec::new(),
            upload_weight,
            upload_fraction: 0.0,
            poll_fraction: 0.0,
            high_water: 0,
        }
    }

    /// Register an observer. Must be called before `run()`.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Consume progress messages until the channel closes or an error arrives.
    pub async fn run(mut self, mut progress_rx: mpsc::Receiver<Result<ProgressSample, String>>) {
        while let Some(msg) = progress_rx.recv().await {
            match msg {
                Ok(sample) => {
                    let snapshot = self.handle_sample(sample);
                    for observer in &self.observers {
                        observer.on_progress(&snapshot).await;
                    }
                }
                Err(error) => {
                    for observer in &self.observers {
                        observer.on_error(&error).await;
                    }
                    return; // stop processing after error
                }
            }
        }
        // Channel closed cleanly — all senders dropped, no error received
        self.finish().await;
    }

    /// Fold one sample into the tracked fractions and build the snapshot.
    fn handle_sample(&mut self, sample: ProgressSample) -> ProgressSnapshot {
        match sample.phase {
            Phase::Uploading => {
                self.upload_fraction = self.upload_fraction.max(sample.fraction);
            }
            Phase::Polling => {
                self.poll_fraction = self.poll_fraction.max(sample.fraction);
            }
            _ => {}
        }

        let view = sink::project(
            sample.phase,
            self.upload_fraction,
            self.poll_fraction,
            self.upload_weight,
        );
        self.high_water = self.high_water.max(view.percent);

        let label = if sample.label.is_empty() {
            view.label
        } else {
            sample.label
        };

        ProgressSnapshot {
            phase: sample.phase,
            percent: self.high_water,
            label,
            done: false,
        }
    }

    /// Finalize: a clean channel close means the transfer completed.
    async fn finish(self) {
        let snapshot = ProgressSnapshot {
            phase: Phase::Completed,
            percent: 100,
            label: "Processing completed".to_string(),
            done: true,
        };
        for observer in &self.observers {
            observer.on_complete(&snapshot).await;
        }
    }
}
