use std::sync::Mutex;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};

use rcu_core::progress::{ProgressObserver, ProgressSnapshot};

/// Renders transfer progress as a single indicatif bar over 0–100.
pub struct TerminalProgressObserver {
    /// Lazily initialised on the first `on_progress` call.
    bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgressObserver {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn ensure_bar(&self) -> ProgressBar {
        let mut guard = self.bar.lock().unwrap();
        if guard.is_none() {
            let style = ProgressStyle::with_template("[{bar:30.cyan/blue}] {pos}% — {msg}")
                .unwrap()
                .progress_chars("=>-");

            let pb = ProgressBar::new(100);
            pb.set_style(style);
            *guard = Some(pb);
        }
        guard.as_ref().unwrap().clone()
    }
}

#[async_trait]
impl ProgressObserver for TerminalProgressObserver {
    async fn on_progress(&self, snapshot: &ProgressSnapshot) {
        let pb = self.ensure_bar();
        pb.set_position(snapshot.percent as u64);
        pb.set_message(snapshot.label.clone());
    }

    async fn on_complete(&self, snapshot: &ProgressSnapshot) {
        let pb = self.ensure_bar();
        pb.set_position(100);
        pb.finish_with_message(snapshot.label.clone());
    }

    async fn on_error(&self, error: &str) {
        let pb = self.ensure_bar();
        pb.abandon_with_message(format!("Error: {}", error));
    }
}
