use serde::Serialize;

use crate::types::types::Phase;

/// Externally observable progress state for one transfer session.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressSnapshot {
    pub phase: Phase,
    /// Overall percent, 0–100, never decreasing within a session.
    pub percent: u32,
    pub label: String,
    pub done: bool,
}

impl ProgressSnapshot {
    pub fn empty() -> Self {
        Self {
            phase: Phase::Idle,
            percent: 0,
            label: String::new(),
            done: false,
        }
    }
}
