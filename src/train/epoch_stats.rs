use serde::{Deserialize, Serialize};

/// Per-epoch training statistics; the trainer returns one record per
/// completed epoch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpochStats {
    /// 1-based epoch number.
    pub epoch: usize,
    /// Total epochs requested for this run.
    pub total_epochs: usize,
    /// Examples whose argmax prediction matched the label this epoch.
    pub correct: usize,
    /// Examples seen this epoch.
    pub total: usize,
    /// Running mean of the epoch-to-epoch change in `correct`.
    pub avg_delta: f64,
    /// Wall-clock duration of this epoch in milliseconds.
    pub elapsed_ms: u64,
}

impl EpochStats {
    /// Accuracy of this epoch as a percentage in [0, 100].
    pub fn accuracy_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 * 100.0 / self.total as f64
        }
    }
}
