use std::path::PathBuf;

use crate::dataset::idx::NumericDecode;

/// Configuration for one training run.
///
/// # Fields
/// - `epochs`           — full passes over the training data
/// - `checkpoint_dir`   — where periodic saves land; `None` disables them
/// - `checkpoint_every` — completed epochs between saves (500 by default)
/// - `decode`           — numeric interpretation of wide dataset elements
pub struct TrainConfig {
    pub epochs: usize,
    pub checkpoint_dir: Option<PathBuf>,
    pub checkpoint_every: usize,
    pub decode: NumericDecode,
}

impl TrainConfig {
    /// A run of `epochs` epochs with periodic checkpointing disabled.
    pub fn new(epochs: usize) -> Self {
        TrainConfig {
            epochs,
            checkpoint_dir: None,
            checkpoint_every: 500,
            decode: NumericDecode::default(),
        }
    }
}
