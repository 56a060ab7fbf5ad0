pub mod math;
pub mod error;
pub mod dataset;
pub mod network;
pub mod checkpoint;
pub mod train;

// Convenience re-exports
pub use dataset::idx::NumericDecode;
pub use error::{Error, Result};
pub use math::matrix::Matrix;
pub use network::network::{DatasetPaths, Network};
pub use train::epoch_stats::EpochStats;
pub use train::train_config::TrainConfig;
pub use train::trainer::{evaluate_from_paths, train_from_paths};
