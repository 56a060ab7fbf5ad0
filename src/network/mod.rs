pub mod layer;
pub mod network;
pub mod snapshot;

pub use layer::Layer;
pub use network::{DatasetPaths, Network};
pub use snapshot::SerializedNetwork;
