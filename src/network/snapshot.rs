//! JSON snapshot of a network's parameters — the same state the binary
//! checkpoint carries, in a human-readable form.
//!
//! Internal `Network`/`Layer` structs are not serialized directly; the bridge
//! structs below keep the file format stable and let deserialization validate
//! shapes before a network is assembled.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::layer::Layer;
use crate::network::network::{DatasetPaths, Network};

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedNetwork {
    pub format_version: u32,
    pub learning_rate: f64,
    pub train_items: String,
    pub train_labels: String,
    pub test_items: String,
    pub test_labels: String,
    pub layers: Vec<SerializedLayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SerializedLayer {
    pub rows: usize,
    pub cols: usize,
    /// Row-major (rows × cols).
    pub weights: Vec<f64>,
    pub biases: Vec<f64>,
}

impl SerializedNetwork {
    pub fn validate(&self) -> Result<()> {
        if self.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(Error::Checkpoint(format!(
                "unsupported snapshot format_version {}; expected {}",
                self.format_version, SNAPSHOT_FORMAT_VERSION
            )));
        }
        if self.layers.len() < 2 {
            return Err(Error::Checkpoint(
                "snapshot must hold at least one hidden layer and the output layer".to_owned(),
            ));
        }
        if !self.learning_rate.is_finite() {
            return Err(Error::Checkpoint("learning rate must be finite".to_owned()));
        }

        for (i, layer) in self.layers.iter().enumerate() {
            layer.validate(i)?;
            if i > 0 && layer.cols != self.layers[i - 1].rows {
                return Err(Error::Checkpoint(format!(
                    "layer {i}: weight columns {} do not match previous layer's {} rows",
                    layer.cols,
                    self.layers[i - 1].rows
                )));
            }
        }

        Ok(())
    }
}

impl SerializedLayer {
    fn validate(&self, idx: usize) -> Result<()> {
        if self.rows == 0 || self.cols == 0 {
            return Err(Error::Checkpoint(format!(
                "layer {idx}: dims must be > 0, got {}×{}",
                self.rows, self.cols
            )));
        }
        let expected = self
            .rows
            .checked_mul(self.cols)
            .ok_or_else(|| Error::Checkpoint(format!("layer {idx}: weight shape overflow")))?;
        if self.weights.len() != expected {
            return Err(Error::Checkpoint(format!(
                "layer {idx}: weight length {} does not match {}×{}",
                self.weights.len(),
                self.rows,
                self.cols
            )));
        }
        if self.biases.len() != self.rows {
            return Err(Error::Checkpoint(format!(
                "layer {idx}: bias length {} does not match {} rows",
                self.biases.len(),
                self.rows
            )));
        }
        if self.weights.iter().chain(self.biases.iter()).any(|v| !v.is_finite()) {
            return Err(Error::Checkpoint(format!(
                "layer {idx}: parameters must be finite"
            )));
        }
        Ok(())
    }
}

impl From<&Network> for SerializedNetwork {
    fn from(net: &Network) -> Self {
        let layers = net
            .layers
            .iter()
            .map(|layer| SerializedLayer {
                rows: layer.weights.rows,
                cols: layer.weights.cols,
                weights: layer.weights.data.iter().flatten().copied().collect(),
                biases: layer.biases.clone(),
            })
            .collect();
        let paths = net.paths();
        SerializedNetwork {
            format_version: SNAPSHOT_FORMAT_VERSION,
            learning_rate: net.learning_rate(),
            train_items: paths.train_items.clone(),
            train_labels: paths.train_labels.clone(),
            test_items: paths.test_items.clone(),
            test_labels: paths.test_labels.clone(),
            layers,
        }
    }
}

impl TryFrom<SerializedNetwork> for Network {
    type Error = Error;

    fn try_from(value: SerializedNetwork) -> Result<Network> {
        value.validate()?;

        let learning_rate = value.learning_rate;
        let paths = DatasetPaths {
            train_items: value.train_items,
            train_labels: value.train_labels,
            test_items: value.test_items,
            test_labels: value.test_labels,
        };
        let layers = value
            .layers
            .into_iter()
            .map(|layer| {
                let data = layer
                    .weights
                    .chunks(layer.cols)
                    .map(|row| row.to_vec())
                    .collect();
                Layer::from_parts(Matrix::from_data(data), layer.biases)
            })
            .collect();

        Ok(Network::from_parts(layers, learning_rate, paths))
    }
}

impl Network {
    /// Writes a pretty-printed JSON snapshot of the network's parameters.
    pub fn export_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let snapshot = SerializedNetwork::from(self);
        let json = serde_json::to_string_pretty(&snapshot)
            .map_err(|e| Error::Checkpoint(format!("failed to serialize snapshot: {e}")))?;
        std::fs::write(path, json)
            .map_err(|e| Error::Checkpoint(format!("cannot write '{}': {e}", path.display())))
    }

    /// Reassembles a network from a JSON snapshot written by `export_json`.
    pub fn import_json(path: impl AsRef<Path>) -> Result<Network> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| Error::Checkpoint(format!("cannot read '{}': {e}", path.display())))?;
        let snapshot: SerializedNetwork = serde_json::from_str(&json)
            .map_err(|e| Error::Checkpoint(format!("malformed snapshot '{}': {e}", path.display())))?;
        snapshot.try_into()
    }
}
