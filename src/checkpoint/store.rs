//! Directory-based checkpoint format.
//!
//! A checkpoint directory holds:
//! - `net_info.txt` — six lines in fixed order: hidden-layer count, learning
//!   rate, train-items path, train-labels path, test-items path,
//!   test-labels path
//! - per layer `i`, `weight_NN` and `bias_NN` (two-digit zero-padded `NN`) —
//!   big-endian u32 dimensions followed by big-endian f64 values, row-major
//!
//! Saving is last-writer-wins per file; there is no multi-file transaction.
//! Loading validates shape chaining and never returns a partial network.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::layer::Layer;
use crate::network::network::{DatasetPaths, Network};

pub const METADATA_FILE: &str = "net_info.txt";

fn weight_file(i: usize) -> String {
    format!("weight_{i:02}")
}

fn bias_file(i: usize) -> String {
    format!("bias_{i:02}")
}

fn write_err(path: &Path, e: std::io::Error) -> Error {
    Error::Checkpoint(format!("cannot write '{}': {e}", path.display()))
}

fn read_err(path: &Path, e: std::io::Error) -> Error {
    Error::Checkpoint(format!("cannot read '{}': {e}", path.display()))
}

/// Persists the network's metadata and per-layer parameters into `dir`,
/// creating the directory if absent.
pub fn save(network: &Network, dir: impl AsRef<Path>) -> Result<()> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .map_err(|e| Error::Checkpoint(format!("cannot create '{}': {e}", dir.display())))?;

    let paths = network.paths();
    let metadata = format!(
        "{}\n{}\n{}\n{}\n{}\n{}\n",
        network.hidden_count(),
        network.learning_rate(),
        paths.train_items,
        paths.train_labels,
        paths.test_items,
        paths.test_labels,
    );
    let meta_path = dir.join(METADATA_FILE);
    fs::write(&meta_path, metadata).map_err(|e| write_err(&meta_path, e))?;

    for (i, layer) in network.layers.iter().enumerate() {
        write_matrix(&dir.join(weight_file(i)), &layer.weights)?;
        write_vector(&dir.join(bias_file(i)), &layer.biases)?;
    }

    Ok(())
}

/// Reconstructs a network from a directory written by `save`. Gradient
/// accumulators come back zero-filled in the shapes of the loaded parameters.
pub fn load(dir: impl AsRef<Path>) -> Result<Network> {
    let dir = dir.as_ref();
    let meta_path = dir.join(METADATA_FILE);
    let metadata = fs::read_to_string(&meta_path).map_err(|e| read_err(&meta_path, e))?;

    let mut lines = metadata.lines();
    let mut next_line = |what: &str| {
        lines.next().ok_or_else(|| {
            Error::Checkpoint(format!("'{}' is missing the {what} line", meta_path.display()))
        })
    };

    let hidden_count: usize = next_line("hidden-layer count")?.trim().parse().map_err(|_| {
        Error::Checkpoint(format!("'{}' has a malformed hidden-layer count", meta_path.display()))
    })?;
    let learning_rate: f64 = next_line("learning rate")?.trim().parse().map_err(|_| {
        Error::Checkpoint(format!("'{}' has a malformed learning rate", meta_path.display()))
    })?;
    let paths = DatasetPaths {
        train_items: next_line("train-items path")?.to_owned(),
        train_labels: next_line("train-labels path")?.to_owned(),
        test_items: next_line("test-items path")?.to_owned(),
        test_labels: next_line("test-labels path")?.to_owned(),
    };

    if hidden_count < 1 {
        return Err(Error::Checkpoint(format!(
            "'{}' declares zero hidden layers",
            meta_path.display()
        )));
    }

    let mut layers: Vec<Layer> = Vec::with_capacity(hidden_count + 1);
    for i in 0..=hidden_count {
        let weights = read_matrix(&dir.join(weight_file(i)))?;
        let biases = read_vector(&dir.join(bias_file(i)))?;

        if biases.len() != weights.rows {
            return Err(Error::Checkpoint(format!(
                "layer {i}: bias length {} does not match weight rows {}",
                biases.len(),
                weights.rows
            )));
        }
        if let Some(prev) = layers.last() {
            if weights.cols != prev.output_width() {
                return Err(Error::Checkpoint(format!(
                    "layer {i}: weight columns {} do not match previous layer's {} rows",
                    weights.cols,
                    prev.output_width()
                )));
            }
        }

        layers.push(Layer::from_parts(weights, biases));
    }

    Ok(Network::from_parts(layers, learning_rate, paths))
}

fn write_matrix(path: &Path, m: &Matrix) -> Result<()> {
    let file = File::create(path).map_err(|e| write_err(path, e))?;
    let mut w = BufWriter::new(file);

    w.write_u32::<BigEndian>(m.rows as u32).map_err(|e| write_err(path, e))?;
    w.write_u32::<BigEndian>(m.cols as u32).map_err(|e| write_err(path, e))?;
    for row in &m.data {
        for &v in row {
            w.write_f64::<BigEndian>(v).map_err(|e| write_err(path, e))?;
        }
    }
    w.flush().map_err(|e| write_err(path, e))?;

    Ok(())
}

fn write_vector(path: &Path, v: &[f64]) -> Result<()> {
    let file = File::create(path).map_err(|e| write_err(path, e))?;
    let mut w = BufWriter::new(file);

    w.write_u32::<BigEndian>(v.len() as u32).map_err(|e| write_err(path, e))?;
    for &x in v {
        w.write_f64::<BigEndian>(x).map_err(|e| write_err(path, e))?;
    }
    w.flush().map_err(|e| write_err(path, e))?;

    Ok(())
}

fn read_matrix(path: &Path) -> Result<Matrix> {
    let file = File::open(path).map_err(|e| read_err(path, e))?;
    let mut r = BufReader::new(file);

    let rows = r.read_u32::<BigEndian>().map_err(|e| read_err(path, e))? as usize;
    let cols = r.read_u32::<BigEndian>().map_err(|e| read_err(path, e))? as usize;
    if rows == 0 || cols == 0 {
        return Err(Error::Checkpoint(format!(
            "'{}' declares an empty {rows}×{cols} matrix",
            path.display()
        )));
    }

    let mut m = Matrix::zeros(rows, cols);
    for row in &mut m.data {
        for v in row.iter_mut() {
            *v = r.read_f64::<BigEndian>().map_err(|e| read_err(path, e))?;
        }
    }

    Ok(m)
}

fn read_vector(path: &Path) -> Result<Vec<f64>> {
    let file = File::open(path).map_err(|e| read_err(path, e))?;
    let mut r = BufReader::new(file);

    let len = r.read_u32::<BigEndian>().map_err(|e| read_err(path, e))? as usize;
    let mut v = Vec::with_capacity(len);
    for _ in 0..len {
        v.push(r.read_f64::<BigEndian>().map_err(|e| read_err(path, e))?);
    }

    Ok(v)
}
