use std::io::{self, Write};
use std::time::Instant;

use crate::checkpoint;
use crate::dataset::idx::{self, NumericDecode};
use crate::error::{Error, Result};
use crate::math::matrix::Matrix;
use crate::network::network::Network;
use crate::train::epoch_stats::EpochStats;
use crate::train::train_config::TrainConfig;

// ---------------------------------------------------------------------------
// Public entry points
// ---------------------------------------------------------------------------

/// Outcome of a forward-only pass over a dataset.
#[derive(Debug, Clone, Copy)]
pub struct EvalReport {
    pub correct: usize,
    pub total: usize,
}

impl EvalReport {
    pub fn accuracy_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 * 100.0 / self.total as f64
        }
    }
}

/// Loads the training pair from the network's stored paths, cross-checks the
/// example counts, and runs `train_loop`. A failed load aborts before any
/// network state is touched.
pub fn train_from_paths(network: &mut Network, config: &TrainConfig) -> Result<Vec<EpochStats>> {
    let paths = network.paths().clone();

    println!("Loading training data...");
    let items = idx::load_items(&paths.train_items, config.decode)?;
    let labels = idx::load_labels(&paths.train_labels, config.decode)?;
    if items.cols != labels.len() {
        return Err(Error::DimensionMismatch {
            items: items.cols,
            labels: labels.len(),
        });
    }
    if items.cols == 0 {
        return Err(Error::Decode("training data contains no examples".to_owned()));
    }
    println!(
        "Feature length: {}, examples: {}, labels: {}",
        items.rows,
        items.cols,
        labels.len()
    );

    train_loop(network, &items, &labels, config)
}

/// Trains `network` for `config.epochs` full passes over the dataset, one
/// column per example in dataset order.
///
/// Per example: forward pass, argmax tally, backward accumulation. Per epoch:
/// one averaged gradient application, an in-place progress line, and — every
/// `checkpoint_every` completed epochs — a checkpoint save into
/// `config.checkpoint_dir` when one is set. Returns the per-epoch history.
///
/// # Panics
/// Panics if the dataset is empty or misaligned; the path-level entry point
/// rules both out before calling in.
pub fn train_loop(
    network: &mut Network,
    items: &Matrix,
    labels: &[i64],
    config: &TrainConfig,
) -> Result<Vec<EpochStats>> {
    assert!(items.cols > 0, "training data must not be empty");
    assert_eq!(items.cols, labels.len(), "items and labels must be aligned");

    // Resolve every label up front so a bad one cannot abort mid-epoch and
    // leave half-accumulated gradients behind.
    let output_size = network.output_size();
    let targets = labels
        .iter()
        .map(|&label| target_class(label, output_size))
        .collect::<Result<Vec<usize>>>()?;

    let total = items.cols;
    let mut history = Vec::with_capacity(config.epochs);
    let mut prev_correct = 0usize;
    let mut delta_sum = 0i64;

    for epoch in 1..=config.epochs {
        let t_start = Instant::now();
        let mut correct = 0usize;

        // One full pass; gradients accumulate across the whole epoch and are
        // applied exactly once at its end.
        for i in 0..total {
            let input = items.column(i);
            let output = network.forward(&input);
            if argmax(&output) == targets[i] {
                correct += 1;
            }
            network.backward(&input, targets[i]);
        }

        network.apply_gradient(total);

        if epoch > 1 {
            delta_sum += correct as i64 - prev_correct as i64;
        }
        let avg_delta = if epoch > 1 {
            delta_sum as f64 / (epoch - 1) as f64
        } else {
            0.0
        };
        prev_correct = correct;

        let stats = EpochStats {
            epoch,
            total_epochs: config.epochs,
            correct,
            total,
            avg_delta,
            elapsed_ms: t_start.elapsed().as_millis() as u64,
        };
        print!(
            "\rTraining... {} / {} complete. Correct: {} ({:.1}%), avg change: {:+.2}",
            epoch,
            config.epochs,
            correct,
            stats.accuracy_pct(),
            avg_delta
        );
        let _ = io::stdout().flush();
        history.push(stats);

        if let Some(dir) = &config.checkpoint_dir {
            if config.checkpoint_every > 0 && epoch % config.checkpoint_every == 0 {
                checkpoint::save(network, dir)?;
            }
        }
    }

    if config.epochs > 0 {
        println!();
    }

    Ok(history)
}

/// Loads the test pair from the network's stored paths, cross-checks the
/// example counts, and runs `evaluate`.
pub fn evaluate_from_paths(network: &mut Network, decode: NumericDecode) -> Result<EvalReport> {
    let paths = network.paths().clone();

    println!("Loading testing data...");
    let items = idx::load_items(&paths.test_items, decode)?;
    let labels = idx::load_labels(&paths.test_labels, decode)?;
    if items.cols != labels.len() {
        return Err(Error::DimensionMismatch {
            items: items.cols,
            labels: labels.len(),
        });
    }
    println!(
        "Feature length: {}, examples: {}, labels: {}",
        items.rows,
        items.cols,
        labels.len()
    );

    evaluate(network, &items, &labels)
}

/// Forward-only accuracy over a dataset. Parameters and gradient accumulators
/// are left untouched; only the transient activations change.
pub fn evaluate(network: &mut Network, items: &Matrix, labels: &[i64]) -> Result<EvalReport> {
    assert_eq!(items.cols, labels.len(), "items and labels must be aligned");

    let output_size = network.output_size();
    let mut correct = 0usize;
    for i in 0..items.cols {
        let input = items.column(i);
        let target = target_class(labels[i], output_size)?;
        let output = network.forward(&input);
        if argmax(&output) == target {
            correct += 1;
        }
    }

    Ok(EvalReport {
        correct,
        total: items.cols,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Index of the maximum element; the lowest index wins ties.
pub fn argmax(v: &[f64]) -> usize {
    let mut best = 0;
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x > v[best] {
            best = i;
        }
    }
    best
}

/// Class index for a raw label value. Label files in the wild carry either
/// raw class indices or ASCII digit bytes; the low nibble yields the class
/// either way.
fn target_class(label: i64, output_size: usize) -> Result<usize> {
    let class = (label & 0x0F) as usize;
    if class >= output_size {
        return Err(Error::Decode(format!(
            "label {label} maps to class {class}, outside the {output_size}-wide output layer"
        )));
    }
    Ok(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::layer::Layer;
    use crate::network::network::DatasetPaths;

    /// 2 → 3 → 2 network with fixed weights whose initial argmax is wrong for
    /// both training examples, so the test exercises actual movement.
    fn stubborn_net() -> Network {
        let hidden = Layer::from_parts(
            Matrix::from_data(vec![
                vec![0.5, -0.5],
                vec![-0.5, 0.5],
                vec![0.25, 0.25],
            ]),
            vec![0.0, 0.0, 0.0],
        );
        // Rows swapped relative to what the labels want.
        let output = Layer::from_parts(
            Matrix::from_data(vec![vec![-0.3, 0.3, 0.1], vec![0.3, -0.3, 0.1]]),
            vec![0.0, 0.0],
        );
        // An elevated rate; the tiny dataset needs visible movement per epoch.
        let mut net = Network::from_parts(vec![hidden, output], 0.002, DatasetPaths::default());
        net.set_learning_rate(5.0);
        net
    }

    fn separable_dataset() -> (Matrix, Vec<i64>) {
        // Two 2-pixel "images" with opposite labels, one per column.
        let items = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        (items, vec![0, 1])
    }

    #[test]
    fn separable_dataset_converges_within_fifty_epochs() {
        let mut net = stubborn_net();
        let (items, labels) = separable_dataset();

        let before = evaluate(&mut net, &items, &labels).unwrap();
        assert_eq!(before.correct, 0, "fixture must start out wrong");

        let history = train_loop(&mut net, &items, &labels, &TrainConfig::new(50)).unwrap();
        assert_eq!(history.len(), 50);

        let after = evaluate(&mut net, &items, &labels).unwrap();
        assert_eq!(after.correct, 2, "both examples classify correctly after training");
    }

    #[test]
    fn evaluate_leaves_parameters_untouched() {
        let mut net = stubborn_net();
        let (items, labels) = separable_dataset();
        let weights_before = net.layers[0].weights.clone();

        evaluate(&mut net, &items, &labels).unwrap();

        assert_eq!(net.layers[0].weights, weights_before);
        assert!(net.layers[0].bias_grad.iter().all(|&g| g == 0.0));
    }

    #[test]
    fn epoch_history_counts_every_epoch_once() {
        let mut net = stubborn_net();
        let (items, labels) = separable_dataset();

        let history = train_loop(&mut net, &items, &labels, &TrainConfig::new(3)).unwrap();

        assert_eq!(history.len(), 3);
        for (i, stats) in history.iter().enumerate() {
            assert_eq!(stats.epoch, i + 1);
            assert_eq!(stats.total_epochs, 3);
            assert_eq!(stats.total, 2);
        }
    }

    #[test]
    fn ascii_digit_labels_mask_down_to_class_indices() {
        let mut net = stubborn_net();
        let (items, _) = separable_dataset();
        // '0' (0x30) and '1' (0x31) mask to classes 0 and 1.
        let labels = vec![0x30, 0x31];

        let history = train_loop(&mut net, &items, &labels, &TrainConfig::new(50)).unwrap();
        assert_eq!(history.last().unwrap().correct, 2);
    }

    #[test]
    fn out_of_range_label_aborts_before_any_accumulation() {
        let mut net = stubborn_net();
        let (items, _) = separable_dataset();
        let labels = vec![0, 9];

        let err = train_loop(&mut net, &items, &labels, &TrainConfig::new(1)).unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        // Nothing accumulated, nothing applied.
        assert!(net.layers[0].bias_grad.iter().all(|&g| g == 0.0));
        assert_eq!(
            net.layers[0].weight_grad,
            Matrix::zeros(3, 2)
        );
    }

    #[test]
    fn argmax_breaks_ties_toward_the_lowest_index() {
        assert_eq!(argmax(&[0.2, 0.8, 0.8]), 1);
        assert_eq!(argmax(&[0.5, 0.5]), 0);
        assert_eq!(argmax(&[0.1]), 0);
        assert_eq!(argmax(&[0.0, 0.3, 0.9, 0.2]), 2);
    }
}
