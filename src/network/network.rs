use crate::network::layer::{sigmoid_prime, Layer};

/// Learning rate a fresh network starts with. Small enough to avoid
/// overshooting on full-batch updates; tune live through the setter.
pub const DEFAULT_LEARNING_RATE: f64 = 0.002;

/// The four dataset file paths a network carries alongside its parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetPaths {
    pub train_items: String,
    pub train_labels: String,
    pub test_items: String,
    pub test_labels: String,
}

/// A sigmoid-activated feed-forward network: `hidden_count` hidden layers
/// plus one output layer, a runtime-tunable learning rate, and the dataset
/// paths it trains/tests from.
#[derive(Debug)]
pub struct Network {
    pub(crate) layers: Vec<Layer>,
    learning_rate: f64,
    paths: DatasetPaths,
}

impl Network {
    /// Fresh network: `hidden_count` hidden layers of `hidden_height` neurons
    /// each, then one output layer of `output_size` neurons. Weights start
    /// glorot-uniform, biases and accumulators at zero.
    ///
    /// Panics unless `hidden_count ≥ 1`; the topology always has at least one
    /// hidden layer.
    pub fn new(
        hidden_height: usize,
        hidden_count: usize,
        input_size: usize,
        output_size: usize,
    ) -> Network {
        assert!(hidden_count >= 1, "at least one hidden layer is required");

        let mut layers = Vec::with_capacity(hidden_count + 1);
        layers.push(Layer::new(hidden_height, input_size));
        for _ in 1..hidden_count {
            layers.push(Layer::new(hidden_height, hidden_height));
        }
        layers.push(Layer::new(output_size, hidden_height));

        Network {
            layers,
            learning_rate: DEFAULT_LEARNING_RATE,
            paths: DatasetPaths::default(),
        }
    }

    /// Reassembles a network from already-validated layers; the checkpoint
    /// loader and the snapshot importer come through here.
    pub fn from_parts(layers: Vec<Layer>, learning_rate: f64, paths: DatasetPaths) -> Network {
        assert!(
            layers.len() >= 2,
            "a network is at least one hidden layer plus the output layer"
        );
        Network {
            layers,
            learning_rate,
            paths,
        }
    }

    pub fn hidden_count(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].input_width()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.layers.len() - 1].output_width()
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, rate: f64) {
        self.learning_rate = rate;
    }

    pub fn paths(&self) -> &DatasetPaths {
        &self.paths
    }

    pub fn set_paths(&mut self, paths: DatasetPaths) {
        self.paths = paths;
    }

    /// Forward propagation. Every layer's activation is retained for the
    /// backward pass; the output layer's activation is returned.
    pub fn forward(&mut self, input: &[f64]) -> Vec<f64> {
        let mut current = input.to_vec();
        for layer in &mut self.layers {
            current = layer.feed(&current).to_vec();
        }
        current
    }

    /// Backpropagation for one example, using the activations stored by the
    /// preceding `forward` call. Builds the one-hot target from
    /// `target_class`, then walks the error signal from the output layer down
    /// to layer 0, accumulating into each layer's gradient accumulators.
    /// Parameters do not change until `apply_gradient`.
    pub fn backward(&mut self, input: &[f64], target_class: usize) {
        let last = self.layers.len() - 1;

        // δ_L = σ'(output) ⊙ (output − target)
        let mut delta: Vec<f64> = self.layers[last]
            .activation
            .iter()
            .enumerate()
            .map(|(i, &a)| {
                let target = if i == target_class { 1.0 } else { 0.0 };
                sigmoid_prime(a) * (a - target)
            })
            .collect();

        for j in (0..=last).rev() {
            let prev = if j == 0 {
                input.to_vec()
            } else {
                self.layers[j - 1].activation.clone()
            };
            self.layers[j].accumulate(&delta, &prev);

            if j > 0 {
                // δ_{j-1} = σ'(a_{j-1}) ⊙ (W_jᵗ · δ_j)
                let carried = self.layers[j].weights.tr_mul_vec(&delta);
                delta = self.layers[j - 1]
                    .activation
                    .iter()
                    .zip(carried.iter())
                    .map(|(&a, &e)| sigmoid_prime(a) * e)
                    .collect();
            }
        }
    }

    /// Applies every layer's accumulated gradient, averaged over
    /// `example_count`, then zeroes the accumulators. Called once per
    /// completed epoch, never mid-epoch.
    pub fn apply_gradient(&mut self, example_count: usize) {
        for layer in &mut self.layers {
            layer.apply_gradient(self.learning_rate, example_count);
        }
    }
}
