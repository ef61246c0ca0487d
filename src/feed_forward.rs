//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network) with a single
//! bounded output, used as a two-class classifier.
//!
//! # Example
//!
//! Build a network over two input features with one hidden layer of four
//! neurons, then score a point:
//!
//! ```
//! # use playground::feed_forward::*;
//! let mut network = create_network(2, &[4], Activator::TanH).unwrap();
//! let score = network.forward(&[0.5, -1.0]).unwrap();
//!
//! // The output is squashed into (-1, 1); its sign is the predicted class.
//! assert!(score > -1.0 && score < 1.0);
//!
//! // Forward passes are a pure function of the current weights.
//! assert_eq!(network.run(&[0.5, -1.0]).unwrap(), score);
//!
//! // Feature vectors of the wrong width are rejected.
//! assert!(network.run(&[0.5]).is_err());
//! ```

pub use crate::activator::Activator;

use crate::error::{Error, Result};
use crate::layers::dense::{self, Dense};
use crate::layers::Layer;
use crate::regularization::RegularizationConfig;
use crate::utils::ZeroOut;

use serde::{Deserialize, Serialize};

/// The activation applied by the output neuron.
pub const OUTPUT_ACTIVATOR: Activator = Activator::TanH;

/// A Feedforward neural network
///
/// Layers run input → hidden₁ → … → hiddenₖ → one output neuron. The most
/// recent forward pass is cached on the network for introspection and
/// backpropagation.
#[derive(Clone, Debug)]
pub struct Network {
    activator: Activator,
    layers: Vec<Dense>,
    /// Pre-activation sums of each layer from the last forward pass.
    sums: Vec<Vec<f64>>,
    /// The input followed by the activated output of each layer.
    activations: Vec<Vec<f64>>,
}

/// Creates a new, untrained network.
///
/// Arguments:
///  * `input_len` - the number of input features.
///  * `hidden_layers` - the number of neurons in each hidden layer.
///  * `activator` - the activation function of every hidden neuron.
pub fn create_network(
    input_len: usize,
    hidden_layers: &[usize],
    activator: Activator,
) -> Result<Network> {
    Network::new(input_len, hidden_layers, activator)
}

impl Network {
    /// See [`create_network`].
    pub fn new(input_len: usize, hidden_layers: &[usize], activator: Activator) -> Result<Self> {
        if input_len == 0 {
            return Err(Error::InvalidArchitecture(
                "a network needs at least one input".into(),
            ));
        }
        if let Some(i) = hidden_layers.iter().position(|&n| n == 0) {
            return Err(Error::InvalidArchitecture(format!(
                "hidden layer {} has no neurons",
                i
            )));
        }
        let mut layers = Vec::with_capacity(hidden_layers.len() + 1);
        let mut inputs = input_len;
        for &outputs in hidden_layers {
            layers.push(Dense::new(activator, inputs, outputs));
            inputs = outputs;
        }
        layers.push(Dense::new(OUTPUT_ACTIVATOR, inputs, 1));
        let mut network = Network {
            activator,
            layers,
            sums: Vec::new(),
            activations: Vec::new(),
        };
        network.sums = network.empty_sums();
        network.activations = network.empty_network();
        Ok(network)
    }

    /// Returns the size of the input layer to the network.
    pub fn input_len(&self) -> usize {
        self.layers[0].input_len()
    }

    /// The widths of the hidden layers.
    pub fn hidden_layers(&self) -> Vec<usize> {
        self.hidden().iter().map(|l| l.output_len()).collect()
    }

    pub fn activator(&self) -> Activator {
        self.activator
    }

    /// The number of weight layers, hidden plus output.
    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    fn hidden(&self) -> &[Dense] {
        &self.layers[..self.layers.len() - 1]
    }

    /// Redraws every weight and bias and clears the cached pass, keeping the
    /// shape.
    pub fn reset(&mut self) {
        for layer in &mut self.layers {
            layer.reset();
        }
        self.sums.zero_out();
        self.activations.zero_out();
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_len() {
            return Err(Error::InputSize {
                expected: self.input_len(),
                got: input.len(),
            });
        }
        Ok(())
    }

    /// Feeds `input` through the network and returns the output, without
    /// touching the cached pass.
    pub fn run(&self, input: &[f64]) -> Result<f64> {
        self.check_input(input)?;
        let mut sums = self.empty_sums();
        let mut network = self.empty_network();
        self.feed_forward(input, &mut sums, &mut network, self.layers.len());
        Ok(network[self.layers.len()][0])
    }

    /// Feeds `input` through the network, caching every layer's sums and
    /// activations, and returns the output.
    pub fn forward(&mut self, input: &[f64]) -> Result<f64> {
        self.check_input(input)?;
        let mut sums = std::mem::take(&mut self.sums);
        let mut network = std::mem::take(&mut self.activations);
        self.feed_forward(input, &mut sums, &mut network, self.layers.len());
        self.sums = sums;
        self.activations = network;
        Ok(self.output())
    }

    /// Returns the activated output of one hidden neuron for `input`.
    ///
    /// `layer` counts hidden layers from zero. Only the layers up to the
    /// requested one are evaluated and the cached pass is left untouched.
    pub fn forward_to_node(&self, input: &[f64], layer: usize, neuron: usize) -> Result<f64> {
        self.check_input(input)?;
        let width = self
            .hidden()
            .get(layer)
            .map(|l| l.output_len())
            .unwrap_or(0);
        if neuron >= width {
            return Err(Error::NodeOutOfRange { layer, neuron });
        }
        let mut sums = self.empty_sums();
        let mut network = self.empty_network();
        self.feed_forward(input, &mut sums, &mut network, layer + 1);
        Ok(network[layer + 1][neuron])
    }

    /// The output of the last cached forward pass.
    pub fn output(&self) -> f64 {
        self.activations[self.layers.len()][0]
    }

    /// Runs the first `depth` layers on `input`.
    fn feed_forward(
        &self,
        input: &[f64],
        sums: &mut [Vec<f64>],
        network: &mut [Vec<f64>],
        depth: usize,
    ) {
        network[0].copy_from_slice(input);
        for (i, layer) in self.layers.iter().enumerate().take(depth) {
            let (input, output) = mut_layers(network, i);
            layer.forward(input, &mut sums[i], output);
        }
    }

    /// Returns zeroed gradients matching the network's shape.
    pub fn new_gradients(&self) -> Gradients {
        Gradients {
            layers: self.layers.iter().map(|l| l.new_update()).collect(),
            examples: 0,
        }
    }

    /// Computes the gradient of the squared error `½(output - target)²`
    /// for one example.
    pub fn backward(&mut self, input: &[f64], target: f64) -> Result<Gradients> {
        let mut gradients = self.new_gradients();
        self.accumulate(input, target, &mut gradients)?;
        Ok(gradients)
    }

    /// Runs a cached forward pass on `input` and adds the gradients of the
    /// squared error to `gradients`. Returns the example's loss.
    pub fn accumulate(
        &mut self,
        input: &[f64],
        target: f64,
        gradients: &mut Gradients,
    ) -> Result<f64> {
        let output = self.forward(input)?;
        let mut errors = self.empty_network();
        errors[self.layers.len()][0] = output - target;
        for (i, layer) in self.layers.iter().enumerate().rev() {
            let (inputs, outputs) = io_layers(&self.activations, i);
            let (in_error, out_error) = mut_layers(&mut errors, i);
            layer.backward(inputs, outputs, out_error, in_error, &mut gradients.layers[i]);
        }
        gradients.examples += 1;
        Ok(0.5 * (output - target) * (output - target))
    }

    /// Applies `gradients` averaged over the examples they hold, then resets
    /// them.
    ///
    /// Each weight moves by `-rate * (gradient + regularization'(weight))`;
    /// biases are not regularized.
    pub fn apply_gradients(
        &mut self,
        rate: f64,
        regularization: &RegularizationConfig,
        gradients: &mut Gradients,
    ) {
        if gradients.examples == 0 {
            return;
        }
        let scale = 1.0 / gradients.examples as f64;
        for (layer, update) in self.layers.iter_mut().zip(gradients.layers.iter_mut()) {
            layer.apply_update(rate, scale, regularization, update);
        }
        gradients.examples = 0;
    }

    /// The sum of the regularization penalty over every weight.
    pub fn penalty(&self, regularization: &RegularizationConfig) -> f64 {
        self.layers
            .iter()
            .map(|l| regularization.penalty(l.weights()))
            .sum()
    }

    /// Copies out the weights and the last cached pass for rendering.
    pub fn state(&self) -> NetworkState {
        NetworkState {
            weights: self
                .layers
                .iter()
                .map(|l| l.weights().outer_iter().map(|row| row.to_vec()).collect())
                .collect(),
            biases: self.layers.iter().map(|l| l.biases().to_vec()).collect(),
            sums: self.sums.clone(),
            activations: self.activations[1..].to_vec(),
        }
    }

    /// Returns an activation network full of zeros.
    fn empty_network(&self) -> Vec<Vec<f64>> {
        let mut network = Vec::with_capacity(self.layers.len() + 1);
        network.push(vec![0.0; self.input_len()]);
        for layer in &self.layers {
            network.push(vec![0.0; layer.output_len()]);
        }
        network
    }

    fn empty_sums(&self) -> Vec<Vec<f64>> {
        self.layers
            .iter()
            .map(|l| vec![0.0; l.output_len()])
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn layer_mut(&mut self, i: usize) -> &mut Dense {
        &mut self.layers[i]
    }
}

/// Parameter gradients accumulated over one or more examples.
#[derive(Clone, Debug)]
pub struct Gradients {
    layers: Vec<dense::Update>,
    examples: usize,
}

impl Gradients {
    /// Gradients of weight layer `i` (hidden layers first, output last).
    pub fn layer(&self, i: usize) -> &dense::Update {
        &self.layers[i]
    }

    /// How many examples have been accumulated since the last update.
    pub fn examples(&self) -> usize {
        self.examples
    }
}

/// A read-only snapshot of the network for visualization.
///
/// Every field is indexed `[layer][neuron]`, hidden layers first and the
/// output layer last; `weights` adds a trailing `[input]` index.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkState {
    pub weights: Vec<Vec<Vec<f64>>>,
    pub biases: Vec<Vec<f64>>,
    /// Pre-activation sums from the last forward pass.
    pub sums: Vec<Vec<f64>>,
    /// Activated outputs from the last forward pass.
    pub activations: Vec<Vec<f64>>,
}

/// Gets input and output slices for a layer.
fn io_layers(layers: &[Vec<f64>], layer: usize) -> (&[f64], &[f64]) {
    let (before, after) = layers[layer..].split_at(1);
    (&before[0], &after[0])
}

fn mut_layers(layers: &mut [Vec<f64>], layer: usize) -> (&mut [f64], &mut [f64]) {
    let (before, after) = layers[layer..].split_at_mut(1);
    (&mut before[0], &mut after[0])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regularization::Regularization;

    const NO_PENALTY: RegularizationConfig = RegularizationConfig {
        kind: Regularization::None,
        rate: 0.0,
    };

    #[test]
    fn shape() {
        let network = Network::new(3, &[4, 2], Activator::ReLU).unwrap();
        assert_eq!(network.input_len(), 3);
        assert_eq!(network.hidden_layers(), vec![4, 2]);
        assert_eq!(network.num_layers(), 3);
        let state = network.state();
        assert_eq!(state.weights.len(), 3);
        assert_eq!(state.weights[0].len(), 4);
        assert_eq!(state.weights[0][0].len(), 3);
        assert_eq!(state.weights[2].len(), 1);
        assert_eq!(state.weights[2][0].len(), 2);
        assert_eq!(state.activations.len(), 3);
    }

    #[test]
    fn invalid_architecture() {
        assert!(Network::new(0, &[2], Activator::TanH).is_err());
        assert!(Network::new(2, &[2, 0], Activator::TanH).is_err());
        assert!(Network::new(2, &[], Activator::TanH).is_ok());
    }

    #[test]
    fn wrong_input_size() {
        let mut network = Network::new(2, &[3], Activator::TanH).unwrap();
        let err = network.forward(&[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(err, Error::InputSize { expected: 2, got: 3 });
        assert!(network.backward(&[1.0], 1.0).is_err());
        assert!(network.forward_to_node(&[], 0, 0).is_err());
    }

    #[test]
    fn forward_is_deterministic_and_cached() {
        let mut network = Network::new(2, &[4, 3], Activator::Sigmoid).unwrap();
        let a = network.forward(&[0.3, -0.8]).unwrap();
        let b = network.forward(&[0.3, -0.8]).unwrap();
        assert_eq!(a, b);
        assert!(a.is_finite() && a.abs() < 1.0);
        let state = network.state();
        assert_eq!(state.activations[2], vec![a]);
        assert_eq!(state.sums[2][0].tanh(), a);
        assert_eq!(network.run(&[0.3, -0.8]).unwrap(), a);
    }

    #[test]
    fn run_leaves_cache_alone() {
        let mut network = Network::new(2, &[2], Activator::TanH).unwrap();
        network.forward(&[1.0, 1.0]).unwrap();
        let before = network.state();
        network.run(&[-3.0, 2.0]).unwrap();
        network.forward_to_node(&[-3.0, 2.0], 0, 1).unwrap();
        assert_eq!(network.state(), before);
    }

    #[test]
    fn forward_to_node_matches_full_pass() {
        let mut network = Network::new(2, &[3, 2], Activator::TanH).unwrap();
        network.forward(&[0.4, 0.9]).unwrap();
        let state = network.state();
        for layer in 0..2 {
            for neuron in 0..state.activations[layer].len() {
                let value = network.forward_to_node(&[0.4, 0.9], layer, neuron).unwrap();
                assert_eq!(value, state.activations[layer][neuron]);
            }
        }
        assert_eq!(
            network.forward_to_node(&[0.4, 0.9], 1, 2),
            Err(Error::NodeOutOfRange { layer: 1, neuron: 2 })
        );
        assert!(network.forward_to_node(&[0.4, 0.9], 2, 0).is_err());
    }

    fn loss(network: &Network, input: &[f64], target: f64) -> f64 {
        let y = network.run(input).unwrap();
        0.5 * (y - target) * (y - target)
    }

    #[test]
    fn gradients_match_finite_differences() {
        let h = 1e-6;
        for activator in &[Activator::TanH, Activator::Sigmoid, Activator::Linear] {
            let mut network = Network::new(3, &[4, 3], *activator).unwrap();
            let input = [0.7, -0.2, 0.4];
            let target = -1.0;
            let gradients = network.backward(&input, target).unwrap();
            for i in 0..network.num_layers() {
                for (j, &analytic) in gradients.layer(i).weight_gradients().indexed_iter() {
                    let original = network.layers[i].weights()[j];
                    network.layer_mut(i).weights_mut()[j] = original + h;
                    let up = loss(&network, &input, target);
                    network.layer_mut(i).weights_mut()[j] = original - h;
                    let down = loss(&network, &input, target);
                    network.layer_mut(i).weights_mut()[j] = original;
                    let numeric = (up - down) / (2.0 * h);
                    assert!(
                        (numeric - analytic).abs() < 1e-6,
                        "{} layer {} weight {:?}: {} vs {}",
                        activator,
                        i,
                        j,
                        numeric,
                        analytic
                    );
                }
            }
        }
    }

    #[test]
    fn update_descends() {
        let mut network = Network::new(2, &[4], Activator::TanH).unwrap();
        let input = [0.5, -0.5];
        let before = loss(&network, &input, 1.0);
        let mut gradients = network.backward(&input, 1.0).unwrap();
        assert_eq!(gradients.examples(), 1);
        network.apply_gradients(0.01, &NO_PENALTY, &mut gradients);
        assert_eq!(gradients.examples(), 0);
        assert!(loss(&network, &input, 1.0) <= before);
    }

    #[test]
    fn averaged_update_equals_single_when_duplicated() {
        let mut a = Network::new(2, &[3], Activator::TanH).unwrap();
        let mut b = a.clone();
        let input = [0.2, 0.1];
        let mut single = a.backward(&input, 1.0).unwrap();
        a.apply_gradients(0.1, &NO_PENALTY, &mut single);
        let mut double = b.new_gradients();
        b.accumulate(&input, 1.0, &mut double).unwrap();
        b.accumulate(&input, 1.0, &mut double).unwrap();
        b.apply_gradients(0.1, &NO_PENALTY, &mut double);
        for (wa, wb) in a.state().weights.iter().zip(b.state().weights.iter()) {
            for (ra, rb) in wa.iter().zip(wb) {
                for (x, y) in ra.iter().zip(rb) {
                    assert!((x - y).abs() < 1e-12);
                }
            }
        }
    }

    #[test]
    fn reset_keeps_shape() {
        let mut network = Network::new(2, &[5, 2], Activator::ReLU).unwrap();
        let before = network.state();
        network.forward(&[1.0, 2.0]).unwrap();
        network.reset();
        let after = network.state();
        assert_eq!(network.hidden_layers(), vec![5, 2]);
        assert_ne!(before.weights, after.weights);
        assert!(after.activations.iter().flatten().all(|&v| v == 0.0));
    }
}
