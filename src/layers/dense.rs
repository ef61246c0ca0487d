use crate::activator::Activator;
use crate::layers;
use crate::regularization::RegularizationConfig;
use crate::utils::ZeroOut;

use itertools::izip;
use ndarray::{linalg, prelude::*};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;

/// A wrapper for a fully connected layer of a neural network
///
/// Stores the weights for every neuron as a single matrix with one row per
/// neuron, plus one bias per neuron.
#[derive(Clone, Debug)]
pub struct Dense {
    /// The activation function to be used for every neuron in the layer.
    activator: Activator,
    /// The network weights, `outputs x inputs`.
    weights: Array2<f64>,
    biases: Array1<f64>,
}

impl Dense {
    /// Initializes a new, untrained layer.
    ///
    /// Arguments:
    ///
    ///  * `activator` - the activation function to be used for this layer's
    ///                  output.
    ///  * `inputs` - the number of inputs to this layer.
    ///  * `outputs` - the number of outputs from this layer.
    ///
    /// Weights are drawn uniformly from `±sqrt(2 / (inputs + 1))` and biases
    /// from a tenth of that range.
    pub fn new(activator: Activator, inputs: usize, outputs: usize) -> Self {
        let scale = (2.0 / (inputs as f64 + 1.0)).sqrt();
        let weights = Uniform::new(-scale, scale)
            .map(|dist| Array2::random((outputs, inputs), dist))
            .unwrap_or_else(|_| Array2::zeros((outputs, inputs)));
        let biases = Uniform::new(-0.1 * scale, 0.1 * scale)
            .map(|dist| Array1::random(outputs, dist))
            .unwrap_or_else(|_| Array1::zeros(outputs));
        Dense {
            activator,
            weights,
            biases,
        }
    }

    /// Redraws every weight and bias, keeping the shape.
    pub fn reset(&mut self) {
        let (outputs, inputs) = self.weights.dim();
        *self = Dense::new(self.activator, inputs, outputs);
    }

    pub fn activator(&self) -> Activator {
        self.activator
    }

    pub fn weights(&self) -> &Array2<f64> {
        &self.weights
    }

    pub fn biases(&self) -> &Array1<f64> {
        &self.biases
    }

    #[cfg(test)]
    pub(crate) fn weights_mut(&mut self) -> &mut Array2<f64> {
        &mut self.weights
    }
}

/// Gradients for one dense layer.
#[derive(Clone, Debug)]
pub struct Update {
    weight_delta: Array2<f64>,
    bias_delta: Array1<f64>,
    derivative: Array1<f64>,
}

impl Update {
    /// Accumulated `dL/dW`, one row per neuron.
    pub fn weight_gradients(&self) -> &Array2<f64> {
        &self.weight_delta
    }

    /// Accumulated `dL/db`.
    pub fn bias_gradients(&self) -> &Array1<f64> {
        &self.bias_delta
    }
}

impl ZeroOut for Update {
    fn zero_out(&mut self) {
        self.weight_delta.zero_out();
        self.bias_delta.zero_out();
        self.derivative.zero_out();
    }
}

impl layers::Layer for Dense {
    type Update = Update;

    fn input_len(&self) -> usize {
        self.weights.ncols()
    }

    fn output_len(&self) -> usize {
        self.weights.nrows()
    }

    fn new_update(&self) -> Self::Update {
        Update {
            weight_delta: Array2::zeros(self.weights.raw_dim()),
            bias_delta: Array1::zeros(self.output_len()),
            derivative: Array1::zeros(self.output_len()),
        }
    }

    fn forward(&self, inputs: &[f64], sums: &mut [f64], outputs: &mut [f64]) {
        assert_eq!(inputs.len(), self.input_len());
        assert_eq!(sums.len(), self.output_len());
        assert_eq!(outputs.len(), self.output_len());
        let inputs = ArrayView1::from(inputs);
        let mut sums = ArrayViewMut1::from(sums);
        sums.assign(&self.biases);
        linalg::general_mat_vec_mul(1.0, &self.weights, &inputs, 1.0, &mut sums);
        for (y, z) in outputs.iter_mut().zip(sums.iter()) {
            *y = self.activator.f(*z);
        }
    }

    fn backward(
        &self,
        inputs: &[f64],
        outputs: &[f64],
        output_errors: &[f64],
        input_errors: &mut [f64],
        update: &mut Self::Update,
    ) {
        assert_eq!(inputs.len(), self.input_len());
        assert_eq!(outputs.len(), self.output_len());
        assert_eq!(output_errors.len(), self.output_len());
        assert_eq!(input_errors.len(), self.input_len());
        for (y, e, d, b) in izip!(
            outputs,
            output_errors,
            update.derivative.iter_mut(),
            update.bias_delta.iter_mut()
        ) {
            *d = e * self.activator.fprime(*y);
            *b += *d;
        }

        let mut input_errors = ArrayViewMut1::from(input_errors);
        linalg::general_mat_vec_mul(
            1.0,
            &self.weights.t(),
            &update.derivative,
            1.0,
            &mut input_errors,
        );

        // dW += d ⊗ x
        let column = update.derivative.view().insert_axis(Axis(1));
        let row = ArrayView1::from(inputs).insert_axis(Axis(0));
        linalg::general_mat_mul(1.0, &column, &row, 1.0, &mut update.weight_delta);
    }

    fn apply_update(
        &mut self,
        rate: f64,
        scale: f64,
        regularization: &RegularizationConfig,
        update: &mut Self::Update,
    ) {
        self.weights.zip_mut_with(&update.weight_delta, |w, &g| {
            let gradient = g * scale + regularization.gradient(*w);
            *w -= rate * gradient;
        });
        self.biases.scaled_add(-rate * scale, &update.bias_delta);
        update.zero_out();
    }
}
