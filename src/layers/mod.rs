use crate::regularization::RegularizationConfig;

pub mod dense;

pub use self::dense::Dense;

/// A single layer of a feed-forward network.
pub trait Layer {
    /// A container for gradients accumulated by `backward`.
    type Update;

    fn input_len(&self) -> usize;

    fn output_len(&self) -> usize;

    /// Returns a new, empty model update.
    fn new_update(&self) -> Self::Update;

    /// Computes the layer's pre-activation sums into `sums` and the
    /// activated values into `outputs`.
    fn forward(&self, inputs: &[f64], sums: &mut [f64], outputs: &mut [f64]);

    /// Feeds `output_errors` backwards through the layer, accumulating the
    /// errors of the previous layer into `input_errors` and the parameter
    /// gradients into `update`.
    fn backward(
        &self,
        inputs: &[f64],
        outputs: &[f64],
        output_errors: &[f64],
        input_errors: &mut [f64],
        update: &mut Self::Update,
    );

    /// Applies and resets the provided `update`, scaling by the gradient
    /// descent `rate`. Accumulated gradients are multiplied by `scale`
    /// before the regularization term is added.
    fn apply_update(
        &mut self,
        rate: f64,
        scale: f64,
        regularization: &RegularizationConfig,
        update: &mut Self::Update,
    );
}
