//! L1 and L2 weight penalties.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::utils::sign;

/// Which penalty is added to the weight gradients.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regularization {
    #[default]
    None,
    /// Lasso, `rate * Σ|w|`
    L1,
    /// Ridge, `rate * ½ Σ w²`
    L2,
}

impl Regularization {
    pub fn name(&self) -> &'static str {
        match *self {
            Regularization::None => "None",
            Regularization::L1 => "L1",
            Regularization::L2 => "L2",
        }
    }
}

impl fmt::Display for Regularization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A penalty kind paired with its strength.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RegularizationConfig {
    #[serde(rename = "type")]
    pub kind: Regularization,
    pub rate: f64,
}

impl RegularizationConfig {
    pub fn new(kind: Regularization, rate: f64) -> Self {
        RegularizationConfig { kind, rate }
    }

    fn is_active(&self) -> bool {
        self.kind != Regularization::None && self.rate != 0.0
    }

    /// The penalty contributed by `weights` to the total loss.
    pub fn penalty<'a, I>(&self, weights: I) -> f64
    where
        I: IntoIterator<Item = &'a f64>,
    {
        if !self.is_active() {
            return 0.0;
        }
        let weights = weights.into_iter();
        let sum = match self.kind {
            Regularization::None => 0.0,
            Regularization::L1 => weights.map(|w| w.abs()).sum(),
            Regularization::L2 => 0.5 * weights.map(|w| w * w).sum::<f64>(),
        };
        self.rate * sum
    }

    /// Derivative of the penalty with respect to a single weight.
    pub fn gradient(&self, weight: f64) -> f64 {
        if !self.is_active() {
            return 0.0;
        }
        match self.kind {
            Regularization::None => 0.0,
            Regularization::L1 => self.rate * sign(weight),
            Regularization::L2 => self.rate * weight,
        }
    }
}
