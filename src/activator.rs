//! Activation function types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types selectable for the hidden layers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activator {
    /// Rectified Linear Unit
    #[serde(rename = "relu")]
    ReLU,
    /// Hyperbolic tan function
    #[serde(rename = "tanh")]
    TanH,
    /// Sigmoid function
    Sigmoid,
    /// Identity
    Linear,
}

impl Activator {
    /// Every activator, in the order they are offered to users.
    pub const ALL: [Activator; 4] = [
        Activator::ReLU,
        Activator::TanH,
        Activator::Sigmoid,
        Activator::Linear,
    ];

    /// Evaluates `f(x)` for the selected the activation function.
    pub fn f(&self, x: f64) -> f64 {
        match *self {
            Activator::ReLU => {
                if x > 0.0 {
                    x
                } else {
                    0.0
                }
            }
            Activator::TanH => x.tanh(),
            Activator::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activator::Linear => x,
        }
    }

    /// Evaluates the derivative `f'(x)`, where `x = f^{-1}(y)`.
    ///
    /// Note that this function takes in the *output* of the activation
    /// function, rather than the input. For ReLU an input of exactly zero
    /// produces an output of zero, which is treated as the "off" branch and
    /// has a derivative of zero.
    pub fn fprime(&self, y: f64) -> f64 {
        match *self {
            Activator::ReLU => {
                if y > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activator::TanH => 1.0 - y * y,
            Activator::Sigmoid => y * (1.0 - y),
            Activator::Linear => 1.0,
        }
    }

    /// Display name used by UI labels.
    pub fn name(&self) -> &'static str {
        match *self {
            Activator::ReLU => "ReLU",
            Activator::TanH => "Tanh",
            Activator::Sigmoid => "Sigmoid",
            Activator::Linear => "Linear",
        }
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relu_kink_is_off() {
        let y = Activator::ReLU.f(0.0);
        assert_eq!(y, 0.0);
        assert_eq!(Activator::ReLU.fprime(y), 0.0);
        assert_eq!(Activator::ReLU.fprime(Activator::ReLU.f(0.5)), 1.0);
    }

    #[test]
    fn derivatives_match_finite_differences() {
        let h = 1e-6;
        for activator in &[Activator::TanH, Activator::Sigmoid, Activator::Linear] {
            for &x in &[-2.0, -0.3, 0.0, 0.7, 1.9] {
                let numeric = (activator.f(x + h) - activator.f(x - h)) / (2.0 * h);
                let analytic = activator.fprime(activator.f(x));
                assert!(
                    (numeric - analytic).abs() < 1e-6,
                    "{} at {}: {} vs {}",
                    activator,
                    x,
                    numeric,
                    analytic
                );
            }
        }
    }

    #[test]
    fn serde_names() {
        let parsed: Activator = serde_json::from_str("\"relu\"").unwrap();
        assert_eq!(parsed, Activator::ReLU);
        assert_eq!(serde_json::to_string(&Activator::TanH).unwrap(), "\"tanh\"");
        assert_eq!(serde_json::to_string(&Activator::Sigmoid).unwrap(), "\"sigmoid\"");
    }
}
