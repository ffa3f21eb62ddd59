use std::fmt;

use serde::{Deserialize, Serialize};

/// Slope of [`ActivationKind::LeakyRelu`] for negative inputs.
pub const LEAKY_RELU_SLOPE: f32 = 0.01;

/// Element-wise activation function applied after every layer.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivationKind {
    #[default]
    Sigmoid,
    Relu,
    LeakyRelu,
    Tanh,
}

impl ActivationKind {
    pub const ALL: [Self; 4] = [Self::Sigmoid, Self::Relu, Self::LeakyRelu, Self::Tanh];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Sigmoid => "sigmoid",
            Self::Relu => "relu",
            Self::LeakyRelu => "leaky_relu",
            Self::Tanh => "tanh",
        }
    }

    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Self::Relu => x.max(0.0),
            Self::LeakyRelu => {
                if x > 0.0 {
                    x
                } else {
                    LEAKY_RELU_SLOPE * x
                }
            }
            Self::Tanh => x.tanh(),
        }
    }
}

impl fmt::Display for ActivationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_is_centered() {
        assert!((ActivationKind::Sigmoid.apply(0.0) - 0.5).abs() < 1e-6);
        assert!(ActivationKind::Sigmoid.apply(50.0) <= 1.0);
        assert!(ActivationKind::Sigmoid.apply(-50.0) >= 0.0);
    }

    #[test]
    fn test_rectifiers() {
        assert!(ActivationKind::Relu.apply(-3.0).abs() < f32::EPSILON);
        assert!((ActivationKind::Relu.apply(2.5) - 2.5).abs() < f32::EPSILON);
        assert!((ActivationKind::LeakyRelu.apply(-2.0) + 0.02).abs() < 1e-6);
        assert!((ActivationKind::LeakyRelu.apply(2.0) - 2.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_tanh_is_odd() {
        for x in [0.1, 0.7, 3.0] {
            let t = ActivationKind::Tanh.apply(x);
            assert!((t + ActivationKind::Tanh.apply(-x)).abs() < 1e-6);
            assert!(t.abs() < 1.0);
        }
    }
}
