//! Fixed-topology feed-forward networks evolved by the genetic algorithm.
//!
//! A [`Genome`] is a stack of fully connected layers. Layer `l` owns a weight
//! matrix of shape `inputs × outputs` and a bias vector of length `outputs`,
//! and computes
//!
//! ```text
//! outputs = activation(inputs · W + b)
//! ```
//!
//! with the same [`ActivationKind`] applied element-wise after every layer,
//! including the output layer. The layer shapes are fully determined by the
//! [`Architecture`]:
//!
//! ```text
//! 7 × h,  h × h (hidden_layers - 1 times),  h × 4
//! ```
//!
//! where 7 is the number of agent sensors and 4 the number of actions.
//!
//! The activation and crossover operator are chosen once at construction and
//! travel with the genome, so children inherit them from their parents.

use gladius_engine::{ACTION_COUNT, Brain, SENSOR_COUNT};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{ActivationKind, CrossoverKind, Matrix};

/// Shape of the networks of a population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Architecture {
    pub hidden_layers: usize,
    pub nodes_per_layer: usize,
}

impl Default for Architecture {
    fn default() -> Self {
        Self {
            hidden_layers: 1,
            nodes_per_layer: 8,
        }
    }
}

impl Architecture {
    pub const INPUT_NODES: usize = SENSOR_COUNT;
    pub const OUTPUT_NODES: usize = ACTION_COUNT;

    /// `(inputs, outputs)` of every layer, from input to output.
    ///
    /// # Panics
    ///
    /// Panics if the architecture has no hidden layer or no hidden node.
    #[must_use]
    pub fn layer_shapes(&self) -> Vec<(usize, usize)> {
        assert!(
            self.hidden_layers > 0 && self.nodes_per_layer > 0,
            "architecture needs at least one hidden node"
        );
        let h = self.nodes_per_layer;
        let mut shapes = Vec::with_capacity(self.hidden_layers + 1);
        shapes.push((Self::INPUT_NODES, h));
        shapes.extend((1..self.hidden_layers).map(|_| (h, h)));
        shapes.push((h, Self::OUTPUT_NODES));
        shapes
    }
}

/// A genome whose stored layers do not match its declared [`Architecture`].
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum ShapeError {
    #[display("architecture {architecture:?} has no hidden node")]
    EmptyArchitecture { architecture: Architecture },
    #[display(
        "expected {expected} layers, found {weights} weight matrices and {biases} bias vectors"
    )]
    LayerCount {
        expected: usize,
        weights: usize,
        biases: usize,
    },
    #[display(
        "layer {layer}: expected a {}x{} weight matrix, found {}x{}",
        expected.0,
        expected.1,
        found.0,
        found.1
    )]
    Weights {
        layer: usize,
        expected: (usize, usize),
        found: (usize, usize),
    },
    #[display("layer {layer}: {rows}x{cols} weight matrix holds {len} values")]
    WeightData {
        layer: usize,
        rows: usize,
        cols: usize,
        len: usize,
    },
    #[display("layer {layer}: expected {expected} biases, found {found}")]
    Biases {
        layer: usize,
        expected: usize,
        found: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    architecture: Architecture,
    activation: ActivationKind,
    crossover: CrossoverKind,
    weights: Vec<Matrix>,
    biases: Vec<Vec<f32>>,
}

impl Genome {
    /// Creates a genome with every weight and bias drawn from `U[-1, 1]`.
    pub fn random<R>(
        architecture: Architecture,
        activation: ActivationKind,
        crossover: CrossoverKind,
        rng: &mut R,
    ) -> Self
    where
        R: Rng + ?Sized,
    {
        let shapes = architecture.layer_shapes();
        let weights = shapes
            .iter()
            .map(|&(rows, cols)| Matrix::random(rows, cols, rng))
            .collect();
        let biases = shapes
            .iter()
            .map(|&(_, cols)| (0..cols).map(|_| rng.random_range(-1.0..=1.0)).collect())
            .collect();
        Self {
            architecture,
            activation,
            crossover,
            weights,
            biases,
        }
    }

    /// Creates a genome with every weight and bias set to zero.
    #[must_use]
    pub fn zeroed(
        architecture: Architecture,
        activation: ActivationKind,
        crossover: CrossoverKind,
    ) -> Self {
        let shapes = architecture.layer_shapes();
        Self {
            architecture,
            activation,
            crossover,
            weights: shapes
                .iter()
                .map(|&(rows, cols)| Matrix::zeros(rows, cols))
                .collect(),
            biases: shapes.iter().map(|&(_, cols)| vec![0.0; cols]).collect(),
        }
    }

    #[must_use]
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }

    #[must_use]
    pub fn activation(&self) -> ActivationKind {
        self.activation
    }

    #[must_use]
    pub fn crossover(&self) -> CrossoverKind {
        self.crossover
    }

    #[must_use]
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    #[must_use]
    pub fn biases(&self) -> &[Vec<f32>] {
        &self.biases
    }

    pub(crate) fn layers_mut(&mut self) -> impl Iterator<Item = (&mut Matrix, &mut Vec<f32>)> {
        self.weights.iter_mut().zip(&mut self.biases)
    }

    /// Checks that the stored layers have exactly the shapes of the declared
    /// architecture.
    ///
    /// Genomes built by this crate always pass; deserialized ones may not.
    pub fn check_shape(&self) -> Result<(), ShapeError> {
        let architecture = self.architecture;
        if architecture.hidden_layers == 0 || architecture.nodes_per_layer == 0 {
            return Err(ShapeError::EmptyArchitecture { architecture });
        }
        let shapes = architecture.layer_shapes();
        if self.weights.len() != shapes.len() || self.biases.len() != shapes.len() {
            return Err(ShapeError::LayerCount {
                expected: shapes.len(),
                weights: self.weights.len(),
                biases: self.biases.len(),
            });
        }
        let layers = self.weights.iter().zip(&self.biases).zip(&shapes);
        for (layer, ((w, b), &expected)) in layers.enumerate() {
            let (rows, cols) = w.shape();
            if (rows, cols) != expected {
                return Err(ShapeError::Weights {
                    layer,
                    expected,
                    found: (rows, cols),
                });
            }
            let len = w.as_slice().len();
            if rows.checked_mul(cols) != Some(len) {
                return Err(ShapeError::WeightData {
                    layer,
                    rows,
                    cols,
                    len,
                });
            }
            if b.len() != cols {
                return Err(ShapeError::Biases {
                    layer,
                    expected: cols,
                    found: b.len(),
                });
            }
        }
        Ok(())
    }

    /// Total number of evolvable parameters.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| w.as_slice().len() + b.len())
            .sum()
    }

    /// Runs the network on `inputs`.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not have [`Architecture::INPUT_NODES`] elements.
    #[must_use]
    pub fn forward(&self, inputs: &[f32]) -> Vec<f32> {
        self.layers(inputs).last().unwrap_or_default()
    }

    /// Runs the network on `inputs` and returns the output of every layer.
    ///
    /// # Panics
    ///
    /// Panics if `inputs` does not have [`Architecture::INPUT_NODES`] elements.
    #[must_use]
    pub fn layer_activations(&self, inputs: &[f32]) -> Vec<Vec<f32>> {
        self.layers(inputs).collect()
    }

    fn layers(&self, inputs: &[f32]) -> impl Iterator<Item = Vec<f32>> {
        assert_eq!(
            inputs.len(),
            Architecture::INPUT_NODES,
            "genome expects {} inputs",
            Architecture::INPUT_NODES
        );
        let mut current = inputs.to_vec();
        self.weights.iter().zip(&self.biases).map(move |(w, b)| {
            let mut out = w.left_mul(&current);
            for (o, bias) in out.iter_mut().zip(b) {
                *o = self.activation.apply(*o + bias);
            }
            current.clone_from(&out);
            out
        })
    }

    /// Produces two children with this genome's crossover operator.
    ///
    /// The operator is applied once per row of every weight matrix and once per
    /// bias vector. Children inherit this genome's activation and crossover.
    ///
    /// # Panics
    ///
    /// Panics if `other` has a different architecture.
    pub fn cross_over<R>(&self, other: &Self, rng: &mut R) -> (Self, Self)
    where
        R: Rng + ?Sized,
    {
        assert_eq!(
            self.architecture, other.architecture,
            "cannot cross over genomes with different architectures"
        );
        let mut child1 = Self::zeroed(self.architecture, self.activation, self.crossover);
        let mut child2 = child1.clone();

        for (l, (w1, w2)) in self.weights.iter().zip(&other.weights).enumerate() {
            for row in 0..w1.rows() {
                let (a, b) = self.crossover.perform(w1.row(row), w2.row(row), rng);
                child1.weights[l].row_mut(row).copy_from_slice(&a);
                child2.weights[l].row_mut(row).copy_from_slice(&b);
            }
        }
        for (l, (b1, b2)) in self.biases.iter().zip(&other.biases).enumerate() {
            let (a, b) = self.crossover.perform(b1, b2, rng);
            child1.biases[l] = a;
            child2.biases[l] = b;
        }

        (child1, child2)
    }
}

impl Brain for Genome {
    fn input_len(&self) -> usize {
        Architecture::INPUT_NODES
    }

    fn output_len(&self) -> usize {
        Architecture::OUTPUT_NODES
    }

    fn forward(&self, inputs: &[f32]) -> Vec<f32> {
        Genome::forward(self, inputs)
    }

    fn layer_activations(&self, inputs: &[f32]) -> Vec<Vec<f32>> {
        Genome::layer_activations(self, inputs)
    }
}
