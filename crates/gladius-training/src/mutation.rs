//! In-place mutation operators.
//!
//! A mutation is applied once per genome per generation. Every operator keeps
//! the shapes of the genome and never touches elements it did not select.
//!
//! - `single_weight_per_node` - one coin flip per genome with probability
//!   `rate`; when it fires, every node of every layer gets exactly one of its
//!   incoming weights redrawn from `U[-1, 1]`, and every bias vector gets
//!   exactly one element redrawn
//! - `all_weights` - every weight and bias is independently redrawn from
//!   `U[-1, 1]` with probability `rate`
//! - `all_weights_biased` - every weight and bias is independently nudged by
//!   `U[-1, 1]` with probability `rate`
//!
//! The last two are also accepted as `all_weights_mutation` and
//! `all_weights_biased_mutation`.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::Genome;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    #[default]
    SingleWeightPerNode,
    #[serde(alias = "all_weights_mutation")]
    AllWeights,
    #[serde(alias = "all_weights_biased_mutation")]
    AllWeightsBiased,
}

impl MutationKind {
    pub const ALL: [Self; 3] = [
        Self::SingleWeightPerNode,
        Self::AllWeights,
        Self::AllWeightsBiased,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::SingleWeightPerNode => "single_weight_per_node",
            Self::AllWeights => "all_weights",
            Self::AllWeightsBiased => "all_weights_biased",
        }
    }

    /// Older keys that still resolve to this operator.
    #[must_use]
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::SingleWeightPerNode => &[],
            Self::AllWeights => &["all_weights_mutation"],
            Self::AllWeightsBiased => &["all_weights_biased_mutation"],
        }
    }
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A mutation operator together with its rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mutation {
    pub kind: MutationKind,
    /// Probability in `[0, 1]`; per genome or per element depending on `kind`.
    pub rate: f32,
}

impl Default for Mutation {
    fn default() -> Self {
        Self {
            kind: MutationKind::default(),
            rate: 0.2,
        }
    }
}

impl Mutation {
    #[must_use]
    pub fn new(kind: MutationKind, rate: f32) -> Self {
        Self { kind, rate }
    }

    /// Mutates `genome` in place.
    ///
    /// # Panics
    ///
    /// Panics if the rate is outside `[0, 1]`.
    pub fn mutate<R>(&self, genome: &mut Genome, rng: &mut R)
    where
        R: Rng + ?Sized,
    {
        let rate = f64::from(self.rate);
        match self.kind {
            MutationKind::SingleWeightPerNode => {
                if !rng.random_bool(rate) {
                    return;
                }
                for (weights, biases) in genome.layers_mut() {
                    for node in 0..weights.cols() {
                        let input = rng.random_range(0..weights.rows());
                        weights.set(input, node, rng.random_range(-1.0..=1.0));
                    }
                    let slot = rng.random_range(0..biases.len());
                    biases[slot] = rng.random_range(-1.0..=1.0);
                }
            }
            MutationKind::AllWeights => {
                for (weights, biases) in genome.layers_mut() {
                    for value in weights.as_mut_slice().iter_mut().chain(biases.iter_mut()) {
                        if rng.random_bool(rate) {
                            *value = rng.random_range(-1.0..=1.0);
                        }
                    }
                }
            }
            MutationKind::AllWeightsBiased => {
                for (weights, biases) in genome.layers_mut() {
                    for value in weights.as_mut_slice().iter_mut().chain(biases.iter_mut()) {
                        if rng.random_bool(rate) {
                            *value += rng.random_range(-1.0..=1.0);
                        }
                    }
                }
            }
        }
    }
}
