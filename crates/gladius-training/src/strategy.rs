//! String keys of the pluggable strategies.
//!
//! Every strategy family (activation, crossover, mutation, selection, fitness,
//! action policy) is a closed enum. Configuration files refer to a variant by
//! its key, and keys are resolved once at load time through [`StrategyKey`].

use std::{fmt::Write as _, str::FromStr};

use gladius_engine::ActionPolicy;
use gladius_evaluator::FitnessKind;

use crate::{ActivationKind, CrossoverKind, MutationKind, SelectionKind};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
#[display("unknown {family} `{key}` (expected one of: {expected})")]
pub struct UnknownStrategyError {
    pub family: &'static str,
    pub key: String,
    pub expected: String,
}

/// A closed set of strategies addressable by a string key.
pub trait StrategyKey: Copy + 'static {
    /// Human readable name of the strategy family, used in error messages.
    const FAMILY: &'static str;

    /// Every variant, in declaration order.
    fn all() -> &'static [Self];

    fn key(self) -> &'static str;

    /// Other keys accepted for this strategy.
    fn aliases(self) -> &'static [&'static str] {
        &[]
    }

    /// Resolves a key (or one of its aliases) into a strategy.
    fn from_key(key: &str) -> Result<Self, UnknownStrategyError> {
        Self::all()
            .iter()
            .copied()
            .find(|s| s.key() == key || s.aliases().contains(&key))
            .ok_or_else(|| {
                let mut expected = String::new();
                for (i, s) in Self::all().iter().enumerate() {
                    if i > 0 {
                        expected.push_str(", ");
                    }
                    let _ = write!(expected, "`{}`", s.key());
                }
                UnknownStrategyError {
                    family: Self::FAMILY,
                    key: key.to_owned(),
                    expected,
                }
            })
    }
}

impl StrategyKey for ActivationKind {
    const FAMILY: &'static str = "activation function";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        ActivationKind::key(self)
    }
}

impl StrategyKey for CrossoverKind {
    const FAMILY: &'static str = "crossover operator";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        CrossoverKind::key(self)
    }
}

impl StrategyKey for MutationKind {
    const FAMILY: &'static str = "mutation operator";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        MutationKind::key(self)
    }

    fn aliases(self) -> &'static [&'static str] {
        MutationKind::aliases(self)
    }
}

impl StrategyKey for SelectionKind {
    const FAMILY: &'static str = "selection strategy";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        SelectionKind::key(self)
    }
}

impl StrategyKey for FitnessKind {
    const FAMILY: &'static str = "fitness function";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        FitnessKind::key(self)
    }
}

impl StrategyKey for ActionPolicy {
    const FAMILY: &'static str = "action policy";

    fn all() -> &'static [Self] {
        &Self::ALL
    }

    fn key(self) -> &'static str {
        ActionPolicy::key(self)
    }
}

impl FromStr for ActivationKind {
    type Err = UnknownStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

impl FromStr for CrossoverKind {
    type Err = UnknownStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

impl FromStr for MutationKind {
    type Err = UnknownStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}

impl FromStr for SelectionKind {
    type Err = UnknownStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s)
    }
}
