//! Training configuration file.
//!
//! Every field has a default, so an empty JSON object (or no file at all) is a
//! valid configuration. Strategies are referred to by their string keys and
//! resolved by [`TrainingConfig::resolve`].

use std::{path::Path, thread, time::Duration};

use gladius_engine::{ActionPolicy, BattleConfig};
use gladius_evaluator::FitnessKind;
use gladius_training::{
    ActivationKind, Architecture, CheckpointPolicy, CrossoverKind, EvolutionParams, Mutation,
    MutationKind, PairingPolicy, Selection, SelectionKind, StrategyKey, UnknownStrategyError,
};
use serde::{Deserialize, Serialize};

use crate::util;

#[derive(Debug, Clone, PartialEq, derive_more::Display, derive_more::Error, derive_more::From)]
pub(crate) enum ConfigError {
    UnknownStrategy(#[error(not(source))] UnknownStrategyError),
    #[display("`{name}` must be within [0, 1] (got {value})")]
    #[from(skip)]
    RateOutOfRange { name: &'static str, value: f32 },
    #[display("`workers` must be at least 1")]
    #[from(skip)]
    NoWorkers,
    #[display("`population_size` must be at least 2 (got {size})")]
    #[from(skip)]
    PopulationTooSmall { size: usize },
    #[display("`architecture` needs at least one hidden layer with one node")]
    #[from(skip)]
    NoHiddenNodes,
    #[display("`battle.frames` must be at least 1")]
    #[from(skip)]
    NoFrames,
    #[display("`battle.delta_s` must be positive (got {value})")]
    #[from(skip)]
    InvalidTimeStep { value: f32 },
    #[display("`result_timeout_secs` must be at least 1")]
    #[from(skip)]
    NoTimeout,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct BattleSection {
    pub(crate) frames: usize,
    pub(crate) delta_s: f32,
    pub(crate) action_policy: String,
}

impl Default for BattleSection {
    fn default() -> Self {
        let battle = BattleConfig::default();
        Self {
            frames: battle.frames,
            delta_s: battle.delta_s,
            action_policy: battle.action_policy.key().to_owned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct TrainingConfig {
    pub(crate) population_size: usize,
    pub(crate) architecture: Architecture,
    pub(crate) activation: String,
    pub(crate) selection: String,
    pub(crate) keep_rate: f32,
    pub(crate) mutation: String,
    pub(crate) mutation_rate: f32,
    pub(crate) crossover: String,
    pub(crate) workers: usize,
    pub(crate) battle: BattleSection,
    pub(crate) fitness: String,
    pub(crate) pairing: PairingPolicy,
    pub(crate) result_timeout_secs: u64,
    pub(crate) checkpoint: CheckpointPolicy,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let params = EvolutionParams::default();
        Self {
            population_size: params.population_size,
            architecture: params.architecture,
            activation: params.activation.key().to_owned(),
            selection: params.selection.kind.key().to_owned(),
            keep_rate: params.selection.keep_rate,
            mutation: params.mutation.kind.key().to_owned(),
            mutation_rate: params.mutation.rate,
            crossover: params.crossover.key().to_owned(),
            workers: thread::available_parallelism().map_or(1, Into::into),
            battle: BattleSection::default(),
            fitness: FitnessKind::default().key().to_owned(),
            pairing: params.pairing,
            result_timeout_secs: 600,
            checkpoint: CheckpointPolicy::default(),
        }
    }
}

/// A validated configuration, with every strategy resolved.
#[derive(Debug, Clone)]
pub(crate) struct ResolvedConfig {
    pub(crate) params: EvolutionParams,
    pub(crate) battle: BattleConfig,
    pub(crate) fitness: FitnessKind,
    pub(crate) workers: usize,
    pub(crate) result_timeout: Duration,
    pub(crate) checkpoint: CheckpointPolicy,
}

impl TrainingConfig {
    /// Reads a configuration file, or the defaults if `path` is `None`.
    pub(crate) fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => util::read_json_file("configuration", path),
            None => Ok(Self::default()),
        }
    }

    /// Validates the numeric fields and resolves every strategy key.
    pub(crate) fn resolve(&self) -> Result<ResolvedConfig, ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::PopulationTooSmall {
                size: self.population_size,
            });
        }
        if self.architecture.hidden_layers == 0 || self.architecture.nodes_per_layer == 0 {
            return Err(ConfigError::NoHiddenNodes);
        }
        for (name, value) in [
            ("keep_rate", self.keep_rate),
            ("mutation_rate", self.mutation_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange { name, value });
            }
        }
        if self.workers == 0 {
            return Err(ConfigError::NoWorkers);
        }
        if self.battle.frames == 0 {
            return Err(ConfigError::NoFrames);
        }
        if !(self.battle.delta_s.is_finite() && self.battle.delta_s > 0.0) {
            return Err(ConfigError::InvalidTimeStep {
                value: self.battle.delta_s,
            });
        }
        if self.result_timeout_secs == 0 {
            return Err(ConfigError::NoTimeout);
        }

        let params = EvolutionParams {
            population_size: self.population_size,
            architecture: self.architecture,
            activation: ActivationKind::from_key(&self.activation)?,
            crossover: CrossoverKind::from_key(&self.crossover)?,
            selection: Selection::new(SelectionKind::from_key(&self.selection)?, self.keep_rate),
            mutation: Mutation::new(MutationKind::from_key(&self.mutation)?, self.mutation_rate),
            pairing: self.pairing,
        };
        let battle = BattleConfig {
            frames: self.battle.frames,
            delta_s: self.battle.delta_s,
            action_policy: ActionPolicy::from_key(&self.battle.action_policy)?,
        };
        Ok(ResolvedConfig {
            params,
            battle,
            fitness: FitnessKind::from_key(&self.fitness)?,
            workers: self.workers,
            result_timeout: Duration::from_secs(self.result_timeout_secs),
            checkpoint: self.checkpoint.clone(),
        })
    }
}
