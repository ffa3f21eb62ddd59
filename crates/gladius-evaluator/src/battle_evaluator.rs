//! Battle evaluation: scoring brains by letting them fight.
//!
//! A [`DuelEvaluator`] runs one battle between two brains and scores both
//! sides. The training scheduler only depends on this trait, so the way a
//! battle is configured and scored stays a concern of this crate.
//!
//! [`BattleEvaluator`] is the default implementation: it runs a
//! [`Battle`] with a fixed [`BattleConfig`], converts both agents' counters to
//! [`AgentMetrics`] and applies a [`FitnessFunction`] from each side's
//! perspective.

use std::fmt;

use gladius_engine::{Battle, BattleConfig, BattleError, BattleOutcome, Brain, Side};
use serde::Serialize;

use crate::{AgentMetrics, FitnessFunction};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum DuelError {
    #[display("battle setup failed: {_0}")]
    Battle(BattleError),
    #[display("{side} fitness is not finite: {fitness}")]
    #[from(skip)]
    NonFiniteFitness { side: Side, fitness: f32 },
}

/// Fitness of both duelists of one battle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DuelScores {
    pub left: f32,
    pub right: f32,
}

impl DuelScores {
    #[must_use]
    pub fn get(&self, side: Side) -> f32 {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }
}

/// Runs a battle between two brains and scores both of them.
pub trait DuelEvaluator: fmt::Debug + Send + Sync {
    /// Runs one battle seeded with `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error when the battle cannot be set up or when a score is
    /// not a finite number.
    fn duel(&self, left: &dyn Brain, right: &dyn Brain, seed: u64)
    -> Result<DuelScores, DuelError>;
}

/// Everything known about a finished battle.
#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub seed: u64,
    pub outcome: BattleOutcome,
    pub left: AgentMetrics,
    pub right: AgentMetrics,
    pub left_fitness: f32,
    pub right_fitness: f32,
}

impl BattleReport {
    #[must_use]
    pub fn scores(&self) -> DuelScores {
        DuelScores {
            left: self.left_fitness,
            right: self.right_fitness,
        }
    }
}

/// Default battle evaluator.
///
/// Plays a full battle with a fixed configuration and evaluates both agents
/// with a fitness function.
#[derive(Debug, Clone)]
pub struct BattleEvaluator<F> {
    config: BattleConfig,
    fitness: F,
}

impl<F> BattleEvaluator<F>
where
    F: FitnessFunction,
{
    /// Creates a new battle evaluator.
    ///
    /// # Arguments
    /// * `config` - Battle length, tick duration and action policy
    /// * `fitness` - Fitness function applied to both sides
    #[must_use]
    pub fn new(config: BattleConfig, fitness: F) -> Self {
        Self { config, fitness }
    }

    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    #[must_use]
    pub fn fitness(&self) -> &F {
        &self.fitness
    }

    /// Plays a battle and returns its full report, including non-finite
    /// fitness values.
    pub fn fight(
        &self,
        left: &dyn Brain,
        right: &dyn Brain,
        seed: u64,
    ) -> Result<BattleReport, BattleError> {
        let outcome = Battle::new(left, right, &self.config, seed)?.fight();
        Ok(self.report(seed, outcome))
    }

    /// Scores an already finished battle.
    #[must_use]
    pub fn report(&self, seed: u64, outcome: BattleOutcome) -> BattleReport {
        let left = AgentMetrics::new(&outcome.left, outcome.frames);
        let right = AgentMetrics::new(&outcome.right, outcome.frames);
        BattleReport {
            seed,
            left_fitness: self.fitness.evaluate(&left, &right),
            right_fitness: self.fitness.evaluate(&right, &left),
            outcome,
            left,
            right,
        }
    }
}

impl<F> DuelEvaluator for BattleEvaluator<F>
where
    F: FitnessFunction,
{
    fn duel(
        &self,
        left: &dyn Brain,
        right: &dyn Brain,
        seed: u64,
    ) -> Result<DuelScores, DuelError> {
        let report = self.fight(left, right, seed)?;
        for side in [Side::Left, Side::Right] {
            let fitness = report.scores().get(side);
            if !fitness.is_finite() {
                tracing::warn!(seed, %side, fitness, "discarding non-finite fitness");
                return Err(DuelError::NonFiniteFitness { side, fitness });
            }
        }
        tracing::trace!(
            seed,
            left = report.left_fitness,
            right = report.right_fitness,
            "battle finished"
        );
        Ok(report.scores())
    }
}
