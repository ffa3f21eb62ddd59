//! Fitness functions: from two duelists' metrics to a scalar reward.
//!
//! A fitness function is a pure mapping `(own, enemy) -> f32` where higher is
//! better. Callers must not assume any particular scale or sign: the training
//! engine only sorts by the value.
//!
//! # Available Functions
//!
//! ## Bullet Difference (`bullet_difference`)
//!
//! ```text
//! d = successful_shots - bullets_taken
//! fitness = 3 + d   if d > 0
//!         = 1       if d = 0
//!         = 0       otherwise
//! ```
//!
//! A winner always scores strictly more than a draw, and a draw more than a loss.
//!
//! ## Penalized Ratio (`penalized_ratio`)
//!
//! ```text
//! ratio   = (successful_shots + 1) / (bullets_taken + 1)
//! fitness = ratio × (1 - 0.5 × corner_time) × stalling
//!
//! stalling = 0.5 for each of: never moved, rotated more than 80% of the fight
//! ```
//!
//! Discourages agents that camp in a corner or spin in place waiting for the
//! enemy to walk into their line of fire.
//!
//! ## Accuracy and Field of View (`accuracy_fov`)
//!
//! ```text
//! reward  = 0.6 × accuracy + 0.4 × enemy_in_fov_time + 0.1 × successful_shots
//! penalty = 0.3                          if shooting less than 1% of the fight
//!         + 0.2 × border_time
//!         + 0.4 × (repeated - 0.5) / 0.5  if one action repeats over half the fight
//! fitness = max(reward - penalty, 0)
//! ```
//!
//! Percentages are used as fractions in `[0, 1]` in the formulas above.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::AgentMetrics;

/// Maps the metrics of a duelist and its opponent to a fitness score.
pub trait FitnessFunction: fmt::Debug + Send + Sync {
    /// Computes the fitness of `own`, given how `enemy` behaved in the same battle.
    fn evaluate(&self, own: &AgentMetrics, enemy: &AgentMetrics) -> f32;
}

/// Rewards landing more shots than taken.
#[derive(Debug, Default, Clone, Copy)]
pub struct BulletDifference;

impl FitnessFunction for BulletDifference {
    #[expect(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
    fn evaluate(&self, own: &AgentMetrics, _enemy: &AgentMetrics) -> f32 {
        let diff = own.successful_shots as i64 - own.bullets_taken as i64;
        match diff {
            1.. => 3.0 + diff as f32,
            0 => 1.0,
            _ => 0.0,
        }
    }
}

/// Hit ratio scaled down by corner camping and stalling.
#[derive(Debug, Default, Clone, Copy)]
pub struct PenalizedRatio;

impl PenalizedRatio {
    const CORNER_WEIGHT: f32 = 0.5;
    const STALL_FACTOR: f32 = 0.5;
    const ROTATION_STALL_PERCENT: f32 = 80.0;
}

impl FitnessFunction for PenalizedRatio {
    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, own: &AgentMetrics, _enemy: &AgentMetrics) -> f32 {
        let ratio = (own.successful_shots as f32 + 1.0) / (own.bullets_taken as f32 + 1.0);
        let corner = 1.0 - Self::CORNER_WEIGHT * (own.corner_time_percent / 100.0);

        let mut stalling = 1.0;
        if own.moves_percent <= 0.0 {
            stalling *= Self::STALL_FACTOR;
        }
        if own.rotations_percent > Self::ROTATION_STALL_PERCENT {
            stalling *= Self::STALL_FACTOR;
        }

        ratio * corner * stalling
    }
}

/// Blend of accuracy and time spent facing the enemy, with behavioral penalties.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccuracyFov;

impl AccuracyFov {
    const ACCURACY_WEIGHT: f32 = 0.6;
    const FOV_WEIGHT: f32 = 0.4;
    const HIT_BONUS: f32 = 0.1;
    const PASSIVE_SHOTS_PERCENT: f32 = 1.0;
    const PASSIVE_PENALTY: f32 = 0.3;
    const BORDER_WEIGHT: f32 = 0.2;
    const LOOP_PERCENT: f32 = 50.0;
    const LOOP_WEIGHT: f32 = 0.4;
}

impl FitnessFunction for AccuracyFov {
    #[expect(clippy::cast_precision_loss)]
    fn evaluate(&self, own: &AgentMetrics, _enemy: &AgentMetrics) -> f32 {
        let reward = Self::ACCURACY_WEIGHT * (own.shot_accuracy_percent / 100.0)
            + Self::FOV_WEIGHT * (own.enemy_in_fov_time_percent / 100.0)
            + Self::HIT_BONUS * own.successful_shots as f32;

        let mut penalty = Self::BORDER_WEIGHT * (own.border_time_percent / 100.0);
        if own.shots_percent < Self::PASSIVE_SHOTS_PERCENT {
            penalty += Self::PASSIVE_PENALTY;
        }
        if own.most_repeated_action_percent > Self::LOOP_PERCENT {
            let excess = (own.most_repeated_action_percent - Self::LOOP_PERCENT)
                / (100.0 - Self::LOOP_PERCENT);
            penalty += Self::LOOP_WEIGHT * excess;
        }

        (reward - penalty).max(0.0)
    }
}

/// Registry of the available fitness functions, keyed by name.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessKind {
    #[default]
    BulletDifference,
    PenalizedRatio,
    AccuracyFov,
}

impl FitnessKind {
    pub const ALL: [Self; 3] = [
        Self::BulletDifference,
        Self::PenalizedRatio,
        Self::AccuracyFov,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::BulletDifference => "bullet_difference",
            Self::PenalizedRatio => "penalized_ratio",
            Self::AccuracyFov => "accuracy_fov",
        }
    }
}

impl FitnessFunction for FitnessKind {
    fn evaluate(&self, own: &AgentMetrics, enemy: &AgentMetrics) -> f32 {
        match self {
            Self::BulletDifference => BulletDifference.evaluate(own, enemy),
            Self::PenalizedRatio => PenalizedRatio.evaluate(own, enemy),
            Self::AccuracyFov => AccuracyFov.evaluate(own, enemy),
        }
    }
}

impl fmt::Display for FitnessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown fitness function `{key}`")]
pub struct ParseFitnessKindError {
    key: String,
}

impl FromStr for FitnessKind {
    type Err = ParseFitnessKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.key() == s)
            .ok_or_else(|| ParseFitnessKindError { key: s.to_owned() })
    }
}
