//! Metrics, fitness functions and battle evaluation for duelling agents.
//!
//! This crate sits between the arena simulation and the genetic algorithm:
//!
//! ```text
//! Battle (gladius-engine)
//!     ↓ raw counters per agent
//! AgentMetrics (frame-normalized percentages)
//!     ↓ own + enemy metrics
//! FitnessFunction (scalar reward, higher is better)
//!     ↓ both sides
//! DuelEvaluator (what the training scheduler calls)
//! ```
//!
//! # Modules
//!
//! - [`metrics`] - [`AgentMetrics`], derived from [`gladius_engine::AgentCounters`]
//! - [`fitness`] - the [`FitnessFunction`] seam and the [`FitnessKind`] registry
//! - [`battle_evaluator`] - [`DuelEvaluator`] and its default [`BattleEvaluator`]
//!
//! # Example
//!
//! ```rust,no_run
//! use gladius_engine::{BattleConfig, Brain};
//! use gladius_evaluator::{BattleEvaluator, DuelEvaluator as _, FitnessKind};
//! # fn brains() -> (Box<dyn Brain>, Box<dyn Brain>) { todo!() }
//! let (left, right) = brains();
//! let evaluator = BattleEvaluator::new(BattleConfig::default(), FitnessKind::BulletDifference);
//! let scores = evaluator.duel(left.as_ref(), right.as_ref(), 7).unwrap();
//! println!("{} vs {}", scores.left, scores.right);
//! ```

pub use self::{battle_evaluator::*, fitness::*, metrics::*};

pub mod battle_evaluator;
pub mod fitness;
pub mod metrics;
