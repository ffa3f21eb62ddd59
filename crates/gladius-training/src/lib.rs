//! Genetic training of neural-network controlled agents.
//!
//! The crate owns everything that changes from one generation to the next:
//! the genomes themselves, the operators that breed them and the machinery that
//! scores them in parallel.
//!
//! ```text
//! GeneticEvolution (generation controller)
//!     ↓ plan fixtures (PairingPolicy) with seeds from the controller RNG
//! EvaluationScheduler (scoped worker threads, one MPSC result channel)
//!     ↓ per battle
//! DuelEvaluator (gladius-evaluator)
//!     ↓ scores, sorted descending
//! Selection → crossover (inside Genome) → Mutation
//!     ↓
//! next generation
//! ```
//!
//! # Modules
//!
//! - [`genome`] - [`Genome`] and its [`Architecture`], built on [`matrix`]
//! - [`activation`], [`crossover`], [`mutation`], [`selection`] - the strategy
//!   registries; [`strategy`] resolves their string keys
//! - [`population`] - [`Individual`]
//! - [`scheduler`] - pairing policies and the parallel [`EvaluationScheduler`]
//! - [`evolution`] - the [`GeneticEvolution`] controller
//! - [`checkpoint`] - JSON [`GenerationState`] and [`GenomeExport`]
//! - [`session`] - the background [`TrainingSession`]
//! - [`summary`] - [`FitnessSummary`] for reports
//!
//! # Example
//!
//! ```rust,no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use gladius_engine::BattleConfig;
//! use gladius_evaluator::{BattleEvaluator, FitnessKind};
//! use gladius_training::{
//!     EvaluationScheduler, EvolutionParams, GeneticEvolution, SessionOptions, TrainingSession,
//! };
//!
//! let evolution = GeneticEvolution::new(EvolutionParams::default(), 42);
//! let evaluator = BattleEvaluator::new(BattleConfig::default(), FitnessKind::BulletDifference);
//! let mut session = TrainingSession::new(
//!     evolution,
//!     EvaluationScheduler::new(4, Duration::from_secs(600)),
//!     Arc::new(evaluator),
//!     SessionOptions {
//!         generations: Some(10),
//!         checkpoint: None,
//!     },
//! );
//! let reports = session.start().unwrap();
//! for report in reports {
//!     println!("#{}: {:.2}", report.generation, report.summary.max);
//! }
//! session.join().unwrap();
//! ```

pub use self::{
    activation::*, checkpoint::*, crossover::*, evolution::*, genome::*, matrix::*, mutation::*,
    population::*, scheduler::*, selection::*, session::*, strategy::*, summary::*,
};

pub mod activation;
pub mod checkpoint;
pub mod crossover;
pub mod evolution;
pub mod genome;
pub mod matrix;
pub mod mutation;
pub mod population;
pub mod scheduler;
pub mod selection;
pub mod session;
pub mod strategy;
pub mod summary;
