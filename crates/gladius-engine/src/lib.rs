//! Deterministic 2D duel simulation for evolved agents.
//!
//! This crate implements the arena in which two neural-network controlled agents
//! fight each other. It knows nothing about genetic algorithms: agents are driven
//! by anything implementing the [`Brain`] capability, and a finished battle yields
//! raw behavioral counters ([`AgentCounters`]) that higher layers turn into metrics
//! and fitness scores.
//!
//! # Layout
//!
//! - [`core`] - geometry primitives ([`Vec2`])
//! - [`engine`] - the world, agents, bullets, actions and the [`Battle`] runner
//!
//! # Simulation Model
//!
//! The world is a fixed rectangle. Every tick of duration `delta_s`:
//!
//! 1. Entities destroyed during the previous tick are swept
//! 2. Every agent moves, senses, resolves collisions and hits, updates its
//!    positional counters and (unless manually controlled) asks its brain for
//!    the next action
//! 3. Every bullet flies in a straight line and is destroyed when it leaves the
//!    world bounds
//!
//! A battle runs for a fixed number of ticks and never ends early. All
//! randomness (initial headings, stochastic action sampling) comes from a
//! [`rand_pcg::Pcg32`] seeded per battle, so a battle is reproducible from its
//! seed.
//!
//! # Example
//!
//! ```rust,no_run
//! use gladius_engine::{Battle, BattleConfig, Brain};
//! # fn brains() -> (Box<dyn Brain>, Box<dyn Brain>) { todo!() }
//! let (left, right) = brains();
//! let config = BattleConfig::default();
//! let battle = Battle::new(left.as_ref(), right.as_ref(), &config, 42).unwrap();
//! let outcome = battle.fight();
//! println!("left landed {} shots", outcome.left.successful_shots);
//! ```

use std::fmt;

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Decision-making capability bound to an agent.
///
/// A brain maps the agent's normalized sensor readings to one score per
/// available action. Brains are shared read-only between battles running on
/// different threads, hence the `Sync` bound.
pub trait Brain: fmt::Debug + Sync {
    /// Number of inputs expected by [`Brain::forward`].
    fn input_len(&self) -> usize;

    /// Number of outputs produced by [`Brain::forward`].
    fn output_len(&self) -> usize;

    /// Computes one score per action from the sensor inputs.
    fn forward(&self, inputs: &[f32]) -> Vec<f32>;

    /// Returns the output of every layer for the given inputs.
    ///
    /// Used by visualizations; the last entry equals [`Brain::forward`].
    fn layer_activations(&self, inputs: &[f32]) -> Vec<Vec<f32>> {
        vec![self.forward(inputs)]
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum BattleError {
    #[display(
        "{side} brain is incompatible with the arena: expected {expected_inputs} inputs and {expected_outputs} outputs, got {inputs} and {outputs}"
    )]
    IncompatibleBrain {
        side: Side,
        expected_inputs: usize,
        expected_outputs: usize,
        inputs: usize,
        outputs: usize,
    },
}

/// Which of the two duelists an item refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::IsVariant)]
pub enum Side {
    #[display("left")]
    Left,
    #[display("right")]
    Right,
}
