//! Arena simulation: world, agents, bullets and battles.
//!
//! - [`World`] - bounds plus live [`Agent`]s and [`Bullet`]s, updated tick by tick
//! - [`Agent`] - a duelist with physics state, sensors and behavioral counters
//! - [`Action`] / [`ActionPolicy`] - the fixed action set and how brain outputs
//!   select from it
//! - [`Battle`] - two duelists fighting for a fixed number of ticks
//!
//! The world is also the read-only boundary for visualizations: between ticks a
//! caller can inspect every agent's position, heading, sensors, last action and
//! counters, and ask its brain for per-layer activations.

pub use self::{action::*, agent::*, battle::*, bullet::*, world::*};

mod action;
mod agent;
mod battle;
mod bullet;
mod world;
