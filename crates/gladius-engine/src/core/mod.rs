//! Geometry primitives shared by the simulation.

pub use self::vec2::*;

mod vec2;
