use std::ops::{Div, Mul};

use serde::{Deserialize, Serialize};

/// A 2D vector in world coordinates (x to the right, y downwards).
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize, derive_more::Add, derive_more::Sub,
)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self::new(0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing along `angle` (radians).
    #[must_use]
    pub fn from_angle(angle: f32) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, sin)
    }

    #[must_use]
    pub fn norm(self) -> f32 {
        self.x.hypot(self.y)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        (self - other).norm()
    }

    /// Returns the vector scaled to unit length, or `None` for the zero vector.
    #[must_use]
    pub fn unit(self) -> Option<Self> {
        let norm = self.norm();
        (norm > 0.0).then(|| self / norm)
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Angle of the vector measured from the positive x axis, in `(-π, π]`.
    #[must_use]
    pub fn angle(self) -> f32 {
        self.y.atan2(self.x)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self {
        Self::new(self.x * rhs, self.y * rhs)
    }
}

impl Div<f32> for Vec2 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self {
        Self::new(self.x / rhs, self.y / rhs)
    }
}
