use crate::{AgentId, Vec2};

/// Collision radius of a bullet.
pub const BULLET_RADIUS: f32 = 2.0;
/// Travel speed of every bullet, in world units per second.
pub const BULLET_SPEED: f32 = 250.0;

/// A projectile flying in a straight line.
#[derive(Debug, Clone)]
pub struct Bullet {
    position: Vec2,
    direction: Vec2,
    speed: f32,
    power: f32,
    owner: AgentId,
    destroyed: bool,
}

impl Bullet {
    #[must_use]
    pub fn new(position: Vec2, direction: Vec2, speed: f32, power: f32, owner: AgentId) -> Self {
        Self {
            position,
            direction,
            speed,
            power,
            owner,
            destroyed: false,
        }
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[must_use]
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    #[must_use]
    pub fn power(&self) -> f32 {
        self.power
    }

    #[must_use]
    pub fn owner(&self) -> AgentId {
        self.owner
    }

    /// Whether the bullet hit something or left the arena during this tick.
    ///
    /// Destroyed bullets are ignored by sensors and collisions and swept at the
    /// start of the next tick.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn destroy(&mut self) {
        self.destroyed = true;
    }

    pub(crate) fn tick(&mut self, delta_s: f32, world_size: Vec2) {
        self.position = self.position + self.direction * (self.speed * delta_s);
        let Vec2 { x, y } = self.position;
        if x < 0.0 || x > world_size.x || y < 0.0 || y > world_size.y {
            self.destroy();
        }
    }
}
