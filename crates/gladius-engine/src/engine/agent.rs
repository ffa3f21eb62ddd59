use std::f32::consts::{PI, TAU};

use serde::{Deserialize, Serialize};

use crate::{ACTION_COUNT, Action, ActionKind, Brain, DEFAULT_ACTIONS, Vec2};

/// Collision radius of an agent.
pub const AGENT_RADIUS: f32 = 10.0;
/// Speeds at or below this magnitude snap to zero.
pub const SPEED_EPSILON: f32 = 0.5;
/// Linear deceleration, in world units per second squared.
pub const LINEAR_DECELERATION: f32 = 70.0;
/// Angular deceleration, in radians per second squared.
pub const ANGULAR_DECELERATION: f32 = TAU;
/// Reload time of a shot with power `1.0`, in seconds.
pub const MAX_RELOAD_TIME: f32 = 1.0;
/// Distance ahead of the agent's center where bullets spawn.
pub const MUZZLE_OFFSET: f32 = 15.0;
/// Field-of-view reading above which the enemy counts as "in view".
pub const FOV_THRESHOLD: f32 = 0.8;

/// Number of sensor readings fed to a brain.
pub const SENSOR_COUNT: usize = 7;

/// Index of an agent inside its [`World`](crate::World).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AgentId(pub usize);

/// Normalized sensor readings of an agent.
///
/// Every reading lies in `[0, 1]` while the agent stays inside the arena.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensors {
    /// Distance to the nearest enemy agent divided by the world diagonal.
    pub enemy_distance: f32,
    /// Distance to the nearest enemy bullet divided by the world diagonal
    /// (`1.0` when no enemy bullet is in flight).
    pub bullet_distance: f32,
    pub x: f32,
    pub y: f32,
    /// Heading divided by a full turn, wrapped into `[0, 1)`.
    pub heading: f32,
    /// Remaining reload time as a fraction of [`MAX_RELOAD_TIME`].
    pub reload: f32,
    /// `1.0` when the enemy is dead ahead, `0.0` when directly behind.
    pub enemy_in_fov: f32,
}

impl Sensors {
    #[must_use]
    pub fn to_array(&self) -> [f32; SENSOR_COUNT] {
        [
            self.enemy_distance,
            self.bullet_distance,
            self.x,
            self.y,
            self.heading,
            self.reload,
            self.enemy_in_fov,
        ]
    }
}

/// Converts the angle between a heading and a bearing into a field-of-view score.
///
/// The difference is normalized into `(-π, π]` first, so the score is `1.0`
/// when the bearing equals the heading and `0.0` when it is opposite.
#[must_use]
pub fn field_of_view(heading: f32, bearing: f32) -> f32 {
    let mut angle = heading - bearing;
    if !(-PI..=PI).contains(&angle) {
        angle = angle.sin().atan2(angle.cos());
    }
    1.0 - angle.abs() / PI
}

/// Number of times each kind of action was chosen.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub moves: usize,
    pub rotations: usize,
    pub shots: usize,
}

impl ActionCounts {
    fn record(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::Move => self.moves += 1,
            ActionKind::Rotate => self.rotations += 1,
            ActionKind::Shoot => self.shots += 1,
        }
    }
}

/// Raw behavioral counters accumulated by an agent during a battle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCounters {
    pub actions: ActionCounts,
    pub successful_shots: usize,
    pub bullets_taken: usize,
    pub shots_during_reload: usize,
    pub shots_while_enemy_in_fov: usize,
    pub enemy_in_fov_frames: usize,
    pub enemy_close_frames: usize,
    pub corner_frames: usize,
    pub border_frames: usize,
    /// Longest run of consecutive ticks repeating the same action.
    pub longest_streak: usize,
    /// Action slot of the longest run.
    pub longest_streak_action: Option<usize>,
}

/// A duelist controlled by a [`Brain`].
#[derive(Debug, Clone)]
pub struct Agent<'a> {
    id: AgentId,
    position: Vec2,
    angle: f32,
    linear_speed: f32,
    angular_speed: f32,
    reload_timer: f32,
    brain: &'a dyn Brain,
    actions: [Action; ACTION_COUNT],
    manual: bool,
    sensors: Sensors,
    last_action: Option<usize>,
    streak: usize,
    counters: AgentCounters,
}

impl<'a> Agent<'a> {
    pub(crate) fn new(id: AgentId, position: Vec2, angle: f32, brain: &'a dyn Brain) -> Self {
        Self {
            id,
            position,
            angle,
            linear_speed: 0.0,
            angular_speed: 0.0,
            reload_timer: 0.0,
            brain,
            actions: DEFAULT_ACTIONS,
            manual: false,
            sensors: Sensors::default(),
            last_action: None,
            streak: 0,
            counters: AgentCounters::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> AgentId {
        self.id
    }

    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Heading in radians (not wrapped).
    #[must_use]
    pub fn angle(&self) -> f32 {
        self.angle
    }

    #[must_use]
    pub fn forward_vector(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    #[must_use]
    pub fn linear_speed(&self) -> f32 {
        self.linear_speed
    }

    #[must_use]
    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }

    #[must_use]
    pub fn reload_timer(&self) -> f32 {
        self.reload_timer
    }

    #[must_use]
    pub fn is_reloading(&self) -> bool {
        self.reload_timer > 0.0
    }

    #[must_use]
    pub fn brain(&self) -> &'a dyn Brain {
        self.brain
    }

    #[must_use]
    pub fn actions(&self) -> &[Action; ACTION_COUNT] {
        &self.actions
    }

    /// Whether autonomous action selection is disabled.
    #[must_use]
    pub fn is_manual(&self) -> bool {
        self.manual
    }

    pub fn set_manual(&mut self, manual: bool) {
        self.manual = manual;
    }

    /// Sensor readings taken during the last tick.
    #[must_use]
    pub fn sensors(&self) -> &Sensors {
        &self.sensors
    }

    /// Slot of the last performed action.
    #[must_use]
    pub fn last_action(&self) -> Option<usize> {
        self.last_action
    }

    #[must_use]
    pub fn counters(&self) -> &AgentCounters {
        &self.counters
    }

    pub(crate) fn counters_mut(&mut self) -> &mut AgentCounters {
        &mut self.counters
    }

    pub(crate) fn set_sensors(&mut self, sensors: Sensors) {
        self.sensors = sensors;
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    pub(crate) fn collides_with(&self, position: Vec2, radius: f32) -> bool {
        self.position.distance(position) < AGENT_RADIUS + radius
    }

    pub(crate) fn apply_linear_motion(&mut self, delta_s: f32, world_size: Vec2) {
        if self.linear_speed > SPEED_EPSILON {
            self.position = self.position + self.forward_vector() * (self.linear_speed * delta_s);
            self.linear_speed -= LINEAR_DECELERATION * delta_s;
        } else {
            self.linear_speed = 0.0;
        }

        self.position.x = self
            .position
            .x
            .clamp(AGENT_RADIUS, world_size.x - AGENT_RADIUS);
        self.position.y = self
            .position
            .y
            .clamp(AGENT_RADIUS, world_size.y - AGENT_RADIUS);
    }

    pub(crate) fn apply_angular_motion(&mut self, delta_s: f32) {
        if self.angular_speed.abs() > SPEED_EPSILON {
            self.angle += self.angular_speed * delta_s;
            self.angular_speed -= self.angular_speed.signum() * ANGULAR_DECELERATION * delta_s;
        } else {
            self.angular_speed = 0.0;
        }
    }

    pub(crate) fn count_down_reload(&mut self, delta_s: f32) {
        self.reload_timer = (self.reload_timer - delta_s).max(0.0);
    }

    pub(crate) fn track_position(&mut self, world_size: Vec2) {
        let corner_offset = 0.05 * world_size.norm();
        let x_offset = 0.05 * world_size.x;
        let y_offset = 0.05 * world_size.y;

        let corners = [
            Vec2::ZERO,
            Vec2::new(0.0, world_size.y),
            Vec2::new(world_size.x, 0.0),
            world_size,
        ];
        let Vec2 { x, y } = self.position;
        if corners
            .iter()
            .any(|c| self.position.distance(*c) < corner_offset)
        {
            self.counters.corner_frames += 1;
        }
        if x < x_offset || x > world_size.x - x_offset || y < y_offset || y > world_size.y - y_offset
        {
            self.counters.border_frames += 1;
        }
    }

    pub(crate) fn set_linear_speed(&mut self, speed: f32) {
        self.linear_speed = speed;
    }

    pub(crate) fn set_angular_speed(&mut self, angular_speed: f32) {
        self.angular_speed = angular_speed;
    }

    /// Arms the reload timer after a shot.
    pub(crate) fn start_reload(&mut self, power: f32) {
        self.reload_timer = MAX_RELOAD_TIME * power;
    }

    pub(crate) fn record_action(&mut self, slot: usize) {
        self.counters.actions.record(self.actions[slot].kind());
        if self.last_action == Some(slot) {
            self.streak += 1;
        } else {
            self.streak = 1;
        }
        self.last_action = Some(slot);

        if self.streak > self.counters.longest_streak {
            self.counters.longest_streak = self.streak;
            self.counters.longest_streak_action = Some(slot);
        }
    }
}
