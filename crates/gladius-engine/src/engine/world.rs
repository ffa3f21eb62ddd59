use rand::SeedableRng as _;
use rand_pcg::Pcg32;

use crate::{
    AGENT_RADIUS, Action, ActionPolicy, Agent, AgentId, BULLET_RADIUS, BULLET_SPEED, Brain,
    Bullet, FOV_THRESHOLD, MAX_RELOAD_TIME, MUZZLE_OFFSET, Sensors, Vec2, field_of_view,
};

/// The arena: fixed rectangular bounds plus every live agent and bullet.
///
/// Agents and bullets are kept in insertion order, which is also the order in
/// which they are updated.
#[derive(Debug, Clone)]
pub struct World<'a> {
    size: Vec2,
    diagonal: f32,
    agents: Vec<Agent<'a>>,
    bullets: Vec<Bullet>,
    policy: ActionPolicy,
    rng: Pcg32,
}

impl<'a> World<'a> {
    #[must_use]
    pub fn new(size: Vec2, policy: ActionPolicy, seed: u64) -> Self {
        Self {
            size,
            diagonal: size.norm(),
            agents: vec![],
            bullets: vec![],
            policy,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.size
    }

    #[must_use]
    pub fn diagonal(&self) -> f32 {
        self.diagonal
    }

    #[must_use]
    pub fn policy(&self) -> ActionPolicy {
        self.policy
    }

    #[must_use]
    pub fn agents(&self) -> &[Agent<'a>] {
        &self.agents
    }

    #[must_use]
    pub fn agent(&self, id: AgentId) -> &Agent<'a> {
        &self.agents[id.0]
    }

    pub fn agent_mut(&mut self, id: AgentId) -> &mut Agent<'a> {
        &mut self.agents[id.0]
    }

    /// Bullets currently in flight, including those destroyed during the last tick.
    #[must_use]
    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    /// Mutable access to the world's random number generator.
    pub fn rng_mut(&mut self) -> &mut Pcg32 {
        &mut self.rng
    }

    pub fn add_agent(&mut self, brain: &'a dyn Brain, position: Vec2, angle: f32) -> AgentId {
        let id = AgentId(self.agents.len());
        self.agents.push(Agent::new(id, position, angle, brain));
        id
    }

    /// Advances the simulation by one tick.
    pub fn update(&mut self, delta_s: f32) {
        self.bullets.retain(|b| !b.is_destroyed());

        for index in 0..self.agents.len() {
            self.tick_agent(AgentId(index), delta_s);
        }

        let size = self.size;
        for bullet in &mut self.bullets {
            if !bullet.is_destroyed() {
                bullet.tick(delta_s, size);
            }
        }
    }

    /// Makes an agent perform the action in the given slot of its action set.
    ///
    /// This is the path used by brains as well as by manual control.
    pub fn perform(&mut self, id: AgentId, slot: usize) {
        let action = self.agents[id.0].actions()[slot];
        match action {
            Action::Move { speed } => self.agents[id.0].set_linear_speed(speed),
            Action::Rotate { angular_speed } => {
                self.agents[id.0].set_angular_speed(angular_speed);
            }
            Action::Shoot { power } => self.shoot(id, power),
        }
        self.agents[id.0].record_action(slot);
    }

    /// Nearest other agent and its distance, ignoring agents farther than the diagonal.
    #[must_use]
    pub fn nearest_enemy(&self, id: AgentId) -> Option<(AgentId, f32)> {
        let position = self.agents[id.0].position();
        let mut nearest = None;
        let mut nearest_distance = self.diagonal;
        for other in &self.agents {
            if other.id() == id {
                continue;
            }
            let distance = position.distance(other.position());
            if distance < nearest_distance {
                nearest_distance = distance;
                nearest = Some(other.id());
            }
        }
        nearest.map(|enemy| (enemy, nearest_distance))
    }

    /// Distance to the nearest live bullet fired by someone else.
    #[must_use]
    pub fn nearest_enemy_bullet_distance(&self, id: AgentId) -> Option<f32> {
        let position = self.agents[id.0].position();
        self.bullets
            .iter()
            .filter(|b| !b.is_destroyed() && b.owner() != id)
            .map(|b| position.distance(b.position()))
            .filter(|d| *d < self.diagonal)
            .min_by(f32::total_cmp)
    }

    /// Computes the normalized sensor readings of an agent.
    #[must_use]
    pub fn sense(&self, id: AgentId) -> Sensors {
        let agent = &self.agents[id.0];
        let enemy = self.nearest_enemy(id);
        let enemy_distance = enemy.map_or(self.diagonal, |(_, d)| d);
        let bullet_distance = self
            .nearest_enemy_bullet_distance(id)
            .unwrap_or(self.diagonal);

        let enemy_in_fov = enemy.map_or(0.0, |(enemy, _)| {
            match (self.agents[enemy.0].position() - agent.position()).unit() {
                Some(direction) => field_of_view(agent.angle(), direction.angle()),
                None => 1.0,
            }
        });

        Sensors {
            enemy_distance: enemy_distance / self.diagonal,
            bullet_distance: bullet_distance / self.diagonal,
            x: agent.position().x / self.size.x,
            y: agent.position().y / self.size.y,
            heading: (agent.angle() / std::f32::consts::TAU).rem_euclid(1.0),
            reload: agent.reload_timer() / MAX_RELOAD_TIME,
            enemy_in_fov,
        }
    }

    fn tick_agent(&mut self, id: AgentId, delta_s: f32) {
        let size = self.size;
        let previous_position = self.agents[id.0].position();
        self.agents[id.0].apply_linear_motion(delta_s, size);

        let sensors = self.sense(id);
        self.agents[id.0].set_sensors(sensors);
        if sensors.enemy_in_fov > FOV_THRESHOLD {
            self.agents[id.0].counters_mut().enemy_in_fov_frames += 1;
        }

        if let Some((enemy, distance)) = self.nearest_enemy(id) {
            let enemy_position = self.agents[enemy.0].position();
            let agent = &mut self.agents[id.0];
            if agent.collides_with(enemy_position, AGENT_RADIUS) {
                agent.set_position(previous_position);
            }
            if distance < AGENT_RADIUS * 2.0 {
                agent.counters_mut().enemy_close_frames += 1;
            }
        }

        let agent = &mut self.agents[id.0];
        agent.apply_angular_motion(delta_s);
        agent.count_down_reload(delta_s);

        self.resolve_hits(id);
        self.agents[id.0].track_position(size);

        if self.agents[id.0].is_manual() {
            return;
        }

        let brain = self.agents[id.0].brain();
        let outputs = brain.forward(&sensors.to_array());
        let slot = self.policy.choose(&outputs, &mut self.rng);
        self.perform(id, slot);
    }

    fn resolve_hits(&mut self, id: AgentId) {
        let target = &self.agents[id.0];
        let mut shooters = vec![];
        for bullet in &mut self.bullets {
            if !bullet.is_destroyed()
                && bullet.owner() != id
                && target.collides_with(bullet.position(), BULLET_RADIUS)
            {
                bullet.destroy();
                shooters.push(bullet.owner());
            }
        }

        self.agents[id.0].counters_mut().bullets_taken += shooters.len();
        for shooter in shooters {
            self.agents[shooter.0].counters_mut().successful_shots += 1;
        }
    }

    fn shoot(&mut self, id: AgentId, power: f32) {
        if self.agents[id.0].is_reloading() {
            self.agents[id.0].counters_mut().shots_during_reload += 1;
            return;
        }

        if self.sense(id).enemy_in_fov > FOV_THRESHOLD {
            self.agents[id.0].counters_mut().shots_while_enemy_in_fov += 1;
        }

        let agent = &mut self.agents[id.0];
        let forward = agent.forward_vector();
        self.bullets.push(Bullet::new(
            agent.position() + forward * MUZZLE_OFFSET,
            forward,
            BULLET_SPEED,
            power,
            id,
        ));
        agent.start_reload(power);
    }
}

#[cfg(test)]
mod tests {
    use std::f32::consts::PI;

    use crate::{ACTION_COUNT, SENSOR_COUNT};

    use super::*;

    #[derive(Debug)]
    struct FixedBrain([f32; ACTION_COUNT]);

    impl Brain for FixedBrain {
        fn input_len(&self) -> usize {
            SENSOR_COUNT
        }

        fn output_len(&self) -> usize {
            ACTION_COUNT
        }

        fn forward(&self, _inputs: &[f32]) -> Vec<f32> {
            self.0.to_vec()
        }
    }

    const SHOOT: FixedBrain = FixedBrain([0.0, 0.0, 0.0, 1.0]);
    const ROTATE: FixedBrain = FixedBrain([0.0, 1.0, 0.0, 0.0]);

    fn world() -> World<'static> {
        World::new(Vec2::new(500.0, 500.0), ActionPolicy::ArgMax, 0)
    }

    #[test]
    fn test_sensors_facing_enemy() {
        let mut world = world();
        let left = world.add_agent(&ROTATE, Vec2::new(50.0, 250.0), 0.0);
        world.add_agent(&ROTATE, Vec2::new(450.0, 250.0), PI);

        let sensors = world.sense(left);
        assert!((sensors.enemy_in_fov - 1.0).abs() < 1e-6);
        assert!((sensors.enemy_distance - 400.0 / world.diagonal()).abs() < 1e-6);
        assert!((sensors.bullet_distance - 1.0).abs() < 1e-6);
        assert!((sensors.x - 0.1).abs() < 1e-6);
        assert!((sensors.y - 0.5).abs() < 1e-6);
        assert!(sensors.reload.abs() < 1e-6);
    }

    #[test]
    fn test_sensors_without_enemy() {
        let mut world = world();
        let lonely = world.add_agent(&ROTATE, Vec2::new(250.0, 250.0), 0.0);
        let sensors = world.sense(lonely);
        assert!((sensors.enemy_distance - 1.0).abs() < 1e-6);
        assert!(sensors.enemy_in_fov.abs() < 1e-6);
    }

    #[test]
    fn test_heading_sensor_wraps() {
        let mut world = world();
        let id = world.add_agent(&ROTATE, Vec2::new(250.0, 250.0), -PI / 2.0);
        let sensors = world.sense(id);
        assert!((sensors.heading - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_facing_shooter_hits_enemy() {
        let mut world = world();
        let shooter = world.add_agent(&SHOOT, Vec2::new(50.0, 250.0), 0.0);
        let target = world.add_agent(&ROTATE, Vec2::new(450.0, 250.0), 0.0);
        world.agent_mut(target).set_manual(true);

        // 400 units at 250 units/s with a 0.1 s tick
        for _ in 0..20 {
            world.update(0.1);
        }

        let shooter_counters = world.agent(shooter).counters();
        let target_counters = world.agent(target).counters();
        assert!(shooter_counters.successful_shots >= 1);
        assert_eq!(
            shooter_counters.successful_shots,
            target_counters.bullets_taken
        );
        assert_eq!(shooter_counters.actions.shots, 20);
        assert!(shooter_counters.shots_during_reload > 0);
        assert!(shooter_counters.shots_while_enemy_in_fov >= 1);
    }

    #[test]
    fn test_bullets_leaving_world_are_swept() {
        let mut world = world();
        world.add_agent(&SHOOT, Vec2::new(450.0, 250.0), 0.0);
        world.add_agent(&ROTATE, Vec2::new(50.0, 250.0), 0.0);
        world.update(0.1);
        assert_eq!(world.bullets().len(), 1);
        for _ in 0..5 {
            world.update(0.1);
        }
        assert!(
            world
                .bullets()
                .iter()
                .all(|b| b.position().x <= 500.0 || b.is_destroyed())
        );
    }

    #[test]
    fn test_overlapping_agents_revert_movement() {
        #[derive(Debug)]
        struct Mover;
        impl Brain for Mover {
            fn input_len(&self) -> usize {
                SENSOR_COUNT
            }
            fn output_len(&self) -> usize {
                ACTION_COUNT
            }
            fn forward(&self, _inputs: &[f32]) -> Vec<f32> {
                vec![1.0, 0.0, 0.0, 0.0]
            }
        }

        let mut world = world();
        let mover = world.add_agent(&Mover, Vec2::new(200.0, 250.0), 0.0);
        let wall = world.add_agent(&ROTATE, Vec2::new(230.0, 250.0), 0.0);
        world.agent_mut(wall).set_manual(true);
        for _ in 0..50 {
            world.update(0.1);
        }
        let distance = world
            .agent(mover)
            .position()
            .distance(world.agent(wall).position());
        assert!(distance >= AGENT_RADIUS * 2.0 - 1e-3);
        assert!(world.agent(mover).counters().enemy_close_frames > 0);
    }

    #[test]
    fn test_manual_agent_ignores_brain() {
        let mut world = world();
        let manual = world.add_agent(&SHOOT, Vec2::new(50.0, 250.0), 0.0);
        world.add_agent(&ROTATE, Vec2::new(450.0, 250.0), 0.0);
        world.agent_mut(manual).set_manual(true);
        world.update(0.1);
        assert_eq!(world.agent(manual).counters().actions.shots, 0);

        world.perform(manual, 3);
        assert_eq!(world.agent(manual).counters().actions.shots, 1);
        assert!(world.agent(manual).is_reloading());
        assert_eq!(world.agent(manual).last_action(), Some(3));
    }
}
