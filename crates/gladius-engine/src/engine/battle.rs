use std::f32::consts::TAU;

use rand::Rng as _;
use serde::{Deserialize, Serialize};

use crate::{
    ACTION_COUNT, ActionPolicy, AgentCounters, AgentId, BattleError, Brain, SENSOR_COUNT, Side,
    Vec2, World,
};

/// Size of the arena used for battles.
pub const ARENA_SIZE: Vec2 = Vec2::new(500.0, 500.0);
/// Starting position of the left duelist.
pub const LEFT_START: Vec2 = Vec2::new(50.0, 250.0);
/// Starting position of the right duelist.
pub const RIGHT_START: Vec2 = Vec2::new(450.0, 250.0);

/// Parameters of a single battle.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleConfig {
    /// Number of ticks simulated.
    pub frames: usize,
    /// Duration of one tick, in seconds.
    pub delta_s: f32,
    pub action_policy: ActionPolicy,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            frames: 1800,
            // six frames of a 60 FPS display per tick
            delta_s: 0.016_666_668 * 6.0,
            action_policy: ActionPolicy::ArgMax,
        }
    }
}

/// Raw counters of both duelists after a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    pub frames: usize,
    pub left: AgentCounters,
    pub right: AgentCounters,
}

impl BattleOutcome {
    /// Counters of one side followed by those of its opponent.
    #[must_use]
    pub fn from_perspective(&self, side: Side) -> (&AgentCounters, &AgentCounters) {
        match side {
            Side::Left => (&self.left, &self.right),
            Side::Right => (&self.right, &self.left),
        }
    }
}

/// A fixed-length duel between two brains.
///
/// The battle owns its world exclusively; brains are only borrowed.
#[derive(Debug, Clone)]
pub struct Battle<'a> {
    world: World<'a>,
    config: BattleConfig,
    frames_elapsed: usize,
}

impl<'a> Battle<'a> {
    /// Sets up the arena with both duelists at their mirrored starting positions.
    ///
    /// Initial headings are drawn from the battle's RNG, seeded with `seed`.
    pub fn new(
        left: &'a dyn Brain,
        right: &'a dyn Brain,
        config: &BattleConfig,
        seed: u64,
    ) -> Result<Self, BattleError> {
        check_brain(Side::Left, left)?;
        check_brain(Side::Right, right)?;

        let mut world = World::new(ARENA_SIZE, config.action_policy, seed);
        let left_angle = world.rng_mut().random_range(0.0..TAU);
        let right_angle = world.rng_mut().random_range(0.0..TAU);
        world.add_agent(left, LEFT_START, left_angle);
        world.add_agent(right, RIGHT_START, right_angle);

        Ok(Self {
            world,
            config: config.clone(),
            frames_elapsed: 0,
        })
    }

    #[must_use]
    pub fn world(&self) -> &World<'a> {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World<'a> {
        &mut self.world
    }

    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    #[must_use]
    pub fn frames_elapsed(&self) -> usize {
        self.frames_elapsed
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.frames_elapsed >= self.config.frames
    }

    #[must_use]
    pub fn agent_id(side: Side) -> AgentId {
        match side {
            Side::Left => AgentId(0),
            Side::Right => AgentId(1),
        }
    }

    /// Enables or disables the manual override of one duelist.
    pub fn set_manual(&mut self, side: Side, manual: bool) {
        self.world.agent_mut(Self::agent_id(side)).set_manual(manual);
    }

    /// Advances the battle by one tick.
    pub fn step(&mut self) {
        self.world.update(self.config.delta_s);
        self.frames_elapsed += 1;
    }

    /// Snapshot of both duelists' counters so far.
    #[must_use]
    pub fn outcome(&self) -> BattleOutcome {
        BattleOutcome {
            frames: self.frames_elapsed,
            left: *self.world.agent(Self::agent_id(Side::Left)).counters(),
            right: *self.world.agent(Self::agent_id(Side::Right)).counters(),
        }
    }

    /// Runs the remaining ticks and returns the final counters.
    #[must_use]
    pub fn fight(mut self) -> BattleOutcome {
        while !self.is_finished() {
            self.step();
        }
        self.outcome()
    }
}

fn check_brain(side: Side, brain: &dyn Brain) -> Result<(), BattleError> {
    if brain.input_len() != SENSOR_COUNT || brain.output_len() != ACTION_COUNT {
        return Err(BattleError::IncompatibleBrain {
            side,
            expected_inputs: SENSOR_COUNT,
            expected_outputs: ACTION_COUNT,
            inputs: brain.input_len(),
            outputs: brain.output_len(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct FixedBrain {
        outputs: Vec<f32>,
    }

    impl FixedBrain {
        fn new(outputs: &[f32]) -> Self {
            Self {
                outputs: outputs.to_vec(),
            }
        }
    }

    impl Brain for FixedBrain {
        fn input_len(&self) -> usize {
            SENSOR_COUNT
        }

        fn output_len(&self) -> usize {
            self.outputs.len()
        }

        fn forward(&self, inputs: &[f32]) -> Vec<f32> {
            assert_eq!(inputs.len(), SENSOR_COUNT);
            self.outputs.clone()
        }
    }

    /// Picks the action whose index is derived from the sensors, so behavior varies.
    #[derive(Debug)]
    struct SensorBrain;

    impl Brain for SensorBrain {
        fn input_len(&self) -> usize {
            SENSOR_COUNT
        }

        fn output_len(&self) -> usize {
            ACTION_COUNT
        }

        fn forward(&self, inputs: &[f32]) -> Vec<f32> {
            vec![inputs[0], inputs[4], 1.0 - inputs[4], inputs[6]]
        }
    }

    fn config(frames: usize) -> BattleConfig {
        BattleConfig {
            frames,
            ..BattleConfig::default()
        }
    }

    #[test]
    fn test_stationary_agents_never_hit() {
        let idle = FixedBrain::new(&[0.0, 1.0, 0.0, 0.0]);
        let battle = Battle::new(&idle, &idle, &config(300), 3).unwrap();
        let outcome = battle.fight();

        assert_eq!(outcome.frames, 300);
        for counters in [outcome.left, outcome.right] {
            assert_eq!(counters.successful_shots, 0);
            assert_eq!(counters.bullets_taken, 0);
            assert_eq!(counters.actions.rotations, 300);
            assert_eq!(counters.actions.moves, 0);
            assert_eq!(counters.actions.shots, 0);
            assert_eq!(counters.longest_streak, 300);
        }
    }

    #[test]
    fn test_same_seed_same_outcome() {
        let brain = SensorBrain;
        let shooter = FixedBrain::new(&[0.1, 0.2, 0.3, 0.4]);
        for policy in ActionPolicy::ALL {
            let config = BattleConfig {
                frames: 400,
                action_policy: policy,
                ..BattleConfig::default()
            };
            let a = Battle::new(&brain, &shooter, &config, 11).unwrap().fight();
            let b = Battle::new(&brain, &shooter, &config, 11).unwrap().fight();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_hits_are_symmetric_between_sides() {
        let brain = SensorBrain;
        let shooter = FixedBrain::new(&[0.0, 0.0, 0.0, 1.0]);
        for seed in 0..5 {
            let outcome = Battle::new(&brain, &shooter, &config(600), seed)
                .unwrap()
                .fight();
            assert_eq!(outcome.left.successful_shots, outcome.right.bullets_taken);
            assert_eq!(outcome.right.successful_shots, outcome.left.bullets_taken);
        }
    }

    #[test]
    fn test_incompatible_brain_is_rejected() {
        let ok = FixedBrain::new(&[0.0; ACTION_COUNT]);
        let bad = FixedBrain::new(&[0.0; 3]);
        let err = Battle::new(&ok, &bad, &config(10), 0).unwrap_err();
        assert!(matches!(
            err,
            BattleError::IncompatibleBrain {
                side: Side::Right,
                outputs: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_manual_override_freezes_actions() {
        let shooter = FixedBrain::new(&[0.0, 0.0, 0.0, 1.0]);
        let mut battle = Battle::new(&shooter, &shooter, &config(50), 0).unwrap();
        battle.set_manual(Side::Left, true);
        while !battle.is_finished() {
            battle.step();
        }
        let outcome = battle.outcome();
        assert_eq!(outcome.left.actions.shots, 0);
        assert_eq!(outcome.right.actions.shots, 50);
    }

    #[test]
    fn test_from_perspective_swaps_sides() {
        let idle = FixedBrain::new(&[0.0, 1.0, 0.0, 0.0]);
        let outcome = Battle::new(&idle, &idle, &config(1), 0).unwrap().fight();
        let (own, enemy) = outcome.from_perspective(Side::Right);
        assert!(std::ptr::eq(own, &outcome.right));
        assert!(std::ptr::eq(enemy, &outcome.left));
    }

    #[test]
    fn test_outcome_serializes() {
        let idle = FixedBrain::new(&[0.0, 1.0, 0.0, 0.0]);
        let outcome = Battle::new(&idle, &idle, &config(5), 0).unwrap().fight();
        let json = serde_json::to_string(&outcome).unwrap();
        let back: BattleOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(outcome, back);
    }
}
