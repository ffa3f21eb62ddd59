//! Frame-normalized behavioral metrics of one duelist.
//!
//! [`AgentMetrics`] turns the raw [`AgentCounters`] of a finished battle into
//! percentages, which fitness functions consume. Two groups of percentages
//! exist:
//!
//! - **Time shares** (`*_percent` relative to frames): how much of the fight
//!   the agent spent moving, rotating, shooting, near a corner or border, with
//!   the enemy in view or close by, and repeating its favorite action
//! - **Shot shares** (relative to shots chosen): accuracy, shots attempted
//!   while reloading and shots taken with the enemy in view; all defined as `0`
//!   when the agent never shot
//!
//! Absolute hit counts are kept alongside so that fitness functions can reward
//! raw damage.

use gladius_engine::AgentCounters;
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentMetrics {
    pub frames: usize,
    pub moves_percent: f32,
    pub rotations_percent: f32,
    pub shots_percent: f32,
    pub corner_time_percent: f32,
    pub border_time_percent: f32,
    pub shot_accuracy_percent: f32,
    pub shots_during_reload_percent: f32,
    pub shots_while_enemy_in_fov_percent: f32,
    pub most_repeated_action_percent: f32,
    pub enemy_in_fov_time_percent: f32,
    pub enemy_close_time_percent: f32,
    pub successful_shots: usize,
    pub bullets_taken: usize,
}

impl AgentMetrics {
    /// Derives the metrics of an agent that fought for `frames` ticks.
    #[must_use]
    pub fn new(counters: &AgentCounters, frames: usize) -> Self {
        let shots = counters.actions.shots;
        Self {
            frames,
            moves_percent: percent(counters.actions.moves, frames),
            rotations_percent: percent(counters.actions.rotations, frames),
            shots_percent: percent(shots, frames),
            corner_time_percent: percent(counters.corner_frames, frames),
            border_time_percent: percent(counters.border_frames, frames),
            shot_accuracy_percent: percent(counters.successful_shots, shots),
            shots_during_reload_percent: percent(counters.shots_during_reload, shots),
            shots_while_enemy_in_fov_percent: percent(counters.shots_while_enemy_in_fov, shots),
            most_repeated_action_percent: percent(counters.longest_streak, frames),
            enemy_in_fov_time_percent: percent(counters.enemy_in_fov_frames, frames),
            enemy_close_time_percent: percent(counters.enemy_close_frames, frames),
            successful_shots: counters.successful_shots,
            bullets_taken: counters.bullets_taken,
        }
    }

    /// Whether the agent chose to shoot at least once.
    #[must_use]
    pub fn has_shot(&self) -> bool {
        self.shots_percent > 0.0
    }
}

#[expect(clippy::cast_precision_loss)]
fn percent(count: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    count as f32 / total as f32 * 100.0
}
