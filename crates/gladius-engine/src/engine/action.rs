use std::{
    f32::consts::FRAC_PI_2,
    fmt,
    str::FromStr,
};

use rand::{
    Rng,
    distr::{Distribution as _, weighted::WeightedIndex},
};
use serde::{Deserialize, Serialize};

/// Number of actions available to every agent (and outputs of every brain).
pub const ACTION_COUNT: usize = 4;

/// The fixed action set, in brain output order.
pub const DEFAULT_ACTIONS: [Action; ACTION_COUNT] = [
    Action::Move { speed: 80.0 },
    Action::Rotate {
        angular_speed: FRAC_PI_2,
    },
    Action::Rotate {
        angular_speed: -FRAC_PI_2,
    },
    Action::Shoot { power: 1.0 },
];

/// Something an agent can do during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Sets the linear speed; the agent then glides and decelerates.
    Move { speed: f32 },
    /// Sets the angular speed (positive is clockwise on screen).
    Rotate { angular_speed: f32 },
    /// Fires a bullet unless reloading; reload time scales with `power`.
    Shoot { power: f32 },
}

impl Action {
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Action::Move { .. } => ActionKind::Move,
            Action::Rotate { .. } => ActionKind::Rotate,
            Action::Shoot { .. } => ActionKind::Shoot,
        }
    }
}

/// Action categories used for behavioral counters.
///
/// Clockwise and counter-clockwise rotations share [`ActionKind::Rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ActionKind {
    #[display("move")]
    Move,
    #[display("rotate")]
    Rotate,
    #[display("shoot")]
    Shoot,
}

/// How an agent turns its brain's outputs into an action.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionPolicy {
    /// Pick the action with the highest output (first one on ties).
    #[default]
    ArgMax,
    /// Sample an action using the outputs as categorical weights.
    ///
    /// Negative and non-finite outputs weigh zero; when every weight is zero the
    /// action is drawn uniformly.
    Sampled,
}

impl ActionPolicy {
    pub const ALL: [Self; 2] = [Self::ArgMax, Self::Sampled];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ArgMax => "arg_max",
            Self::Sampled => "sampled",
        }
    }

    /// Chooses an action index from brain outputs.
    ///
    /// # Panics
    ///
    /// Panics if `outputs` is empty.
    pub fn choose<R>(self, outputs: &[f32], rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        assert!(!outputs.is_empty(), "brain produced no outputs");
        match self {
            Self::ArgMax => arg_max(outputs),
            Self::Sampled => {
                let weights = outputs
                    .iter()
                    .map(|&o| if o.is_finite() && o > 0.0 { o } else { 0.0 });
                match WeightedIndex::new(weights) {
                    Ok(dist) => dist.sample(rng),
                    Err(_) => rng.random_range(0..outputs.len()),
                }
            }
        }
    }
}

fn arg_max(outputs: &[f32]) -> usize {
    let mut best = 0;
    for (i, &o) in outputs.iter().enumerate().skip(1) {
        if o > outputs[best] || outputs[best].is_nan() {
            best = i;
        }
    }
    best
}

impl fmt::Display for ActionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("unknown action policy `{key}` (expected `arg_max` or `sampled`)")]
pub struct ParseActionPolicyError {
    key: String,
}

impl FromStr for ActionPolicy {
    type Err = ParseActionPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.key() == s)
            .ok_or_else(|| ParseActionPolicyError { key: s.to_owned() })
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    #[test]
    fn test_arg_max_prefers_first_on_ties() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(ActionPolicy::ArgMax.choose(&[0.2, 0.9, 0.9, 0.1], &mut rng), 1);
        assert_eq!(ActionPolicy::ArgMax.choose(&[-3.0, -2.0, -5.0, -4.0], &mut rng), 1);
    }

    #[test]
    fn test_arg_max_skips_nan() {
        let mut rng = Pcg32::seed_from_u64(0);
        assert_eq!(ActionPolicy::ArgMax.choose(&[f32::NAN, 0.1, 0.3, 0.2], &mut rng), 2);
    }

    #[test]
    fn test_sampled_one_hot_is_deterministic() {
        let mut rng = Pcg32::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(ActionPolicy::Sampled.choose(&[0.0, 0.0, 1.0, 0.0], &mut rng), 2);
        }
    }

    #[test]
    fn test_sampled_all_zero_falls_back_to_uniform() {
        let mut rng = Pcg32::seed_from_u64(7);
        let mut seen = [false; ACTION_COUNT];
        for _ in 0..200 {
            let i = ActionPolicy::Sampled.choose(&[0.0, -1.0, f32::NAN, 0.0], &mut rng);
            seen[i] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_policy_keys_parse() {
        for policy in ActionPolicy::ALL {
            assert_eq!(policy.key().parse::<ActionPolicy>().unwrap(), policy);
        }
        assert!("argmax".parse::<ActionPolicy>().is_err());
    }

    #[test]
    fn test_default_actions_kinds() {
        let kinds = DEFAULT_ACTIONS.map(|a| a.kind());
        assert_eq!(
            kinds,
            [
                ActionKind::Move,
                ActionKind::Rotate,
                ActionKind::Rotate,
                ActionKind::Shoot
            ]
        );
    }
}
