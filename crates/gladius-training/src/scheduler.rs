//! Parallel fitness evaluation of a population.
//!
//! # How It Works
//!
//! 1. **Planning** - [`PairingPolicy::plan`] turns the population into
//!    [`Fixture`]s. Every battle gets its seed here, before any work is handed
//!    out, so the plan alone determines every battle.
//! 2. **Fan-out** - fixtures are split into contiguous batches of
//!    `ceil(fixtures / workers)` and each batch runs sequentially on its own
//!    scoped thread. Genomes are shared read-only.
//! 3. **Collection** - workers push `(index, score)` results onto one MPSC
//!    channel. Every plan yields exactly one result per individual, and the
//!    scheduler performs exactly that many receives, each bounded by the
//!    configured timeout.
//! 4. **Ranking** - individuals are re-ordered by descending score, ties broken
//!    by their previous position.
//!
//! # Failure Handling
//!
//! A battle that fails (returns an error or panics) is logged and contributes
//! no score; the rest of the batch carries on. A timeout or all workers hanging
//! up early aborts the evaluation with an [`EvaluationError`]. On timeout the
//! remaining workers are asked to stop: each checks the request before every
//! battle, so at most the battle already in progress runs to completion.

use std::{
    mem,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering},
        mpsc::{self, RecvTimeoutError},
    },
    thread,
    time::{Duration, Instant},
};

use gladius_evaluator::{DuelEvaluator, DuelScores};
use rand::{Rng, seq::SliceRandom as _};
use serde::{Deserialize, Serialize};

use crate::Individual;

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum EvaluationError {
    #[display(
        "no result received within {timeout:?} ({received} of {expected} results collected)"
    )]
    Timeout {
        timeout: Duration,
        received: usize,
        expected: usize,
    },
    #[display("all workers stopped early ({received} of {expected} results collected)")]
    Disconnected { received: usize, expected: usize },
    #[display("individual #{index} received no result")]
    MissingResult { index: usize },
}

/// How individuals are matched against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum PairingPolicy {
    /// Every individual fights `fights_per_genome` opponents drawn uniformly
    /// with replacement (possibly itself) and scores the sum of its fitness.
    RandomOpponents { fights_per_genome: usize },
    /// The population is shuffled and split into couples; each couple fights
    /// once and both members are scored from that battle.
    ShuffledCouples,
}

impl Default for PairingPolicy {
    fn default() -> Self {
        Self::RandomOpponents {
            fights_per_genome: 10,
        }
    }
}

/// A unit of work producing the score of one or two individuals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fixture {
    /// `contender` fights every opponent in turn, on the left side.
    Gauntlet {
        contender: usize,
        bouts: Vec<(usize, u64)>,
    },
    /// `left` and `right` fight once and are both scored.
    Couple { left: usize, right: usize, seed: u64 },
}

impl Fixture {
    /// Number of battles in this fixture.
    #[must_use]
    pub fn battles(&self) -> usize {
        match self {
            Self::Gauntlet { bouts, .. } => bouts.len(),
            Self::Couple { .. } => 1,
        }
    }

    /// Number of results this fixture sends.
    #[must_use]
    pub fn results(&self) -> usize {
        match self {
            Self::Gauntlet { .. } => 1,
            Self::Couple { left, right, .. } => {
                if left == right {
                    1
                } else {
                    2
                }
            }
        }
    }
}

impl PairingPolicy {
    /// Plans the fixtures of one evaluation of `population_size` individuals.
    ///
    /// # Panics
    ///
    /// Panics if the shuffled-couples policy is used with an odd population.
    pub fn plan<R>(self, population_size: usize, rng: &mut R) -> Vec<Fixture>
    where
        R: Rng + ?Sized,
    {
        match self {
            Self::RandomOpponents { fights_per_genome } => (0..population_size)
                .map(|contender| Fixture::Gauntlet {
                    contender,
                    bouts: (0..fights_per_genome)
                        .map(|_| (rng.random_range(0..population_size), rng.random()))
                        .collect(),
                })
                .collect(),
            Self::ShuffledCouples => {
                assert!(
                    population_size % 2 == 0,
                    "shuffled couples need an even population"
                );
                let mut order = (0..population_size).collect::<Vec<_>>();
                order.shuffle(rng);
                order
                    .chunks_exact(2)
                    .map(|pair| Fixture::Couple {
                        left: pair[0],
                        right: pair[1],
                        seed: rng.random(),
                    })
                    .collect()
            }
        }
    }
}

/// Runs the fixtures of a generation on a pool of scoped worker threads.
#[derive(Debug, Clone)]
pub struct EvaluationScheduler {
    workers: usize,
    result_timeout: Duration,
}

impl EvaluationScheduler {
    /// Creates a scheduler.
    ///
    /// # Arguments
    /// * `workers` - Number of worker threads (at least one is used)
    /// * `result_timeout` - Maximum wait for each individual result
    #[must_use]
    pub fn new(workers: usize, result_timeout: Duration) -> Self {
        Self {
            workers: workers.max(1),
            result_timeout,
        }
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    #[must_use]
    pub fn result_timeout(&self) -> Duration {
        self.result_timeout
    }

    /// Scores every individual and re-orders `population` by descending score.
    ///
    /// On error the population is left untouched.
    ///
    /// # Panics
    ///
    /// Panics if the fixtures do not produce exactly one result per individual.
    pub fn evaluate(
        &self,
        population: &mut Vec<Individual>,
        fixtures: &[Fixture],
        evaluator: &dyn DuelEvaluator,
    ) -> Result<(), EvaluationError> {
        let expected = population.len();
        assert_eq!(
            fixtures.iter().map(Fixture::results).sum::<usize>(),
            expected,
            "fixtures must yield one result per individual"
        );

        let started = Instant::now();
        let scores = self.collect_scores(population, fixtures, evaluator)?;
        tracing::info!(
            individuals = expected,
            battles = fixtures.iter().map(Fixture::battles).sum::<usize>(),
            elapsed = ?started.elapsed(),
            "population evaluated"
        );

        let mut ranking = scores.into_iter().enumerate().collect::<Vec<_>>();
        ranking.sort_by(|(ia, sa), (ib, sb)| sb.total_cmp(sa).then(ia.cmp(ib)));

        let mut slots = mem::take(population)
            .into_iter()
            .map(Some)
            .collect::<Vec<_>>();
        population.extend(ranking.into_iter().filter_map(|(index, score)| {
            let mut individual = slots[index].take()?;
            individual.set_fitness(score);
            Some(individual)
        }));
        Ok(())
    }

    fn collect_scores(
        &self,
        population: &[Individual],
        fixtures: &[Fixture],
        evaluator: &dyn DuelEvaluator,
    ) -> Result<Vec<f32>, EvaluationError> {
        let expected = population.len();
        let batch_size = fixtures.len().div_ceil(self.workers).max(1);
        let cancelled = AtomicBool::new(false);
        let (tx, rx) = mpsc::channel();

        tracing::debug!(
            fixtures = fixtures.len(),
            workers = self.workers,
            batch_size,
            "dispatching fixtures"
        );

        thread::scope(|s| {
            for (worker, batch) in fixtures.chunks(batch_size).enumerate() {
                let tx = tx.clone();
                let cancelled = &cancelled;
                tracing::debug!(
                    worker,
                    first = worker * batch_size,
                    last = worker * batch_size + batch.len() - 1,
                    "worker taking fixtures"
                );
                s.spawn(move || {
                    for fixture in batch {
                        if cancelled.load(Ordering::Relaxed) {
                            break;
                        }
                        let results =
                            run_fixture(worker, fixture, population, evaluator, cancelled);
                        for result in results {
                            if tx.send(result).is_err() {
                                return;
                            }
                        }
                    }
                });
            }
            drop(tx);

            let mut scores = vec![None; expected];
            for received in 0..expected {
                let (index, score) = match rx.recv_timeout(self.result_timeout) {
                    Ok(result) => result,
                    Err(RecvTimeoutError::Timeout) => {
                        cancelled.store(true, Ordering::Relaxed);
                        tracing::error!(received, expected, "timed out waiting for results");
                        return Err(EvaluationError::Timeout {
                            timeout: self.result_timeout,
                            received,
                            expected,
                        });
                    }
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::error!(received, expected, "workers hung up early");
                        return Err(EvaluationError::Disconnected { received, expected });
                    }
                };
                scores[index] = Some(score);
            }

            scores
                .into_iter()
                .enumerate()
                .map(|(index, score)| score.ok_or(EvaluationError::MissingResult { index }))
                .collect()
        })
    }
}

fn run_fixture(
    worker: usize,
    fixture: &Fixture,
    population: &[Individual],
    evaluator: &dyn DuelEvaluator,
    cancelled: &AtomicBool,
) -> Vec<(usize, f32)> {
    match *fixture {
        Fixture::Gauntlet {
            contender,
            ref bouts,
        } => {
            let mut score = 0.0;
            for &(opponent, seed) in bouts {
                if cancelled.load(Ordering::Relaxed) {
                    return vec![];
                }
                let scores = duel(worker, evaluator, population, contender, opponent, seed);
                if let Some(scores) = scores {
                    score += scores.left;
                }
            }
            vec![(contender, score)]
        }
        Fixture::Couple { left, right, seed } => {
            let scores = duel(worker, evaluator, population, left, right, seed).unwrap_or(
                DuelScores {
                    left: 0.0,
                    right: 0.0,
                },
            );
            if left == right {
                vec![(left, scores.left)]
            } else {
                vec![(left, scores.left), (right, scores.right)]
            }
        }
    }
}

/// Runs one battle, turning errors and panics into a logged `None`.
fn duel(
    worker: usize,
    evaluator: &dyn DuelEvaluator,
    population: &[Individual],
    left: usize,
    right: usize,
    seed: u64,
) -> Option<DuelScores> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        evaluator.duel(population[left].genome(), population[right].genome(), seed)
    }));
    match result {
        Ok(Ok(scores)) => Some(scores),
        Ok(Err(err)) => {
            tracing::error!(worker, left, right, seed, %err, "battle failed");
            None
        }
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(ToString::to_string)
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_owned());
            tracing::error!(worker, left, right, seed, %message, "battle panicked");
            None
        }
    }
}
