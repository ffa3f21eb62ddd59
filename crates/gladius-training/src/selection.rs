//! Selection strategies producing the next population from a ranked one.
//!
//! Both strategies take a population sorted by descending fitness and return
//! exactly as many individuals, all with fitness reset to `0.0`:
//!
//! 1. **Retention** - `floor(n × keep_rate)` parents survive unchanged
//! 2. **Reproduction** - parent pairs are crossed over, two children per pair,
//!    until the population is full; excess children are dropped
//!
//! # Pair Best Ones (`pair_best_ones`)
//!
//! Retains the top of the ranking. Children come from every unordered pair
//! `(i, j)`, `i < j`, among the `K` best individuals in ascending order, where
//! `K` is the smallest integer `≥ 2` with `K·(K - 1) ≥ n` (see
//! [`nearest_combination_k`]). `K` best individuals yield `K·(K - 1)` children,
//! enough to refill the population even when nothing is retained.
//!
//! # Roulette (`roulette`)
//!
//! Fitness-proportional selection over a cumulative wheel built in population
//! order. Both retention and parent choice spin the wheel; the two parents of a
//! pair must differ.
//!
//! Negative fitness counts as zero on the wheel. When the wheel has no weight
//! at all (typically the first generation, before any evaluation) every slot is
//! equally likely. When fewer than two slots carry weight, the second parent is
//! drawn uniformly among the other individuals, so reproduction always
//! terminates.

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Individual, is_ranked};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionKind {
    #[default]
    PairBestOnes,
    Roulette,
}

impl SelectionKind {
    pub const ALL: [Self; 2] = [Self::PairBestOnes, Self::Roulette];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::PairBestOnes => "pair_best_ones",
            Self::Roulette => "roulette",
        }
    }
}

impl fmt::Display for SelectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A selection strategy together with its parent retention rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: SelectionKind,
    /// Fraction of the population retained as-is, in `[0, 1]`.
    pub keep_rate: f32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            kind: SelectionKind::default(),
            keep_rate: 0.2,
        }
    }
}

impl Selection {
    #[must_use]
    pub fn new(kind: SelectionKind, keep_rate: f32) -> Self {
        Self { kind, keep_rate }
    }

    /// Number of parents retained from a population of `n`.
    #[must_use]
    #[expect(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn retained(&self, n: usize) -> usize {
        ((n as f32 * self.keep_rate).floor() as usize).min(n)
    }

    /// Builds the next population.
    ///
    /// # Panics
    ///
    /// Panics if the population has fewer than two individuals or is not sorted
    /// by descending fitness.
    pub fn next_generation<R>(&self, population: &[Individual], rng: &mut R) -> Vec<Individual>
    where
        R: Rng + ?Sized,
    {
        let n = population.len();
        assert!(n >= 2, "selection needs at least two individuals");
        assert!(is_ranked(population), "population must be ranked");

        let next = match self.kind {
            SelectionKind::PairBestOnes => self.pair_best_ones(population, rng),
            SelectionKind::Roulette => self.roulette(population, rng),
        };
        debug_assert_eq!(next.len(), n);
        next
    }

    fn pair_best_ones<R>(&self, population: &[Individual], rng: &mut R) -> Vec<Individual>
    where
        R: Rng + ?Sized,
    {
        let n = population.len();
        let mut next = Vec::with_capacity(n + 1);
        next.extend(
            population[..self.retained(n)]
                .iter()
                .map(|ind| Individual::new(ind.genome().clone())),
        );

        let k = nearest_combination_k(n);
        'pairs: for i in 0..k {
            for j in i + 1..k {
                if next.len() >= n {
                    break 'pairs;
                }
                push_children(&mut next, &population[i], &population[j], rng);
            }
        }
        next.truncate(n);
        next
    }

    fn roulette<R>(&self, population: &[Individual], rng: &mut R) -> Vec<Individual>
    where
        R: Rng + ?Sized,
    {
        let n = population.len();
        let wheel = Wheel::new(population);
        let mut next = Vec::with_capacity(n + 1);

        for _ in 0..self.retained(n) {
            let i = wheel.spin(rng);
            next.push(Individual::new(population[i].genome().clone()));
        }

        while next.len() < n {
            let first = wheel.spin(rng);
            let second = if wheel.weighted_slots() >= 2 {
                let second = wheel.spin(rng);
                if second == first {
                    continue;
                }
                second
            } else {
                let other = rng.random_range(0..n - 1);
                if other >= first { other + 1 } else { other }
            };
            push_children(&mut next, &population[first], &population[second], rng);
        }
        next.truncate(n);
        next
    }
}

fn push_children<R>(next: &mut Vec<Individual>, p1: &Individual, p2: &Individual, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let (c1, c2) = p1.genome().cross_over(p2.genome(), rng);
    next.push(Individual::new(c1));
    next.push(Individual::new(c2));
}

/// Smallest `K ≥ 2` such that `K·(K - 1) ≥ n`.
///
/// Found by binary search over `[2, max(n, 2)]`.
#[must_use]
pub fn nearest_combination_k(n: usize) -> usize {
    let (mut lo, mut hi) = (2, n.max(2));
    while lo < hi {
        let mid = lo + (hi - lo) / 2;
        if mid * (mid - 1) >= n {
            hi = mid;
        } else {
            lo = mid + 1;
        }
    }
    lo
}

/// Cumulative fitness wheel used by roulette selection.
#[derive(Debug)]
struct Wheel {
    cumulative: Vec<f32>,
    weighted_slots: usize,
}

impl Wheel {
    fn new(population: &[Individual]) -> Self {
        let mut total = 0.0;
        let mut weighted_slots = 0;
        let cumulative = population
            .iter()
            .map(|ind| {
                let weight = if ind.fitness().is_finite() {
                    ind.fitness().max(0.0)
                } else {
                    0.0
                };
                if weight > 0.0 {
                    weighted_slots += 1;
                }
                total += weight;
                total
            })
            .collect();
        Self {
            cumulative,
            weighted_slots,
        }
    }

    fn total(&self) -> f32 {
        self.cumulative.last().copied().unwrap_or(0.0)
    }

    fn weighted_slots(&self) -> usize {
        self.weighted_slots
    }

    /// Index of the first slot whose cumulative weight reaches a uniform draw.
    fn spin<R>(&self, rng: &mut R) -> usize
    where
        R: Rng + ?Sized,
    {
        let n = self.cumulative.len();
        let total = self.total();
        if total <= 0.0 {
            return rng.random_range(0..n);
        }
        let u = rng.random_range(0.0..=total);
        self.cumulative
            .partition_point(|&c| c < u)
            .min(n - 1)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{ActivationKind, Architecture, CrossoverKind, Genome};

    fn population(fitness: &[f32], rng: &mut Pcg32) -> Vec<Individual> {
        fitness
            .iter()
            .map(|&f| {
                let genome = Genome::random(
                    Architecture {
                        hidden_layers: 1,
                        nodes_per_layer: 3,
                    },
                    ActivationKind::Sigmoid,
                    CrossoverKind::TwoPoints,
                    rng,
                );
                Individual::with_fitness(genome, f)
            })
            .collect()
    }

    #[expect(clippy::cast_precision_loss)]
    fn descending(n: usize) -> Vec<f32> {
        (0..n).rev().map(|i| i as f32).collect()
    }

    #[test]
    fn test_nearest_combination_k() {
        assert_eq!(nearest_combination_k(2), 2);
        assert_eq!(nearest_combination_k(3), 3);
        assert_eq!(nearest_combination_k(6), 3);
        assert_eq!(nearest_combination_k(7), 4);
        assert_eq!(nearest_combination_k(20), 5);
        assert_eq!(nearest_combination_k(21), 6);
        assert_eq!(nearest_combination_k(100), 11);
    }

    #[test]
    fn test_selection_keeps_population_size() {
        let mut rng = Pcg32::seed_from_u64(0);
        for n in [2, 4, 10, 20] {
            let pop = population(&descending(n), &mut rng);
            for kind in SelectionKind::ALL {
                for keep_rate in [0.0, 0.2, 0.5, 0.9, 1.0] {
                    let next = Selection::new(kind, keep_rate).next_generation(&pop, &mut rng);
                    assert_eq!(next.len(), n, "{kind} keep={keep_rate} n={n}");
                    assert!(next.iter().all(|ind| ind.fitness().abs() < f32::EPSILON));
                }
            }
        }
    }

    #[test]
    fn test_pair_best_ones_retains_top_in_order() {
        let mut rng = Pcg32::seed_from_u64(1);
        let pop = population(&descending(10), &mut rng);
        let next = Selection::new(SelectionKind::PairBestOnes, 0.3).next_generation(&pop, &mut rng);
        for (kept, parent) in next.iter().zip(&pop).take(3) {
            assert_eq!(kept.genome(), parent.genome());
        }
    }

    #[test]
    fn test_pair_best_ones_only_uses_top_k_parents() {
        // with arithmetic crossover a child lies between its parents, so weights
        // of children of the top K stay within the top K's range
        let mut rng = Pcg32::seed_from_u64(2);
        let arch = Architecture {
            hidden_layers: 1,
            nodes_per_layer: 2,
        };
        let pop: Vec<Individual> = descending(6)
            .into_iter()
            .enumerate()
            .map(|(i, f)| {
                let mut genome =
                    Genome::zeroed(arch, ActivationKind::Sigmoid, CrossoverKind::Arithmetic);
                #[expect(clippy::cast_precision_loss)]
                let value = i as f32;
                for (w, b) in genome.layers_mut() {
                    w.as_mut_slice().fill(value);
                    b.fill(value);
                }
                Individual::with_fitness(genome, f)
            })
            .collect();

        // K = 3 for n = 6, so only individuals 0, 1 and 2 reproduce
        let next = Selection::new(SelectionKind::PairBestOnes, 0.0).next_generation(&pop, &mut rng);
        for ind in &next {
            for w in ind.genome().weights() {
                assert!(w.as_slice().iter().all(|&v| (-1e-5..=2.0 + 1e-5).contains(&v)));
            }
        }
    }

    #[test]
    fn test_roulette_zero_fitness_falls_back_to_uniform() {
        let mut rng = Pcg32::seed_from_u64(3);
        let pop = population(&[0.0; 8], &mut rng);
        let next = Selection::new(SelectionKind::Roulette, 0.5).next_generation(&pop, &mut rng);
        assert_eq!(next.len(), 8);
    }

    #[test]
    fn test_roulette_single_weighted_slot_terminates() {
        let mut rng = Pcg32::seed_from_u64(4);
        let pop = population(&[5.0, 0.0, -1.0, -2.0], &mut rng);
        let next = Selection::new(SelectionKind::Roulette, 0.5).next_generation(&pop, &mut rng);
        assert_eq!(next.len(), 4);
        // only the single weighted individual can be retained
        assert_eq!(next[0].genome(), pop[0].genome());
        assert_eq!(next[1].genome(), pop[0].genome());
    }

    #[test]
    fn test_wheel_spin_follows_weights() {
        let mut rng = Pcg32::seed_from_u64(5);
        let pop = population(&[3.0, 1.0, 0.0, 0.0], &mut rng);
        let wheel = Wheel::new(&pop);
        assert_eq!(wheel.weighted_slots(), 2);
        let mut hits = [0usize; 4];
        for _ in 0..4000 {
            hits[wheel.spin(&mut rng)] += 1;
        }
        assert_eq!(hits[2] + hits[3], 0);
        assert!(hits[0] > 2 * hits[1], "{hits:?}");
    }

    #[test]
    #[should_panic(expected = "ranked")]
    fn test_unranked_population_panics() {
        let mut rng = Pcg32::seed_from_u64(6);
        let pop = population(&[1.0, 2.0], &mut rng);
        let _ = Selection::default().next_generation(&pop, &mut rng);
    }
}
