//! Crossover operators combining two parent vectors into two children.
//!
//! Both operators are pure: parents are never modified and children are
//! freshly allocated. A [`Genome`](crate::Genome) applies its operator to every
//! row of every weight matrix and to every bias vector independently.
//!
//! # Two-Point Crossover (`two_points`)
//!
//! Two distinct cut indices `c1 < c2` are drawn without replacement:
//!
//! ```text
//! child A = p1[..=c1] ++ p2[c1 + 1..c2] ++ p1[c2..]
//! child B = p2[..=c1] ++ p1[c1 + 1..c2] ++ p2[c2..]
//! ```
//!
//! Adjacent cuts leave the middle segment empty, so the children are copies of
//! their parents. Vectors shorter than two elements cannot be cut and are copied
//! as well.
//!
//! # Arithmetic Crossover (`arithmetic`)
//!
//! With `α ~ U[0, 1)`:
//!
//! ```text
//! child A = α·p1 + (1 - α)·p2
//! child B = (1 - α)·p1 + α·p2
//! ```
//!
//! The children always sum to the parents' sum.

use std::fmt;

use rand::{Rng, seq::index};
use serde::{Deserialize, Serialize};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossoverKind {
    #[default]
    TwoPoints,
    Arithmetic,
}

impl CrossoverKind {
    pub const ALL: [Self; 2] = [Self::TwoPoints, Self::Arithmetic];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TwoPoints => "two_points",
            Self::Arithmetic => "arithmetic",
        }
    }

    /// Combines two equally long parents into two children.
    ///
    /// # Panics
    ///
    /// Panics if the parents have different lengths.
    pub fn perform<R>(self, p1: &[f32], p2: &[f32], rng: &mut R) -> (Vec<f32>, Vec<f32>)
    where
        R: Rng + ?Sized,
    {
        assert_eq!(p1.len(), p2.len(), "parents must have the same length");
        match self {
            Self::TwoPoints => two_points(p1, p2, rng),
            Self::Arithmetic => arithmetic(p1, p2, rng),
        }
    }
}

impl fmt::Display for CrossoverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn two_points<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> (Vec<f32>, Vec<f32>)
where
    R: Rng + ?Sized,
{
    if p1.len() < 2 {
        return (p1.to_vec(), p2.to_vec());
    }

    let mut cuts = index::sample(rng, p1.len(), 2).into_vec();
    cuts.sort_unstable();
    let (c1, c2) = (cuts[0], cuts[1]);

    let splice = |a: &[f32], b: &[f32]| {
        let mut child = Vec::with_capacity(a.len());
        child.extend_from_slice(&a[..=c1]);
        child.extend_from_slice(&b[c1 + 1..c2]);
        child.extend_from_slice(&a[c2..]);
        child
    };
    (splice(p1, p2), splice(p2, p1))
}

fn arithmetic<R>(p1: &[f32], p2: &[f32], rng: &mut R) -> (Vec<f32>, Vec<f32>)
where
    R: Rng + ?Sized,
{
    let alpha: f32 = rng.random();
    let blend = |a: f32, b: f32| alpha * a + (1.0 - alpha) * b;
    let child1 = p1.iter().zip(p2).map(|(&a, &b)| blend(a, b)).collect();
    let child2 = p1.iter().zip(p2).map(|(&a, &b)| blend(b, a)).collect();
    (child1, child2)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;

    fn parents(len: usize) -> (Vec<f32>, Vec<f32>) {
        #[expect(clippy::cast_precision_loss)]
        let p1 = (0..len).map(|i| i as f32).collect();
        #[expect(clippy::cast_precision_loss)]
        let p2 = (0..len).map(|i| -(i as f32) - 100.0).collect();
        (p1, p2)
    }

    #[test]
    fn test_two_points_swaps_middle_segment() {
        let mut rng = Pcg32::seed_from_u64(1);
        let (p1, p2) = parents(10);
        for _ in 0..100 {
            let (a, b) = CrossoverKind::TwoPoints.perform(&p1, &p2, &mut rng);
            assert_eq!(a.len(), 10);
            assert_eq!(b.len(), 10);
            for i in 0..10 {
                // every position comes from exactly one parent, mirrored in the sibling
                let from_p1 = (a[i] - p1[i]).abs() < f32::EPSILON;
                assert!(from_p1 || (a[i] - p2[i]).abs() < f32::EPSILON);
                let sibling = if from_p1 { p2[i] } else { p1[i] };
                assert!((b[i] - sibling).abs() < f32::EPSILON);
            }
            // the first element is never swapped
            assert!((a[0] - p1[0]).abs() < f32::EPSILON);
            // the swapped positions form one contiguous run
            let swapped: Vec<usize> = (0..10)
                .filter(|&i| (a[i] - p2[i]).abs() < f32::EPSILON)
                .collect();
            if let (Some(first), Some(last)) = (swapped.first(), swapped.last()) {
                assert_eq!(last - first + 1, swapped.len());
            }
        }
    }

    #[test]
    fn test_two_points_short_vectors_are_copied() {
        let mut rng = Pcg32::seed_from_u64(0);
        for len in [0, 1] {
            let (p1, p2) = parents(len);
            let (a, b) = CrossoverKind::TwoPoints.perform(&p1, &p2, &mut rng);
            assert_eq!(a, p1);
            assert_eq!(b, p2);
        }
    }

    #[test]
    fn test_two_points_length_two_is_copied() {
        // the only possible cuts are adjacent, so the middle segment is empty
        let mut rng = Pcg32::seed_from_u64(3);
        let (p1, p2) = parents(2);
        let (a, b) = CrossoverKind::TwoPoints.perform(&p1, &p2, &mut rng);
        assert_eq!(a, p1);
        assert_eq!(b, p2);
    }

    #[test]
    fn test_arithmetic_preserves_sum() {
        let mut rng = Pcg32::seed_from_u64(2);
        let (p1, p2) = parents(16);
        let (a, b) = CrossoverKind::Arithmetic.perform(&p1, &p2, &mut rng);
        for i in 0..16 {
            assert!((a[i] + b[i] - (p1[i] + p2[i])).abs() < 1e-3);
        }
    }

    #[test]
    #[should_panic(expected = "same length")]
    fn test_mismatched_parents_panic() {
        let mut rng = Pcg32::seed_from_u64(0);
        let _ = CrossoverKind::Arithmetic.perform(&[1.0], &[1.0, 2.0], &mut rng);
    }
}
