use serde::{Deserialize, Serialize};

use crate::Individual;

/// Descriptive statistics of a population's fitness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitnessSummary {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
    pub median: f32,
    pub std_dev: f32,
}

impl FitnessSummary {
    /// Computes the summary of arbitrary fitness values.
    ///
    /// Returns `None` when `values` is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// # use gladius_training::FitnessSummary;
    /// let summary = FitnessSummary::new([5.0, 2.0, 4.0, 1.0, 3.0]).unwrap();
    /// assert_eq!(summary.min, 1.0);
    /// assert_eq!(summary.max, 5.0);
    /// assert_eq!(summary.mean, 3.0);
    /// assert_eq!(summary.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f32>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f32::total_cmp);
        Self::from_sorted(&values)
    }

    /// Summarizes the fitness of every individual.
    #[must_use]
    pub fn of_population(population: &[Individual]) -> Option<Self> {
        Self::new(population.iter().map(Individual::fitness))
    }

    #[expect(clippy::cast_precision_loss)]
    fn from_sorted(sorted: &[f32]) -> Option<Self> {
        let (&min, &max) = (sorted.first()?, sorted.last()?);
        let len = sorted.len() as f32;
        let mean = sorted.iter().sum::<f32>() / len;
        let mid = sorted.len() / 2;
        let median = if sorted.len() % 2 == 0 {
            f32::midpoint(sorted[mid - 1], sorted[mid])
        } else {
            sorted[mid]
        };
        let variance = sorted.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / len;
        Some(Self {
            min,
            max,
            mean,
            median,
            std_dev: variance.sqrt(),
        })
    }
}
