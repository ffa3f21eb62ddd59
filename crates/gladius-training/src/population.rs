use serde::{Deserialize, Serialize};

use crate::Genome;

/// A genome and the fitness it earned in the last evaluation.
///
/// Fitness is `0.0` until the individual has been evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    genome: Genome,
    fitness: f32,
}

impl Individual {
    #[must_use]
    pub fn new(genome: Genome) -> Self {
        Self {
            genome,
            fitness: 0.0,
        }
    }

    #[must_use]
    pub fn with_fitness(genome: Genome, fitness: f32) -> Self {
        Self { genome, fitness }
    }

    #[must_use]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    pub fn genome_mut(&mut self) -> &mut Genome {
        &mut self.genome
    }

    #[must_use]
    pub fn into_genome(self) -> Genome {
        self.genome
    }

    #[must_use]
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }
}

/// Whether `population` is ordered by descending fitness.
#[must_use]
pub fn is_ranked(population: &[Individual]) -> bool {
    population.is_sorted_by(|a, b| a.fitness >= b.fitness)
}
