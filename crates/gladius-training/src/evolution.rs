//! The generation controller.
//!
//! [`GeneticEvolution`] owns the population between generations and drives one
//! cycle at a time:
//!
//! ```text
//! evaluate_population -> (checkpoint) -> create_next_generation -> ...
//! ```
//!
//! All randomness of a run (initial genomes, battle seeds, selection and
//! mutation) comes from the controller's own seeded generator, so with a single
//! worker a run is fully reproducible from its seed.

use gladius_evaluator::DuelEvaluator;
use rand::SeedableRng as _;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::{
    ActivationKind, Architecture, CheckpointError, CrossoverKind, EvaluationError,
    EvaluationScheduler, FitnessSummary, GenerationState, Genome, Individual, Mutation,
    PairingPolicy, Selection,
};

/// Operator choices of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionParams {
    pub population_size: usize,
    pub architecture: Architecture,
    pub activation: ActivationKind,
    pub crossover: CrossoverKind,
    pub selection: Selection,
    pub mutation: Mutation,
    pub pairing: PairingPolicy,
}

impl Default for EvolutionParams {
    fn default() -> Self {
        Self {
            population_size: 20,
            architecture: Architecture::default(),
            activation: ActivationKind::default(),
            crossover: CrossoverKind::default(),
            selection: Selection::default(),
            mutation: Mutation::default(),
            pairing: PairingPolicy::default(),
        }
    }
}

impl EvolutionParams {
    /// Population size actually used: odd sizes are rounded up by one.
    #[must_use]
    pub fn effective_population_size(&self) -> usize {
        self.population_size.next_multiple_of(2)
    }
}

#[derive(Debug, Clone)]
pub struct GeneticEvolution {
    generation: usize,
    params: EvolutionParams,
    population: Vec<Individual>,
    fitness_history: Vec<f32>,
    is_evaluated: bool,
    rng: Pcg32,
}

impl GeneticEvolution {
    /// Starts a run at generation 1 with a random population.
    ///
    /// # Panics
    ///
    /// Panics if the population size is below 2.
    #[must_use]
    pub fn new(mut params: EvolutionParams, seed: u64) -> Self {
        assert!(
            params.population_size >= 2,
            "population needs at least two individuals"
        );
        let size = params.effective_population_size();
        if size != params.population_size {
            tracing::info!(
                configured = params.population_size,
                size,
                "rounded population size up to an even number"
            );
            params.population_size = size;
        }

        let mut rng = Pcg32::seed_from_u64(seed);
        let population = (0..size)
            .map(|_| {
                Individual::new(Genome::random(
                    params.architecture,
                    params.activation,
                    params.crossover,
                    &mut rng,
                ))
            })
            .collect();

        Self {
            generation: 1,
            params,
            population,
            fitness_history: vec![],
            is_evaluated: false,
            rng,
        }
    }

    /// Resumes a run from a checkpoint.
    ///
    /// The generator is not part of the checkpoint; `seed` starts a fresh one.
    pub fn from_state(state: GenerationState, seed: u64) -> Result<Self, CheckpointError> {
        state.validate()?;
        let GenerationState {
            generation,
            mut params,
            population,
            fitness_history,
            is_evaluated,
        } = state;
        params.population_size = population.len();
        Ok(Self {
            generation,
            params,
            population,
            fitness_history,
            is_evaluated,
            rng: Pcg32::seed_from_u64(seed),
        })
    }

    /// Snapshot of the run for checkpointing.
    #[must_use]
    pub fn state(&self) -> GenerationState {
        GenerationState {
            generation: self.generation,
            params: self.params.clone(),
            population: self.population.clone(),
            fitness_history: self.fitness_history.clone(),
            is_evaluated: self.is_evaluated,
        }
    }

    /// Replaces the operator choices of a resumed run.
    ///
    /// The architecture must match the population's and the population size
    /// is kept.
    pub fn set_params(&mut self, mut params: EvolutionParams) -> Result<(), CheckpointError> {
        if params.architecture != self.params.architecture {
            return Err(CheckpointError::ArchitectureMismatch {
                expected: params.architecture,
                found: self.params.architecture,
            });
        }
        if params.population_size != self.population.len() {
            tracing::warn!(
                configured = params.population_size,
                size = self.population.len(),
                "keeping the population size of the resumed run"
            );
            params.population_size = self.population.len();
        }
        self.params = params;
        Ok(())
    }

    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn params(&self) -> &EvolutionParams {
        &self.params
    }

    #[must_use]
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    #[must_use]
    pub fn fitness_history(&self) -> &[f32] {
        &self.fitness_history
    }

    #[must_use]
    pub fn is_evaluated(&self) -> bool {
        self.is_evaluated
    }

    /// Best individual of the last evaluation, `None` before it.
    #[must_use]
    pub fn best(&self) -> Option<&Individual> {
        self.population.first().filter(|_| self.is_evaluated)
    }

    /// Genome of the best individual of the last evaluation.
    #[must_use]
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best().map(Individual::genome)
    }

    #[must_use]
    pub fn top_fitness(&self) -> Option<f32> {
        self.best().map(Individual::fitness)
    }

    /// A fresh random genome with the run's architecture and operators.
    pub fn random_genome(&mut self) -> Genome {
        Genome::random(
            self.params.architecture,
            self.params.activation,
            self.params.crossover,
            &mut self.rng,
        )
    }

    /// Whether the current generation is due for a checkpoint.
    #[must_use]
    pub fn should_checkpoint(&self, interval: usize) -> bool {
        interval > 0 && self.generation % interval == 0
    }

    /// Scores the population and ranks it by descending fitness.
    ///
    /// Re-evaluating a generation replaces its entry in the fitness history.
    /// On error the population and history are left as they were.
    pub fn evaluate_population(
        &mut self,
        scheduler: &EvaluationScheduler,
        evaluator: &dyn DuelEvaluator,
    ) -> Result<FitnessSummary, EvaluationError> {
        let fixtures = self.params.pairing.plan(self.population.len(), &mut self.rng);
        tracing::debug!(
            generation = self.generation,
            fixtures = fixtures.len(),
            "evaluating population"
        );
        scheduler.evaluate(&mut self.population, &fixtures, evaluator)?;

        let top = self.population[0].fitness();
        if self.is_evaluated {
            self.fitness_history.pop();
        }
        self.fitness_history.push(top);
        self.is_evaluated = true;

        let summary = FitnessSummary::of_population(&self.population)
            .ok_or(EvaluationError::MissingResult { index: 0 })?;
        tracing::info!(
            generation = self.generation,
            top = summary.max,
            mean = summary.mean,
            min = summary.min,
            "generation evaluated"
        );
        Ok(summary)
    }

    /// Selects, reproduces and mutates the population, then advances the
    /// generation counter.
    ///
    /// Every individual of the new population is mutated, retained parents
    /// included.
    ///
    /// An unevaluated population is treated as equally fit: every fitness is
    /// reset to zero, so roulette selection draws uniformly and pair-best-ones
    /// keeps the current order.
    pub fn create_next_generation(&mut self) {
        if !self.is_evaluated {
            tracing::warn!(
                generation = self.generation,
                "selecting from an unevaluated population"
            );
            for individual in &mut self.population {
                individual.set_fitness(0.0);
            }
        }
        let mut next = self.select();
        self.mutate(&mut next);
        self.population = next;
        self.generation += 1;
        self.is_evaluated = false;
        tracing::debug!(generation = self.generation, "created next generation");
    }

    fn select(&mut self) -> Vec<Individual> {
        self.params
            .selection
            .next_generation(&self.population, &mut self.rng)
    }

    fn mutate(&mut self, population: &mut [Individual]) {
        for individual in population {
            self.params
                .mutation
                .mutate(individual.genome_mut(), &mut self.rng);
        }
    }
}
