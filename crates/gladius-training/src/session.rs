//! Training on a background thread.
//!
//! A [`TrainingSession`] moves the [`GeneticEvolution`] onto a worker thread
//! and loops `evaluate -> checkpoint -> advance` until it is paused or reaches
//! its generation limit. Stopping is cooperative: the generation in progress
//! finishes, the population it produced is evaluated once more so that the
//! final state is ranked, and the thread exits. Battles are never interrupted.
//!
//! Progress is observable without locking through [`TrainingSession::generation`]
//! and through the [`GenerationReport`]s sent after every evaluation.

use std::{
    mem,
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
        mpsc::{self, Receiver, Sender},
    },
    thread::{self, JoinHandle},
};

use gladius_evaluator::DuelEvaluator;
use serde::{Deserialize, Serialize};

use crate::{
    CheckpointError, EvaluationError, EvaluationScheduler, FitnessSummary, GeneticEvolution,
    GenomeExport,
};

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::From)]
pub enum SessionError {
    #[display("training is already running")]
    AlreadyRunning,
    #[display("training is not running")]
    NotRunning,
    #[display("training thread panicked")]
    Panicked,
    #[display("evaluation failed")]
    #[from]
    Evaluation(EvaluationError),
    #[display("checkpoint failed")]
    #[from]
    Checkpoint(CheckpointError),
}

/// Where and how often training progress is saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckpointPolicy {
    /// Save every `interval` generations; `0` disables periodic saves.
    pub interval: usize,
    pub generation_path: PathBuf,
    pub best_genome_path: PathBuf,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self {
            interval: 1,
            generation_path: PathBuf::from("generations/generation.json"),
            best_genome_path: PathBuf::from("creatures/creature.json"),
        }
    }
}

impl CheckpointPolicy {
    /// Saves the run state, and the best genome if the population is ranked.
    pub fn save(&self, evolution: &GeneticEvolution) -> Result<(), CheckpointError> {
        evolution.state().save(&self.generation_path)?;
        if let Some(best) = evolution.best() {
            GenomeExport::new(best, evolution.generation()).save(&self.best_genome_path)?;
        }
        tracing::info!(
            generation = evolution.generation(),
            path = %self.generation_path.display(),
            "saved checkpoint"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Number of generations to advance before stopping; unbounded if `None`.
    pub generations: Option<usize>,
    pub checkpoint: Option<CheckpointPolicy>,
}

/// Sent after every evaluation of the running session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationReport {
    pub generation: usize,
    pub summary: FitnessSummary,
    /// Whether this is the evaluation that ends the run.
    pub is_final: bool,
}

#[derive(Debug)]
enum State {
    Idle(GeneticEvolution),
    Running(JoinHandle<(GeneticEvolution, Result<(), SessionError>)>),
    Taken,
}

#[derive(Debug)]
struct Shared {
    paused: AtomicBool,
    generation: AtomicUsize,
}

#[derive(Debug)]
pub struct TrainingSession {
    state: State,
    shared: Arc<Shared>,
    scheduler: EvaluationScheduler,
    evaluator: Arc<dyn DuelEvaluator>,
    options: SessionOptions,
}

impl TrainingSession {
    #[must_use]
    pub fn new(
        evolution: GeneticEvolution,
        scheduler: EvaluationScheduler,
        evaluator: Arc<dyn DuelEvaluator>,
        options: SessionOptions,
    ) -> Self {
        let shared = Arc::new(Shared {
            paused: AtomicBool::new(false),
            generation: AtomicUsize::new(evolution.generation()),
        });
        Self {
            state: State::Idle(evolution),
            shared,
            scheduler,
            evaluator,
            options,
        }
    }

    /// Starts training on a background thread.
    ///
    /// Returns the receiving end of the per-generation reports. Fails with
    /// [`SessionError::AlreadyRunning`] until the previous run is joined.
    pub fn start(&mut self) -> Result<Receiver<GenerationReport>, SessionError> {
        let evolution = match mem::replace(&mut self.state, State::Taken) {
            State::Idle(evolution) => evolution,
            running @ State::Running(_) => {
                self.state = running;
                return Err(SessionError::AlreadyRunning);
            }
            State::Taken => return Err(SessionError::NotRunning),
        };

        let (tx, rx) = mpsc::channel();
        self.shared.paused.store(false, Ordering::Relaxed);
        self.shared
            .generation
            .store(evolution.generation(), Ordering::Relaxed);

        let run = Run {
            shared: Arc::clone(&self.shared),
            scheduler: self.scheduler.clone(),
            evaluator: Arc::clone(&self.evaluator),
            options: self.options.clone(),
            reports: tx,
        };
        tracing::info!(
            generation = evolution.generation(),
            limit = ?self.options.generations,
            "starting training"
        );
        self.state = State::Running(thread::spawn(move || run.train(evolution)));
        Ok(rx)
    }

    /// Asks the running session to stop after the current generation.
    pub fn pause(&self) {
        self.shared.paused.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(&self.state, State::Running(handle) if !handle.is_finished())
    }

    /// Generation the session is currently working on.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.shared.generation.load(Ordering::Relaxed)
    }

    /// Waits for the background thread and takes the controller back.
    ///
    /// The controller stays in the session, ready for another [`start`] or
    /// [`into_evolution`], whatever the outcome of the run. It is lost only if
    /// the training thread panicked.
    ///
    /// [`start`]: Self::start
    /// [`into_evolution`]: Self::into_evolution
    pub fn join(&mut self) -> Result<(), SessionError> {
        let handle = match mem::replace(&mut self.state, State::Taken) {
            State::Running(handle) => handle,
            other => {
                self.state = other;
                return Err(SessionError::NotRunning);
            }
        };
        let (evolution, result) = handle.join().map_err(|_| SessionError::Panicked)?;
        self.shared
            .generation
            .store(evolution.generation(), Ordering::Relaxed);
        self.state = State::Idle(evolution);
        result
    }

    /// The controller, unless a run is in progress.
    #[must_use]
    pub fn evolution(&self) -> Option<&GeneticEvolution> {
        match &self.state {
            State::Idle(evolution) => Some(evolution),
            State::Running(_) | State::Taken => None,
        }
    }

    /// Gives up the session and returns ownership of the controller.
    ///
    /// Returns `None` while a run is in progress.
    #[must_use]
    pub fn into_evolution(self) -> Option<GeneticEvolution> {
        match self.state {
            State::Idle(evolution) => Some(evolution),
            State::Running(_) | State::Taken => None,
        }
    }
}

/// Everything the background thread needs besides the controller.
struct Run {
    shared: Arc<Shared>,
    scheduler: EvaluationScheduler,
    evaluator: Arc<dyn DuelEvaluator>,
    options: SessionOptions,
    reports: Sender<GenerationReport>,
}

impl Run {
    fn train(self, mut evolution: GeneticEvolution) -> (GeneticEvolution, Result<(), SessionError>) {
        let result = self.train_loop(&mut evolution);
        if let Err(err) = &result {
            tracing::error!(generation = evolution.generation(), %err, "training stopped");
        }
        (evolution, result)
    }

    fn train_loop(&self, evolution: &mut GeneticEvolution) -> Result<(), SessionError> {
        let mut advanced = 0;
        while !self.shared.paused.load(Ordering::Relaxed)
            && self.options.generations.is_none_or(|limit| advanced < limit)
        {
            self.evaluate(evolution, false)?;
            if let Some(checkpoint) = &self.options.checkpoint
                && evolution.should_checkpoint(checkpoint.interval)
            {
                checkpoint.save(evolution)?;
            }
            evolution.create_next_generation();
            advanced += 1;
            self.shared
                .generation
                .store(evolution.generation(), Ordering::Relaxed);
        }

        self.evaluate(evolution, true)?;
        if let Some(checkpoint) = &self.options.checkpoint {
            checkpoint.save(evolution)?;
        }
        tracing::info!(
            generation = evolution.generation(),
            advanced,
            "training stopped"
        );
        Ok(())
    }

    fn evaluate(
        &self,
        evolution: &mut GeneticEvolution,
        is_final: bool,
    ) -> Result<(), SessionError> {
        let summary = evolution.evaluate_population(&self.scheduler, self.evaluator.as_ref())?;
        let report = GenerationReport {
            generation: evolution.generation(),
            summary,
            is_final,
        };
        // the caller may have stopped listening
        self.reports.send(report).ok();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gladius_engine::Brain;
    use gladius_evaluator::{DuelError, DuelScores};

    use super::*;
    use crate::{Architecture, EvolutionParams, GenerationState};

    #[derive(Debug)]
    struct FirstOutput {
        delay: Duration,
    }

    impl DuelEvaluator for FirstOutput {
        fn duel(
            &self,
            left: &dyn Brain,
            right: &dyn Brain,
            _seed: u64,
        ) -> Result<DuelScores, DuelError> {
            thread::sleep(self.delay);
            Ok(DuelScores {
                left: left.forward(&[0.0; 7])[0],
                right: right.forward(&[0.0; 7])[0],
            })
        }
    }

    fn session(delay: Duration, options: SessionOptions) -> TrainingSession {
        let evolution = GeneticEvolution::new(
            EvolutionParams {
                population_size: 4,
                architecture: Architecture {
                    hidden_layers: 1,
                    nodes_per_layer: 3,
                },
                ..EvolutionParams::default()
            },
            0,
        );
        TrainingSession::new(
            evolution,
            EvaluationScheduler::new(2, Duration::from_secs(60)),
            Arc::new(FirstOutput { delay }),
            options,
        )
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut session = session(Duration::from_millis(5), SessionOptions::default());
        let _reports = session.start().unwrap();
        assert!(matches!(session.start(), Err(SessionError::AlreadyRunning)));
        assert!(session.evolution().is_none());

        session.pause();
        session.join().unwrap();
        assert!(session.evolution().is_some());
    }

    #[test]
    fn test_generation_limit_ends_with_final_evaluation() {
        let mut session = session(
            Duration::ZERO,
            SessionOptions {
                generations: Some(3),
                checkpoint: None,
            },
        );
        let reports = session.start().unwrap();
        session.join().unwrap();

        let reports = reports.iter().collect::<Vec<_>>();
        assert_eq!(
            reports.iter().map(|r| r.generation).collect::<Vec<_>>(),
            [1, 2, 3, 4]
        );
        assert_eq!(
            reports.iter().filter(|r| r.is_final).count(),
            1,
            "{reports:?}"
        );
        assert_eq!(session.generation(), 4);

        let evolution = session.into_evolution().unwrap();
        assert!(evolution.is_evaluated());
        assert_eq!(evolution.fitness_history().len(), 4);
    }

    #[test]
    fn test_pause_stops_after_current_generation() {
        let mut session = session(Duration::from_millis(1), SessionOptions::default());
        let reports = session.start().unwrap();
        let first = reports.recv().unwrap();
        assert_eq!(first.generation, 1);
        session.pause();
        session.join().unwrap();

        let last = reports.iter().last().unwrap();
        assert!(last.is_final);
        let evolution = session.evolution().unwrap();
        assert_eq!(last.generation, evolution.generation());
        assert!(evolution.is_evaluated());
    }

    #[test]
    fn test_join_without_start_fails() {
        let mut session = session(Duration::ZERO, SessionOptions::default());
        assert!(matches!(session.join(), Err(SessionError::NotRunning)));
        assert!(session.evolution().is_some());
    }

    #[test]
    fn test_checkpoints_are_written() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint = CheckpointPolicy {
            interval: 2,
            generation_path: dir.path().join("generations/generation.json"),
            best_genome_path: dir.path().join("creatures/creature.json"),
        };
        let mut session = session(
            Duration::ZERO,
            SessionOptions {
                generations: Some(2),
                checkpoint: Some(checkpoint.clone()),
            },
        );
        let _reports = session.start().unwrap();
        session.join().unwrap();

        let state = GenerationState::load(&checkpoint.generation_path).unwrap();
        assert_eq!(state.generation, 3);
        assert!(state.is_evaluated);
        let best = GenomeExport::load(&checkpoint.best_genome_path).unwrap();
        assert_eq!(best.generation, 3);
        assert_eq!(&best.genome, state.population[0].genome());
    }
}
