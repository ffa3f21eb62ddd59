use std::{
    io::{self, BufRead as _},
    path::PathBuf,
    sync::{
        Arc,
        mpsc::{self, Receiver},
    },
    thread,
};

use anyhow::Context;
use gladius_evaluator::BattleEvaluator;
use gladius_training::{
    EvaluationScheduler, GenerationReport, GenerationState, GeneticEvolution, SessionOptions,
    TrainingSession,
};

use crate::config::{ResolvedConfig, TrainingConfig};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct TrainArg {
    /// Training configuration (JSON); defaults are used if omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Stop after this many generations (runs until Enter is pressed otherwise)
    #[arg(long)]
    generations: Option<usize>,
    /// Seed of the training run (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// Start a new population even if a checkpoint exists
    #[arg(long)]
    no_resume: bool,
}

pub(crate) fn run(arg: &TrainArg) -> anyhow::Result<()> {
    let TrainArg {
        config,
        generations,
        seed,
        no_resume,
    } = arg;
    let config = TrainingConfig::load(config.as_deref())?
        .resolve()
        .context("Invalid training configuration")?;
    let seed = seed.unwrap_or_else(rand::random);

    let evolution = load_or_create(&config, seed, !*no_resume)?;
    eprintln!(
        "Training from generation #{} (population {}, seed {seed})",
        evolution.generation(),
        evolution.population().len(),
    );

    let evaluator = BattleEvaluator::new(config.battle.clone(), config.fitness);
    let scheduler = EvaluationScheduler::new(config.workers, config.result_timeout);
    let mut session = TrainingSession::new(
        evolution,
        scheduler,
        Arc::new(evaluator),
        SessionOptions {
            generations: *generations,
            checkpoint: Some(config.checkpoint.clone()),
        },
    );

    let reports = session.start()?;
    let stop_requests = listen_for_stop();
    if generations.is_none() {
        eprintln!("Press Enter to stop after the current generation.");
    }
    let mut stopping = false;
    for report in &reports {
        print_report(&report);
        if !stopping && stop_requests.try_recv().is_ok() {
            eprintln!("Stopping after the current generation...");
            session.pause();
            stopping = true;
        }
    }
    session.join().context("Training failed")?;

    let evolution = session
        .into_evolution()
        .context("Training session did not return the population")?;
    let best = evolution
        .best()
        .context("Final population was not evaluated")?;

    eprintln!();
    eprintln!("Training stopped at generation #{}", evolution.generation());
    eprintln!(
        "  Checkpoint: {}",
        config.checkpoint.generation_path.display()
    );
    eprintln!(
        "  Best genome: {}",
        config.checkpoint.best_genome_path.display()
    );
    eprintln!("  Final fitness: {:.3}", best.fitness());
    eprintln!("  Parameters: {}", best.genome().parameter_count());

    Ok(())
}

fn load_or_create(
    config: &ResolvedConfig,
    seed: u64,
    resume: bool,
) -> anyhow::Result<GeneticEvolution> {
    let path = &config.checkpoint.generation_path;
    if !resume || !path.exists() {
        return Ok(GeneticEvolution::new(config.params.clone(), seed));
    }

    let state = GenerationState::load(path)
        .with_context(|| format!("Failed to load checkpoint: {}", path.display()))?;
    let mut evolution = GeneticEvolution::from_state(state, seed)?;
    evolution
        .set_params(config.params.clone())
        .with_context(|| format!("Checkpoint {} is incompatible", path.display()))?;
    tracing::info!(
        path = %path.display(),
        generation = evolution.generation(),
        "resumed from checkpoint"
    );
    Ok(evolution)
}

/// Signals once a line is entered on stdin.
fn listen_for_stop() -> Receiver<()> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        if let Some(Ok(_)) = io::stdin().lock().lines().next() {
            tx.send(()).ok();
        }
    });
    rx
}

fn print_report(report: &GenerationReport) {
    let GenerationReport {
        generation,
        summary,
        is_final,
    } = report;
    let label = if *is_final { " (final)" } else { "" };
    eprintln!("Generation #{generation}{label}:");
    eprintln!("  Fitness Stats:");
    eprintln!("    Max:    {:.3}", summary.max);
    eprintln!("    Mean:   {:.3}", summary.mean);
    eprintln!("    Median: {:.3}", summary.median);
    eprintln!("    Min:    {:.3}", summary.min);
    eprintln!("    Stddev: {:.3}", summary.std_dev);
}
