use std::{
    cmp::Ordering,
    path::{Path, PathBuf},
};

use anyhow::Context;
use gladius_engine::{ActionPolicy, Battle, BattleConfig, Brain, Side};
use gladius_evaluator::{AgentMetrics, BattleEvaluator, BattleReport, FitnessKind};
use gladius_training::{Genome, GenomeExport};
use rand::SeedableRng as _;
use rand_pcg::Pcg32;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct FightArg {
    /// Exported genome fighting on the left
    #[arg(long)]
    left: PathBuf,
    /// Exported genome fighting on the right (a random genome if omitted)
    #[arg(long)]
    right: Option<PathBuf>,
    /// Number of ticks to simulate
    #[arg(long, default_value_t = BattleConfig::default().frames)]
    frames: usize,
    /// Battle seed (random if omitted)
    #[arg(long)]
    seed: Option<u64>,
    /// How an agent picks an action from its network outputs
    #[arg(long, default_value_t = ActionPolicy::ArgMax)]
    policy: ActionPolicy,
    /// Fitness function used to score the battle
    #[arg(long, default_value_t = FitnessKind::default())]
    fitness: FitnessKind,
    /// Print the state of both agents on every tick
    #[arg(long)]
    trace: bool,
}

pub(crate) fn run(arg: &FightArg) -> anyhow::Result<()> {
    let FightArg {
        left,
        right,
        frames,
        seed,
        policy,
        fitness,
        trace,
    } = arg;
    let seed = seed.unwrap_or_else(rand::random);

    let left = load_genome(left)?;
    let right = match right {
        Some(path) => load_genome(path)?,
        None => {
            let mut rng = Pcg32::seed_from_u64(seed.wrapping_add(1));
            eprintln!("No right genome given; using a random one");
            Genome::random(
                left.architecture(),
                left.activation(),
                left.crossover(),
                &mut rng,
            )
        }
    };

    let config = BattleConfig {
        frames: *frames,
        action_policy: *policy,
        ..BattleConfig::default()
    };
    let evaluator = BattleEvaluator::new(config, *fitness);

    let report = if *trace {
        traced_fight(&evaluator, &left, &right, seed)?
    } else {
        evaluator
            .fight(&left, &right, seed)
            .context("Failed to start battle")?
    };

    eprintln!(
        "Battle of {} ticks (seed {seed}, policy {policy}, fitness {fitness})",
        report.outcome.frames
    );
    print_side("Left", &report.left, report.left_fitness);
    print_side("Right", &report.right, report.right_fitness);
    let winner = match report.left.successful_shots.cmp(&report.right.successful_shots) {
        Ordering::Greater => "left",
        Ordering::Less => "right",
        Ordering::Equal => "nobody",
    };
    eprintln!("Winner: {winner}");
    Ok(())
}

fn load_genome(path: &Path) -> anyhow::Result<Genome> {
    let export = GenomeExport::load(path)
        .with_context(|| format!("Failed to load genome: {}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        generation = export.generation,
        fitness = export.fitness,
        trained_at = %export.trained_at,
        "loaded genome"
    );
    Ok(export.genome)
}

fn traced_fight(
    evaluator: &BattleEvaluator<FitnessKind>,
    left: &dyn Brain,
    right: &dyn Brain,
    seed: u64,
) -> anyhow::Result<BattleReport> {
    let mut battle =
        Battle::new(left, right, evaluator.config(), seed).context("Failed to start battle")?;
    println!("tick,side,x,y,angle,action,hits,taken,bullets");
    while !battle.is_finished() {
        battle.step();
        let tick = battle.frames_elapsed();
        let world = battle.world();
        for side in [Side::Left, Side::Right] {
            let agent = world.agent(Battle::agent_id(side));
            let action = agent
                .last_action()
                .map(|slot| format!("{}:{slot}", agent.actions()[slot].kind()))
                .unwrap_or_default();
            let side = match side {
                Side::Left => "left",
                Side::Right => "right",
            };
            println!(
                "{tick},{side},{:.2},{:.2},{:.3},{action},{},{},{}",
                agent.position().x,
                agent.position().y,
                agent.angle(),
                agent.counters().successful_shots,
                agent.counters().bullets_taken,
                world.bullets().len(),
            );
        }
    }
    Ok(evaluator.report(seed, battle.outcome()))
}

fn print_side(label: &str, metrics: &AgentMetrics, fitness: f32) {
    eprintln!("{label}:");
    eprintln!("  Fitness:          {fitness:.3}");
    eprintln!("  Hits:             {}", metrics.successful_shots);
    eprintln!("  Bullets taken:    {}", metrics.bullets_taken);
    eprintln!("  Accuracy:         {:.1}%", metrics.shot_accuracy_percent);
    eprintln!(
        "  Actions:          move {:.1}% / rotate {:.1}% / shoot {:.1}%",
        metrics.moves_percent, metrics.rotations_percent, metrics.shots_percent
    );
    eprintln!("  Enemy in view:    {:.1}%", metrics.enemy_in_fov_time_percent);
    eprintln!("  Near border:      {:.1}%", metrics.border_time_percent);
    eprintln!("  Near corner:      {:.1}%", metrics.corner_time_percent);
    eprintln!(
        "  Repeated action:  {:.1}%",
        metrics.most_repeated_action_percent
    );
}
