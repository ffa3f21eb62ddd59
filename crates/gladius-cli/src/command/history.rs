use std::{
    io::{self},
    path::{Path, PathBuf},
};

use anyhow::Context;
use gladius_training::GenerationState;

use crate::util::Output;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct HistoryArg {
    /// Checkpoint file written by `train`
    #[arg(long, default_value = "generations/generation.json")]
    checkpoint: PathBuf,
    /// Output file path (stdout if omitted)
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &HistoryArg) -> anyhow::Result<()> {
    let HistoryArg { checkpoint, output } = arg;
    let fitness_history = load_history(checkpoint)?;

    let mut output = Output::from_output_path(output.clone())?;
    write_history(&mut output, &fitness_history)
        .with_context(|| format!("Failed to write history to {}", output.display_path()))?;
    Ok(())
}

fn load_history(checkpoint: &Path) -> anyhow::Result<Vec<f32>> {
    let state = GenerationState::load(checkpoint)
        .with_context(|| format!("Failed to load checkpoint: {}", checkpoint.display()))?;
    Ok(state.fitness_history)
}

/// Writes one `generation,top_fitness` row per evaluated generation.
fn write_history<W>(writer: &mut W, fitness_history: &[f32]) -> io::Result<()>
where
    W: io::Write,
{
    writeln!(writer, "generation,top_fitness")?;
    for (i, fitness) in fitness_history.iter().enumerate() {
        writeln!(writer, "{},{fitness}", i + 1)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use gladius_training::{CheckpointError, EvolutionParams, GeneticEvolution};

    use super::*;

    fn params() -> EvolutionParams {
        EvolutionParams {
            population_size: 4,
            ..EvolutionParams::default()
        }
    }

    #[test]
    fn test_history_is_read_from_checkpoint() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.json");
        let mut state = GeneticEvolution::new(params(), 0).state();
        state.fitness_history = vec![2.0, 3.5];
        state.save(&path).unwrap();

        assert_eq!(load_history(&path).unwrap(), vec![2.0, 3.5]);
    }

    #[test]
    fn test_invalid_checkpoint_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.json");
        let mut state = GeneticEvolution::new(params(), 0).state();
        state.population.pop();
        state.save(&path).unwrap();

        let err = load_history(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to load checkpoint"), "{err}");
        assert!(matches!(
            err.downcast_ref::<CheckpointError>(),
            Some(CheckpointError::InvalidPopulation { len: 3 })
        ));
    }

    #[test]
    fn test_history_is_one_row_per_generation() {
        let mut out = vec![];
        write_history(&mut out, &[1.0, 4.5, 12.25]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "generation,top_fitness\n1,1\n2,4.5\n3,12.25\n"
        );
    }
}
