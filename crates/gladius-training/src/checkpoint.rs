//! JSON persistence of training progress.
//!
//! Two documents are written during training:
//!
//! - a [`GenerationState`], the full state needed to resume the genetic
//!   algorithm where it stopped
//! - a [`GenomeExport`], the best genome of a generation, loadable on its own
//!   for exhibition battles
//!
//! Parent directories are created on save. Both documents are pretty-printed.

use std::{
    fs::{self, File},
    io::{self, BufReader, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{Architecture, EvolutionParams, Genome, Individual, ShapeError};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum CheckpointError {
    #[display("failed to access {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed JSON in {}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[display("architecture mismatch: expected {expected:?}, found {found:?}")]
    ArchitectureMismatch {
        expected: Architecture,
        found: Architecture,
    },
    #[display("genome #{individual} is malformed: {source}")]
    ShapeMismatch {
        individual: usize,
        source: ShapeError,
    },
    #[display("checkpoint population has {len} individuals (expected an even count of at least 2)")]
    InvalidPopulation { len: usize },
}

/// Everything needed to resume training.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationState {
    pub generation: usize,
    pub params: EvolutionParams,
    pub population: Vec<Individual>,
    /// Top fitness of every evaluated generation, oldest first.
    pub fitness_history: Vec<f32>,
    pub is_evaluated: bool,
}

impl GenerationState {
    pub fn save<P>(&self, path: P) -> Result<(), CheckpointError>
    where
        P: AsRef<Path>,
    {
        write_json(path.as_ref(), self)
    }

    /// Loads a state and checks that it is usable by the controller.
    pub fn load<P>(path: P) -> Result<Self, CheckpointError>
    where
        P: AsRef<Path>,
    {
        let state = read_json::<Self>(path.as_ref())?;
        state.validate()?;
        Ok(state)
    }

    /// Checks the population size, that every genome has the declared
    /// architecture, and that its layers really have that shape.
    pub fn validate(&self) -> Result<(), CheckpointError> {
        let len = self.population.len();
        if len < 2 || len % 2 != 0 {
            return Err(CheckpointError::InvalidPopulation { len });
        }
        self.check_architecture(self.params.architecture)?;
        for (individual, ind) in self.population.iter().enumerate() {
            ind.genome()
                .check_shape()
                .map_err(|source| CheckpointError::ShapeMismatch { individual, source })?;
        }
        Ok(())
    }

    /// Checks that every genome matches `expected`.
    pub fn check_architecture(&self, expected: Architecture) -> Result<(), CheckpointError> {
        match self
            .population
            .iter()
            .map(|ind| ind.genome().architecture())
            .find(|&found| found != expected)
        {
            Some(found) => Err(CheckpointError::ArchitectureMismatch { expected, found }),
            None => Ok(()),
        }
    }
}

/// A single trained genome, exported for exhibition battles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenomeExport {
    pub genome: Genome,
    pub generation: usize,
    pub fitness: f32,
    pub trained_at: DateTime<Utc>,
}

impl GenomeExport {
    /// Captures `individual` as trained now.
    #[must_use]
    pub fn new(individual: &Individual, generation: usize) -> Self {
        Self {
            genome: individual.genome().clone(),
            generation,
            fitness: individual.fitness(),
            trained_at: Utc::now(),
        }
    }

    pub fn save<P>(&self, path: P) -> Result<(), CheckpointError>
    where
        P: AsRef<Path>,
    {
        write_json(path.as_ref(), self)
    }

    /// Loads an export and checks that its genome is well formed.
    pub fn load<P>(path: P) -> Result<Self, CheckpointError>
    where
        P: AsRef<Path>,
    {
        let export = read_json::<Self>(path.as_ref())?;
        export
            .genome
            .check_shape()
            .map_err(|source| CheckpointError::ShapeMismatch {
                individual: 0,
                source,
            })?;
        Ok(export)
    }
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> CheckpointError {
    move |source| CheckpointError::Io {
        path: path.to_owned(),
        source,
    }
}

fn write_json<T>(path: &Path, value: &T) -> Result<(), CheckpointError>
where
    T: Serialize,
{
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_error(parent))?;
    }
    let file = File::create(path).map_err(io_error(path))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).map_err(|source| CheckpointError::Json {
        path: path.to_owned(),
        source,
    })?;
    writeln!(writer).map_err(io_error(path))?;
    writer.flush().map_err(io_error(path))?;
    tracing::debug!(path = %path.display(), "wrote checkpoint");
    Ok(())
}

fn read_json<T>(path: &Path) -> Result<T, CheckpointError>
where
    T: DeserializeOwned,
{
    let file = File::open(path).map_err(io_error(path))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| CheckpointError::Json {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::{ActivationKind, CrossoverKind};

    fn state(rng: &mut Pcg32) -> GenerationState {
        let params = EvolutionParams {
            population_size: 4,
            architecture: Architecture {
                hidden_layers: 2,
                nodes_per_layer: 3,
            },
            ..EvolutionParams::default()
        };
        let population = (0..4_u8)
            .map(|i| {
                let genome = Genome::random(
                    params.architecture,
                    ActivationKind::Tanh,
                    CrossoverKind::Arithmetic,
                    rng,
                );
                Individual::with_fitness(genome, 10.0 - f32::from(i) * 1.5)
            })
            .collect();
        GenerationState {
            generation: 7,
            params,
            population,
            fitness_history: vec![1.0, 4.5, 10.0],
            is_evaluated: true,
        }
    }

    #[test]
    fn test_state_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/dir/generation.json");
        let state = state(&mut Pcg32::seed_from_u64(0));

        state.save(&path).unwrap();
        let loaded = GenerationState::load(&path).unwrap();

        assert_eq!(loaded, state);
        assert_eq!(loaded.generation, 7);
        assert_eq!(loaded.population[0].genome(), state.population[0].genome());
    }

    #[test]
    fn test_mismatched_architecture_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.json");
        let mut state = state(&mut Pcg32::seed_from_u64(1));
        state.params.architecture.nodes_per_layer = 5;
        state.save(&path).unwrap();

        let err = GenerationState::load(&path).unwrap_err();
        assert!(
            matches!(
                err,
                CheckpointError::ArchitectureMismatch {
                    expected: Architecture {
                        nodes_per_layer: 5,
                        ..
                    },
                    found: Architecture {
                        nodes_per_layer: 3,
                        ..
                    },
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn test_odd_population_is_rejected() {
        let mut state = state(&mut Pcg32::seed_from_u64(2));
        state.population.pop();
        assert!(matches!(
            state.validate(),
            Err(CheckpointError::InvalidPopulation { len: 3 })
        ));
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        let err = GenerationState::load(&path).unwrap_err();
        assert!(matches!(err, CheckpointError::Io { .. }));
        assert!(err.to_string().contains("absent.json"));
    }

    #[test]
    fn test_widened_layer_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("generation.json");
        let state = state(&mut Pcg32::seed_from_u64(4));
        state.save(&path).unwrap();

        // Give individual 1 an 8-row input layer with matching data.
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let first = &mut json["population"][1]["genome"]["weights"][0];
        first["rows"] = 8.into();
        first["data"] = serde_json::Value::from(vec![0.5_f32; 8 * 3]);
        fs::write(&path, json.to_string()).unwrap();

        let err = GenerationState::load(&path).unwrap_err();
        assert!(
            matches!(
                err,
                CheckpointError::ShapeMismatch {
                    individual: 1,
                    source: ShapeError::Weights {
                        layer: 0,
                        expected: (7, 3),
                        found: (8, 3),
                    },
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn test_truncated_export_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creature.json");
        let state = state(&mut Pcg32::seed_from_u64(5));
        GenomeExport::new(&state.population[0], state.generation)
            .save(&path)
            .unwrap();

        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        json["genome"]["weights"][0]["data"]
            .as_array_mut()
            .unwrap()
            .truncate(3);
        fs::write(&path, json.to_string()).unwrap();

        let err = GenomeExport::load(&path).unwrap_err();
        assert!(
            matches!(
                err,
                CheckpointError::ShapeMismatch {
                    source: ShapeError::WeightData { len: 3, .. },
                    ..
                }
            ),
            "{err}"
        );
    }

    #[test]
    fn test_genome_export_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("creature.json");
        let state = state(&mut Pcg32::seed_from_u64(3));
        let export = GenomeExport::new(&state.population[0], state.generation);

        export.save(&path).unwrap();
        let loaded = GenomeExport::load(&path).unwrap();
        assert_eq!(loaded, export);
        assert!((loaded.fitness - 10.0).abs() < f32::EPSILON);
    }
}
