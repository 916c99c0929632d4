use neatris::logging::{EvolutionLogger, ReportingLevel};
use neatris::{Generation, GenerationConfig, Genome, ParallelEvaluator};
use neatris_nn::genomics::{GeneticConfig, InnovatedConnection, InnovationCounter, NetworkGenome};
use neatris_nn::networks::FeedForwardNetwork;

use anyhow::{Context, Result};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use std::{env, fs};

const DEFAULT_CONFIG: &str = "xor/config.ron";

// Allowed error margin for neural net answers.
const ERROR_MARGIN: f32 = 0.3;

/// Everything a run needs, loaded from a RON file.
#[derive(Debug, Deserialize)]
struct RunConfig {
    generations: usize,
    seed: u64,
    /// Fitness at which the run stops early.
    target_fitness: f32,
    time_limit_ms: Option<u64>,
    timeout_fitness: f32,
    champion_path: PathBuf,
    genetic_config: GeneticConfig,
    generation_config: GenerationConfig,
}

fn evaluate_xor(network: &mut FeedForwardNetwork) -> f32 {
    let values = [
        ([1.0, 0.0, 0.0], 0.0),
        ([1.0, 0.0, 1.0], 1.0),
        ([1.0, 1.0, 0.0], 1.0),
        ([1.0, 1.0, 1.0], 0.0),
    ];

    let mut errors = [0.0; 4];
    for (error, (input, output)) in errors.iter_mut().zip(values.iter()) {
        *error = match network.forward(input) {
            Ok(y) => (y[0] - output).abs(),
            Err(_) => 1.0,
        };
        if *error < ERROR_MARGIN {
            *error = 0.0;
        }
    }

    (4.0 - errors.iter().sum::<f32>()).powf(2.0)
}

/// Bias and operands wired straight to the output,
/// with random weights and shared innovations 0 to 2.
fn seed_population<R: Rng>(size: usize, rng: &mut R) -> Result<Vec<NetworkGenome>> {
    (0..size)
        .map(|_| {
            let connections: Vec<InnovatedConnection> = (1..=3)
                .map(|source| (source, 4, rng.gen_range(-1.0..=1.0), true, source - 1))
                .collect();
            NetworkGenome::with_innovations(&connections, 3, 1).context("building seed genome")
        })
        .collect()
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG.to_owned());
    let text = fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
    let config: RunConfig = ron::from_str(&text).with_context(|| format!("parsing {}", path))?;

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let history = Arc::new(InnovationCounter::starting_at(3));
    let seed = seed_population(config.generation_config.population_size, &mut rng)?;
    let mut generation = Generation::new(
        vec![seed],
        config.genetic_config.clone(),
        config.generation_config.clone(),
        history,
    )?;

    let mut evaluator = ParallelEvaluator::new(evaluate_xor);
    if let Some(ms) = config.time_limit_ms {
        evaluator = evaluator.with_time_limit(Duration::from_millis(ms), config.timeout_fitness);
    }
    let mut logger = EvolutionLogger::new(ReportingLevel::GenerationChampion);
    let mut best: Option<NetworkGenome> = None;

    for _ in 0..config.generations {
        let next = generation.create_new_generation(&mut evaluator, &mut rng)?;
        logger.log(&generation);
        if let Some(log) = logger.latest() {
            info!("{}", log);
        }

        if let Some(champion) = generation.champion() {
            if best.as_ref().map_or(true, |b| b.fitness() < champion.fitness()) {
                best = Some(champion.clone());
            }
        }
        if best.as_ref().and_then(|b| b.fitness()) >= Some(config.target_fitness) {
            info!(generation = generation.id(), "target fitness reached");
            break;
        }
        generation = next;
    }

    let best = best.context("no generation was evaluated")?;
    info!(fitness = ?best.fitness(), genome = %best, "run champion");
    fs::write(&config.champion_path, best.to_json()?)
        .with_context(|| format!("writing {}", config.champion_path.display()))?;
    Ok(())
}
