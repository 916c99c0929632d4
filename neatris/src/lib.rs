//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! The crate holds the generic half of the algorithm: groups (species),
//! fitness sharing, offspring apportionment and the generation-to-generation
//! pipeline. Genomes are user-defined via the [`Genome`] trait. A
//! neural-network genome, as in the original algorithm, is supplied by
//! the `neatris-nn` crate.
//!
//! Fitness is computed by a [`FitnessEvaluator`], which receives every
//! phenotype of a generation at once and is free to evaluate them in
//! parallel (see [`ParallelEvaluator`]).
//!
//! # Example usage: Evolution of XOR function approximator, using `neatris-nn`
//! ```
//! use neatris::{Generation, GenerationConfig, ParallelEvaluator};
//! use neatris_nn::{
//!     genomics::{
//!         CompatibilityCoefficients, GeneticConfig, InnovationCounter, MutationCoefficients,
//!         NetworkGenome,
//!     },
//!     networks::FeedForwardNetwork,
//! };
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use std::sync::Arc;
//!
//! fn evaluate_xor(network: &mut FeedForwardNetwork) -> f32 {
//!     let cases = [
//!         ([1.0, 0.0, 0.0], 0.0),
//!         ([1.0, 0.0, 1.0], 1.0),
//!         ([1.0, 1.0, 0.0], 1.0),
//!         ([1.0, 1.0, 1.0], 0.0),
//!     ];
//!     let error: f32 = cases
//!         .iter()
//!         .map(|(input, output)| (network.forward(input).unwrap()[0] - output).abs())
//!         .sum();
//!     (4.0 - error).powi(2)
//! }
//!
//! let genetic_config = GeneticConfig {
//!     mutation_coefficients: MutationCoefficients {
//!         add_connection: 0.5,
//!         split_connection: 0.2,
//!         change_weight: 0.8,
//!         new_connection_abs_max_weight: 2.0,
//!         max_weight_mutation: 0.5,
//!     },
//!     compatibility_coefficients: CompatibilityCoefficients {
//!         excess_factor: 1.0,
//!         disjoint_factor: 1.0,
//!         weight_difference_factor: 2.0,
//!     },
//! };
//! let config = GenerationConfig {
//!     population_size: 50,
//!     compatibility_threshold: 3.0,
//!     r_factor: 0.3,
//!     ..GenerationConfig::zero()
//! };
//!
//! // Every seed genome shares the same three innovations.
//! let connections = [(1, 4, 0.0, true, 0), (2, 4, 0.0, true, 1), (3, 4, 0.0, true, 2)];
//! let seed: Vec<_> = (0..50)
//!     .map(|_| NetworkGenome::with_innovations(&connections, 3, 1).unwrap())
//!     .collect();
//! let history = Arc::new(InnovationCounter::starting_at(3));
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(2002);
//! let mut evaluator = ParallelEvaluator::new(evaluate_xor);
//! let mut generation = Generation::new(vec![seed], genetic_config, config, history).unwrap();
//! for _ in 0..10 {
//!     match generation.create_new_generation(&mut evaluator, &mut rng) {
//!         Ok(next) => generation = next,
//!         Err(e) => {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//! }
//! ```

mod evaluation;
mod generations;
mod genome;
#[cfg(test)]
mod mock;

pub use evaluation::*;
pub use generations::*;
pub use genome::*;
