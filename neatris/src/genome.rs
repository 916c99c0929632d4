use crate::ConfigError;

use rand::Rng;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// crossover alignment and compatibility distance.
pub type Innovation = usize;

/// An interface for genomes that can be evolved by a [`Generation`].
///
/// [`Generation`]: crate::Generation
pub trait Genome: Sized {
    /// Coefficients steering mutation and compatibility distance.
    type Config;
    /// Source of fresh innovation numbers, shared by every
    /// generation of a run.
    type InnovationHistory: InnovationHistory;
    /// The evaluable network built from a genome.
    type Phenotype;
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the compatibility distance between two genomes.
    fn compatibility_distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Combines two parents into a brand-new child genome.
    /// Neither parent is modified.
    fn reproduce<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        rng: &mut R,
    ) -> Result<Self, Self::Error>;

    /// Mutates the genome in place. Finding nothing to mutate
    /// is not an error.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Builds the genome's phenotype.
    fn express(&self) -> Self::Phenotype;

    /// Returns the raw fitness, if it has been evaluated.
    fn fitness(&self) -> Option<f32>;

    fn set_fitness(&mut self, fitness: f32);

    /// Returns the fitness after fitness sharing, if computed.
    fn adjusted_fitness(&self) -> Option<f32>;

    fn set_adjusted_fitness(&mut self, adjusted_fitness: f32);

    /// Checks the genetic configuration before a run starts.
    fn validate_config(_config: &Self::Config) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// An Innovation History hands out the innovation numbers
/// used to recognise the same historical mutation across
/// different genomes.
///
/// Implementations must be safe to share between threads,
/// as mutation may run concurrently across groups.
pub trait InnovationHistory: Send + Sync {
    /// Returns a fresh, never before issued, innovation number.
    fn next_innovation(&self) -> Innovation;
}
