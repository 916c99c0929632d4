//! A Generation is one step of an evolutionary run:
//! a set of groups (species) of genomes that are
//! evaluated, and then bred into the next generation.
mod config;
mod errors;
mod group;
pub mod logging;
mod offspring_factory;

pub use config::{GenerationConfig, ParentSelection, StalenessConfig};
pub use errors::{ConfigError, GenerationError};
pub(crate) use group::compare_fitness;
pub use group::{Group, GroupId};
use offspring_factory::OffspringFactory;

use crate::{FitnessEvaluator, Genome, GenomeRef, Phenotype};

use rand::Rng;
use tracing::{debug, info};

use std::collections::BTreeMap;
use std::sync::Arc;

/// The stages a generation goes through, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Stage {
    Created,
    PhenotypesBuilt,
    Evaluated,
    FitnessAdjusted,
    OffspringApportioned,
    /// Terminal. The successor has been produced.
    NextGenerationProduced,
}

/// A population of genomes, grouped by compatibility.
///
/// A generation is advanced by [`create_new_generation`],
/// which evaluates every genome, then returns a fresh
/// `Generation` holding their offspring. The old generation's
/// groups are left as they were, so it can still be inspected
/// (and logged) afterwards.
///
/// [`create_new_generation`]: Generation::create_new_generation
pub struct Generation<G: Genome> {
    id: usize,
    groups: BTreeMap<GroupId, Group<G>>,
    genetic_config: G::Config,
    config: GenerationConfig,
    history: Arc<G::InnovationHistory>,
    next_group_id: usize,
    stage: Stage,
}

impl<G: Genome> Generation<G> {
    /// Creates the first generation of a run. Each inner
    /// vector of `seed` becomes its own group; empty
    /// vectors are ignored.
    ///
    /// # Errors
    /// Returns an error if either configuration is
    /// invalid or the seed holds no genomes.
    ///
    /// # Examples
    /// ```
    /// use neatris::{Generation, GenerationConfig};
    /// use neatris_nn::genomics::{GeneticConfig, InnovationCounter, NetworkGenome};
    /// use std::sync::Arc;
    ///
    /// let history = Arc::new(InnovationCounter::new());
    /// let seed = vec![
    ///     NetworkGenome::new(&[(1, 2, 0.5, true)], 1, 1, &history).unwrap(),
    ///     NetworkGenome::new(&[(1, 2, -0.5, true)], 1, 1, &history).unwrap(),
    /// ];
    /// let config = GenerationConfig {
    ///     population_size: 10,
    ///     compatibility_threshold: 3.0,
    ///     r_factor: 0.5,
    ///     ..GenerationConfig::zero()
    /// };
    ///
    /// let generation =
    ///     Generation::new(vec![seed], GeneticConfig::zero(), config, history).unwrap();
    /// assert_eq!(generation.id(), 0);
    /// assert_eq!(generation.len(), 2);
    /// ```
    pub fn new(
        seed: Vec<Vec<G>>,
        genetic_config: G::Config,
        config: GenerationConfig,
        history: Arc<G::InnovationHistory>,
    ) -> Result<Generation<G>, ConfigError> {
        config.validate()?;
        G::validate_config(&genetic_config)?;

        let groups: BTreeMap<GroupId, Group<G>> = seed
            .into_iter()
            .filter(|genomes| !genomes.is_empty())
            .enumerate()
            .map(|(i, genomes)| {
                let mut group = Group::new(GroupId(i));
                for genome in genomes {
                    group.add_genome(genome);
                }
                (GroupId(i), group)
            })
            .collect();
        if groups.is_empty() {
            return Err(ConfigError::EmptyPopulation);
        }

        Ok(Generation {
            id: 0,
            next_group_id: groups.len(),
            groups,
            genetic_config,
            config,
            history,
            stage: Stage::Created,
        })
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn genetic_config(&self) -> &G::Config {
        &self.genetic_config
    }

    /// Returns the innovation history shared by the run.
    pub fn history(&self) -> &Arc<G::InnovationHistory> {
        &self.history
    }

    /// Returns an iterator over the groups, by ascending id.
    pub fn groups(&self) -> impl Iterator<Item = &Group<G>> {
        self.groups.values()
    }

    pub fn group(&self, id: GroupId) -> Option<&Group<G>> {
        self.groups.get(&id)
    }

    pub fn genome(&self, genome: GenomeRef) -> Option<&G> {
        self.groups.get(&genome.group)?.genome(genome.member)
    }

    /// Returns an iterator over all genomes, group by group.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.groups.values().flat_map(|g| g.genomes())
    }

    /// Total number of genomes.
    pub fn len(&self) -> usize {
        self.groups.values().map(Group::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the genome with the highest raw fitness.
    pub fn champion(&self) -> Option<&G> {
        self.genomes()
            .max_by(|a, b| compare_fitness(a.fitness(), b.fitness()))
    }

    /// Builds one phenotype per genome, in group order.
    pub fn create_phenotypes(
        &mut self,
    ) -> Result<Vec<Phenotype<G::Phenotype>>, GenerationError<G::Error>> {
        self.ensure_not_advanced()?;
        let phenotypes = self
            .groups
            .values()
            .flat_map(|group| {
                group.genomes().iter().enumerate().map(move |(member, genome)| {
                    Phenotype::new(
                        genome.express(),
                        GenomeRef {
                            group: group.id(),
                            member,
                        },
                    )
                })
            })
            .collect();
        self.stage = Stage::PhenotypesBuilt;
        Ok(phenotypes)
    }

    /// Hands the phenotypes to the evaluator, blocking
    /// until it has scored all of them.
    pub fn run_phenotypes<E>(
        &mut self,
        phenotypes: &mut [Phenotype<G::Phenotype>],
        evaluator: &mut E,
    ) -> Result<(), GenerationError<G::Error>>
    where
        E: FitnessEvaluator<G::Phenotype> + ?Sized,
    {
        self.ensure_not_advanced()?;
        evaluator.evaluate(phenotypes);
        self.stage = Stage::Evaluated;
        Ok(())
    }

    /// Writes every phenotype's score onto its genome.
    ///
    /// # Errors
    /// Fails if the phenotypes don't cover the whole
    /// generation, one of them has no score, or one refers
    /// to a genome that doesn't exist.
    pub fn update_genomes_fitness_scores<E>(
        &mut self,
        phenotypes: &[Phenotype<G::Phenotype>],
        evaluator: &E,
    ) -> Result<(), GenerationError<G::Error>>
    where
        E: FitnessEvaluator<G::Phenotype> + ?Sized,
    {
        self.ensure_not_advanced()?;
        let expected = self.len();
        if phenotypes.len() != expected {
            return Err(GenerationError::FitnessCount {
                expected,
                found: phenotypes.len(),
            });
        }
        for phenotype in phenotypes {
            let genome_ref = phenotype.genome();
            let fitness = evaluator
                .read_fitness(phenotype)
                .ok_or(GenerationError::MissingFitness(genome_ref))?;
            self.groups
                .get_mut(&genome_ref.group)
                .and_then(|group| group.genome_mut(genome_ref.member))
                .ok_or(GenerationError::UnknownGenome(genome_ref))?
                .set_fitness(fitness);
        }
        Ok(())
    }

    /// Applies fitness sharing within every group.
    pub fn adjust_genomes_fitness_scores(&mut self) -> Result<(), GenerationError<G::Error>> {
        self.ensure_not_advanced()?;
        for group in self.groups.values_mut() {
            group.adjust_genomes_fitness();
        }
        self.stage = Stage::FitnessAdjusted;
        Ok(())
    }

    /// Computes and returns every group's adjusted fitness.
    pub fn calculate_groups_adjusted_fitness_scores(
        &mut self,
    ) -> Result<BTreeMap<GroupId, f32>, GenerationError<G::Error>> {
        self.ensure_not_advanced()?;
        Ok(self
            .groups
            .values_mut()
            .map(|group| (group.id(), group.calculate_group_adjusted_fitness_score()))
            .collect())
    }

    /// Apportions the population across groups by adjusted
    /// fitness, after dropping stale groups if configured.
    /// Only groups with a positive quota are returned.
    ///
    /// # Errors
    /// Returns [`GenerationError::Extinct`] if no group
    /// is left with offspring.
    pub fn calculate_groups_offspring(
        &mut self,
    ) -> Result<BTreeMap<GroupId, usize>, GenerationError<G::Error>> {
        self.ensure_not_advanced()?;
        let mut scores: BTreeMap<GroupId, f32> = self
            .groups
            .values_mut()
            .map(|group| {
                let score = match group.group_adjusted_fitness() {
                    Some(score) => score,
                    None => group.calculate_group_adjusted_fitness_score(),
                };
                (group.id(), score)
            })
            .collect();

        for id in self.stale_groups(&scores) {
            info!(generation = self.id, group = id.0, "dropping stale group");
            scores.remove(&id);
        }

        let mut quotas = apportion_offspring(&scores, self.config.population_size);
        quotas.retain(|id, quota| {
            if *quota == 0 {
                debug!(generation = self.id, group = id.0, "group received no offspring");
            }
            *quota > 0
        });
        if quotas.is_empty() {
            return Err(GenerationError::Extinct(self.id));
        }
        self.stage = Stage::OffspringApportioned;
        Ok(quotas)
    }

    /// Breeds the allotted offspring into the next generation.
    pub fn produce_next_generation<R>(
        &mut self,
        quotas: &BTreeMap<GroupId, usize>,
        rng: &mut R,
    ) -> Result<Generation<G>, GenerationError<G::Error>>
    where
        G::Config: Clone,
        R: Rng + ?Sized,
    {
        self.ensure_not_advanced()?;
        let mut next_group_id = self.next_group_id;
        let groups = OffspringFactory::new(
            &self.groups,
            &self.history,
            &self.genetic_config,
            &self.config,
        )
        .generate_offspring(quotas, &mut next_group_id, rng)
        .map_err(GenerationError::Genome)?;
        if groups.is_empty() {
            return Err(GenerationError::Extinct(self.id));
        }

        self.stage = Stage::NextGenerationProduced;
        Ok(Generation {
            id: self.id + 1,
            groups,
            genetic_config: self.genetic_config.clone(),
            config: self.config.clone(),
            history: Arc::clone(&self.history),
            next_group_id,
            stage: Stage::Created,
        })
    }

    /// Runs the whole pipeline: builds and evaluates the
    /// phenotypes, shares fitness, apportions offspring and
    /// breeds them into a new generation.
    ///
    /// # Errors
    /// Fails if the generation was already advanced, the
    /// evaluator left a phenotype unscored, every group
    /// died out, or a genome operation failed.
    ///
    /// # Examples
    /// ```
    /// use neatris::{Generation, GenerationConfig, Stage};
    /// use neatris_nn::genomics::{GeneticConfig, InnovationCounter, NetworkGenome};
    /// use neatris_nn::networks::FeedForwardNetwork;
    /// use std::sync::Arc;
    ///
    /// let history = Arc::new(InnovationCounter::new());
    /// let seed: Vec<_> = (0..4)
    ///     .map(|i| NetworkGenome::new(&[(1, 2, i as f32, true)], 1, 1, &history).unwrap())
    ///     .collect();
    /// let config = GenerationConfig {
    ///     population_size: 4,
    ///     compatibility_threshold: 10.0,
    ///     r_factor: 0.5,
    ///     ..GenerationConfig::zero()
    /// };
    /// let mut generation =
    ///     Generation::new(vec![seed], GeneticConfig::zero(), config, history).unwrap();
    ///
    /// let mut evaluator = |network: &mut FeedForwardNetwork| network.forward(&[1.0]).unwrap()[0];
    /// let next = generation
    ///     .create_new_generation(&mut evaluator, &mut rand::thread_rng())
    ///     .unwrap();
    ///
    /// assert_eq!(generation.stage(), Stage::NextGenerationProduced);
    /// assert_eq!(next.id(), 1);
    /// assert_eq!(next.len(), 4);
    /// ```
    pub fn create_new_generation<E, R>(
        &mut self,
        evaluator: &mut E,
        rng: &mut R,
    ) -> Result<Generation<G>, GenerationError<G::Error>>
    where
        G::Config: Clone,
        E: FitnessEvaluator<G::Phenotype> + ?Sized,
        R: Rng + ?Sized,
    {
        self.ensure_not_advanced()?;
        let mut phenotypes = self.create_phenotypes()?;
        self.run_phenotypes(&mut phenotypes, evaluator)?;
        self.update_genomes_fitness_scores(&phenotypes, evaluator)?;
        drop(phenotypes);
        self.adjust_genomes_fitness_scores()?;
        self.calculate_groups_adjusted_fitness_scores()?;
        let quotas = self.calculate_groups_offspring()?;
        let next = self.produce_next_generation(&quotas, rng)?;

        info!(
            generation = self.id,
            groups = self.groups.len(),
            best_fitness = self.champion().and_then(|g| g.fitness()).unwrap_or(f32::NAN),
            next_groups = next.groups.len(),
            next_size = next.len(),
            "generation advanced"
        );
        Ok(next)
    }

    fn ensure_not_advanced(&self) -> Result<(), GenerationError<G::Error>> {
        if self.stage == Stage::NextGenerationProduced {
            Err(GenerationError::AlreadyAdvanced(self.id))
        } else {
            Ok(())
        }
    }

    /// Returns the ids of groups to drop for staleness.
    /// The best scoring group is always kept.
    fn stale_groups(&self, scores: &BTreeMap<GroupId, f32>) -> Vec<GroupId> {
        let staleness = match &self.config.staleness {
            Some(staleness) => staleness,
            None => return vec![],
        };
        if self.id < staleness.min_generation || scores.len() < staleness.min_groups {
            return vec![];
        }
        let best = scores
            .iter()
            .max_by(|a, b| compare_fitness(Some(*a.1), Some(*b.1)))
            .map(|(id, _)| *id);
        self.groups
            .values()
            .filter(|group| Some(group.id()) != best && scores.contains_key(&group.id()))
            .filter(|group| group.is_stale(staleness))
            .map(Group::id)
            .collect()
    }
}

/// Splits `population_size` among groups in proportion to
/// their adjusted fitness, rounding each share.
///
/// If the total is not positive every group gets nothing,
/// and negative scores are never given offspring.
///
/// # Examples
/// ```
/// use neatris::{apportion_offspring, GroupId};
/// use std::collections::BTreeMap;
///
/// let scores: BTreeMap<_, _> = vec![(GroupId(0), 16.0), (GroupId(1), 9.0)].into_iter().collect();
/// let quotas = apportion_offspring(&scores, 100);
///
/// assert_eq!(quotas[&GroupId(0)], 64);
/// assert_eq!(quotas[&GroupId(1)], 36);
/// ```
pub fn apportion_offspring(
    scores: &BTreeMap<GroupId, f32>,
    population_size: usize,
) -> BTreeMap<GroupId, usize> {
    let total: f32 = scores.values().sum();
    scores
        .iter()
        .map(|(id, score)| {
            let share = if total > 0.0 { score / total } else { 0.0 };
            let quota = (share * population_size as f32).round().max(0.0) as usize;
            (*id, quota)
        })
        .collect()
}
