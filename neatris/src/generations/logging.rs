use super::{Generation, GenerationConfig, GroupId};

use crate::genome::Genome;

use serde::Serialize;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Clones the entire generation.
    AllGenomes,
    /// Clones every group's champion.
    GroupChampions,
    /// Clones only the generation champion.
    GenerationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// Size and performance of a single group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupRecord {
    pub id: GroupId,
    pub size: usize,
    pub group_adjusted_fitness: Option<f32>,
}

/// A snapshot of a generation.
#[derive(Clone, Debug, Serialize)]
pub struct Log<G, C> {
    pub generation_number: usize,
    pub genetic_config: C,
    pub config: GenerationConfig,
    pub groups: Vec<GroupRecord>,
    pub generation_sample: GenerationMemberRecord<G>,
    /// Raw fitness statistics; `None` before evaluation.
    pub fitness: Option<Stats>,
}

impl<G, C> fmt::Display for Log<G, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tgroup_count: {:?}\n\
            \tfitness: {:?}\n\
            }}",
            &self.generation_number,
            &self.groups.len(),
            &self.fitness,
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if it is empty.
    ///
    /// # Examples
    /// ```
    /// use neatris::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied()).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return None;
        }
        data.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        })
    }
}

/// A reporting-level dependant store
/// of genomes from a generation.
#[derive(Clone, Debug, Serialize)]
pub enum GenerationMemberRecord<G> {
    /// Group IDs and their genomes.
    Groups(Vec<(GroupId, Vec<G>)>),
    /// Group IDs and group champions.
    GroupChampions(Vec<(GroupId, G)>),
    /// Only the generation champion.
    GenerationChampion(G),
    /// Empty.
    None,
}

/// A log of the evolution of a run over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G, C> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G, C>>,
}

impl<G, C> EvolutionLogger<G, C>
where
    G: Genome<Config = C> + Clone,
    C: Clone,
{
    /// Returns a logger with the appropiate reporting level.
    ///
    /// # Examples
    /// ```
    /// # use neatris_nn::genomics::{GeneticConfig, NetworkGenome as G};
    /// use neatris::logging::{EvolutionLogger, ReportingLevel};
    ///
    /// // With `G` a suitable type implementing `Genome`...
    /// let logger = EvolutionLogger::<G, GeneticConfig>::new(ReportingLevel::NoGenomes);
    /// assert!(logger.latest().is_none());
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G, C> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Stores a snapshot of a generation.
    ///
    /// Best taken after the generation has been evaluated,
    /// e.g. right after it produced its successor.
    pub fn log(&mut self, generation: &Generation<G>) {
        let groups = generation
            .groups()
            .map(|g| GroupRecord {
                id: g.id(),
                size: g.len(),
                group_adjusted_fitness: g.group_adjusted_fitness(),
            })
            .collect();
        let generation_sample = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Groups(
                generation
                    .groups()
                    .map(|g| (g.id(), g.genomes().to_vec()))
                    .collect(),
            ),
            ReportingLevel::GroupChampions => GenerationMemberRecord::GroupChampions(
                generation
                    .groups()
                    .filter_map(|g| g.champion().map(|c| (g.id(), c.clone())))
                    .collect(),
            ),
            ReportingLevel::GenerationChampion => match generation.champion() {
                Some(champion) => GenerationMemberRecord::GenerationChampion(champion.clone()),
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };

        self.logs.push(Log {
            generation_number: generation.id(),
            genetic_config: generation.genetic_config().clone(),
            config: generation.config().clone(),
            groups,
            generation_sample,
            fitness: Stats::from(generation.genomes().filter_map(|g| g.fitness())),
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log<G, C>> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn latest(&self) -> Option<&Log<G, C>> {
        self.logs.last()
    }
}
