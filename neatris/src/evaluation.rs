//! The fitness-evaluation boundary.
//!
//! A [`Generation`] hands every phenotype it builds to a
//! [`FitnessEvaluator`], then reads one fitness score back per
//! phenotype and writes it onto the owning genome.
//!
//! [`Generation`]: crate::Generation
use crate::GroupId;

use rayon::prelude::*;
use tracing::warn;

use std::time::{Duration, Instant};

/// Locates a genome within a generation: the group
/// it belongs to and its position among the members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GenomeRef {
    pub group: GroupId,
    pub member: usize,
}

/// A network under evaluation, along with a reference
/// back to the genome it was built from and a slot
/// for its fitness score.
#[derive(Debug, Clone)]
pub struct Phenotype<N> {
    network: N,
    genome: GenomeRef,
    fitness: Option<f32>,
}

impl<N> Phenotype<N> {
    pub fn new(network: N, genome: GenomeRef) -> Phenotype<N> {
        Phenotype {
            network,
            genome,
            fitness: None,
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut N {
        &mut self.network
    }

    /// Returns the reference to the owning genome.
    pub fn genome(&self) -> GenomeRef {
        self.genome
    }

    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }
}

/// The capability a generation needs from whatever runs
/// its phenotypes (a game, a test bench, a pool of workers).
///
/// `evaluate` must leave a fitness score for every phenotype
/// before it returns; `read_fitness` retrieves it.
pub trait FitnessEvaluator<N> {
    fn evaluate(&mut self, phenotypes: &mut [Phenotype<N>]);

    fn read_fitness(&self, phenotype: &Phenotype<N>) -> Option<f32> {
        phenotype.fitness()
    }
}

/// Any closure scoring a single network is a sequential evaluator.
///
/// # Examples
/// ```
/// use neatris::{FitnessEvaluator, GenomeRef, GroupId, Phenotype};
///
/// let mut phenotypes = vec![
///     Phenotype::new(2.0_f32, GenomeRef { group: GroupId(0), member: 0 }),
///     Phenotype::new(5.0_f32, GenomeRef { group: GroupId(0), member: 1 }),
/// ];
///
/// let mut evaluator = |network: &mut f32| *network * 10.0;
/// evaluator.evaluate(&mut phenotypes);
///
/// assert_eq!(phenotypes[0].fitness(), Some(20.0));
/// assert_eq!(phenotypes[1].fitness(), Some(50.0));
/// ```
impl<N, F> FitnessEvaluator<N> for F
where
    F: FnMut(&mut N) -> f32,
{
    fn evaluate(&mut self, phenotypes: &mut [Phenotype<N>]) {
        for phenotype in phenotypes {
            let fitness = self(&mut phenotype.network);
            phenotype.set_fitness(fitness);
        }
    }
}

/// Evaluates every phenotype as its own rayon task.
///
/// Each task owns its phenotype exclusively and writes only that
/// phenotype's fitness slot.
///
/// The time limit is not a deadline: every evaluation runs to
/// completion, and one whose duration exceeded the limit is then
/// scored with `timeout_fitness` instead of its result. An evaluation
/// that never returns blocks the generation.
pub struct ParallelEvaluator<F> {
    function: F,
    time_limit: Option<Duration>,
    timeout_fitness: f32,
}

impl<F> ParallelEvaluator<F> {
    /// Creates an evaluator without a time limit.
    pub fn new(function: F) -> ParallelEvaluator<F> {
        ParallelEvaluator {
            function,
            time_limit: None,
            timeout_fitness: 0.0,
        }
    }

    /// Sets the per-phenotype time limit and the score given to
    /// phenotypes whose evaluation took longer. Overruns are
    /// detected after the evaluation returns.
    ///
    /// `timeout_fitness` should be a small positive
    /// value rather than zero, so that groups made only
    /// of timed-out members don't zero out fitness sharing.
    pub fn with_time_limit(
        mut self,
        limit: Duration,
        timeout_fitness: f32,
    ) -> ParallelEvaluator<F> {
        self.time_limit = Some(limit);
        self.timeout_fitness = timeout_fitness;
        self
    }
}

impl<N, F> FitnessEvaluator<N> for ParallelEvaluator<F>
where
    N: Send,
    F: Fn(&mut N) -> f32 + Sync,
{
    fn evaluate(&mut self, phenotypes: &mut [Phenotype<N>]) {
        let function = &self.function;
        let time_limit = self.time_limit;
        let timeout_fitness = self.timeout_fitness;

        phenotypes.par_iter_mut().for_each(|phenotype| {
            let started = Instant::now();
            let fitness = function(&mut phenotype.network);
            let fitness = match time_limit {
                Some(limit) if started.elapsed() > limit => {
                    warn!(
                        genome = ?phenotype.genome,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "phenotype evaluation exceeded its time limit"
                    );
                    timeout_fitness
                }
                _ => fitness,
            };
            phenotype.set_fitness(fitness);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phenotypes(values: &[f32]) -> Vec<Phenotype<f32>> {
        values
            .iter()
            .enumerate()
            .map(|(member, value)| {
                Phenotype::new(
                    *value,
                    GenomeRef {
                        group: GroupId(1),
                        member,
                    },
                )
            })
            .collect()
    }

    #[test]
    fn closure_evaluator_fills_every_slot() {
        let mut phenotypes = phenotypes(&[1.0, 2.0, 3.0]);
        let mut calls = 0;
        let mut evaluator = |network: &mut f32| {
            calls += 1;
            *network + 1.0
        };
        evaluator.evaluate(&mut phenotypes);

        assert_eq!(calls, 3);
        assert_eq!(
            phenotypes.iter().map(|p| p.fitness()).collect::<Vec<_>>(),
            vec![Some(2.0), Some(3.0), Some(4.0)]
        );
    }

    #[test]
    fn parallel_evaluator_keeps_index_ownership() {
        let mut phenotypes = phenotypes(&(0..64).map(|i| i as f32).collect::<Vec<_>>());
        let mut evaluator = ParallelEvaluator::new(|network: &mut f32| *network * 2.0);
        evaluator.evaluate(&mut phenotypes);

        for (i, phenotype) in phenotypes.iter().enumerate() {
            assert_eq!(phenotype.genome().member, i);
            assert_eq!(evaluator.read_fitness(phenotype), Some(i as f32 * 2.0));
        }
    }

    #[test]
    fn parallel_evaluator_scores_overruns_after_they_finish() {
        let mut phenotypes = phenotypes(&[0.0, 1.0]);
        let started = Instant::now();
        let mut evaluator = ParallelEvaluator::new(|network: &mut f32| {
            if *network > 0.5 {
                std::thread::sleep(Duration::from_millis(50));
            }
            100.0
        })
        .with_time_limit(Duration::from_millis(10), 0.01);
        evaluator.evaluate(&mut phenotypes);

        assert_eq!(phenotypes[0].fitness(), Some(100.0));
        assert_eq!(phenotypes[1].fitness(), Some(0.01));
        // The slow evaluation wasn't cut short.
        assert!(started.elapsed() >= Duration::from_millis(50));
    }
}
