use super::{ParentSelection, StalenessConfig};
use crate::Genome;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

/// Group (species) identifier, unique within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(pub usize);

/// Groups are collections of reproductively compatible
/// genomes, sharing a fitness-normalization pool.
///
/// Membership is decided by comparing a genome
/// against a _representative_: a uniformly random
/// member, drawn anew every time one is needed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group<G> {
    id: GroupId,
    genomes: Vec<G>,
    group_adjusted_fitness: Option<f32>,
    fitness_history: Vec<f32>,
}

impl<G: Genome> Group<G> {
    /// Creates an empty group.
    pub fn new(id: GroupId) -> Group<G> {
        Group {
            id,
            genomes: vec![],
            group_adjusted_fitness: None,
            fitness_history: vec![],
        }
    }

    /// Creates a group holding only its founding member.
    pub fn with_founder(id: GroupId, founder: G) -> Group<G> {
        let mut group = Group::new(id);
        group.add_genome(founder);
        group
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn add_genome(&mut self, genome: G) {
        self.genomes.push(genome);
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// Returns the group's members, in insertion order.
    pub fn genomes(&self) -> &[G] {
        &self.genomes
    }

    pub fn genome(&self, member: usize) -> Option<&G> {
        self.genomes.get(member)
    }

    pub(crate) fn genome_mut(&mut self, member: usize) -> Option<&mut G> {
        self.genomes.get_mut(member)
    }

    /// Applies fitness sharing: every member's adjusted
    /// fitness becomes its raw fitness divided by the
    /// group's size. Unevaluated members count as 0.
    ///
    /// # Examples
    /// ```
    /// # use neatris::{Genome, Group, GroupId};
    /// # use neatris_nn::genomics::NetworkGenome;
    /// let mut group = Group::new(GroupId(0));
    /// for fitness in [2.0, 6.0] {
    ///     let mut genome = NetworkGenome::empty(1, 1);
    ///     genome.set_fitness(fitness);
    ///     group.add_genome(genome);
    /// }
    ///
    /// group.adjust_genomes_fitness();
    /// let adjusted: Vec<_> = group.genomes().iter().map(|g| g.adjusted_fitness()).collect();
    /// assert_eq!(adjusted, vec![Some(1.0), Some(3.0)]);
    /// ```
    pub fn adjust_genomes_fitness(&mut self) {
        let size = self.genomes.len() as f32;
        for genome in &mut self.genomes {
            let fitness = genome.fitness().unwrap_or(0.0);
            genome.set_adjusted_fitness(fitness / size);
        }
    }

    /// Sums the members' adjusted fitness, storing
    /// and returning the result.
    pub fn calculate_group_adjusted_fitness_score(&mut self) -> f32 {
        let score = self
            .genomes
            .iter()
            .map(|g| g.adjusted_fitness().unwrap_or(0.0))
            .sum();
        self.group_adjusted_fitness = Some(score);
        score
    }

    /// Returns the last computed group adjusted fitness.
    pub fn group_adjusted_fitness(&self) -> Option<f32> {
        self.group_adjusted_fitness
    }

    /// Group adjusted fitness of previous generations, oldest first.
    pub fn fitness_history(&self) -> &[f32] {
        &self.fitness_history
    }

    /// Returns the breeding pool: the best members
    /// by adjusted fitness, best first. Members with
    /// equal scores keep their relative order.
    pub fn get_parents(&self, r: f32, selection: ParentSelection) -> Vec<&G> {
        let n = self.genomes.len();
        let scaled = r * n as f32;
        let count = match selection {
            ParentSelection::AtLeastTwo => (scaled.ceil() as usize).max(2),
            ParentSelection::Rounded => scaled.round() as usize,
        }
        .min(n);

        let mut ranked: Vec<&G> = self.genomes.iter().collect();
        ranked.sort_by(|a, b| {
            let (a, b) = (
                a.adjusted_fitness().unwrap_or(0.0),
                b.adjusted_fitness().unwrap_or(0.0),
            );
            b.partial_cmp(&a).unwrap_or(Ordering::Equal)
        });
        ranked.truncate(count);
        ranked
    }

    /// Picks a uniformly random member.
    pub fn get_representative<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&G> {
        self.genomes.choose(rng)
    }

    /// Returns the member with the highest raw fitness.
    pub fn champion(&self) -> Option<&G> {
        self.genomes
            .iter()
            .max_by(|a, b| compare_fitness(a.fitness(), b.fitness()))
    }

    /// Returns whether the group adjusted fitness has
    /// changed by less than the configured tolerance
    /// since `generations_back` generations ago.
    ///
    /// Groups without enough history, or whose
    /// current score hasn't been computed, are never stale.
    pub fn is_stale(&self, config: &StalenessConfig) -> bool {
        let current = match self.group_adjusted_fitness {
            Some(current) => current,
            None => return false,
        };
        let len = self.fitness_history.len();
        if config.generations_back == 0 || len < config.generations_back {
            return false;
        }
        let past = self.fitness_history[len - config.generations_back];
        if past == 0.0 {
            return current == 0.0;
        }
        ((current - past) / past).abs() < config.relative_tolerance
    }

    /// Returns an empty group with the same id,
    /// carrying this group's fitness history forward.
    pub(crate) fn successor(&self) -> Group<G> {
        let mut fitness_history = self.fitness_history.clone();
        if let Some(score) = self.group_adjusted_fitness {
            fitness_history.push(score);
        }
        Group {
            id: self.id,
            genomes: vec![],
            group_adjusted_fitness: None,
            fitness_history,
        }
    }
}

/// Orders optional fitness values, an unset
/// value ranking below any set one.
pub(crate) fn compare_fitness(a: Option<f32>, b: Option<f32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::Scalar;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn group_of(fitnesses: &[f32]) -> Group<Scalar> {
        let mut group = Group::new(GroupId(3));
        for (i, fitness) in fitnesses.iter().enumerate() {
            group.add_genome(Scalar::with_fitness(i as f32 + 1.0, *fitness));
        }
        group
    }

    fn staleness(generations_back: usize) -> StalenessConfig {
        StalenessConfig {
            generations_back,
            min_generation: 0,
            min_groups: 0,
            relative_tolerance: 0.05,
        }
    }

    #[test]
    fn fitness_sharing() {
        let mut group = group_of(&[2.0, 0.0, 22.0, 13.0, 2.0, 6.0, 8.0]);
        group.adjust_genomes_fitness();

        let expected = [2.0, 0.0, 22.0, 13.0, 2.0, 6.0, 8.0].map(|f: f32| f / 7.0);
        for (genome, expected) in group.genomes().iter().zip(expected) {
            assert!((genome.adjusted_fitness().unwrap() - expected).abs() < 1e-6);
        }

        let score = group.calculate_group_adjusted_fitness_score();
        assert!((score - 7.57143).abs() < 1e-4);
        assert_eq!(group.group_adjusted_fitness(), Some(score));
    }

    #[test]
    fn unevaluated_members_share_nothing() {
        let mut group = group_of(&[4.0]);
        group.add_genome(Scalar::new(9.0));
        group.adjust_genomes_fitness();
        assert_eq!(group.genomes()[1].adjusted_fitness(), Some(0.0));
        assert_eq!(group.calculate_group_adjusted_fitness_score(), 2.0);
    }

    #[test]
    fn parents_are_the_best_members() {
        let mut group = group_of(&[2.0, 0.0, 22.0, 13.0, 2.0, 6.0, 8.0]);
        group.adjust_genomes_fitness();

        let parents: Vec<f32> = group
            .get_parents(0.3, ParentSelection::AtLeastTwo)
            .iter()
            .map(|g| g.value)
            .collect();
        assert_eq!(parents, vec![3.0, 4.0, 7.0]);

        // round(0.3 * 7) = 2
        assert_eq!(group.get_parents(0.3, ParentSelection::Rounded).len(), 2);
    }

    #[test]
    fn parent_pool_floor_and_cap() {
        let mut group = group_of(&[1.0, 5.0, 3.0, 2.0]);
        group.adjust_genomes_fitness();
        assert_eq!(group.get_parents(0.1, ParentSelection::AtLeastTwo).len(), 2);
        assert_eq!(group.get_parents(0.1, ParentSelection::Rounded).len(), 0);

        let mut lonely = group_of(&[1.0]);
        lonely.adjust_genomes_fitness();
        assert_eq!(lonely.get_parents(0.5, ParentSelection::AtLeastTwo).len(), 1);
    }

    #[test]
    fn representative_is_a_member() {
        let group = group_of(&[1.0, 2.0, 3.0]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let representative = group.get_representative(&mut rng).unwrap();
            assert!(group.genomes().contains(representative));
        }
        assert!(Group::<Scalar>::new(GroupId(0))
            .get_representative(&mut rng)
            .is_none());
    }

    #[test]
    fn champion_prefers_evaluated_members() {
        let mut group = group_of(&[1.0, 5.0, 3.0]);
        group.add_genome(Scalar::new(10.0));
        assert_eq!(group.champion().unwrap().value, 2.0);
    }

    #[test]
    fn staleness_compares_against_the_past() {
        let mut group = group_of(&[10.0]);
        group.adjust_genomes_fitness();
        group.calculate_group_adjusted_fitness_score();

        let mut next = group.successor();
        assert_eq!(next.fitness_history(), &[10.0]);
        next.add_genome(Scalar::with_fitness(1.0, 10.2));
        next.adjust_genomes_fitness();
        next.calculate_group_adjusted_fitness_score();

        assert!(next.is_stale(&staleness(1)));
        assert!(!next.is_stale(&staleness(2)));

        let mut improved = group.successor();
        improved.add_genome(Scalar::with_fitness(1.0, 20.0));
        improved.adjust_genomes_fitness();
        improved.calculate_group_adjusted_fitness_score();
        assert!(!improved.is_stale(&staleness(1)));
    }

    #[test]
    fn zero_past_is_stale_only_when_still_zero() {
        let mut group = group_of(&[0.0]);
        group.adjust_genomes_fitness();
        group.calculate_group_adjusted_fitness_score();

        let mut still_zero = group.successor();
        still_zero.add_genome(Scalar::with_fitness(1.0, 0.0));
        still_zero.adjust_genomes_fitness();
        still_zero.calculate_group_adjusted_fitness_score();
        assert!(still_zero.is_stale(&staleness(1)));

        let mut woke_up = group.successor();
        woke_up.add_genome(Scalar::with_fitness(1.0, 0.5));
        woke_up.adjust_genomes_fitness();
        woke_up.calculate_group_adjusted_fitness_score();
        assert!(!woke_up.is_stale(&staleness(1)));
    }

    #[test]
    fn fitness_ordering() {
        assert_eq!(compare_fitness(None, Some(-1.0)), Ordering::Less);
        assert_eq!(compare_fitness(Some(2.0), Some(1.0)), Ordering::Greater);
        assert_eq!(compare_fitness(None, None), Ordering::Equal);
    }
}
