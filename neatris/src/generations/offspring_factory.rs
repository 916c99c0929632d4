use super::{GenerationConfig, Group, GroupId};
use crate::Genome;

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use std::collections::BTreeMap;

/// Auxiliary type for offspring generation.
/// Breeds every surviving group's quota and sorts
/// the children into groups by compatibility.
pub(super) struct OffspringFactory<'a, G: Genome> {
    groups: &'a BTreeMap<GroupId, Group<G>>,
    history: &'a G::InnovationHistory,
    genetic_config: &'a G::Config,
    config: &'a GenerationConfig,
}

impl<'a, G: Genome> OffspringFactory<'a, G> {
    pub(super) fn new(
        groups: &'a BTreeMap<GroupId, Group<G>>,
        history: &'a G::InnovationHistory,
        genetic_config: &'a G::Config,
        config: &'a GenerationConfig,
    ) -> OffspringFactory<'a, G> {
        OffspringFactory {
            groups,
            history,
            genetic_config,
            config,
        }
    }

    /// Generates the allotted offspring of each group.
    ///
    /// Returns the next generation's non-empty groups: the
    /// successors of the surviving groups, then any groups
    /// founded along the way, whose ids are drawn from
    /// `next_group_id`.
    pub(super) fn generate_offspring<R: Rng + ?Sized>(
        &self,
        quotas: &BTreeMap<GroupId, usize>,
        next_group_id: &mut usize,
        rng: &mut R,
    ) -> Result<BTreeMap<GroupId, Group<G>>, G::Error> {
        let mut offspring: BTreeMap<GroupId, Group<G>> = quotas
            .keys()
            .filter_map(|id| self.groups.get(id))
            .map(|group| (group.id(), group.successor()))
            .collect();
        let mut founded: Vec<Group<G>> = vec![];

        for (id, quota) in quotas {
            let group = match self.groups.get(id) {
                Some(group) => group,
                None => continue,
            };
            let mut pool = group.get_parents(self.config.r_factor, self.config.parent_selection);
            if pool.is_empty() {
                // Too small a fraction to round up to one parent.
                pool.extend(group.champion());
            }
            if pool.is_empty() {
                continue;
            }

            for _ in 0..*quota {
                let child = self.breed(&pool, rng)?;
                self.assign(child, *id, quotas, &mut offspring, &mut founded, next_group_id, rng);
            }
        }

        offspring.retain(|_, group| !group.is_empty());
        offspring.extend(founded.into_iter().map(|group| (group.id(), group)));
        Ok(offspring)
    }

    /// Mates two parents drawn with replacement from the
    /// pool, then mutates the child.
    fn breed<R: Rng + ?Sized>(&self, pool: &[&G], rng: &mut R) -> Result<G, G::Error> {
        let parent1 = pool[rng.gen_range(0..pool.len())];
        let parent2 = pool[rng.gen_range(0..pool.len())];
        let mut child = G::reproduce(parent1, parent2, rng)?;
        child.mutate(self.history, self.genetic_config, rng);
        Ok(child)
    }

    /// Places a child in the first compatible group, trying in order:
    /// its parents' group, the other surviving groups, then groups
    /// founded earlier in this pass. Founds a new group otherwise.
    #[allow(clippy::too_many_arguments)]
    fn assign<R: Rng + ?Sized>(
        &self,
        child: G,
        origin: GroupId,
        quotas: &BTreeMap<GroupId, usize>,
        offspring: &mut BTreeMap<GroupId, Group<G>>,
        founded: &mut Vec<Group<G>>,
        next_group_id: &mut usize,
        rng: &mut R,
    ) {
        let surviving = std::iter::once(origin)
            .chain(quotas.keys().copied().filter(|id| *id != origin));
        for id in surviving {
            let compatible = self
                .groups
                .get(&id)
                .and_then(|group| group.get_representative(rng))
                .map_or(false, |representative| self.is_compatible(&child, representative));
            if compatible {
                if let Some(group) = offspring.get_mut(&id) {
                    group.add_genome(child);
                    return;
                }
            }
        }

        for group in founded.iter_mut() {
            let compatible = group
                .get_representative(rng)
                .map_or(false, |representative| self.is_compatible(&child, representative));
            if compatible {
                group.add_genome(child);
                return;
            }
        }

        let id = GroupId(*next_group_id);
        *next_group_id += 1;
        debug!(group = id.0, parents_group = origin.0, "founded new group");
        founded.push(Group::with_founder(id, child));
    }

    fn is_compatible(&self, genome: &G, representative: &G) -> bool {
        G::compatibility_distance(genome, representative, self.genetic_config)
            < self.config.compatibility_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{Counter, Scalar};
    use crate::ParentSelection;

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(compatibility_threshold: f32) -> GenerationConfig {
        GenerationConfig {
            population_size: 10,
            compatibility_threshold,
            r_factor: 1.0,
            ..GenerationConfig::zero()
        }
    }

    fn groups(members: &[(usize, &[f32])]) -> BTreeMap<GroupId, Group<Scalar>> {
        members
            .iter()
            .map(|(id, values)| {
                let mut group = Group::new(GroupId(*id));
                for value in values.iter() {
                    group.add_genome(Scalar::with_fitness(*value, 1.0));
                }
                group.adjust_genomes_fitness();
                group.calculate_group_adjusted_fitness_score();
                (GroupId(*id), group)
            })
            .collect()
    }

    #[test]
    fn offspring_stay_with_compatible_parents() {
        let groups = groups(&[(0, &[1.0, 1.0]), (1, &[50.0, 50.0])]);
        let config = config(0.5);
        let history = Counter::default();
        let quotas: BTreeMap<_, _> = [(GroupId(0), 4), (GroupId(1), 6)].into_iter().collect();
        let mut next_group_id = 2;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let offspring = OffspringFactory::new(&groups, &history, &0.0, &config)
            .generate_offspring(&quotas, &mut next_group_id, &mut rng)
            .unwrap();

        assert_eq!(offspring.len(), 2);
        assert_eq!(offspring[&GroupId(0)].len(), 4);
        assert_eq!(offspring[&GroupId(1)].len(), 6);
        assert_eq!(offspring[&GroupId(0)].fitness_history(), &[1.0]);
        assert_eq!(next_group_id, 2);
    }

    #[test]
    fn offspring_migrate_to_other_groups() {
        // Group 0 breeds children at 5.0, which only group 1 accepts.
        let groups = groups(&[(0, &[0.0, 10.0]), (1, &[5.0])]);
        let config = config(0.5);
        let history = Counter::default();
        let quotas: BTreeMap<_, _> = [(GroupId(0), 3), (GroupId(1), 0)].into_iter().collect();
        let mut next_group_id = 2;
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let offspring = OffspringFactory::new(&groups, &history, &0.0, &config)
            .generate_offspring(&quotas, &mut next_group_id, &mut rng)
            .unwrap();

        let total: usize = offspring.values().map(Group::len).sum();
        assert_eq!(total, 3);
        for group in offspring.values() {
            assert!(group.genomes().iter().all(|g| [0.0, 5.0, 10.0].contains(&g.value)));
        }
        // Mixed parents land in group 1; pure ones stay or found new groups.
        for child in offspring.get(&GroupId(1)).map(|g| g.genomes()).unwrap_or(&[]) {
            assert_eq!(child.value, 5.0);
        }
    }

    #[test]
    fn incompatible_offspring_found_shared_groups() {
        let groups = groups(&[(0, &[0.0])]);
        let config = config(0.5);
        let history = Counter::default();
        let quotas: BTreeMap<_, _> = [(GroupId(0), 5)].into_iter().collect();
        let mut next_group_id = 7;
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        // Every child mutates by exactly +-3 at most, away from 0.
        let offspring = OffspringFactory::new(&groups, &history, &3.0, &config)
            .generate_offspring(&quotas, &mut next_group_id, &mut rng)
            .unwrap();

        let total: usize = offspring.values().map(Group::len).sum();
        assert_eq!(total, 5);
        assert!(offspring.keys().all(|id| id.0 == 0 || id.0 >= 7));
        assert_eq!(next_group_id - 7, offspring.keys().filter(|id| id.0 >= 7).count());
    }

    #[test]
    fn rounded_pool_falls_back_to_champion() {
        let groups = groups(&[(0, &[2.0, 4.0, 6.0])]);
        let config = GenerationConfig {
            r_factor: 0.0,
            parent_selection: ParentSelection::Rounded,
            ..config(100.0)
        };
        let history = Counter::default();
        let quotas: BTreeMap<_, _> = [(GroupId(0), 2)].into_iter().collect();
        let mut next_group_id = 1;
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let offspring = OffspringFactory::new(&groups, &history, &0.0, &config)
            .generate_offspring(&quotas, &mut next_group_id, &mut rng)
            .unwrap();

        // Every child descends from the champion alone.
        let values: Vec<f32> = offspring[&GroupId(0)].genomes().iter().map(|g| g.value).collect();
        assert_eq!(values.len(), 2);
        assert_eq!(values[0], values[1]);
    }
}
