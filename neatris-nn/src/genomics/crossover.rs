use super::{
    CompatibilityCoefficients, ConnectionGene, NetworkGenome, NodeGene, NodeKind, ReproductionError,
};
use crate::Innovation;

use ahash::RandomState;
use rand::Rng;
use tracing::debug;

use std::collections::{BTreeSet, HashMap};

/// Genomes with fewer connections than this aren't
/// normalized by size in compatibility distance.
const SMALL_GENOME_CONNECTIONS: usize = 20;

type GeneIndex<'a> = HashMap<Innovation, &'a ConnectionGene, RandomState>;

fn index_genes(genome: &NetworkGenome) -> GeneIndex<'_> {
    genome.genes().map(|g| (g.innovation(), g)).collect()
}

impl NetworkGenome {
    /// Combines two parents into a new genome, aligning their
    /// connection genes by innovation number.
    ///
    /// The child takes its input and output nodes from the fitter
    /// parent (the first one on a tie), connected or not.
    ///
    /// If the parents are equally fit, the child inherits every
    /// innovation from either parent. Otherwise it inherits only
    /// the fitter parent's innovations. Innovations present in
    /// both parents are taken from either at random, with their
    /// weight and enabled state unchanged.
    ///
    /// Genes are added in ascending innovation order; a gene whose
    /// endpoints are already connected in the child, or that would
    /// close a cycle, is dropped.
    ///
    /// # Errors
    /// Fails if the parents' input or output sizes differ.
    ///
    /// # Examples
    /// ```
    /// use neatris::Genome;
    /// use neatris_nn::genomics::NetworkGenome;
    ///
    /// let strong_genes = [(1, 3, 1.0, true, 0), (2, 3, 1.0, true, 1)];
    /// let weak_genes = [(1, 3, -1.0, true, 0), (1, 4, 1.0, true, 2)];
    /// let mut strong = NetworkGenome::with_innovations(&strong_genes, 2, 1).unwrap();
    /// let mut weak = NetworkGenome::with_innovations(&weak_genes, 2, 1).unwrap();
    /// strong.set_fitness(10.0);
    /// weak.set_fitness(1.0);
    ///
    /// let child = NetworkGenome::reproduce(&strong, &weak, &mut rand::thread_rng()).unwrap();
    /// assert_eq!(child.connection_ids(), vec![(1, 3), (2, 3)]);
    /// ```
    pub fn reproduce<R: Rng + ?Sized>(
        parent1: &NetworkGenome,
        parent2: &NetworkGenome,
        rng: &mut R,
    ) -> Result<NetworkGenome, ReproductionError> {
        if parent1.input_size != parent2.input_size || parent1.output_size != parent2.output_size {
            return Err(ReproductionError::MismatchedShapes {
                first_inputs: parent1.input_size,
                first_outputs: parent1.output_size,
                second_inputs: parent2.input_size,
                second_outputs: parent2.output_size,
            });
        }

        let genes1 = index_genes(parent1);
        let genes2 = index_genes(parent2);
        let (innovations, primary): (BTreeSet<Innovation>, _) =
            if parent1.fitness == parent2.fitness {
                (genes1.keys().chain(genes2.keys()).copied().collect(), parent1)
            } else if first_is_fitter(parent1.fitness, parent2.fitness) {
                (genes1.keys().copied().collect(), parent1)
            } else {
                (genes2.keys().copied().collect(), parent2)
            };

        let mut child = NetworkGenome::blank(parent1.input_size, parent1.output_size);
        for node in primary.nodes().filter(|n| n.kind() != NodeKind::Hidden) {
            child.nodes.insert(node.id(), *node);
        }
        for innovation in innovations {
            let gene = match (genes1.get(&innovation), genes2.get(&innovation)) {
                (Some(gene1), Some(gene2)) => {
                    if rng.gen::<bool>() {
                        *gene1
                    } else {
                        *gene2
                    }
                }
                (Some(gene), None) | (None, Some(gene)) => *gene,
                (None, None) => continue,
            };
            child.inherit(gene);
        }
        Ok(child)
    }

    /// Adds a parent's gene to the child. Endpoints the child
    /// doesn't hold yet are added as hidden nodes.
    fn inherit(&mut self, gene: &ConnectionGene) {
        let (source, destination) = gene.endpoints();
        if self.connections.contains_key(&(source, destination)) {
            debug!(%gene, "dropped inherited gene: endpoints already connected");
            return;
        }
        if self.nodes.contains_key(&destination) && self.path_exists(destination, source) {
            debug!(%gene, "dropped inherited gene: would close a cycle");
            return;
        }
        for id in [source, destination] {
            self.nodes
                .entry(id)
                .or_insert_with(|| NodeGene::new(id, NodeKind::Hidden));
        }
        self.connections.insert((source, destination), gene.clone());
    }

    /// Returns the compatibility distance between two genomes.
    ///
    /// Genes present in only one genome are _excess_ if their
    /// innovation is above the lower of the two genomes' highest
    /// innovation numbers, and _disjoint_ otherwise. Gene counts are
    /// divided by the larger genome's connection count, unless it
    /// holds fewer than 20 connections. The weight term is the mean
    /// absolute weight difference of shared innovations (0 if none).
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::genomics::{CompatibilityCoefficients, NetworkGenome};
    ///
    /// let coefficients = CompatibilityCoefficients {
    ///     excess_factor: 1.0,
    ///     disjoint_factor: 1.0,
    ///     weight_difference_factor: 0.5,
    /// };
    /// let genes1 = [(1, 3, 1.0, true, 0), (2, 3, 1.0, true, 1)];
    /// let genome1 = NetworkGenome::with_innovations(&genes1, 2, 1).unwrap();
    /// let genome2 = NetworkGenome::with_innovations(
    ///     &[(1, 3, 3.0, true, 0), (1, 4, 1.0, true, 2), (2, 4, 1.0, true, 3)],
    ///     2,
    ///     1,
    /// )
    /// .unwrap();
    ///
    /// // Innovation 1 is disjoint, 2 and 3 are excess, 0 differs by 2.0.
    /// assert_eq!(
    ///     NetworkGenome::compatibility_distance(&genome1, &genome2, &coefficients),
    ///     1.0 * 2.0 + 1.0 * 1.0 + 0.5 * 2.0
    /// );
    /// assert_eq!(NetworkGenome::compatibility_distance(&genome1, &genome1, &coefficients), 0.0);
    /// ```
    pub fn compatibility_distance(
        first: &NetworkGenome,
        second: &NetworkGenome,
        coefficients: &CompatibilityCoefficients,
    ) -> f32 {
        let genes1 = index_genes(first);
        let genes2 = index_genes(second);

        let larger = genes1.len().max(genes2.len());
        let n = if larger < SMALL_GENOME_CONNECTIONS {
            1.0
        } else {
            larger as f32
        };
        // An empty genome shares no innovation range with the other.
        let common_max = match (first.max_innovation(), second.max_innovation()) {
            (Some(max1), Some(max2)) => Some(max1.min(max2)),
            _ => None,
        };

        let (mut excess, mut disjoint) = (0, 0);
        let (mut shared, mut weight_difference) = (0, 0.0);
        // Ordered iteration keeps the weight sum reproducible.
        for gene in first.genes() {
            match genes2.get(&gene.innovation()) {
                Some(other) => {
                    shared += 1;
                    weight_difference += (gene.weight() - other.weight()).abs();
                }
                None if Some(gene.innovation()) <= common_max => disjoint += 1,
                None => excess += 1,
            }
        }
        for gene in second.genes().filter(|g| !genes1.contains_key(&g.innovation())) {
            if Some(gene.innovation()) <= common_max {
                disjoint += 1;
            } else {
                excess += 1;
            }
        }
        let average_weight_difference = if shared == 0 {
            0.0
        } else {
            weight_difference / shared as f32
        };

        coefficients.excess_factor * excess as f32 / n
            + coefficients.disjoint_factor * disjoint as f32 / n
            + coefficients.weight_difference_factor * average_weight_difference
    }
}

/// Ranks optional fitness values, an unset value
/// ranking below any set one.
fn first_is_fitter(first: Option<f32>, second: Option<f32>) -> bool {
    match (first, second) {
        (Some(first), Some(second)) => first > second,
        (first, _) => first.is_some(),
    }
}
