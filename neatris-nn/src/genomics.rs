//! Genomes are the focus of evolution in NEAT.
//! They are a collection of connection genes and nodes that can be
//! instantiated as a phenotype (a neural network). Genomes are
//! progressively mutated, thus adding complexity and functionality.
//!
//! Genome graphs are kept acyclic: mutation never adds a connection
//! that closes a cycle, and crossover drops any gene that would.

mod config;
mod crossover;
mod errors;
mod genes;
mod history;
mod mutation;
mod nodes;
mod serialization;

pub use config::{CompatibilityCoefficients, GeneticConfig, MutationCoefficients};
pub use errors::{ConstructionError, Error, ReproductionError, SerializationError};
pub use genes::ConnectionGene;
pub use history::InnovationCounter;
pub use nodes::{NodeGene, NodeKind};
pub use serialization::GenomeRecord;

use crate::networks::FeedForwardNetwork;
use crate::{Innovation, NodeId};

use ahash::RandomState;
use neatris::ConfigError;
use rand::Rng;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;

/// A `(source, destination, weight, enabled)` connection description.
pub type Connection = (NodeId, NodeId, f32, bool);

/// A connection description carrying its innovation number.
pub type InnovatedConnection = (NodeId, NodeId, f32, bool, Innovation);

/// A mutable collection of connection genes and nodes.
///
/// Node ids are positive; 0 stands for a missing node.
#[derive(Clone, PartialEq, Debug)]
pub struct NetworkGenome {
    nodes: BTreeMap<NodeId, NodeGene>,
    connections: BTreeMap<(NodeId, NodeId), ConnectionGene>,
    input_size: usize,
    output_size: usize,
    fitness: Option<f32>,
    adjusted_fitness: Option<f32>,
}

impl NetworkGenome {
    /// Creates a genome without connections, holding input
    /// nodes `1..=input_size` and output nodes
    /// `input_size + 1..=input_size + output_size`.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::genomics::{NetworkGenome, NodeKind};
    ///
    /// let genome = NetworkGenome::empty(2, 1);
    /// let kinds: Vec<_> = genome.nodes().map(|n| n.kind()).collect();
    /// assert_eq!(kinds, vec![NodeKind::Input, NodeKind::Input, NodeKind::Output]);
    /// assert_eq!(genome.connections().len(), 0);
    /// ```
    pub fn empty(input_size: usize, output_size: usize) -> NetworkGenome {
        let mut genome = NetworkGenome::blank(input_size, output_size);
        for id in 1..=input_size {
            genome.nodes.insert(id, NodeGene::new(id, NodeKind::Input));
        }
        for id in input_size + 1..=input_size + output_size {
            genome.nodes.insert(id, NodeGene::new(id, NodeKind::Output));
        }
        genome
    }

    /// A genome without nodes or connections.
    fn blank(input_size: usize, output_size: usize) -> NetworkGenome {
        NetworkGenome {
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            input_size,
            output_size,
            fitness: None,
            adjusted_fitness: None,
        }
    }

    /// Creates a genome from a connection list, drawing a
    /// fresh innovation number for every connection, in order.
    ///
    /// Ids `1..=input_size` are input nodes, connected or not.
    /// Among the other ids, the `output_size` highest ones that are
    /// never the source of a connection are output nodes. If there
    /// are fewer than `output_size` of those, the lowest ids above
    /// the inputs that no connection refers to make up the rest, as
    /// unconnected outputs. All remaining ids are hidden.
    ///
    /// # Errors
    /// Fails, without drawing any innovation number, if a
    /// connection refers to node 0, is a self-loop, or repeats
    /// an earlier connection's endpoints.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::genomics::{InnovationCounter, NetworkGenome, NodeKind};
    ///
    /// let history = InnovationCounter::new();
    /// let genome = NetworkGenome::new(
    ///     &[(1, 3, 0.0, true), (1, 4, 0.0, true), (2, 3, 0.0, true), (2, 4, 0.0, true)],
    ///     2,
    ///     1,
    ///     &history,
    /// )
    /// .unwrap();
    ///
    /// let kinds: Vec<_> = genome.nodes().map(|n| n.kind()).collect();
    /// assert_eq!(
    ///     kinds,
    ///     vec![NodeKind::Input, NodeKind::Input, NodeKind::Hidden, NodeKind::Output]
    /// );
    /// assert_eq!(genome.max_innovation(), Some(3));
    ///
    /// // Self-loops are rejected.
    /// assert!(NetworkGenome::new(&[(3, 3, 1.0, true)], 2, 1, &history).is_err());
    /// ```
    pub fn new(
        connections: &[Connection],
        input_size: usize,
        output_size: usize,
        history: &InnovationCounter,
    ) -> Result<NetworkGenome, ConstructionError> {
        let mut seen = BTreeSet::new();
        for (source, destination, ..) in connections {
            check_connection(*source, *destination, &mut seen)?;
        }
        let genes = connections
            .iter()
            .map(|(source, destination, weight, enabled)| {
                ConnectionGene::new(
                    history.next_innovation(),
                    *source,
                    *destination,
                    *weight,
                    *enabled,
                )
            })
            .collect();
        Ok(NetworkGenome::from_genes(genes, input_size, output_size))
    }

    /// Creates a genome from connections carrying their own
    /// innovation numbers. Node kinds follow the same rules
    /// as in [`new`].
    ///
    /// # Errors
    /// Fails under the same conditions as [`new`], or if two
    /// connections share an innovation number.
    ///
    /// [`new`]: NetworkGenome::new
    pub fn with_innovations(
        connections: &[InnovatedConnection],
        input_size: usize,
        output_size: usize,
    ) -> Result<NetworkGenome, ConstructionError> {
        let mut seen = BTreeSet::new();
        let mut innovations: HashMap<Innovation, (NodeId, NodeId), RandomState> =
            HashMap::default();
        for (source, destination, _, _, innovation) in connections {
            check_connection(*source, *destination, &mut seen)?;
            if let Some(first) = innovations.insert(*innovation, (*source, *destination)) {
                return Err(ConstructionError::DuplicateInnovation {
                    innovation: *innovation,
                    first,
                    second: (*source, *destination),
                });
            }
        }
        let genes = connections
            .iter()
            .map(|(source, destination, weight, enabled, innovation)| {
                ConnectionGene::new(*innovation, *source, *destination, *weight, *enabled)
            })
            .collect();
        Ok(NetworkGenome::from_genes(genes, input_size, output_size))
    }

    /// Builds a genome from already validated genes.
    fn from_genes(
        genes: Vec<ConnectionGene>,
        input_size: usize,
        output_size: usize,
    ) -> NetworkGenome {
        let mut genome = NetworkGenome::blank(input_size, output_size);
        let sources: BTreeSet<NodeId> = genes.iter().map(|g| g.source()).collect();
        let ids: BTreeSet<NodeId> = genes
            .iter()
            .flat_map(|g| [g.source(), g.destination()])
            .collect();
        let mut outputs: BTreeSet<NodeId> = ids
            .iter()
            .rev()
            .filter(|id| **id > input_size && !sources.contains(id))
            .take(output_size)
            .copied()
            .collect();
        let missing = output_size - outputs.len();
        outputs.extend(
            (input_size + 1..)
                .filter(|id| !ids.contains(id))
                .take(missing),
        );

        for id in (1..=input_size).chain(ids).chain(outputs.iter().copied()) {
            let kind = if id <= input_size {
                NodeKind::Input
            } else if outputs.contains(&id) {
                NodeKind::Output
            } else {
                NodeKind::Hidden
            };
            genome.nodes.insert(id, NodeGene::new(id, kind));
        }
        for gene in genes {
            genome.connections.insert(gene.endpoints(), gene);
        }
        genome
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    pub fn output_size(&self) -> usize {
        self.output_size
    }

    /// Returns every connection as a `(source, destination, weight, enabled)`
    /// tuple, ordered by endpoints.
    pub fn connections(&self) -> Vec<Connection> {
        self.connections.values().map(ConnectionGene::as_tuple).collect()
    }

    /// Returns the `(source, destination)` pair of every connection,
    /// ordered.
    pub fn connection_ids(&self) -> Vec<(NodeId, NodeId)> {
        self.connections.keys().copied().collect()
    }

    /// Returns an iterator over the connection genes, ordered by endpoints.
    pub fn genes(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    pub fn gene(&self, source: NodeId, destination: NodeId) -> Option<&ConnectionGene> {
        self.connections.get(&(source, destination))
    }

    /// Returns an iterator over the nodes, ordered by id.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Returns the highest innovation number in the genome,
    /// if it has any connections.
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.connections.values().map(|g| g.innovation()).max()
    }

    /// Returns the highest node id, or 0 for a genome without nodes.
    pub fn max_node_id(&self) -> NodeId {
        self.nodes.keys().next_back().copied().unwrap_or(0)
    }

    /// Returns every node reachable from `from` by following
    /// connections forward, enabled or not. Includes `from`.
    pub(crate) fn reachable_from(&self, from: NodeId) -> BTreeSet<NodeId> {
        let mut reached = BTreeSet::new();
        let mut pending = vec![from];
        while let Some(node) = pending.pop() {
            if reached.insert(node) {
                pending.extend(
                    self.connections
                        .range((node, 0)..=(node, NodeId::MAX))
                        .map(|(&(_, destination), _)| destination),
                );
            }
        }
        reached
    }

    /// Returns whether `to` can be reached from `from`.
    pub(crate) fn path_exists(&self, from: NodeId, to: NodeId) -> bool {
        self.reachable_from(from).contains(&to)
    }
}

/// Checks a single connection against those seen before it.
fn check_connection(
    source: NodeId,
    destination: NodeId,
    seen: &mut BTreeSet<(NodeId, NodeId)>,
) -> Result<(), ConstructionError> {
    if source == 0 || destination == 0 {
        return Err(ConstructionError::MissingNode(source, destination));
    }
    if source == destination {
        return Err(ConstructionError::SelfLoop(source));
    }
    if !seen.insert((source, destination)) {
        return Err(ConstructionError::DuplicateConnection(source, destination));
    }
    Ok(())
}

impl neatris::Genome for NetworkGenome {
    type Config = GeneticConfig;
    type InnovationHistory = InnovationCounter;
    type Phenotype = FeedForwardNetwork;
    type Error = Error;

    fn compatibility_distance(first: &Self, second: &Self, config: &GeneticConfig) -> f32 {
        NetworkGenome::compatibility_distance(first, second, &config.compatibility_coefficients)
    }

    fn reproduce<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        rng: &mut R,
    ) -> Result<Self, Error> {
        Ok(NetworkGenome::reproduce(parent1, parent2, rng)?)
    }

    fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &InnovationCounter,
        config: &GeneticConfig,
        rng: &mut R,
    ) {
        NetworkGenome::mutate(self, &config.mutation_coefficients, history, rng);
    }

    fn express(&self) -> FeedForwardNetwork {
        FeedForwardNetwork::new(self)
    }

    fn fitness(&self) -> Option<f32> {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    fn adjusted_fitness(&self) -> Option<f32> {
        self.adjusted_fitness
    }

    fn set_adjusted_fitness(&mut self, adjusted_fitness: f32) {
        self.adjusted_fitness = Some(adjusted_fitness);
    }

    fn validate_config(config: &GeneticConfig) -> Result<(), ConfigError> {
        config.validate()
    }
}

impl fmt::Display for NetworkGenome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut genes: Vec<&ConnectionGene> = self.connections.values().collect();
        genes.sort_unstable_by_key(|g| g.innovation());
        let nodes: Vec<&NodeGene> = self.nodes.values().collect();
        f.debug_struct("NetworkGenome")
            .field("Genes", &genes)
            .field("Nodes", &nodes)
            .field("Fitness", &self.fitness)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(genome: &NetworkGenome) -> Vec<(NodeId, NodeKind)> {
        genome.nodes().map(|n| (n.id(), n.kind())).collect()
    }

    #[test]
    fn node_kinds_from_connections() {
        let history = InnovationCounter::new();
        let genome = NetworkGenome::new(
            &[(1, 3, 0.0, true), (1, 4, 0.0, true), (2, 3, 0.0, true), (2, 4, 0.0, true)],
            2,
            1,
            &history,
        )
        .unwrap();
        assert_eq!(
            kinds(&genome),
            vec![
                (1, NodeKind::Input),
                (2, NodeKind::Input),
                (3, NodeKind::Hidden),
                (4, NodeKind::Output)
            ]
        );
    }

    #[test]
    fn hidden_nodes_with_outgoing_connections_are_not_outputs() {
        let history = InnovationCounter::new();
        let genome = NetworkGenome::new(
            &[(1, 5, 3.0, true), (5, 6, -3.4, true), (6, 4, 5.0, true), (3, 6, 4.0, true)],
            3,
            1,
            &history,
        )
        .unwrap();
        assert_eq!(genome.node(4).map(|n| n.kind()), Some(NodeKind::Output));
        assert_eq!(genome.node(5).map(|n| n.kind()), Some(NodeKind::Hidden));
        assert_eq!(genome.node(6).map(|n| n.kind()), Some(NodeKind::Hidden));
    }

    #[test]
    fn unconnected_inputs_and_outputs_are_kept() {
        let genome = NetworkGenome::with_innovations(&[(1, 4, 1.0, true, 0)], 2, 2).unwrap();
        assert_eq!(
            kinds(&genome),
            vec![
                (1, NodeKind::Input),
                (2, NodeKind::Input),
                (3, NodeKind::Output),
                (4, NodeKind::Output)
            ]
        );
        assert_eq!(genome.max_node_id(), 4);
    }

    #[test]
    fn construction_errors() {
        let history = InnovationCounter::new();
        assert_eq!(
            NetworkGenome::new(&[(0, 3, 1.0, true)], 2, 1, &history),
            Err(ConstructionError::MissingNode(0, 3))
        );
        assert_eq!(
            NetworkGenome::new(&[(1, 3, 1.0, true), (2, 2, 1.0, true)], 2, 1, &history),
            Err(ConstructionError::SelfLoop(2))
        );
        assert_eq!(
            NetworkGenome::new(&[(1, 3, 1.0, true), (1, 3, -1.0, false)], 2, 1, &history),
            Err(ConstructionError::DuplicateConnection(1, 3))
        );
        // Failed constructions don't consume innovations.
        assert_eq!(history.peek(), 0);
    }

    #[test]
    fn duplicate_innovations_are_rejected() {
        assert_eq!(
            NetworkGenome::with_innovations(&[(1, 3, 1.0, true, 4), (2, 3, 1.0, true, 4)], 2, 1),
            Err(ConstructionError::DuplicateInnovation {
                innovation: 4,
                first: (1, 3),
                second: (2, 3)
            })
        );
    }

    #[test]
    fn queries_are_ordered() {
        let history = InnovationCounter::new();
        let genome = NetworkGenome::new(
            &[(2, 4, 1.0, true), (1, 3, 0.0, false), (2, 3, 0.5, true)],
            2,
            2,
            &history,
        )
        .unwrap();
        assert_eq!(
            genome.connections(),
            vec![(1, 3, 0.0, false), (2, 3, 0.5, true), (2, 4, 1.0, true)]
        );
        assert_eq!(genome.connection_ids(), vec![(1, 3), (2, 3), (2, 4)]);
        assert_eq!(genome.gene(2, 4).map(|g| g.innovation()), Some(0));
        assert_eq!(genome.max_node_id(), 4);
    }

    #[test]
    fn reachability_follows_disabled_connections() {
        let genome =
            NetworkGenome::with_innovations(&[(1, 3, 1.0, false, 0), (3, 4, 1.0, true, 1)], 1, 1)
                .unwrap();
        assert!(genome.path_exists(1, 4));
        assert!(!genome.path_exists(4, 1));
        assert_eq!(
            genome.reachable_from(3).into_iter().collect::<Vec<_>>(),
            vec![3, 4]
        );
    }
}
