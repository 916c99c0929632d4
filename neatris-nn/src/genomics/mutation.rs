use super::{
    ConnectionGene, InnovationCounter, MutationCoefficients, NetworkGenome, NodeGene, NodeKind,
};
use crate::NodeId;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

impl NetworkGenome {
    /// Mutates the genome in place. Each kind of mutation
    /// (add connection, split connection, change weight) is
    /// applied independently, when a uniform draw from `[0, 1)`
    /// is below its configured chance: a chance of 0 never
    /// fires and a chance of 1 always does.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::genomics::{InnovationCounter, MutationCoefficients, NetworkGenome};
    ///
    /// let history = InnovationCounter::new();
    /// let mut genome = NetworkGenome::new(&[(1, 2, 0.5, true)], 1, 1, &history).unwrap();
    ///
    /// let coefficients = MutationCoefficients {
    ///     split_connection: 1.0,
    ///     ..MutationCoefficients::zero()
    /// };
    /// genome.mutate(&coefficients, &history, &mut rand::thread_rng());
    ///
    /// assert_eq!(genome.connection_ids(), vec![(1, 2), (1, 3), (3, 2)]);
    /// ```
    pub fn mutate<R: Rng + ?Sized>(
        &mut self,
        coefficients: &MutationCoefficients,
        history: &InnovationCounter,
        rng: &mut R,
    ) {
        if rng.gen::<f32>() < coefficients.add_connection {
            self.mutate_add_connection(coefficients.new_connection_abs_max_weight, history, rng);
        }
        if rng.gen::<f32>() < coefficients.split_connection {
            self.mutate_split_connection(history, rng);
        }
        if rng.gen::<f32>() < coefficients.change_weight {
            self.mutate_change_weight(coefficients.max_weight_mutation, rng);
        }
    }

    /// Adds a new enabled connection between a random pair of
    /// unconnected nodes. Its weight is drawn from a normal
    /// distribution with mean 0 and standard deviation
    /// `abs_max_weight / 2`.
    ///
    /// Sources can be any node but an output, destinations
    /// any node but an input. Pairs whose destination already
    /// reaches the source are excluded, keeping the genome acyclic.
    ///
    /// Returns `None`, leaving the genome unchanged, if there
    /// is no candidate pair.
    pub fn mutate_add_connection<R: Rng + ?Sized>(
        &mut self,
        abs_max_weight: f32,
        history: &InnovationCounter,
        rng: &mut R,
    ) -> Option<&ConnectionGene> {
        let (source, destination) = *self.connection_candidates().choose(rng)?;
        let weight = gaussian(abs_max_weight / 2.0, rng);
        let innovation = history.next_innovation();
        let gene = ConnectionGene::new(innovation, source, destination, weight, true);
        trace!(%gene, "added connection");
        self.connections.insert((source, destination), gene);
        self.connections.get(&(source, destination))
    }

    fn connection_candidates(&self) -> Vec<(NodeId, NodeId)> {
        let mut candidates = vec![];
        for destination in self.nodes.values().filter(|n| n.kind() != NodeKind::Input) {
            let destination = destination.id();
            let downstream = self.reachable_from(destination);
            candidates.extend(
                self.nodes
                    .values()
                    .filter(|n| n.kind() != NodeKind::Output)
                    .map(NodeGene::id)
                    .filter(|source| {
                        !downstream.contains(source)
                            && !self.connections.contains_key(&(*source, destination))
                    })
                    .map(|source| (source, destination)),
            );
        }
        candidates
    }

    /// Splits a random enabled connection `a -> b` with a new hidden
    /// node `c`: `a -> b` is disabled, and `a -> c` (weight 1) and
    /// `c -> b` (the old weight) are added. `c` is one more than the
    /// highest node id in this genome.
    ///
    /// Returns the two new connections and the new node, or `None`
    /// if there is no enabled connection.
    pub fn mutate_split_connection<R: Rng + ?Sized>(
        &mut self,
        history: &InnovationCounter,
        rng: &mut R,
    ) -> Option<(&ConnectionGene, &NodeGene, &ConnectionGene)> {
        let (source, destination) = self.choose_enabled(rng)?;
        let old = self.connections.get_mut(&(source, destination))?;
        old.set_enabled(false);
        let weight = old.weight();

        let node = self.max_node_id() + 1;
        self.nodes.insert(node, NodeGene::new(node, NodeKind::Hidden));
        let (first, second) = (history.next_innovation(), history.next_innovation());
        let incoming = ConnectionGene::new(first, source, node, 1.0, true);
        let outgoing = ConnectionGene::new(second, node, destination, weight, true);
        trace!(source, destination, node, "split connection");
        self.connections.insert((source, node), incoming);
        self.connections.insert((node, destination), outgoing);

        Some((
            self.connections.get(&(source, node))?,
            self.nodes.get(&node)?,
            self.connections.get(&(node, destination))?,
        ))
    }

    /// Perturbs a random enabled connection's weight by a value
    /// drawn from a normal distribution with mean 0 and standard
    /// deviation `max_weight_mutation / 2`. The result is not clamped.
    ///
    /// Returns `None` if there is no enabled connection.
    pub fn mutate_change_weight<R: Rng + ?Sized>(
        &mut self,
        max_weight_mutation: f32,
        rng: &mut R,
    ) -> Option<&ConnectionGene> {
        let endpoints = self.choose_enabled(rng)?;
        let delta = gaussian(max_weight_mutation / 2.0, rng);
        let gene = self.connections.get_mut(&endpoints)?;
        gene.set_weight(gene.weight() + delta);
        Some(&*gene)
    }

    fn choose_enabled<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(NodeId, NodeId)> {
        let enabled: Vec<(NodeId, NodeId)> = self
            .connections
            .values()
            .filter(|g| g.enabled())
            .map(ConnectionGene::endpoints)
            .collect();
        enabled.choose(rng).copied()
    }
}

/// Draws from a zero-mean normal distribution.
/// An invalid deviation yields 0.
fn gaussian<R: Rng + ?Sized>(std_dev: f32, rng: &mut R) -> f32 {
    Normal::new(0.0, std_dev)
        .map(|normal| normal.sample(rng))
        .unwrap_or(0.0)
}
