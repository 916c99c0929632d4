//! A network is the phenotype of a [`NetworkGenome`]:
//! one neuron per genome node, wired with the genome's
//! enabled connections. Disabled genes are ignored.
//!
//! [`NetworkGenome`]: crate::genomics::NetworkGenome
mod neuron;

pub use neuron::sigmoid;

use crate::genomics::{NetworkGenome, NodeKind};
use crate::NodeId;
use neuron::Neuron;

use ahash::RandomState;
use thiserror::Error;

use std::collections::HashMap;
use std::fmt;

/// A failed forward pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ForwardError {
    #[error("expected {expected} inputs, got {found} instead")]
    InputCount { expected: usize, found: usize },
}

/// An acyclic sigmoid network, evaluated with a single
/// depth-first pass per input vector.
#[derive(Clone, Debug)]
pub struct FeedForwardNetwork {
    input_size: usize,
    node_ids: Box<[NodeId]>,
    neurons: Box<[Neuron]>,
    /// `(source index, weight)` pairs feeding each neuron.
    incoming: Box<[Box<[(usize, f32)]>]>,
    /// Neuron index of input `i`, if the genome holds node `i + 1`.
    input_indices: Box<[Option<usize>]>,
    output_indices: Box<[usize]>,
}

impl FeedForwardNetwork {
    /// Generates a new network from the passed genome.
    ///
    /// # Panics
    /// In debug builds, panics if the genome's enabled
    /// connections form a cycle, or if it doesn't hold
    /// exactly `output_size` output nodes.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::{genomics::NetworkGenome, networks::FeedForwardNetwork};
    ///
    /// let network = FeedForwardNetwork::new(&NetworkGenome::empty(3, 2));
    /// assert_eq!(network.input_size(), 3);
    /// assert_eq!(network.output_size(), 2);
    /// ```
    pub fn new(genome: &NetworkGenome) -> FeedForwardNetwork {
        let node_ids: Vec<NodeId> = genome.nodes().map(|n| n.id()).collect();
        let node_index_from_id: HashMap<_, _, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(i, id)| (*id, i))
            .collect();

        let mut incoming = vec![vec![]; node_ids.len()];
        for gene in genome.genes().filter(|g| g.enabled()) {
            let source = node_index_from_id[&gene.source()];
            let destination = node_index_from_id[&gene.destination()];
            incoming[destination].push((source, gene.weight()));
        }
        let incoming: Box<[Box<[(usize, f32)]>]> =
            incoming.into_iter().map(|v| v.into()).collect();
        debug_assert!(is_acyclic(&incoming), "enabled connections form a cycle");

        let input_indices = (1..=genome.input_size())
            .map(|id| node_index_from_id.get(&id).copied())
            .collect();
        let output_indices: Box<[usize]> = genome
            .nodes()
            .filter(|n| n.kind() == NodeKind::Output)
            .map(|n| node_index_from_id[&n.id()])
            .collect();
        debug_assert_eq!(
            output_indices.len(),
            genome.output_size(),
            "genome holds a wrong number of output nodes"
        );

        FeedForwardNetwork {
            input_size: genome.input_size(),
            neurons: vec![Neuron::default(); node_ids.len()].into(),
            node_ids: node_ids.into(),
            incoming,
            input_indices,
            output_indices,
        }
    }

    pub fn input_size(&self) -> usize {
        self.input_size
    }

    /// Returns the number of output neurons, which is the
    /// genome's output size and the length of every `forward` result.
    pub fn output_size(&self) -> usize {
        self.output_indices.len()
    }

    /// Returns the ids of the output nodes, in the
    /// order their values are returned by `forward`.
    pub fn output_ids(&self) -> Vec<NodeId> {
        self.output_indices.iter().map(|i| self.node_ids[*i]).collect()
    }

    /// Propagates `inputs` through the network and returns the
    /// output neurons' activations, ordered by ascending node id.
    ///
    /// Input `i` is fed to node `i + 1`. Every neuron, inputs
    /// included, outputs the sigmoid of its summed input. Every
    /// node is activated only after all the nodes feeding it.
    ///
    /// # Errors
    /// Fails if `inputs` doesn't hold exactly one value per input node.
    ///
    /// # Examples
    /// ```
    /// use neatris_nn::{
    ///     genomics::NetworkGenome,
    ///     networks::{sigmoid, FeedForwardNetwork},
    /// };
    ///
    /// let genome = NetworkGenome::with_innovations(&[(1, 2, 1.0, true, 0)], 1, 1).unwrap();
    /// let mut network = FeedForwardNetwork::new(&genome);
    ///
    /// // Inputs are themselves activated before being propagated.
    /// for input in -20..=20 {
    ///     let input = input as f32 / 10.0;
    ///     assert_eq!(network.forward(&[input]).unwrap(), vec![sigmoid(sigmoid(input))]);
    /// }
    /// assert!(network.forward(&[1.0, 2.0]).is_err());
    /// ```
    pub fn forward(&mut self, inputs: &[f32]) -> Result<Vec<f32>, ForwardError> {
        if inputs.len() != self.input_size {
            return Err(ForwardError::InputCount {
                expected: self.input_size,
                found: inputs.len(),
            });
        }

        for neuron in self.neurons.iter_mut() {
            neuron.reset();
        }
        for (index, value) in self.input_indices.iter().zip(inputs) {
            if let Some(index) = index {
                self.neurons[*index].take_input(*value);
            }
        }

        self.propagate();

        Ok(self
            .output_indices
            .iter()
            .map(|i| self.neurons[*i].fire())
            .collect())
    }

    /// Visits every neuron in ascending id order, accumulating
    /// each one's inputs once all its sources have been visited.
    fn propagate(&mut self) {
        let (incoming, neurons) = (&self.incoming, &mut self.neurons);
        let mut visited = vec![false; neurons.len()];
        let mut stack = vec![];

        for root in 0..neurons.len() {
            stack.push((root, false));
            while let Some((index, expanded)) = stack.pop() {
                if expanded {
                    for &(source, weight) in incoming[index].iter() {
                        let signal = neurons[source].fire() * weight;
                        neurons[index].take_input(signal);
                    }
                    continue;
                }
                if visited[index] {
                    continue;
                }
                visited[index] = true;
                stack.push((index, true));
                stack.extend(
                    incoming[index]
                        .iter()
                        .filter(|(source, _)| !visited[*source])
                        .map(|(source, _)| (*source, false)),
                );
            }
        }
    }
}

/// Kahn's algorithm over the incoming-connection lists.
fn is_acyclic(incoming: &[Box<[(usize, f32)]>]) -> bool {
    let mut pending: Vec<usize> = incoming.iter().map(|sources| sources.len()).collect();
    let mut outgoing = vec![vec![]; incoming.len()];
    for (destination, sources) in incoming.iter().enumerate() {
        for (source, _) in sources.iter() {
            outgoing[*source].push(destination);
        }
    }

    let mut ready: Vec<usize> = (0..incoming.len()).filter(|i| pending[*i] == 0).collect();
    let mut sorted = 0;
    while let Some(node) = ready.pop() {
        sorted += 1;
        for destination in &outgoing[node] {
            pending[*destination] -= 1;
            if pending[*destination] == 0 {
                ready.push(*destination);
            }
        }
    }
    sorted == incoming.len()
}

impl fmt::Display for FeedForwardNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self as &dyn fmt::Debug).fmt(f)
    }
}
