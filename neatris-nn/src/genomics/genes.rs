use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Connection genes are the principal components of genomes.
/// They link two nodes, and become network connections
/// in the genome's phenotype.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    source: NodeId,
    destination: NodeId,
    weight: f32,
    enabled: bool,
}

impl ConnectionGene {
    pub fn new(
        innovation: Innovation,
        source: NodeId,
        destination: NodeId,
        weight: f32,
        enabled: bool,
    ) -> ConnectionGene {
        ConnectionGene {
            innovation,
            source,
            destination,
            weight,
            enabled,
        }
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// Returns the gene's source and destination ids.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.destination)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub(super) fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub(super) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns the gene as a `(source, destination, weight, enabled)` tuple.
    pub fn as_tuple(&self) -> (NodeId, NodeId, f32, bool) {
        (self.source, self.destination, self.weight, self.enabled)
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            self.destination,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}
