use crate::{Innovation, NodeId};

use thiserror::Error;

/// A connection list that doesn't describe a valid genome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    #[error("connection {0} -> {1} refers to a missing node")]
    MissingNode(NodeId, NodeId),
    #[error("connection {0} -> {0} is a self-loop")]
    SelfLoop(NodeId),
    #[error("duplicate connection {0} -> {1}")]
    DuplicateConnection(NodeId, NodeId),
    #[error("innovation {innovation} is used by both {first:?} and {second:?}")]
    DuplicateInnovation {
        innovation: Innovation,
        first: (NodeId, NodeId),
        second: (NodeId, NodeId),
    },
}

/// A failed crossover.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReproductionError {
    #[error("parents have mismatched shapes: {first_inputs}x{first_outputs} and \
             {second_inputs}x{second_outputs}")]
    MismatchedShapes {
        first_inputs: usize,
        first_outputs: usize,
        second_inputs: usize,
        second_outputs: usize,
    },
}

/// A genome that couldn't be read from or written to JSON.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("malformed genome JSON")]
    Json(#[from] serde_json::Error),
    #[error("decoded genome is invalid")]
    Construction(#[from] ConstructionError),
}

/// Failures of building or breeding a [`NetworkGenome`].
///
/// [`NetworkGenome`]: super::NetworkGenome
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Construction(#[from] ConstructionError),
    #[error(transparent)]
    Reproduction(#[from] ReproductionError),
}
