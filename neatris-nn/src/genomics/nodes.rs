use crate::NodeId;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A NodeKind indicates the function of
/// the node's network equivalent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Output,
    Hidden,
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct NodeGene {
    id: NodeId,
    kind: NodeKind,
}

impl NodeGene {
    pub fn new(id: NodeId, kind: NodeKind) -> NodeGene {
        NodeGene { id, kind }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?})", self.id, self.kind)
    }
}
