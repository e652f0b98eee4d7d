//! Network - the ordered, fixed-size set of nodes

use serde::{Deserialize, Serialize};
use trustbed_common::{DataError, Node};

/// Nodes indexed by id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    nodes: Vec<Node>,
}

impl Network {
    pub fn from_nodes(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn get(&self, id: usize) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Like [`Network::get`], but a missing id is an error
    pub fn node(&self, id: usize) -> Result<&Node, DataError> {
        self.nodes.get(id).ok_or(DataError::NodeOutOfRange {
            id,
            size: self.nodes.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Node)> {
        self.nodes.iter().enumerate()
    }
}
