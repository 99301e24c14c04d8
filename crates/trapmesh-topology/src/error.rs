//! Topology errors.

#![allow(missing_docs)]

use thiserror::Error;

use crate::graph::NodeId;

/// Errors raised while ingesting a reported topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// The topology payload is not a well-formed descriptor sequence.
    #[error("invalid topology json: {0}")]
    Parse(String),

    /// A device reported the identifier reserved for the local module.
    #[error("node id {0} is reserved for the local module")]
    ReservedNodeId(NodeId),

    /// A node was inserted twice into the same graph.
    #[error("duplicate node {0}")]
    DuplicateNode(NodeId),

    /// An edge references a node the graph does not hold.
    #[error("edge endpoint {0} is not in the graph")]
    UnknownEndpoint(NodeId),
}

impl From<serde_json::Error> for TopologyError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value.to_string())
    }
}
