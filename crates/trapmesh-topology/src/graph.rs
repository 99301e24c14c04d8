//! Node and edge graph model handed to the renderer.

#![allow(missing_docs)]

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::TopologyError;

/// Default node color.
pub const NODE_COLOR: &str = "#617db4";
/// Default node size.
pub const NODE_SIZE: f64 = 1.0;

/// Mesh device identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Identifier reserved for the synthetic node standing for the local module.
    pub const ROOT: NodeId = NodeId(0);

    /// Whether this is the reserved root identifier.
    #[must_use]
    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Edge identifier, unique for the lifetime of the allocator that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EdgeId(pub u64);

/// Monotonic edge id source. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct EdgeIdAllocator {
    last: u64,
}

impl EdgeIdAllocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next identifier.
    pub fn next_id(&mut self) -> EdgeId {
        self.last += 1;
        EdgeId(self.last)
    }

    /// Last identifier handed out, if any.
    #[must_use]
    pub fn last(&self) -> Option<EdgeId> {
        (self.last > 0).then_some(EdgeId(self.last))
    }
}

/// Edge shape tag understood by the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EdgeKind {
    /// Tapered edge, drawn thicker at the source.
    #[serde(rename = "t")]
    Tapered,
}

/// A device in the mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub id: NodeId,
    pub label: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
    pub color: String,
}

impl GraphNode {
    /// Node with the standard label, size and color at the given position.
    #[must_use]
    pub fn new(id: NodeId, label: impl fmt::Display, x: f64, y: f64) -> Self {
        Self {
            id,
            label: format!("Node {label}"),
            x,
            y,
            size: NODE_SIZE,
            color: NODE_COLOR.to_string(),
        }
    }
}

/// "target is one hop away through source".
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub size: f64,
    pub kind: EdgeKind,
}

/// Renderable mesh graph.
///
/// Nodes keep insertion order so repeated rebuilds of the same topology list
/// them identically. Edges are not de-duplicated: a device reachable through
/// several parents gets one edge per parent.
#[derive(Debug, Default, Clone)]
pub struct GraphModel {
    nodes: IndexMap<NodeId, GraphNode>,
    edges: Vec<GraphEdge>,
}

impl GraphModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every node and edge.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    #[must_use]
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn add_node(&mut self, node: GraphNode) -> Result<(), TopologyError> {
        if self.nodes.contains_key(&node.id) {
            return Err(TopologyError::DuplicateNode(node.id));
        }
        self.nodes.insert(node.id, node);
        Ok(())
    }

    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<(), TopologyError> {
        for endpoint in [edge.source, edge.target] {
            if !self.nodes.contains_key(&endpoint) {
                return Err(TopologyError::UnknownEndpoint(endpoint));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&GraphNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut GraphNode> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.nodes.values()
    }

    pub fn nodes_mut(&mut self) -> impl Iterator<Item = &mut GraphNode> {
        self.nodes.values_mut()
    }

    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Position of a node in insertion order.
    #[must_use]
    pub fn node_index(&self, id: NodeId) -> Option<usize> {
        self.nodes.get_index_of(&id)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of edges pointing at `id`.
    #[must_use]
    pub fn in_degree(&self, id: NodeId) -> usize {
        self.edges.iter().filter(|edge| edge.target == id).count()
    }

    /// Direct children of `id`, one entry per edge.
    #[must_use]
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|edge| edge.source == id)
            .map(|edge| edge.target)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(id: u64, source: u32, target: u32) -> GraphEdge {
        GraphEdge {
            id: EdgeId(id),
            source: NodeId(source),
            target: NodeId(target),
            size: 0.5,
            kind: EdgeKind::Tapered,
        }
    }

    #[test]
    fn duplicate_node_is_rejected() {
        let mut graph = GraphModel::new();
        graph.add_node(GraphNode::new(NodeId(4), 4, 0.0, 0.0)).unwrap();
        let err = graph
            .add_node(GraphNode::new(NodeId(4), 4, 1.0, 1.0))
            .unwrap_err();
        assert_eq!(err, TopologyError::DuplicateNode(NodeId(4)));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn edge_requires_both_endpoints() {
        let mut graph = GraphModel::new();
        graph.add_node(GraphNode::new(NodeId::ROOT, 9, 0.0, 0.0)).unwrap();
        let err = graph.add_edge(edge(1, 0, 5)).unwrap_err();
        assert_eq!(err, TopologyError::UnknownEndpoint(NodeId(5)));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn parallel_edges_are_kept() {
        let mut graph = GraphModel::new();
        for id in [0, 1] {
            graph.add_node(GraphNode::new(NodeId(id), id, 0.0, 0.0)).unwrap();
        }
        graph.add_edge(edge(1, 0, 1)).unwrap();
        graph.add_edge(edge(2, 0, 1)).unwrap();
        assert_eq!(graph.in_degree(NodeId(1)), 2);
        assert_eq!(graph.neighbors(NodeId(0)), vec![NodeId(1), NodeId(1)]);
    }

    #[test]
    fn allocator_is_monotonic() {
        let mut ids = EdgeIdAllocator::new();
        assert_eq!(ids.last(), None);
        let first = ids.next_id();
        let second = ids.next_id();
        assert_eq!(first, EdgeId(1));
        assert!(second > first);
        assert_eq!(ids.last(), Some(second));
    }

    #[test]
    fn node_defaults_match_renderer_style() {
        let node = GraphNode::new(NodeId(17), 17, 0.25, 0.75);
        assert_eq!(node.label, "Node 17");
        assert_eq!(node.color, NODE_COLOR);
        assert!((node.size - NODE_SIZE).abs() < f64::EPSILON);
    }
}
