//! `trapmesh-topology` - Mesh topology ingestion for trap modules.
//!
//! A trap module reports the mesh peers reachable through it as a nested
//! tree of `{ nodeId, subs }` descriptors. This crate turns that tree into a
//! node-and-edge graph model and lays it out for display:
//!
//! - **Descriptors**: serde model and parser for the reported tree
//! - **Graph model**: nodes keyed by device id, directed parent to child edges
//! - **Ingestor**: full-rebuild pass with stable edge identities
//! - **Renderer**: the seam to a rendering engine, plus a time-boxed
//!   force-directed layout implementation
//!
//! # Example
//!
//! ```
//! use trapmesh_topology::{
//!     GraphRenderer, LayoutRenderer, NodeId, RebuildOutcome, TopologyIngestor,
//! };
//!
//! let mut ingestor = TopologyIngestor::new();
//! let mut renderer = LayoutRenderer::new();
//! let raw = r#"[{"nodeId":1,"subs":[{"nodeId":2}]},{"nodeId":3,"subs":[{"nodeId":2}]}]"#;
//!
//! let outcome = ingestor.rebuild_graph(&mut renderer, Some("7"), raw).unwrap();
//! assert_eq!(outcome, RebuildOutcome::Rebuilt { nodes: 4, edges: 4 });
//! assert_eq!(renderer.graph().in_degree(NodeId(2)), 2);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

/// Reported topology descriptors.
pub mod descriptor;
/// Topology errors.
pub mod error;
/// Node and edge graph model.
pub mod graph;
/// Topology ingestion passes.
pub mod ingest;
/// Force-directed layout.
pub mod layout;
/// Renderer seam and the layout-driven renderer.
pub mod render;

pub use descriptor::{parse_json_unbounded, parse_topology, PeerDescriptor, TopologyPayload};
pub use error::TopologyError;
pub use graph::{EdgeId, EdgeIdAllocator, EdgeKind, GraphEdge, GraphModel, GraphNode, NodeId};
pub use ingest::{Jitter, RandomJitter, RebuildOutcome, TopologyIngestor, DEFAULT_SETTLE};
pub use layout::{ForceLayout, LayoutParams};
pub use render::{GraphRenderer, LayoutRenderer};
