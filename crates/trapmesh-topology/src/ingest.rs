//! Topology ingestion: reported descriptor trees to a renderable graph.

use std::time::Duration;

use tracing::{debug, warn};

use crate::descriptor::{find_reserved, parse_topology, PeerDescriptor};
use crate::error::TopologyError;
use crate::graph::{EdgeIdAllocator, EdgeKind, GraphEdge, GraphNode, NodeId};
use crate::render::GraphRenderer;

/// How long the force layout runs after a rebuild before it is stopped.
pub const DEFAULT_SETTLE: Duration = Duration::from_millis(2500);

/// Source of the random values a rebuild assigns (node positions, edge sizes).
pub trait Jitter {
    /// Coordinate in `[0, 1)`.
    fn coordinate(&mut self) -> f64;

    /// Edge thickness in `[0, 1)`.
    fn edge_size(&mut self) -> f64 {
        self.coordinate()
    }
}

/// [`Jitter`] backed by the thread-local `rand` generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomJitter;

impl Jitter for RandomJitter {
    fn coordinate(&mut self) -> f64 {
        rand::random::<f64>()
    }
}

/// Result of a rebuild request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebuildOutcome {
    /// No root identifier was available; the graph was left untouched.
    Skipped,
    /// The graph was replaced.
    Rebuilt {
        /// Nodes in the new graph, root included.
        nodes: usize,
        /// Edges in the new graph.
        edges: usize,
    },
}

/// Rebuilds the renderer's graph from reported topology.
///
/// Owns the edge id counter, so edge ids stay unique across every rebuild
/// done through the same ingestor. Every rebuild is a full replace.
pub struct TopologyIngestor {
    edge_ids: EdgeIdAllocator,
    jitter: Box<dyn Jitter + Send>,
    settle: Duration,
}

impl Default for TopologyIngestor {
    fn default() -> Self {
        Self::new()
    }
}

impl TopologyIngestor {
    /// Ingestor placing nodes at random.
    #[must_use]
    pub fn new() -> Self {
        Self::with_jitter(RandomJitter)
    }

    /// Ingestor drawing positions and edge sizes from `jitter`.
    #[must_use]
    pub fn with_jitter(jitter: impl Jitter + Send + 'static) -> Self {
        Self {
            edge_ids: EdgeIdAllocator::new(),
            jitter: Box::new(jitter),
            settle: DEFAULT_SETTLE,
        }
    }

    /// Overrides how long the layout runs after each rebuild.
    #[must_use]
    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }

    /// How long the layout runs after a rebuild.
    #[must_use]
    pub fn settle(&self) -> Duration {
        self.settle
    }

    /// Highest edge id issued so far.
    #[must_use]
    pub fn last_edge_id(&self) -> Option<crate::graph::EdgeId> {
        self.edge_ids.last()
    }

    /// Replaces the renderer's graph with the topology in `raw`.
    ///
    /// `root` is the identifier of the module currently displayed; when it is
    /// absent or blank nothing happens. Otherwise the graph is cleared first,
    /// so a payload that fails to parse leaves it empty.
    pub fn rebuild_graph<R: GraphRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        root: Option<&str>,
        raw: &str,
    ) -> Result<RebuildOutcome, TopologyError> {
        let Some(root) = normalize_root(root) else {
            debug!("mesh graph skipped: no module id displayed");
            return Ok(RebuildOutcome::Skipped);
        };
        renderer.graph_mut().clear();
        let peers = parse_topology(raw).inspect_err(|err| {
            warn!("mesh graph rejected: {err}");
        })?;
        self.populate(renderer, root, &peers)
    }

    /// Same as [`Self::rebuild_graph`] for an already parsed sequence.
    pub fn rebuild_from_descriptors<R: GraphRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        root: Option<&str>,
        peers: &[PeerDescriptor],
    ) -> Result<RebuildOutcome, TopologyError> {
        let Some(root) = normalize_root(root) else {
            debug!("mesh graph skipped: no module id displayed");
            return Ok(RebuildOutcome::Skipped);
        };
        renderer.graph_mut().clear();
        self.populate(renderer, root, peers)
    }

    fn populate<R: GraphRenderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        root: &str,
        peers: &[PeerDescriptor],
    ) -> Result<RebuildOutcome, TopologyError> {
        if let Some(reserved) = find_reserved(peers) {
            warn!("mesh graph rejected: device reported reserved id {reserved}");
            return Err(TopologyError::ReservedNodeId(reserved));
        }

        let (nodes, edges) = {
            let graph = renderer.graph_mut();
            let x = self.jitter.coordinate();
            let y = self.jitter.coordinate();
            graph.add_node(GraphNode::new(NodeId::ROOT, root, x, y))?;

            // Pre-order walk; each frame is a parent and its unvisited children.
            let mut stack = vec![(NodeId::ROOT, peers.iter())];
            while let Some((parent, siblings)) = stack.last_mut() {
                let parent = *parent;
                let Some(peer) = siblings.next() else {
                    stack.pop();
                    continue;
                };
                if !graph.contains_node(peer.node_id) {
                    let x = self.jitter.coordinate();
                    let y = self.jitter.coordinate();
                    graph.add_node(GraphNode::new(peer.node_id, peer.node_id, x, y))?;
                }
                graph.add_edge(GraphEdge {
                    id: self.edge_ids.next_id(),
                    source: parent,
                    target: peer.node_id,
                    size: self.jitter.edge_size(),
                    kind: EdgeKind::Tapered,
                })?;
                if let Some(subs) = peer.subs.as_deref() {
                    stack.push((peer.node_id, subs.iter()));
                }
            }
            (graph.node_count(), graph.edge_count())
        };

        renderer.refresh();
        renderer.start_layout();
        renderer.schedule_layout_stop(self.settle);
        renderer.enable_drag();
        debug!(root, nodes, edges, "mesh graph rebuilt");
        Ok(RebuildOutcome::Rebuilt { nodes, edges })
    }
}

fn normalize_root(root: Option<&str>) -> Option<&str> {
    root.map(str::trim).filter(|root| !root.is_empty())
}

#[cfg(test)]
mod tests {
    use std::fmt::Write as _;

    use expect_test::expect;

    use super::*;
    use crate::graph::GraphModel;

    /// Counts up in small steps so positions are predictable.
    struct StepJitter(f64);

    impl Jitter for StepJitter {
        fn coordinate(&mut self) -> f64 {
            self.0 = (self.0 + 0.125) % 1.0;
            self.0
        }
    }

    #[derive(Default)]
    struct RecordingRenderer {
        graph: GraphModel,
        calls: Vec<String>,
    }

    impl GraphRenderer for RecordingRenderer {
        fn graph(&self) -> &GraphModel {
            &self.graph
        }

        fn graph_mut(&mut self) -> &mut GraphModel {
            &mut self.graph
        }

        fn refresh(&mut self) {
            self.calls.push("refresh".into());
        }

        fn start_layout(&mut self) {
            self.calls.push("start_layout".into());
        }

        fn schedule_layout_stop(&mut self, after: Duration) {
            self.calls.push(format!("stop_after {}ms", after.as_millis()));
        }

        fn enable_drag(&mut self) {
            self.calls.push("enable_drag".into());
        }
    }

    fn dump(graph: &GraphModel) -> String {
        let mut out = String::new();
        for node in graph.nodes() {
            writeln!(out, "node {} {:?} @({}, {})", node.id, node.label, node.x, node.y).unwrap();
        }
        for edge in graph.edges() {
            writeln!(out, "edge #{} {} -> {}", edge.id.0, edge.source, edge.target).unwrap();
        }
        out
    }

    #[test]
    fn rebuild_walks_depth_first_in_input_order() {
        let mut ingestor = TopologyIngestor::with_jitter(StepJitter(0.0));
        let mut renderer = RecordingRenderer::default();
        let raw = r#"[
            {"nodeId": 11, "subs": [{"nodeId": 21, "subs": [{"nodeId": 31}]}, {"nodeId": 22}]},
            {"nodeId": 12, "subs": null}
        ]"#;
        ingestor
            .rebuild_graph(&mut renderer, Some("3001"), raw)
            .unwrap();

        expect![[r#"
            node 0 "Node 3001" @(0.125, 0.25)
            node 11 "Node 11" @(0.375, 0.5)
            node 21 "Node 21" @(0.75, 0.875)
            node 31 "Node 31" @(0.125, 0.25)
            node 22 "Node 22" @(0.5, 0.625)
            node 12 "Node 12" @(0.875, 0)
            edge #1 0 -> 11
            edge #2 11 -> 21
            edge #3 21 -> 31
            edge #4 11 -> 22
            edge #5 0 -> 12
        "#]]
        .assert_eq(&dump(&renderer.graph));
    }

    #[test]
    fn rebuild_drives_renderer_after_population() {
        let mut ingestor = TopologyIngestor::new().with_settle(Duration::from_millis(2500));
        let mut renderer = RecordingRenderer::default();
        ingestor
            .rebuild_graph(&mut renderer, Some("1"), r#"[{"nodeId":2}]"#)
            .unwrap();
        assert_eq!(
            renderer.calls,
            vec!["refresh", "start_layout", "stop_after 2500ms", "enable_drag"]
        );
    }

    #[test]
    fn blank_root_is_skipped() {
        let mut ingestor = TopologyIngestor::new();
        let mut renderer = RecordingRenderer::default();
        let outcome = ingestor
            .rebuild_graph(&mut renderer, Some("   "), "not even json")
            .unwrap();
        assert_eq!(outcome, RebuildOutcome::Skipped);
        assert!(renderer.calls.is_empty());
    }

    #[test]
    fn reserved_id_clears_and_rejects() {
        let mut ingestor = TopologyIngestor::new();
        let mut renderer = RecordingRenderer::default();
        ingestor
            .rebuild_graph(&mut renderer, Some("1"), r#"[{"nodeId":2}]"#)
            .unwrap();
        let err = ingestor
            .rebuild_graph(&mut renderer, Some("1"), r#"[{"nodeId":2,"subs":[{"nodeId":0}]}]"#)
            .unwrap_err();
        assert_eq!(err, TopologyError::ReservedNodeId(NodeId::ROOT));
        assert!(renderer.graph.is_empty());
        assert_eq!(renderer.calls.len(), 4);
    }
}
