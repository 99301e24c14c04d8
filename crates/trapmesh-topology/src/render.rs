//! Renderer seam and a renderer driven by [`ForceLayout`].

use std::collections::HashSet;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::graph::{GraphModel, NodeId};
use crate::layout::{ForceLayout, LayoutParams};

/// What the ingestor needs from a rendering engine.
pub trait GraphRenderer {
    /// Graph model currently displayed.
    fn graph(&self) -> &GraphModel;

    /// Graph model for the ingestor to rebuild.
    fn graph_mut(&mut self) -> &mut GraphModel;

    /// Redraws from the current graph model.
    fn refresh(&mut self);

    /// Starts the automatic force-directed layout.
    fn start_layout(&mut self);

    /// Stops the layout once `after` has elapsed. A later call replaces an
    /// earlier one.
    fn schedule_layout_stop(&mut self, after: Duration);

    /// Lets the user reposition nodes by hand.
    fn enable_drag(&mut self);
}

/// Renderer that owns the graph and advances a [`ForceLayout`] on each tick
/// until the scheduled stop time.
#[derive(Debug, Default)]
pub struct LayoutRenderer {
    graph: GraphModel,
    layout: ForceLayout,
    running: bool,
    stop_at: Option<Instant>,
    drag_enabled: bool,
    pinned: HashSet<NodeId>,
    refreshes: u64,
}

impl LayoutRenderer {
    /// Renderer with the default layout parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Renderer with tuned layout forces.
    #[must_use]
    pub fn with_params(params: LayoutParams) -> Self {
        Self {
            layout: ForceLayout::new(params),
            ..Self::default()
        }
    }

    /// Whether [`Self::tick`] still advances the layout.
    #[must_use]
    pub fn is_layout_running(&self) -> bool {
        self.running
    }

    /// When the running layout will be stopped.
    #[must_use]
    pub fn layout_deadline(&self) -> Option<Instant> {
        self.stop_at
    }

    /// Whether nodes may be dragged.
    #[must_use]
    pub fn drag_enabled(&self) -> bool {
        self.drag_enabled
    }

    /// Number of redraw requests so far.
    #[must_use]
    pub fn refresh_count(&self) -> u64 {
        self.refreshes
    }

    /// Stops the layout now and drops the pending deadline.
    pub fn stop_layout(&mut self) {
        if self.running {
            debug!("mesh layout stopped");
        }
        self.running = false;
        self.stop_at = None;
    }

    /// Runs one layout step if the layout is active, stopping it first when
    /// the deadline has passed. Returns whether a step ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if !self.running {
            return false;
        }
        if self.stop_at.is_some_and(|deadline| now >= deadline) {
            self.stop_layout();
            return false;
        }
        self.layout.step(&mut self.graph, &self.pinned);
        true
    }

    /// Moves a node by hand and pins it there. Ignored until drag is enabled.
    pub fn drag_node(&mut self, id: NodeId, x: f64, y: f64) -> bool {
        if !self.drag_enabled {
            return false;
        }
        let Some(node) = self.graph.node_mut(id) else {
            return false;
        };
        node.x = x;
        node.y = y;
        self.pinned.insert(id);
        true
    }

    /// Lets a dragged node move with the layout again.
    pub fn release_node(&mut self, id: NodeId) -> bool {
        self.pinned.remove(&id)
    }

    /// `(min_x, max_x, min_y, max_y)` over all nodes.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.graph.nodes().fold(None, |acc, node| {
            Some(match acc {
                None => (node.x, node.x, node.y, node.y),
                Some((min_x, max_x, min_y, max_y)) => (
                    min_x.min(node.x),
                    max_x.max(node.x),
                    min_y.min(node.y),
                    max_y.max(node.y),
                ),
            })
        })
    }
}

impl GraphRenderer for LayoutRenderer {
    fn graph(&self) -> &GraphModel {
        &self.graph
    }

    fn graph_mut(&mut self) -> &mut GraphModel {
        &mut self.graph
    }

    fn refresh(&mut self) {
        self.refreshes += 1;
        self.pinned.retain(|id| self.graph.contains_node(*id));
    }

    fn start_layout(&mut self) {
        self.layout.reset();
        self.running = true;
    }

    fn schedule_layout_stop(&mut self, after: Duration) {
        self.stop_at = Some(Instant::now() + after);
    }

    fn enable_drag(&mut self) {
        self.drag_enabled = true;
    }
}
