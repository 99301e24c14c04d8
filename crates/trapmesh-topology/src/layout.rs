//! Force-directed layout for the mesh graph.

#![allow(missing_docs)]

use std::collections::HashSet;
use std::f64::consts::TAU;

use crate::graph::{GraphModel, NodeId};

/// Tuning for [`ForceLayout`]. Distances are in the unit square the
/// ingestor scatters nodes into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutParams {
    pub repulsion: f64,
    pub spring: f64,
    pub link_distance: f64,
    pub gravity: f64,
    pub damping: f64,
    pub max_step: f64,
    pub dt: f64,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            repulsion: 0.004,
            spring: 0.6,
            link_distance: 0.2,
            gravity: 0.05,
            damping: 0.85,
            max_step: 0.05,
            dt: 0.5,
        }
    }
}

/// Pairwise repulsion, springs along edges and a pull toward the centre.
#[derive(Debug, Clone, Default)]
pub struct ForceLayout {
    params: LayoutParams,
    velocities: Vec<(f64, f64)>,
}

impl ForceLayout {
    #[must_use]
    pub fn new(params: LayoutParams) -> Self {
        Self {
            params,
            velocities: Vec::new(),
        }
    }

    #[must_use]
    pub fn params(&self) -> &LayoutParams {
        &self.params
    }

    /// Forgets accumulated velocities.
    pub fn reset(&mut self) {
        self.velocities.clear();
    }

    /// Advances the simulation one step. Pinned nodes exert forces but do not
    /// move. Returns the total distance moved.
    pub fn step(&mut self, graph: &mut GraphModel, pinned: &HashSet<NodeId>) -> f64 {
        let count = graph.node_count();
        if count == 0 {
            return 0.0;
        }
        let params = self.params;
        let positions: Vec<(f64, f64)> = graph.nodes().map(|node| (node.x, node.y)).collect();
        let mut forces = vec![(0.0_f64, 0.0_f64); count];

        for i in 0..count {
            for j in (i + 1)..count {
                let dx = positions[i].0 - positions[j].0;
                let dy = positions[i].1 - positions[j].1;
                let distance_sq = dx * dx + dy * dy;
                let distance = distance_sq.sqrt();
                let direction = if distance > 1e-6 {
                    (dx / distance, dy / distance)
                } else {
                    // Coincident nodes: push apart along a fixed angle per pair.
                    let angle = ((i as f64) * 0.618_034 + (j as f64) * 0.414_214) * TAU;
                    (angle.cos(), angle.sin())
                };
                let magnitude = params.repulsion / distance_sq.max(1e-4);
                forces[i].0 += direction.0 * magnitude;
                forces[i].1 += direction.1 * magnitude;
                forces[j].0 -= direction.0 * magnitude;
                forces[j].1 -= direction.1 * magnitude;
            }
        }

        for edge in graph.edges() {
            let (Some(from), Some(to)) = (graph.node_index(edge.source), graph.node_index(edge.target))
            else {
                continue;
            };
            if from == to {
                continue;
            }
            let dx = positions[to].0 - positions[from].0;
            let dy = positions[to].1 - positions[from].1;
            let distance = (dx * dx + dy * dy).sqrt().max(1e-6);
            let stretch = (distance - params.link_distance) * params.spring;
            let fx = dx / distance * stretch;
            let fy = dy / distance * stretch;
            forces[from].0 += fx;
            forces[from].1 += fy;
            forces[to].0 -= fx;
            forces[to].1 -= fy;
        }

        for (force, position) in forces.iter_mut().zip(&positions) {
            force.0 -= position.0 * params.gravity;
            force.1 -= position.1 * params.gravity;
        }

        self.velocities.resize(count, (0.0, 0.0));
        let mut moved = 0.0;
        for (index, node) in graph.nodes_mut().enumerate() {
            if pinned.contains(&node.id) {
                self.velocities[index] = (0.0, 0.0);
                continue;
            }
            let velocity = &mut self.velocities[index];
            velocity.0 = (velocity.0 + forces[index].0 * params.dt) * params.damping;
            velocity.1 = (velocity.1 + forces[index].1 * params.dt) * params.damping;
            let mut step = (velocity.0 * params.dt, velocity.1 * params.dt);
            let length = (step.0 * step.0 + step.1 * step.1).sqrt();
            if length > params.max_step {
                step = (
                    step.0 / length * params.max_step,
                    step.1 / length * params.max_step,
                );
            }
            node.x += step.0;
            node.y += step.1;
            moved += length.min(params.max_step);
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeId, EdgeKind, GraphEdge, GraphNode};

    fn pair(ax: f64, bx: f64, linked: bool) -> GraphModel {
        let mut graph = GraphModel::new();
        graph.add_node(GraphNode::new(NodeId(1), 1, ax, 0.0)).unwrap();
        graph.add_node(GraphNode::new(NodeId(2), 2, bx, 0.0)).unwrap();
        if linked {
            graph
                .add_edge(GraphEdge {
                    id: EdgeId(1),
                    source: NodeId(1),
                    target: NodeId(2),
                    size: 1.0,
                    kind: EdgeKind::Tapered,
                })
                .unwrap();
        }
        graph
    }

    fn gap(graph: &GraphModel) -> f64 {
        let xs: Vec<f64> = graph.nodes().map(|node| node.x).collect();
        (xs[1] - xs[0]).abs()
    }

    #[test]
    fn linked_nodes_far_apart_are_pulled_together() {
        let mut graph = pair(-2.0, 2.0, true);
        let mut layout = ForceLayout::default();
        let pinned = HashSet::new();
        for _ in 0..20 {
            layout.step(&mut graph, &pinned);
        }
        assert!(gap(&graph) < 4.0);
    }

    #[test]
    fn unlinked_nodes_close_together_are_pushed_apart() {
        let mut graph = pair(0.0, 0.01, false);
        let mut layout = ForceLayout::new(LayoutParams {
            gravity: 0.0,
            ..LayoutParams::default()
        });
        layout.step(&mut graph, &HashSet::new());
        assert!(gap(&graph) > 0.01);
    }

    #[test]
    fn coincident_nodes_separate() {
        let mut graph = pair(0.5, 0.5, true);
        let mut layout = ForceLayout::default();
        let moved = layout.step(&mut graph, &HashSet::new());
        assert!(moved > 0.0);
        let nodes: Vec<_> = graph.nodes().collect();
        assert!(nodes[0].x != nodes[1].x || nodes[0].y != nodes[1].y);
    }

    #[test]
    fn pinned_nodes_stay_put() {
        let mut graph = pair(-1.0, 1.0, true);
        let mut layout = ForceLayout::default();
        let pinned = HashSet::from([NodeId(1)]);
        for _ in 0..5 {
            layout.step(&mut graph, &pinned);
        }
        let anchor = graph.node(NodeId(1)).unwrap();
        assert!((anchor.x + 1.0).abs() < f64::EPSILON);
        assert!((graph.node(NodeId(2)).unwrap().x - 1.0).abs() > 1e-6);
    }

    #[test]
    fn empty_graph_does_nothing() {
        let mut graph = GraphModel::new();
        assert!(ForceLayout::default()
            .step(&mut graph, &HashSet::new())
            .abs()
            < f64::EPSILON);
    }
}
