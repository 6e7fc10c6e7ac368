//! Node/edge projection of the graph store.
//!
//! The canvas follows the store through a `watch` subscription and owns the
//! presentation-only state the store knows nothing about: node positions,
//! entrance animation flags and the delayed edge reveal. Timer work is kept on
//! a `Timeline`; a newer projection bumps the epoch and older tasks become
//! no-ops when they fire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use azdraft_core::{Connection, GraphSnapshot, Position, Resource};
use tokio::sync::watch;

use crate::config::CanvasConfig;
use crate::timeline::Timeline;
use crate::view::{EdgeView, NodeView};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CanvasTask {
    EndEntrance { epoch: u64 },
    RevealEdges { epoch: u64 },
}

pub struct Canvas {
    config: CanvasConfig,
    source: watch::Receiver<GraphSnapshot>,
    nodes: Vec<NodeView>,
    edges: Vec<EdgeView>,
    connections: Arc<Vec<Connection>>,
    seen_resources: Option<u64>,
    seen_connections: Option<u64>,
    entrance_epoch: u64,
    reveal_epoch: u64,
    timeline: Timeline<CanvasTask>,
}

impl Canvas {
    pub fn new(source: watch::Receiver<GraphSnapshot>, config: CanvasConfig) -> Self {
        Self {
            config,
            source,
            nodes: Vec::new(),
            edges: Vec::new(),
            connections: Arc::new(Vec::new()),
            seen_resources: None,
            seen_connections: None,
            entrance_epoch: 0,
            reveal_epoch: 0,
            timeline: Timeline::new(),
        }
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[NodeView] {
        &self.nodes
    }

    pub fn edges(&self) -> &[EdgeView] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn is_animating(&self) -> bool {
        self.nodes.iter().any(|n| n.data.animate)
    }

    /// Whether edges are waiting for their delayed reveal.
    pub fn reveal_pending(&self) -> bool {
        self.edges.len() != self.connections.len()
            || self
                .edges
                .iter()
                .zip(self.connections.iter())
                .any(|(e, c)| e.id != c.id)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timeline.next_deadline()
    }

    /// Replace the subscription, e.g. after the session swapped its store.
    /// Everything currently projected is dropped.
    pub fn rebind(&mut self, source: watch::Receiver<GraphSnapshot>) {
        self.source = source;
        self.nodes.clear();
        self.edges.clear();
        self.connections = Arc::new(Vec::new());
        self.seen_resources = None;
        self.seen_connections = None;
        self.entrance_epoch += 1;
        self.reveal_epoch += 1;
        self.timeline.clear();
    }

    /// Pull the latest store state and reproject what changed.
    /// Returns true when the visible node or edge list changed.
    pub fn refresh(&mut self, now: Duration) -> bool {
        let snapshot = self.source.borrow_and_update().clone();
        let mut changed = false;

        if self.seen_resources != Some(snapshot.resources_version) {
            self.seen_resources = Some(snapshot.resources_version);
            changed |= self.project_nodes(&snapshot.resources, now);
        }
        if self.seen_connections != Some(snapshot.connections_version) {
            self.seen_connections = Some(snapshot.connections_version);
            changed |= self.project_edges(snapshot.connections.clone(), now);
        }
        changed
    }

    /// Run every timeline task due at `now`. Returns true when anything
    /// visible changed.
    pub fn advance(&mut self, now: Duration) -> bool {
        let mut changed = false;
        for task in self.timeline.due(now) {
            match task {
                CanvasTask::EndEntrance { epoch } if epoch == self.entrance_epoch => {
                    for node in &mut self.nodes {
                        if node.data.animate {
                            node.data.animate = false;
                            changed = true;
                        }
                    }
                }
                CanvasTask::RevealEdges { epoch } if epoch == self.reveal_epoch => {
                    let stagger = self.config.edge_stagger_ms;
                    self.edges = self
                        .connections
                        .iter()
                        .enumerate()
                        .map(|(i, c)| EdgeView::new(c, i, stagger))
                        .collect();
                    tracing::debug!(edges = self.edges.len(), "edges revealed");
                    changed = true;
                }
                superseded => tracing::trace!(?superseded, "ignoring superseded canvas task"),
            }
        }
        changed
    }

    /// Put every node back on the grid in its current order.
    pub fn auto_layout(&mut self) {
        for (i, node) in self.nodes.iter_mut().enumerate() {
            node.position = self.config.grid_position(i);
        }
    }

    /// Manual drag. The position survives later projections.
    pub fn move_node(&mut self, id: &str, position: Position) -> bool {
        match self.nodes.iter_mut().find(|n| n.id == id) {
            Some(node) => {
                node.position = position;
                true
            }
            None => false,
        }
    }

    fn project_nodes(&mut self, resources: &[Resource], now: Duration) -> bool {
        let mut previous: HashMap<String, NodeView> = self
            .nodes
            .drain(..)
            .map(|n| (n.id.clone(), n))
            .collect();
        let mut entered = 0usize;

        let nodes: Vec<NodeView> = resources
            .iter()
            .enumerate()
            .map(|(i, resource)| match previous.remove(&resource.id) {
                Some(mut node) => {
                    node.sync_from(resource);
                    node
                }
                None => {
                    entered += 1;
                    let position = resource
                        .position
                        .unwrap_or_else(|| self.config.grid_position(i));
                    NodeView::new(resource, position)
                }
            })
            .collect();
        let removed = previous.len();
        self.nodes = nodes;

        if entered > 0 {
            self.entrance_epoch += 1;
            self.timeline.schedule_after(
                now,
                Duration::from_millis(self.config.entrance_ms),
                CanvasTask::EndEntrance {
                    epoch: self.entrance_epoch,
                },
            );
        }
        tracing::debug!(
            nodes = self.nodes.len(),
            entered,
            removed,
            "nodes projected"
        );
        true
    }

    fn project_edges(&mut self, connections: Arc<Vec<Connection>>, now: Duration) -> bool {
        let live: HashMap<&str, &Connection> =
            connections.iter().map(|c| (c.id.as_str(), c)).collect();
        let before = self.edges.len();
        self.edges.retain(|e| live.contains_key(e.id.as_str()));
        let dropped = before - self.edges.len();
        // Edges already on screen pick up a new type or label right away.
        let mut restyled = 0usize;
        for edge in &mut self.edges {
            if let Some(connection) = live.get(edge.id.as_str()) {
                if edge.sync_from(connection) {
                    restyled += 1;
                }
            }
        }
        self.connections = connections;

        self.reveal_epoch += 1;
        if self.connections.is_empty() {
            tracing::debug!(dropped, "edges cleared");
        } else {
            self.timeline.schedule_after(
                now,
                Duration::from_millis(self.config.edge_reveal_ms),
                CanvasTask::RevealEdges {
                    epoch: self.reveal_epoch,
                },
            );
        }
        dropped > 0 || restyled > 0
    }
}
