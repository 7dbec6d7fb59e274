//! The canonical node/edge set of a diagram.
//!
//! Nodes and edges live in a petgraph `StableDiGraph` so node removal
//! cascades to incident edges and indices stay valid across removals.
//! Side indexes map node ids, edge ids, and entity ids to graph indices.
//!
//! Invariants upheld by every mutation:
//! - node ids are unique, and each entity is represented by at most one node;
//! - no edge connects a node to itself;
//! - no two edges share the same `(source, source_handle, target, target_handle)`.

use crate::diagram::GraphData;
use crate::error::GraphError;
use crate::id::{EdgeId, EntityId, NodeId};
use crate::model::{Connection, ContentPatch, Edge, Node, NodeContent, Position};
use petgraph::Direction;
use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use smallvec::SmallVec;
use std::collections::HashMap;

/// Edges dropped alongside a removed node.
pub type CascadedEdges = SmallVec<[Edge; 4]>;

#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    graph: StableDiGraph<Node, Edge>,
    id_index: HashMap<NodeId, NodeIndex>,
    edge_index: HashMap<EdgeId, EdgeIndex>,
    entity_index: HashMap<EntityId, NodeId>,
    /// Node ids in insertion order.
    order: Vec<NodeId>,
    next_edge_seq: u64,
}

impl FlowGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a graph from persisted data, validating every invariant.
    pub fn from_data(data: GraphData) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for node in data.nodes {
            graph.add_node(node)?;
        }
        for edge in data.edges {
            graph.insert_edge(edge)?;
        }
        graph.next_edge_seq = graph.edge_index.len() as u64;
        Ok(graph)
    }

    /// Snapshot nodes (insertion order) and edges (sorted by id) for persistence.
    pub fn to_data(&self) -> GraphData {
        GraphData {
            nodes: self.nodes().cloned().collect(),
            edges: self.edge_list(),
        }
    }

    // ─── Nodes ───────────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.id_index.contains_key(&node.id) {
            return Err(GraphError::DuplicateId(node.id));
        }
        if let Some(entity) = node.entity_id()
            && self.entity_index.contains_key(&entity)
        {
            return Err(GraphError::DuplicateEntity(entity));
        }

        let id = node.id;
        if let Some(entity) = node.entity_id() {
            self.entity_index.insert(entity, id);
        }
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        self.order.push(id);
        Ok(())
    }

    /// Remove a node and every edge touching it. Absent ids are a no-op.
    pub fn remove_node(&mut self, id: NodeId) -> Option<(Node, CascadedEdges)> {
        let idx = self.id_index.remove(&id)?;

        let incident: Vec<EdgeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| e.id())
            .collect();
        let mut cascaded = CascadedEdges::new();
        for eidx in incident {
            if let Some(edge) = self.graph.remove_edge(eidx) {
                self.edge_index.remove(&edge.id);
                cascaded.push(edge);
            }
        }

        let node = self.graph.remove_node(idx)?;
        if let Some(entity) = node.entity_id() {
            self.entity_index.remove(&entity);
        }
        self.order.retain(|n| *n != id);
        Some((node, cascaded))
    }

    /// Merge `patch` into a node's content. Position is never touched.
    /// Returns whether the content actually changed.
    pub fn update_node_payload(&mut self, id: NodeId, patch: &ContentPatch) -> Result<bool, GraphError> {
        let idx = self.index_of(id).ok_or(GraphError::NotFound(id))?;
        patch.apply_to(id, &mut self.graph[idx].content)
    }

    /// Replace a node's content wholesale, keeping its position.
    pub fn set_content(&mut self, id: NodeId, content: NodeContent) -> Result<(), GraphError> {
        let idx = self.index_of(id).ok_or(GraphError::NotFound(id))?;
        let old_entity = self.graph[idx].entity_id();
        let new_entity = content.entity_id();

        if old_entity != new_entity {
            if let Some(entity) = new_entity
                && self.entity_index.contains_key(&entity)
            {
                return Err(GraphError::DuplicateEntity(entity));
            }
            if let Some(entity) = old_entity {
                self.entity_index.remove(&entity);
            }
            if let Some(entity) = new_entity {
                self.entity_index.insert(entity, id);
            }
        }

        self.graph[idx].content = content;
        Ok(())
    }

    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        let idx = self.index_of(id).ok_or(GraphError::NotFound(id))?;
        self.graph[idx].position = position;
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    pub fn contains_node(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.order.iter().filter_map(|id| self.node(*id))
    }

    pub fn node_count(&self) -> usize {
        self.order.len()
    }

    /// The node bound to `entity`, if any.
    pub fn node_for_entity(&self, entity: EntityId) -> Option<NodeId> {
        self.entity_index.get(&entity).copied()
    }

    fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    // ─── Edges ───────────────────────────────────────────────────────────

    /// Validate and insert a new edge, generating its id.
    pub fn add_edge(&mut self, connection: Connection) -> Result<Edge, GraphError> {
        self.validate(&connection)?;

        let id = loop {
            let candidate = EdgeId::derive(
                connection.source,
                connection.source_handle,
                connection.target,
                connection.target_handle,
                self.next_edge_seq,
            );
            self.next_edge_seq += 1;
            if !self.edge_index.contains_key(&candidate) {
                break candidate;
            }
        };

        let edge = Edge { id, connection };
        self.link(edge);
        Ok(edge)
    }

    /// Insert an edge that already has an id (restored from history or
    /// persisted data). Subject to the same invariants as `add_edge`.
    pub fn insert_edge(&mut self, edge: Edge) -> Result<(), GraphError> {
        self.validate(&edge.connection)?;
        if self.edge_index.contains_key(&edge.id) {
            return Err(GraphError::DuplicateEdge(edge.connection));
        }
        self.link(edge);
        Ok(())
    }

    /// Remove an edge by id. Absent ids are a no-op.
    pub fn remove_edge(&mut self, id: EdgeId) -> Option<Edge> {
        let eidx = self.edge_index.remove(&id)?;
        self.graph.remove_edge(eidx)
    }

    /// Drop every edge and insert `edges` instead. Edges that no longer fit
    /// the graph (missing endpoint, duplicate tuple) are skipped; returns how
    /// many were skipped.
    pub fn replace_edges(&mut self, edges: &[Edge]) -> usize {
        for (_, eidx) in self.edge_index.drain() {
            self.graph.remove_edge(eidx);
        }

        let mut skipped = 0;
        for edge in edges {
            if let Err(err) = self.insert_edge(*edge) {
                log::warn!("skipping edge {} while restoring edges: {err}", edge.id);
                skipped += 1;
            }
        }
        skipped
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edge_index
            .get(&id)
            .and_then(|eidx| self.graph.edge_weight(*eidx))
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.graph
            .edge_indices()
            .filter_map(|eidx| self.graph.edge_weight(eidx))
    }

    /// All edges, sorted by id.
    pub fn edge_list(&self) -> Vec<Edge> {
        let mut edges: Vec<Edge> = self.edges().copied().collect();
        edges.sort_by(|a, b| a.id.cmp(&b.id));
        edges
    }

    pub fn edge_count(&self) -> usize {
        self.edge_index.len()
    }

    /// Edges touching `node` in either direction.
    pub fn edges_of(&self, node: NodeId) -> Vec<Edge> {
        let Some(idx) = self.index_of(node) else {
            return Vec::new();
        };
        self.graph
            .edges_directed(idx, Direction::Outgoing)
            .chain(self.graph.edges_directed(idx, Direction::Incoming))
            .map(|e| *e.weight())
            .collect()
    }

    /// Whether an edge with exactly this handle tuple exists.
    pub fn has_connection(&self, connection: &Connection) -> bool {
        match (self.index_of(connection.source), self.index_of(connection.target)) {
            (Some(s), Some(t)) => self
                .graph
                .edges_directed(s, Direction::Outgoing)
                .filter(|e| e.target() == t)
                .any(|e| e.weight().connection == *connection),
            _ => false,
        }
    }

    fn validate(&self, connection: &Connection) -> Result<(), GraphError> {
        if connection.is_self_loop() {
            return Err(GraphError::SelfLoop(connection.source));
        }
        if !self.contains_node(connection.source) {
            return Err(GraphError::NotFound(connection.source));
        }
        if !self.contains_node(connection.target) {
            return Err(GraphError::NotFound(connection.target));
        }
        if self.has_connection(connection) {
            return Err(GraphError::DuplicateEdge(*connection));
        }
        Ok(())
    }

    /// Insert a validated edge into the graph and the id index.
    fn link(&mut self, edge: Edge) {
        let (Some(s), Some(t)) = (
            self.index_of(edge.connection.source),
            self.index_of(edge.connection.target),
        ) else {
            return;
        };
        let eidx = self.graph.add_edge(s, t, edge);
        self.edge_index.insert(edge.id, eidx);
    }
}
