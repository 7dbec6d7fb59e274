//! Connection manager: turns connect/disconnect requests into discrete,
//! individually reversible actions.
//!
//! Rejected connections are not errors. Dragging onto a handle that is
//! already connected, or back onto the source node, is a routine no-op for
//! the user, so it comes back as `ConnectOutcome::Ignored`.

use flow_core::{Connection, Edge, EdgeId, FlowGraph, GraphError, NodeId};
use smallvec::SmallVec;

/// A single edge edit, as recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionAction {
    Add(Edge),
    Remove(Edge),
}

impl ConnectionAction {
    pub fn edge(&self) -> &Edge {
        match self {
            ConnectionAction::Add(edge) | ConnectionAction::Remove(edge) => edge,
        }
    }
}

/// Why a connect request was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    SelfLoop,
    Duplicate,
    MissingEndpoint(NodeId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOutcome {
    Connected(Edge),
    Ignored(Rejection),
}

impl ConnectOutcome {
    pub fn edge(&self) -> Option<&Edge> {
        match self {
            ConnectOutcome::Connected(edge) => Some(edge),
            ConnectOutcome::Ignored(_) => None,
        }
    }

    pub fn action(&self) -> Option<ConnectionAction> {
        self.edge().map(|edge| ConnectionAction::Add(*edge))
    }
}

pub fn connect(graph: &mut FlowGraph, connection: Connection) -> ConnectOutcome {
    match graph.add_edge(connection) {
        Ok(edge) => {
            log::debug!("connected {connection} as {}", edge.id);
            ConnectOutcome::Connected(edge)
        }
        Err(err) => {
            log::debug!("ignoring connection {connection}: {err}");
            ConnectOutcome::Ignored(match err {
                GraphError::SelfLoop(_) => Rejection::SelfLoop,
                GraphError::NotFound(id) => Rejection::MissingEndpoint(id),
                _ => Rejection::Duplicate,
            })
        }
    }
}

/// Remove one edge. Unknown ids yield `None`.
pub fn disconnect(graph: &mut FlowGraph, id: EdgeId) -> Option<ConnectionAction> {
    graph.remove_edge(id).map(ConnectionAction::Remove)
}

/// Remove several edges at once (multi-select delete), one action per
/// removed edge so each stays individually undoable.
pub fn disconnect_all(
    graph: &mut FlowGraph,
    ids: impl IntoIterator<Item = EdgeId>,
) -> SmallVec<[ConnectionAction; 4]> {
    ids.into_iter().filter_map(|id| disconnect(graph, id)).collect()
}
