//! Undo/redo history.
//!
//! History is an append-only list of entries plus a cursor. Recording while
//! the cursor is behind the end truncates the redo tail first.
//!
//! Two kinds of entry are recorded:
//!
//! - **Content entries** capture every node's kind and payload plus the full
//!   edge set. Undoing one restores the previous entry's content and edges.
//! - **Connection entries** capture a single edge add or remove. Undoing one
//!   reverses exactly that edge, leaving every other edge alone.
//!
//! Positions are never captured. Undo and redo restore content onto nodes at
//! their *live* positions, so dragging never pollutes the stack and never
//! gets reverted by an unrelated undo.

use crate::connect::ConnectionAction;
use flow_core::{Edge, FlowGraph, NodeContent, NodeId};

/// One node's kind and payload at a point in history.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentEntry {
    pub id: NodeId,
    pub content: NodeContent,
}

/// What an entry records beyond its content snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    /// Bulk content edit, with the full edge set at that point.
    Content { edges: Vec<Edge> },
    /// A single connection edit.
    Connection(ConnectionAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    /// Every node's content, in graph order. Positions excluded.
    pub content: Vec<ContentEntry>,
    pub record: Record,
}

/// Whether graph mutations are user edits or history replaying itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Live,
    Replaying,
}

/// A graph mutation planned by `undo`/`redo`.
#[derive(Debug, Clone, PartialEq)]
pub enum Replay {
    InsertEdge(Edge),
    RemoveEdge(Edge),
    Restore {
        content: Vec<ContentEntry>,
        edges: Vec<Edge>,
    },
}

impl Replay {
    /// Apply onto the live graph. Content is matched by node id; nodes keep
    /// their current positions. Snapshot nodes that no longer exist are skipped.
    pub fn apply(&self, graph: &mut FlowGraph) {
        match self {
            Replay::InsertEdge(edge) => {
                if let Err(err) = graph.insert_edge(*edge) {
                    log::warn!("cannot restore edge {}: {err}", edge.id);
                }
            }
            Replay::RemoveEdge(edge) => {
                graph.remove_edge(edge.id);
            }
            Replay::Restore { content, edges } => {
                for entry in content {
                    if !graph.contains_node(entry.id) {
                        log::debug!("node {} is gone, not restoring its content", entry.id);
                        continue;
                    }
                    if let Err(err) = graph.set_content(entry.id, entry.content.clone()) {
                        log::warn!("cannot restore content of {}: {err}", entry.id);
                    }
                }
                graph.replace_edges(edges);
            }
        }
    }
}

/// Undo/redo stack over content snapshots and connection actions.
#[derive(Debug, Default)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Index of the entry matching the live state; `None` when empty.
    cursor: Option<usize>,
    mode: Mode,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Switch between live recording and replay. While `Replaying`, every
    /// `record_*` call is ignored.
    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor.is_some_and(|c| c > 0)
    }

    pub fn can_redo(&self) -> bool {
        self.cursor.is_some_and(|c| c + 1 < self.entries.len())
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = None;
    }

    /// Record a bulk content change. Returns `false` if skipped during replay.
    pub fn record_content_change(&mut self, graph: &FlowGraph) -> bool {
        if self.mode == Mode::Replaying {
            log::trace!("replaying, content change not recorded");
            return false;
        }
        self.push(HistoryEntry {
            content: snapshot(graph),
            record: Record::Content {
                edges: graph.edge_list(),
            },
        });
        true
    }

    /// Record a single connection edit. Returns `false` if skipped during replay.
    pub fn record_connection_action(&mut self, action: ConnectionAction, graph: &FlowGraph) -> bool {
        if self.mode == Mode::Replaying {
            log::trace!("replaying, connection action not recorded");
            return false;
        }
        self.push(HistoryEntry {
            content: snapshot(graph),
            record: Record::Connection(action),
        });
        true
    }

    /// Plan the reversal of the entry at the cursor and step back.
    /// `None` at the start of history.
    pub fn undo(&mut self) -> Option<Replay> {
        let cursor = self.cursor.filter(|&c| c > 0)?;
        let replay = match &self.entries[cursor].record {
            Record::Connection(ConnectionAction::Add(edge)) => Replay::RemoveEdge(*edge),
            Record::Connection(ConnectionAction::Remove(edge)) => Replay::InsertEdge(*edge),
            Record::Content { .. } => Replay::Restore {
                content: self.entries[cursor - 1].content.clone(),
                edges: self.edges_at(cursor - 1),
            },
        };
        self.cursor = Some(cursor - 1);
        log::debug!("undo: cursor {cursor} -> {}", cursor - 1);
        Some(replay)
    }

    /// Plan the re-application of the entry after the cursor and step
    /// forward. `None` at the end of history.
    pub fn redo(&mut self) -> Option<Replay> {
        let next = self.cursor.map(|c| c + 1).filter(|&n| n < self.entries.len())?;
        let entry = &self.entries[next];
        let replay = match &entry.record {
            Record::Connection(ConnectionAction::Add(edge)) => Replay::InsertEdge(*edge),
            Record::Connection(ConnectionAction::Remove(edge)) => Replay::RemoveEdge(*edge),
            Record::Content { edges } => Replay::Restore {
                content: entry.content.clone(),
                edges: edges.clone(),
            },
        };
        self.cursor = Some(next);
        log::debug!("redo: cursor {} -> {next}", next - 1);
        Some(replay)
    }

    /// Undo directly onto `graph`, suppressing recording for the duration.
    pub fn undo_on(&mut self, graph: &mut FlowGraph) -> bool {
        match self.undo() {
            Some(replay) => {
                self.replay(&replay, graph);
                true
            }
            None => false,
        }
    }

    /// Redo directly onto `graph`, suppressing recording for the duration.
    pub fn redo_on(&mut self, graph: &mut FlowGraph) -> bool {
        match self.redo() {
            Some(replay) => {
                self.replay(&replay, graph);
                true
            }
            None => false,
        }
    }

    fn replay(&mut self, replay: &Replay, graph: &mut FlowGraph) {
        self.mode = Mode::Replaying;
        replay.apply(graph);
        self.mode = Mode::Live;
    }

    fn push(&mut self, entry: HistoryEntry) {
        let keep = self.cursor.map_or(0, |c| c + 1);
        self.entries.truncate(keep);
        self.entries.push(entry);
        self.cursor = Some(self.entries.len() - 1);
    }

    /// The edge set as it stood at `index`: the nearest earlier content
    /// entry's snapshot with the connection actions since replayed on top.
    fn edges_at(&self, index: usize) -> Vec<Edge> {
        let base = self.entries[..=index]
            .iter()
            .rposition(|e| matches!(e.record, Record::Content { .. }));
        let (mut edges, start) = match base {
            Some(i) => match &self.entries[i].record {
                Record::Content { edges } => (edges.clone(), i + 1),
                Record::Connection(_) => (Vec::new(), i + 1),
            },
            None => (Vec::new(), 0),
        };

        for entry in &self.entries[start..=index] {
            match entry.record {
                Record::Connection(ConnectionAction::Add(edge)) => {
                    if !edges.iter().any(|e| e.id == edge.id) {
                        edges.push(edge);
                    }
                }
                Record::Connection(ConnectionAction::Remove(edge)) => {
                    edges.retain(|e| e.id != edge.id);
                }
                Record::Content { .. } => {}
            }
        }
        edges
    }
}

fn snapshot(graph: &FlowGraph) -> Vec<ContentEntry> {
    graph
        .nodes()
        .map(|node| ContentEntry {
            id: node.id,
            content: node.content.clone(),
        })
        .collect()
}
