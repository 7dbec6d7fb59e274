//! Node and edge data model for task-flow diagrams.
//!
//! A node is a draggable card bound to a domain entity. Its content is a
//! closed tagged union keyed by kind, so every payload shape is checked
//! exhaustively. Position lives beside the content, never inside it: history
//! snapshots capture content only.

use crate::error::GraphError;
use crate::id::{EdgeId, EntityId, HandleId, NodeId};
use serde::{Deserialize, Serialize};
use std::fmt;

// ─── Position ────────────────────────────────────────────────────────────

/// Canvas coordinate of a node's top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// ─── Task payload ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        })
    }
}

/// Content of an entity card: the fields of the task it represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskCard {
    pub entity_id: EntityId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub priority: Priority,
}

/// Partial update of a task. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
    }

    /// Merge into `card`, returning whether any field changed.
    pub fn apply_to(&self, card: &mut TaskCard) -> bool {
        let mut changed = false;
        if let Some(title) = &self.title
            && card.title != *title
        {
            card.title = title.clone();
            changed = true;
        }
        if let Some(description) = &self.description
            && card.description != *description
        {
            card.description = description.clone();
            changed = true;
        }
        if let Some(completed) = self.completed
            && card.completed != completed
        {
            card.completed = completed;
            changed = true;
        }
        if let Some(priority) = self.priority
            && card.priority != priority
        {
            card.priority = priority;
            changed = true;
        }
        changed
    }
}

// ─── Node content ────────────────────────────────────────────────────────

/// Discriminator selecting which renderer and behavior apply to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    EntityCard,
    Label,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::EntityCard => "entity-card",
            NodeKind::Label => "label",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Node payload, tagged by kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum NodeContent {
    /// A card bound to a task entity.
    #[serde(rename = "entity-card")]
    TaskCard(TaskCard),
    /// A free-standing labelled node.
    #[serde(rename = "label")]
    Label { text: String },
}

impl NodeContent {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeContent::TaskCard(_) => NodeKind::EntityCard,
            NodeContent::Label { .. } => NodeKind::Label,
        }
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            NodeContent::TaskCard(card) => Some(card.entity_id),
            NodeContent::Label { .. } => None,
        }
    }
}

/// Partial payload update, tagged by the kind it applies to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentPatch {
    Task(TaskPatch),
    Label { text: String },
}

impl ContentPatch {
    pub fn kind(&self) -> NodeKind {
        match self {
            ContentPatch::Task(_) => NodeKind::EntityCard,
            ContentPatch::Label { .. } => NodeKind::Label,
        }
    }

    /// Merge into the content of node `id`. Returns whether anything changed.
    pub fn apply_to(&self, id: NodeId, content: &mut NodeContent) -> Result<bool, GraphError> {
        match (self, content) {
            (ContentPatch::Task(patch), NodeContent::TaskCard(card)) => Ok(patch.apply_to(card)),
            (ContentPatch::Label { text }, NodeContent::Label { text: current }) => {
                if current == text {
                    Ok(false)
                } else {
                    *current = text.clone();
                    Ok(true)
                }
            }
            (patch, content) => Err(GraphError::KindMismatch {
                id,
                expected: content.kind(),
                found: patch.kind(),
            }),
        }
    }
}

// ─── Node ────────────────────────────────────────────────────────────────

/// A single node in the diagram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub position: Position,
    #[serde(flatten)]
    pub content: NodeContent,
}

impl Node {
    pub fn new(id: NodeId, position: Position, content: NodeContent) -> Self {
        Self {
            id,
            position,
            content,
        }
    }

    /// Entity card node for `card`, with the deterministic `entity-{id}` id.
    pub fn task(card: TaskCard, position: Position) -> Self {
        Self::new(
            NodeId::for_entity(card.entity_id),
            position,
            NodeContent::TaskCard(card),
        )
    }

    pub fn label(id: NodeId, text: impl Into<String>, position: Position) -> Self {
        Self::new(id, position, NodeContent::Label { text: text.into() })
    }

    pub fn kind(&self) -> NodeKind {
        self.content.kind()
    }

    pub fn entity_id(&self) -> Option<EntityId> {
        self.content.entity_id()
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

/// A connect request between two node handles. Also the uniqueness key of
/// an edge: no two edges may share the same tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<HandleId>,
    pub target: NodeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<HandleId>,
}

impl Connection {
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            source_handle: None,
            target,
            target_handle: None,
        }
    }

    pub fn with_handles(mut self, source_handle: &str, target_handle: &str) -> Self {
        self.source_handle = Some(HandleId::intern(source_handle));
        self.target_handle = Some(HandleId::intern(target_handle));
        self
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        if let Some(h) = self.source_handle {
            write!(f, ":{h}")?;
        }
        write!(f, " -> {}", self.target)?;
        if let Some(h) = self.target_handle {
            write!(f, ":{h}")?;
        }
        Ok(())
    }
}

/// A directed connection between two node handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    #[serde(flatten)]
    pub connection: Connection,
}

impl Edge {
    pub fn source(&self) -> NodeId {
        self.connection.source
    }

    pub fn target(&self) -> NodeId {
        self.connection.target
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.connection.source == node || self.connection.target == node
    }
}
