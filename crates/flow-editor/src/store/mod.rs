//! Collaborator contracts for the stores the editor reads from and writes to.
//!
//! The editor never touches a storage format directly: encoding graph data
//! is the store's concern. `memory` provides in-process implementations.

pub mod memory;

pub use memory::{Encoding, MemoryDiagramStore, MemoryEntityStore, StoreCall};

use flow_core::{CodecError, DiagramId, DiagramResource, EntityId, GraphData, Priority, TaskCard, TaskPatch};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A task record as held by the entity store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
}

impl Entity {
    /// The card content a node bound to this entity displays.
    pub fn to_card(&self) -> TaskCard {
        TaskCard {
            entity_id: self.id,
            title: self.title.clone(),
            description: self.description.clone(),
            completed: self.completed,
            priority: self.priority,
        }
    }
}

/// Fields for creating a task. New tasks start incomplete.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Task records: `list`, `create`, `update`, `delete`.
pub trait EntityStore {
    fn list(&mut self) -> Result<Vec<Entity>, StoreError>;
    fn create(&mut self, task: NewTask) -> Result<Entity, StoreError>;
    fn update(&mut self, id: EntityId, patch: &TaskPatch) -> Result<(), StoreError>;
    fn delete(&mut self, id: EntityId) -> Result<(), StoreError>;
}

/// Named diagram resources.
pub trait DiagramStore {
    /// Persist a new diagram and return its id.
    fn create(&mut self, name: &str, data: &GraphData) -> Result<DiagramId, StoreError>;

    /// Update the fields that are `Some`.
    fn update(
        &mut self,
        id: DiagramId,
        name: Option<&str>,
        data: Option<&GraphData>,
    ) -> Result<(), StoreError>;

    fn most_recent(&mut self) -> Result<Option<DiagramResource>, StoreError>;
}
