use super::{DiagramStore, Entity, EntityStore, NewTask, StoreError};
use flow_core::{DiagramId, DiagramResource, EntityId, GraphData, TaskPatch};

/// How `MemoryDiagramStore` encodes graph data at rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    #[default]
    Json,
    MessagePack,
}

impl Encoding {
    fn encode(self, data: &GraphData) -> Result<Vec<u8>, StoreError> {
        Ok(match self {
            Encoding::Json => data.to_json()?.into_bytes(),
            Encoding::MessagePack => data.to_msgpack()?,
        })
    }

    fn decode(self, bytes: &[u8]) -> Result<GraphData, StoreError> {
        Ok(match self {
            Encoding::Json => {
                let text = std::str::from_utf8(bytes)
                    .map_err(|e| StoreError::Unavailable(format!("corrupt diagram payload: {e}")))?;
                GraphData::from_json(text)?
            }
            Encoding::MessagePack => GraphData::from_msgpack(bytes)?,
        })
    }
}

/// A write issued against `MemoryDiagramStore`, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Create { name: String },
    Update { id: DiagramId, name: Option<String>, graph: bool },
}

#[derive(Debug, Clone)]
struct StoredDiagram {
    id: DiagramId,
    name: String,
    payload: Vec<u8>,
}

/// Diagram store held in memory. Records every write and can be told to
/// fail the next calls.
#[derive(Debug, Default)]
pub struct MemoryDiagramStore {
    encoding: Encoding,
    rows: Vec<StoredDiagram>,
    next_id: i64,
    calls: Vec<StoreCall>,
    failures: usize,
}

impl MemoryDiagramStore {
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            next_id: 1,
            ..Default::default()
        }
    }

    /// Make the next `n` calls fail with `StoreError::Unavailable`.
    pub fn fail_next(&mut self, n: usize) {
        self.failures = n;
    }

    pub fn calls(&self) -> &[StoreCall] {
        &self.calls
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, id: DiagramId) -> Result<DiagramResource, StoreError> {
        let row = self
            .rows
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        self.resource(row)
    }

    fn resource(&self, row: &StoredDiagram) -> Result<DiagramResource, StoreError> {
        Ok(DiagramResource {
            id: Some(row.id),
            name: row.name.clone(),
            graph_data: self.encoding.decode(&row.payload)?,
        })
    }

    fn check_failure(&mut self) -> Result<(), StoreError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

impl DiagramStore for MemoryDiagramStore {
    fn create(&mut self, name: &str, data: &GraphData) -> Result<DiagramId, StoreError> {
        self.calls.push(StoreCall::Create { name: name.to_string() });
        self.check_failure()?;

        let payload = self.encoding.encode(data)?;
        // Ids start at 1 even for a `Default`-constructed store.
        let id = DiagramId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.rows.push(StoredDiagram {
            id,
            name: name.to_string(),
            payload,
        });
        Ok(id)
    }

    fn update(
        &mut self,
        id: DiagramId,
        name: Option<&str>,
        data: Option<&GraphData>,
    ) -> Result<(), StoreError> {
        self.calls.push(StoreCall::Update {
            id,
            name: name.map(str::to_string),
            graph: data.is_some(),
        });
        self.check_failure()?;

        let payload = data.map(|d| self.encoding.encode(d)).transpose()?;
        let row = self
            .rows
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(name) = name {
            row.name = name.to_string();
        }
        if let Some(payload) = payload {
            row.payload = payload;
        }
        Ok(())
    }

    fn most_recent(&mut self) -> Result<Option<DiagramResource>, StoreError> {
        self.check_failure()?;
        self.rows.last().map(|row| self.resource(row)).transpose()
    }
}

/// Task store held in memory.
#[derive(Debug, Default)]
pub struct MemoryEntityStore {
    tasks: Vec<Entity>,
    next_id: i64,
    failures: usize,
}

impl MemoryEntityStore {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Default::default()
        }
    }

    /// Seed the store with existing records.
    pub fn with_tasks(tasks: Vec<Entity>) -> Self {
        let next_id = tasks.iter().map(|t| t.id.0).max().unwrap_or(0) + 1;
        Self {
            tasks,
            next_id,
            failures: 0,
        }
    }

    pub fn fail_next(&mut self, n: usize) {
        self.failures = n;
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn check_failure(&mut self) -> Result<(), StoreError> {
        if self.failures > 0 {
            self.failures -= 1;
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        Ok(())
    }
}

impl EntityStore for MemoryEntityStore {
    fn list(&mut self) -> Result<Vec<Entity>, StoreError> {
        self.check_failure()?;
        Ok(self.tasks.clone())
    }

    fn create(&mut self, task: NewTask) -> Result<Entity, StoreError> {
        self.check_failure()?;
        let entity = Entity {
            id: EntityId(self.next_id.max(1)),
            title: task.title,
            description: task.description,
            completed: false,
            priority: task.priority,
        };
        self.next_id = entity.id.0 + 1;
        self.tasks.push(entity.clone());
        Ok(entity)
    }

    fn update(&mut self, id: EntityId, patch: &TaskPatch) -> Result<(), StoreError> {
        self.check_failure()?;
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(title) = &patch.title {
            task.title = title.clone();
        }
        if let Some(description) = &patch.description {
            task.description = description.clone();
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        Ok(())
    }

    fn delete(&mut self, id: EntityId) -> Result<(), StoreError> {
        self.check_failure()?;
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        if self.tasks.len() == before {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flow_core::{Node, NodeId, Position};
    use pretty_assertions::assert_eq;

    fn data() -> GraphData {
        GraphData {
            nodes: vec![Node::label(NodeId::intern("start"), "Start", Position::default())],
            edges: Vec::new(),
        }
    }

    #[test]
    fn create_then_update_in_place() {
        for encoding in [Encoding::Json, Encoding::MessagePack] {
            let mut store = MemoryDiagramStore::new(encoding);
            let id = store.create("Flow", &data()).unwrap();
            store.update(id, Some("Renamed"), None).unwrap();

            let saved = store.most_recent().unwrap().unwrap();
            assert_eq!(saved.id, Some(id));
            assert_eq!(saved.name, "Renamed");
            assert_eq!(saved.graph_data, data());
            assert_eq!(store.len(), 1);
        }
    }

    #[test]
    fn update_of_unknown_diagram_fails() {
        let mut store = MemoryDiagramStore::default();
        assert!(matches!(
            store.update(DiagramId(99), None, Some(&data())),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn injected_failures_are_consumed() {
        let mut store = MemoryDiagramStore::default();
        store.fail_next(1);
        assert!(store.create("Flow", &data()).is_err());
        assert_eq!(store.create("Flow", &data()).unwrap(), DiagramId(1));
        assert_eq!(store.calls().len(), 2);
    }

    #[test]
    fn entity_store_crud() {
        let mut store = MemoryEntityStore::new();
        let created = store
            .create(NewTask {
                title: "Draft".into(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(created.id, EntityId(1));

        store
            .update(
                created.id,
                &TaskPatch {
                    completed: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();
        assert!(store.get(created.id).unwrap().completed);

        store.delete(created.id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(store.delete(created.id).is_err());
    }
}
