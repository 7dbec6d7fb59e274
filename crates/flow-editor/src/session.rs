//! One open diagram: graph, history, autosave and the scheduler driving it.
//!
//! Every user-facing operation goes through the session so that each
//! canonical-state change is recorded in history (unless history is
//! replaying) and re-arms the autosave timer. Node moves re-arm the timer
//! but are never recorded.

use crate::autosave::{Autosave, ManualScheduler, SaveRequest, SaveStatus, Scheduler, TimerId};
use crate::config::EditorConfig;
use crate::connect::{self, ConnectOutcome, ConnectionAction};
use crate::error::EditorError;
use crate::history::{History, Mode};
use crate::store::{DiagramStore, Entity, EntityStore, NewTask, StoreError};
use crate::sync::{self, SyncReport};
use flow_core::{
    Connection, ContentPatch, DiagramId, DiagramResource, Edge, EdgeId, EntityId, FlowGraph, GraphError,
    Node, NodeId, Position, TaskPatch,
};
use smallvec::SmallVec;
use std::time::Duration;

#[derive(Debug)]
pub struct EditorSession<S: Scheduler> {
    graph: FlowGraph,
    history: History,
    autosave: Autosave,
    scheduler: S,
    name: String,
    config: EditorConfig,
}

impl<S: Scheduler> EditorSession<S> {
    /// An empty, never-saved diagram.
    pub fn new(config: EditorConfig, scheduler: S) -> Self {
        let mut session = Self {
            graph: FlowGraph::new(),
            history: History::new(),
            autosave: Autosave::new(config.autosave_delay()),
            scheduler,
            name: config.default_name.clone(),
            config,
        };
        session.reset_history();
        session
    }

    /// Resume a persisted diagram. Later saves update it by id.
    pub fn from_resource(config: EditorConfig, scheduler: S, resource: DiagramResource) -> Result<Self, GraphError> {
        let mut session = Self::new(config, scheduler);
        session.load(resource)?;
        Ok(session)
    }

    /// Initial load: resume the most recent diagram, then reconcile it with
    /// the entity list. Store failures are logged and leave the session
    /// with whatever could be loaded.
    pub fn open(
        config: EditorConfig,
        scheduler: S,
        diagrams: &mut dyn DiagramStore,
        entities: &mut dyn EntityStore,
    ) -> Self {
        let mut session = Self::new(config, scheduler);
        match diagrams.most_recent() {
            Ok(Some(resource)) => {
                let id = resource.id;
                if let Err(err) = session.load(resource) {
                    log::warn!("discarding unreadable diagram {id:?}: {err}");
                }
            }
            Ok(None) => log::debug!("no saved diagram, starting fresh"),
            Err(err) => log::warn!("cannot load most recent diagram: {err}"),
        }

        let report = match entities.list() {
            Ok(list) => sync::hydrate_from_entities(&mut session.graph, &list, &session.config.grid),
            Err(err) => {
                log::warn!("cannot list entities: {err}");
                SyncReport::default()
            }
        };
        session.reset_history();
        if report.changed() {
            session.schedule_save();
        }

        log::info!(
            "opened {:?} ({} nodes, {} edges)",
            session.name,
            session.graph.node_count(),
            session.graph.edge_count()
        );
        session
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn graph(&self) -> &FlowGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn autosave(&self) -> &Autosave {
        &self.autosave
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn resource_id(&self) -> Option<DiagramId> {
        self.autosave.resource_id()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    // ─── Graph edits ─────────────────────────────────────────────────────

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        self.graph.add_node(node)?;
        self.content_changed();
        Ok(())
    }

    /// Remove a node and its edges. Absent ids are a no-op.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let (node, edges) = self.graph.remove_node(id)?;
        log::debug!("removed {id} with {} edges", edges.len());
        self.content_changed();
        Some(node)
    }

    /// Drag a node. Saved, but never part of history.
    pub fn move_node(&mut self, id: NodeId, position: Position) -> Result<(), GraphError> {
        self.graph.move_node(id, position)?;
        self.schedule_save();
        Ok(())
    }

    /// Merge `patch` into a node's content. A patch that changes nothing
    /// records nothing.
    pub fn update_node_payload(&mut self, id: NodeId, patch: &ContentPatch) -> Result<bool, GraphError> {
        let changed = self.graph.update_node_payload(id, patch)?;
        if changed {
            self.content_changed();
        }
        Ok(changed)
    }

    pub fn connect(&mut self, connection: Connection) -> ConnectOutcome {
        let outcome = connect::connect(&mut self.graph, connection);
        if let Some(action) = outcome.action() {
            self.connection_changed(action);
        }
        outcome
    }

    pub fn disconnect(&mut self, id: EdgeId) -> Option<Edge> {
        let action = connect::disconnect(&mut self.graph, id)?;
        self.connection_changed(action);
        Some(*action.edge())
    }

    /// Remove several edges, one history entry each.
    pub fn disconnect_all(&mut self, ids: impl IntoIterator<Item = EdgeId>) -> SmallVec<[Edge; 4]> {
        let actions = connect::disconnect_all(&mut self.graph, ids);
        for action in &actions {
            self.connection_changed(*action);
        }
        actions.iter().map(|a| *a.edge()).collect()
    }

    // ─── History ─────────────────────────────────────────────────────────

    /// Step back one entry. `false` at the start of history.
    pub fn undo(&mut self) -> bool {
        let Some(replay) = self.history.undo() else {
            return false;
        };
        self.history.set_mode(Mode::Replaying);
        replay.apply(&mut self.graph);
        self.content_changed();
        self.history.set_mode(Mode::Live);
        true
    }

    /// Step forward one entry. `false` at the end of history.
    pub fn redo(&mut self) -> bool {
        let Some(replay) = self.history.redo() else {
            return false;
        };
        self.history.set_mode(Mode::Replaying);
        replay.apply(&mut self.graph);
        self.content_changed();
        self.history.set_mode(Mode::Live);
        true
    }

    // ─── Persistence ─────────────────────────────────────────────────────

    /// Rename the diagram; the next save carries the new name.
    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        if name == self.name {
            return;
        }
        self.name = name;
        self.schedule_save();
    }

    /// Deliver an expired timer. Saves if it is the current debounce timer
    /// and no other save is in flight.
    pub fn on_timer(&mut self, timer: TimerId, store: &mut dyn DiagramStore) -> Option<SaveStatus> {
        self.autosave
            .fire(timer)
            .then(|| self.perform_save(store))
    }

    /// Save immediately, leaving any pending timer armed.
    pub fn perform_save(&mut self, store: &mut dyn DiagramStore) -> SaveStatus {
        self.autosave.perform(&self.name, &self.graph, store)
    }

    /// Explicit save. Cancels the pending debounce timer so it does not
    /// produce a second save right after. While another save is in flight
    /// the timer stays armed, since it carries edits that save missed.
    pub fn save_now(&mut self, store: &mut dyn DiagramStore) -> SaveStatus {
        let Some(request) = self.autosave.begin(&self.name, &self.graph) else {
            return SaveStatus::Skipped;
        };
        self.autosave.cancel_pending(&mut self.scheduler);
        let result = request.execute(store);
        self.autosave.finish(&request, result)
    }

    /// Start a save whose I/O the caller performs. Edits may continue
    /// until the matching `finish_save`.
    pub fn begin_save(&mut self) -> Option<SaveRequest> {
        self.autosave.begin(&self.name, &self.graph)
    }

    pub fn finish_save(&mut self, request: &SaveRequest, result: Result<DiagramId, StoreError>) -> SaveStatus {
        self.autosave.finish(request, result)
    }

    // ─── Entities ────────────────────────────────────────────────────────

    pub fn hydrate_from_entities(&mut self, entities: &[Entity]) -> SyncReport {
        let report = sync::hydrate_from_entities(&mut self.graph, entities, &self.config.grid);
        if report.changed() {
            self.content_changed();
        }
        report
    }

    pub fn apply_entity_update(&mut self, entity: EntityId, patch: &TaskPatch) -> Result<bool, GraphError> {
        let changed = sync::apply_entity_update(&mut self.graph, entity, patch)?;
        if changed {
            self.content_changed();
        }
        Ok(changed)
    }

    pub fn apply_entity_deletion(&mut self, entity: EntityId) -> Option<Node> {
        let (node, _) = sync::apply_entity_deletion(&mut self.graph, entity)?;
        self.content_changed();
        Some(node)
    }

    /// Re-list every entity and reconcile against live positions.
    pub fn reload_entities(&mut self, store: &mut dyn EntityStore) -> Result<SyncReport, EditorError> {
        let entities = store.list().inspect_err(|err| log::warn!("cannot list entities: {err}"))?;
        Ok(self.hydrate_from_entities(&entities))
    }

    /// Create a task, then reload so its card appears in the next free slot.
    /// Once the store has created the task this succeeds; a failed reload
    /// only delays the card until the next one.
    pub fn create_task(&mut self, task: NewTask, store: &mut dyn EntityStore) -> Result<Entity, EditorError> {
        let entity = store
            .create(task)
            .inspect_err(|err| log::warn!("cannot create task: {err}"))?;
        if let Err(err) = self.reload_entities(store) {
            log::debug!("created task {} but could not reload: {err}", entity.id);
        }
        Ok(entity)
    }

    /// Commit an inline card edit to the store, then to the graph.
    pub fn commit_task_edit(
        &mut self,
        entity: EntityId,
        patch: &TaskPatch,
        store: &mut dyn EntityStore,
    ) -> Result<bool, EditorError> {
        if patch.is_empty() {
            return Ok(false);
        }
        store
            .update(entity, patch)
            .inspect_err(|err| log::warn!("cannot update task {entity}: {err}"))?;
        Ok(self.apply_entity_update(entity, patch)?)
    }

    /// Delete a task and its card, then reload the entity list.
    pub fn delete_task(&mut self, entity: EntityId, store: &mut dyn EntityStore) -> Result<Option<Node>, EditorError> {
        store
            .delete(entity)
            .inspect_err(|err| log::warn!("cannot delete task {entity}: {err}"))?;
        let node = self.apply_entity_deletion(entity);
        self.reload_entities(store)?;
        Ok(node)
    }

    // ─── Change notification ─────────────────────────────────────────────

    fn content_changed(&mut self) {
        if self.history.mode() == Mode::Live {
            self.history.record_content_change(&self.graph);
        }
        self.schedule_save();
    }

    fn connection_changed(&mut self, action: ConnectionAction) {
        if self.history.mode() == Mode::Live {
            self.history.record_connection_action(action, &self.graph);
        }
        self.schedule_save();
    }

    fn schedule_save(&mut self) {
        self.autosave.schedule(&mut self.scheduler);
    }

    /// Replace the graph with a persisted diagram. Leaves the session
    /// untouched if the data violates a graph invariant.
    fn load(&mut self, resource: DiagramResource) -> Result<(), GraphError> {
        let DiagramResource { id, name, graph_data } = resource;
        self.graph = FlowGraph::from_data(graph_data)?;
        self.name = name;
        self.autosave.set_resource_id(id);
        self.reset_history();
        Ok(())
    }

    /// Forget history and seed a baseline for the current state.
    fn reset_history(&mut self) {
        self.history.clear();
        self.history.record_content_change(&self.graph);
    }
}

impl EditorSession<ManualScheduler> {
    /// Advance the virtual clock and deliver every timer that expired.
    pub fn advance(&mut self, by: Duration, store: &mut dyn DiagramStore) -> Vec<SaveStatus> {
        let due = self.scheduler.advance(by);
        due.into_iter()
            .filter_map(|timer| self.on_timer(timer, store))
            .collect()
    }
}
