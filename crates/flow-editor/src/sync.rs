//! Bridge between entity records and the graph nodes that represent them.
//!
//! Each entity is shown by exactly one node with id `entity-{id}`. Reloads
//! diff against the live graph: existing nodes keep their position and only
//! have their payload refreshed, so nothing on screen jumps when an
//! unrelated task changes.

use crate::store::Entity;
use flow_core::{
    ContentPatch, EntityId, FlowGraph, GraphError, GridLayout, Node, NodeContent, NodeId, Position,
    TaskPatch, graph::CascadedEdges,
};
use std::collections::HashSet;

/// What a hydration pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub added: Vec<NodeId>,
    pub refreshed: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl SyncReport {
    pub fn changed(&self) -> bool {
        !(self.added.is_empty() && self.refreshed.is_empty() && self.removed.is_empty())
    }
}

/// Reconcile `graph` with the full entity list.
///
/// Unrepresented entities get a node at the next free slot of `grid`.
/// Represented ones get their payload refreshed in place. Task nodes whose
/// entity is no longer listed are removed along with their edges.
pub fn hydrate_from_entities(graph: &mut FlowGraph, entities: &[Entity], grid: &GridLayout) -> SyncReport {
    let mut report = SyncReport::default();
    let listed: HashSet<EntityId> = entities.iter().map(|e| e.id).collect();

    let stale: Vec<NodeId> = graph
        .nodes()
        .filter(|n| n.entity_id().is_some_and(|e| !listed.contains(&e)))
        .map(|n| n.id)
        .collect();
    for id in stale {
        if let Some((_, edges)) = graph.remove_node(id) {
            log::debug!("removed {id}: entity gone ({} edges dropped)", edges.len());
            report.removed.push(id);
        }
    }

    for entity in entities {
        let card = entity.to_card();
        match graph.node_for_entity(entity.id) {
            Some(id) => {
                let unchanged = graph
                    .node(id)
                    .is_some_and(|n| matches!(&n.content, NodeContent::TaskCard(c) if *c == card));
                if unchanged {
                    continue;
                }
                match graph.set_content(id, NodeContent::TaskCard(card)) {
                    Ok(()) => report.refreshed.push(id),
                    Err(err) => log::warn!("cannot refresh {id}: {err}"),
                }
            }
            None => {
                let taken: Vec<Position> = graph.nodes().map(|n| n.position).collect();
                let node = Node::task(card, grid.next_free(taken.iter()));
                let id = node.id;
                match graph.add_node(node) {
                    Ok(()) => report.added.push(id),
                    Err(err) => log::warn!("cannot add node for entity {}: {err}", entity.id),
                }
            }
        }
    }

    if report.changed() {
        log::debug!(
            "hydrated: {} added, {} refreshed, {} removed",
            report.added.len(),
            report.refreshed.len(),
            report.removed.len()
        );
    }
    report
}

/// Merge `patch` into the card of the node representing `entity`.
/// Returns whether anything changed; an unrepresented entity is `NotFound`.
pub fn apply_entity_update(graph: &mut FlowGraph, entity: EntityId, patch: &TaskPatch) -> Result<bool, GraphError> {
    let id = graph
        .node_for_entity(entity)
        .ok_or_else(|| GraphError::NotFound(NodeId::for_entity(entity)))?;
    graph.update_node_payload(id, &ContentPatch::Task(patch.clone()))
}

/// Remove the node representing `entity`, cascading its edges.
pub fn apply_entity_deletion(graph: &mut FlowGraph, entity: EntityId) -> Option<(Node, CascadedEdges)> {
    let id = graph.node_for_entity(entity)?;
    graph.remove_node(id)
}
