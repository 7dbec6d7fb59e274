//! Integration tests: debounced autosave through the editor session.

use flow_core::*;
use flow_editor::store::{DiagramStore, Encoding, MemoryDiagramStore, StoreCall};
use flow_editor::{EditorConfig, EditorSession, ManualScheduler, SaveRequest, SaveStatus};
use pretty_assertions::assert_eq;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(500);

fn session() -> EditorSession<ManualScheduler> {
    let _ = env_logger::builder().is_test(true).try_init();
    EditorSession::new(EditorConfig::default(), ManualScheduler::new())
}

fn label(id: &str) -> Node {
    Node::label(NodeId::intern(id), id, Position::default())
}

// ─── Debounce ───────────────────────────────────────────────────────────

#[test]
fn burst_of_edits_saves_once() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();

    for id in ["a", "b", "c", "d"] {
        s.add_node(label(id)).unwrap();
        assert_eq!(s.advance(TICK, &mut store), vec![]);
    }
    assert!(store.calls().is_empty());

    // 2s of quiet after the last edit.
    assert_eq!(s.advance(TICK * 3, &mut store), vec![SaveStatus::Created(DiagramId(1))]);
    assert_eq!(store.calls().len(), 1);
    assert_eq!(s.scheduler().armed(), 0);
}

#[test]
fn custom_delay_is_honoured() {
    let config = EditorConfig {
        autosave_delay_ms: 100,
        ..EditorConfig::default()
    };
    let mut s = EditorSession::new(config, ManualScheduler::new());
    let mut store = MemoryDiagramStore::default();

    s.add_node(label("a")).unwrap();
    assert_eq!(s.advance(Duration::from_millis(99), &mut store), vec![]);
    assert_eq!(s.advance(Duration::from_millis(1), &mut store).len(), 1);
}

#[test]
fn drags_are_saved_but_not_recorded() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();
    s.add_node(label("a")).unwrap();
    s.save_now(&mut store);
    let entries = s.history().len();

    let dropped_at = Position::new(320.0, 90.0);
    s.move_node(NodeId::intern("a"), dropped_at).unwrap();
    assert_eq!(s.history().len(), entries);
    assert_eq!(s.advance(Duration::from_secs(2), &mut store).len(), 1);

    let saved = store.get(DiagramId(1)).unwrap();
    assert_eq!(saved.graph_data.nodes[0].position, dropped_at);
}

// ─── Save now ───────────────────────────────────────────────────────────

#[test]
fn save_now_cancels_pending_timer() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();
    s.add_node(label("a")).unwrap();
    assert_eq!(s.scheduler().armed(), 1);

    assert_eq!(s.save_now(&mut store), SaveStatus::Created(DiagramId(1)));
    assert_eq!(s.scheduler().armed(), 0);
    assert_eq!(s.advance(Duration::from_secs(10), &mut store), vec![]);
    assert_eq!(store.calls().len(), 1);
}

#[test]
fn rename_is_carried_by_next_update() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();
    let SaveStatus::Created(id) = s.save_now(&mut store) else {
        panic!("expected create");
    };

    s.rename("Sprint 12");
    s.advance(Duration::from_secs(2), &mut store);

    assert_eq!(
        store.calls().last(),
        Some(&StoreCall::Update {
            id,
            name: Some("Sprint 12".into()),
            graph: true
        })
    );
    assert_eq!(store.get(id).unwrap().name, "Sprint 12");
}

// ─── Failures and overlap ───────────────────────────────────────────────

#[test]
fn failed_save_is_retried_by_next_edit() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();
    store.fail_next(1);

    s.add_node(label("a")).unwrap();
    let statuses = s.advance(Duration::from_secs(2), &mut store);
    assert!(matches!(statuses.as_slice(), [SaveStatus::Failed(_)]));
    assert!(!s.autosave().is_saving());
    assert_eq!(s.resource_id(), None);

    // Nothing retries on its own.
    assert_eq!(s.advance(Duration::from_secs(10), &mut store), vec![]);

    s.add_node(label("b")).unwrap();
    assert_eq!(
        s.advance(Duration::from_secs(2), &mut store),
        vec![SaveStatus::Created(DiagramId(1))]
    );
    assert_eq!(store.get(DiagramId(1)).unwrap().graph_data.nodes.len(), 2);
}

#[test]
fn timer_during_inflight_save_is_dropped_and_next_edit_catches_up() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();

    s.add_node(label("a")).unwrap();
    let request = s.begin_save().unwrap();
    assert!(matches!(request, SaveRequest::Create { .. }));

    // Edits continue while the save is in flight.
    s.add_node(label("b")).unwrap();
    assert_eq!(s.advance(Duration::from_secs(2), &mut store), vec![]);
    assert_eq!(s.save_now(&mut store), SaveStatus::Skipped);

    let result = request.execute(&mut store);
    assert_eq!(s.finish_save(&request, result), SaveStatus::Created(DiagramId(1)));
    assert_eq!(store.get(DiagramId(1)).unwrap().graph_data.nodes.len(), 1);

    s.add_node(label("c")).unwrap();
    assert_eq!(
        s.advance(Duration::from_secs(2), &mut store),
        vec![SaveStatus::Updated(DiagramId(1))]
    );
    assert_eq!(store.get(DiagramId(1)).unwrap().graph_data.nodes.len(), 3);
}

#[test]
fn save_now_during_inflight_save_keeps_timer_armed() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();

    s.add_node(label("a")).unwrap();
    let request = s.begin_save().unwrap();

    // Edited while the first save is still running.
    s.add_node(label("b")).unwrap();
    assert_eq!(s.save_now(&mut store), SaveStatus::Skipped);
    assert!(s.autosave().pending().is_some());

    let result = request.execute(&mut store);
    assert_eq!(s.finish_save(&request, result), SaveStatus::Created(DiagramId(1)));

    assert_eq!(
        s.advance(Duration::from_secs(10), &mut store),
        vec![SaveStatus::Updated(DiagramId(1))]
    );
    assert_eq!(store.get(DiagramId(1)).unwrap().graph_data.nodes.len(), 2);
}

// ─── Reload ─────────────────────────────────────────────────────────────

#[test]
fn saved_diagram_reopens_with_ids_and_positions() {
    let mut store = MemoryDiagramStore::new(Encoding::MessagePack);
    let mut s = session();
    s.add_node(Node::label(NodeId::intern("x"), "x", Position::new(10.0, 20.0)))
        .unwrap();
    s.add_node(Node::label(NodeId::intern("y"), "y", Position::new(30.0, 40.0)))
        .unwrap();
    s.connect(Connection::new(NodeId::intern("x"), NodeId::intern("y")).with_handles("bottom", "top"));
    s.rename("Roadmap");
    let SaveStatus::Created(id) = s.save_now(&mut store) else {
        panic!("expected create");
    };

    let resource = store.most_recent().unwrap().unwrap();
    let mut reopened =
        EditorSession::from_resource(EditorConfig::default(), ManualScheduler::new(), resource).unwrap();

    assert_eq!(reopened.graph().to_data(), s.graph().to_data());
    assert_eq!(reopened.name(), "Roadmap");
    assert_eq!(reopened.resource_id(), Some(id));
    assert!(!reopened.can_undo());

    // A reopened diagram updates in place.
    reopened.add_node(label("z")).unwrap();
    assert_eq!(reopened.save_now(&mut store), SaveStatus::Updated(id));
    assert_eq!(store.len(), 1);
}

#[test]
fn new_edges_after_reload_do_not_reuse_ids() {
    let mut store = MemoryDiagramStore::default();
    let mut s = session();
    for id in ["p", "q", "r"] {
        s.add_node(label(id)).unwrap();
    }
    s.connect(Connection::new(NodeId::intern("p"), NodeId::intern("q")));
    s.save_now(&mut store);

    let resource = store.most_recent().unwrap().unwrap();
    let mut reopened =
        EditorSession::from_resource(EditorConfig::default(), ManualScheduler::new(), resource).unwrap();
    reopened.connect(Connection::new(NodeId::intern("q"), NodeId::intern("r")));

    let ids: Vec<EdgeId> = reopened.graph().edges().map(|e| e.id).collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}
