//! Integration tests: history through the editor session.
//!
//! Exercises the session, connection manager and history together the way a
//! presentation layer drives them.

use flow_core::*;
use flow_editor::{ConnectOutcome, EditorConfig, EditorSession, ManualScheduler, Rejection, SaveStatus};
use flow_editor::store::{MemoryDiagramStore, StoreCall};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn session() -> EditorSession<ManualScheduler> {
    let _ = env_logger::builder().is_test(true).try_init();
    EditorSession::new(EditorConfig::default(), ManualScheduler::new())
}

fn label(id: &str, x: f32, y: f32) -> Node {
    Node::label(NodeId::intern(id), id, Position::new(x, y))
}

fn wire(a: &str, b: &str) -> Connection {
    Connection::new(NodeId::intern(a), NodeId::intern(b)).with_handles("bottom", "top")
}

fn connected(outcome: ConnectOutcome) -> Edge {
    match outcome {
        ConnectOutcome::Connected(edge) => edge,
        ConnectOutcome::Ignored(why) => panic!("connection ignored: {why:?}"),
    }
}

fn text_of(s: &EditorSession<ManualScheduler>, id: &str) -> String {
    match &s.graph().node(NodeId::intern(id)).unwrap().content {
        NodeContent::Label { text } => text.clone(),
        other => panic!("expected label, got {other:?}"),
    }
}

// ─── Connect / undo / redo / save scenario ──────────────────────────────

#[test]
fn connect_undo_redo_then_create_and_update() {
    let mut s = session();
    let mut store = MemoryDiagramStore::default();

    s.add_node(label("A", 0.0, 0.0)).unwrap();
    s.add_node(label("B", 0.0, 200.0)).unwrap();
    let edge = connected(s.connect(wire("A", "B")));
    assert_eq!(edge.connection.source_handle, Some(HandleId::intern("bottom")));
    assert_eq!(edge.connection.target_handle, Some(HandleId::intern("top")));

    assert!(s.undo());
    assert_eq!(s.graph().edge_count(), 0);
    assert_eq!(s.graph().node_count(), 2);

    assert!(s.redo());
    assert_eq!(s.graph().edge_list(), vec![edge]);

    let SaveStatus::Created(id) = s.perform_save(&mut store) else {
        panic!("first save should create");
    };
    assert_eq!(s.perform_save(&mut store), SaveStatus::Updated(id));
    assert_eq!(
        store.calls(),
        &[
            StoreCall::Create {
                name: "New Flow".into()
            },
            StoreCall::Update {
                id,
                name: Some("New Flow".into()),
                graph: true
            },
        ]
    );
}

// ─── Connection granularity ─────────────────────────────────────────────

#[test]
fn undoing_a_connection_leaves_earlier_edges() {
    let mut s = session();
    for id in ["a", "b", "c"] {
        s.add_node(label(id, 0.0, 0.0)).unwrap();
    }
    let ab = connected(s.connect(wire("a", "b")));
    let bc = connected(s.connect(wire("b", "c")));
    let ac = connected(s.connect(wire("a", "c")));

    assert!(s.undo());
    assert_eq!(s.graph().edge_list(), vec![ab, bc]);
    assert!(s.graph().edge(ac.id).is_none());
}

#[test]
fn multi_delete_yields_one_entry_per_edge() {
    let mut s = session();
    for id in ["a", "b", "c", "d"] {
        s.add_node(label(id, 0.0, 0.0)).unwrap();
    }
    let edges: Vec<Edge> = [wire("a", "b"), wire("b", "c"), wire("c", "d")]
        .into_iter()
        .map(|c| connected(s.connect(c)))
        .collect();
    let before = s.history().len();

    let removed = s.disconnect_all(edges.iter().map(|e| e.id));
    assert_eq!(removed.len(), 3);
    assert_eq!(s.history().len(), before + 3);
    assert_eq!(s.graph().edge_count(), 0);

    // Each undo brings back exactly one edge, last removed first.
    assert!(s.undo());
    assert_eq!(s.graph().edge_list(), vec![edges[2]]);
    assert!(s.undo());
    assert_eq!(s.graph().edge_count(), 2);
    assert!(s.undo());
    assert_eq!(s.graph().edge_count(), 3);
}

#[test]
fn rejected_connections_record_nothing() {
    let mut s = session();
    s.add_node(label("a", 0.0, 0.0)).unwrap();
    s.add_node(label("b", 0.0, 0.0)).unwrap();
    s.connect(wire("a", "b"));
    let before = s.history().len();

    assert_eq!(s.connect(wire("a", "b")), ConnectOutcome::Ignored(Rejection::Duplicate));
    assert_eq!(s.connect(wire("a", "a")), ConnectOutcome::Ignored(Rejection::SelfLoop));
    assert_eq!(s.history().len(), before);
    assert_eq!(s.graph().edge_count(), 1);
}

#[test]
fn parallel_edges_via_other_handles_are_allowed() {
    let mut s = session();
    s.add_node(label("a", 0.0, 0.0)).unwrap();
    s.add_node(label("b", 0.0, 0.0)).unwrap();
    connected(s.connect(wire("a", "b")));
    let plain = Connection::new(NodeId::intern("a"), NodeId::intern("b"));
    connected(s.connect(plain));
    assert_eq!(s.graph().edge_count(), 2);
}

// ─── Positions ──────────────────────────────────────────────────────────

#[test]
fn moves_between_edits_add_no_entries() {
    let mut s = session();
    s.add_node(label("a", 0.0, 0.0)).unwrap();
    let before = s.history().len();

    for step in 1..=25 {
        s.move_node(NodeId::intern("a"), Position::new(step as f32 * 4.0, 0.0))
            .unwrap();
    }
    assert_eq!(s.history().len(), before);

    s.update_node_payload(NodeId::intern("a"), &ContentPatch::Label { text: "renamed".into() })
        .unwrap();
    assert_eq!(s.history().len(), before + 1);
}

#[test]
fn undo_restores_content_at_live_position() {
    let mut s = session();
    s.add_node(label("a", 0.0, 0.0)).unwrap();
    s.update_node_payload(NodeId::intern("a"), &ContentPatch::Label { text: "draft".into() })
        .unwrap();
    let dragged = Position::new(640.0, 480.0);
    s.move_node(NodeId::intern("a"), dragged).unwrap();

    assert!(s.undo());
    assert_eq!(text_of(&s, "a"), "a");
    assert_eq!(s.graph().node(NodeId::intern("a")).unwrap().position, dragged);

    assert!(s.redo());
    assert_eq!(text_of(&s, "a"), "draft");
    assert_eq!(s.graph().node(NodeId::intern("a")).unwrap().position, dragged);
}

// ─── Boundaries and truncation ──────────────────────────────────────────

#[test]
fn undo_redo_at_boundaries_are_noops() {
    let mut s = session();
    assert!(!s.undo());
    s.add_node(label("a", 0.0, 0.0)).unwrap();
    assert!(!s.redo());
    assert!(s.undo());
    assert!(!s.undo());
    assert!(s.redo());
    assert!(!s.redo());
}

#[test]
fn new_edit_after_undo_discards_redo_tail() {
    let mut s = session();
    s.add_node(label("a", 0.0, 0.0)).unwrap();
    s.add_node(label("b", 0.0, 0.0)).unwrap();
    s.connect(wire("a", "b"));

    assert!(s.undo());
    assert!(s.can_redo());
    s.update_node_payload(NodeId::intern("b"), &ContentPatch::Label { text: "b2".into() })
        .unwrap();
    assert!(!s.can_redo());
    assert!(!s.redo());
    assert_eq!(s.graph().edge_count(), 0);
}

#[test]
fn undo_then_redo_restores_exact_content_and_edges() {
    let mut s = session();
    for id in ["a", "b", "c"] {
        s.add_node(label(id, 0.0, 0.0)).unwrap();
    }
    s.connect(wire("a", "b"));
    s.update_node_payload(NodeId::intern("c"), &ContentPatch::Label { text: "c!".into() })
        .unwrap();
    s.connect(wire("b", "c"));
    let e = s.graph().edge_list()[0].id;
    s.disconnect(e);

    while s.can_undo() {
        let before = s.graph().to_data();
        assert!(s.undo());
        assert!(s.redo());
        assert_eq!(s.graph().to_data(), before);
        assert!(s.undo());
    }
}

#[test]
fn undoing_node_removal_does_not_resurrect_it() {
    let mut s = session();
    s.add_node(label("a", 0.0, 0.0)).unwrap();
    s.add_node(label("b", 0.0, 0.0)).unwrap();
    s.connect(wire("a", "b"));
    s.update_node_payload(NodeId::intern("a"), &ContentPatch::Label { text: "a2".into() })
        .unwrap();

    s.remove_node(NodeId::intern("b")).unwrap();
    assert_eq!(s.graph().edge_count(), 0);

    // The node itself stays gone; its former content is not resurrected.
    assert!(s.undo());
    assert!(!s.graph().contains_node(NodeId::intern("b")));
    assert_eq!(text_of(&s, "a"), "a2");
    assert_eq!(s.graph().edge_count(), 0);
}

// ─── Random edit sequences ──────────────────────────────────────────────

const IDS: [&str; 5] = ["a", "b", "c", "d", "e"];

#[derive(Debug, Clone)]
enum Edit {
    Add(usize),
    Relabel(usize, u8),
    Connect(usize, usize, bool),
    Disconnect(usize),
    Move(usize, i16),
    Undo,
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    let id = 0..IDS.len();
    prop_oneof![
        2 => id.clone().prop_map(Edit::Add),
        2 => (id.clone(), 0u8..3).prop_map(|(i, v)| Edit::Relabel(i, v)),
        3 => (id.clone(), id.clone(), any::<bool>()).prop_map(|(a, b, wired)| Edit::Connect(a, b, wired)),
        1 => (0usize..4).prop_map(Edit::Disconnect),
        1 => (id, any::<i16>()).prop_map(|(i, x)| Edit::Move(i, x)),
        1 => Just(Edit::Undo),
    ]
}

fn run(s: &mut EditorSession<ManualScheduler>, edit: &Edit) {
    match *edit {
        Edit::Add(i) => {
            let _ = s.add_node(label(IDS[i], 0.0, 0.0));
        }
        Edit::Relabel(i, v) => {
            let text = format!("{}{v}", IDS[i]);
            let _ = s.update_node_payload(NodeId::intern(IDS[i]), &ContentPatch::Label { text });
        }
        Edit::Connect(a, b, wired) => {
            let connection = if wired {
                wire(IDS[a], IDS[b])
            } else {
                Connection::new(NodeId::intern(IDS[a]), NodeId::intern(IDS[b]))
            };
            s.connect(connection);
        }
        Edit::Disconnect(nth) => {
            let edge_id = s.graph().edges().nth(nth).map(|e| e.id);
            if let Some(id) = edge_id {
                s.disconnect(id);
            }
        }
        Edit::Move(i, x) => {
            let _ = s.move_node(NodeId::intern(IDS[i]), Position::new(f32::from(x), 0.0));
        }
        Edit::Undo => {
            s.undo();
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn undo_then_redo_is_identity_at_every_step(edits in prop::collection::vec(edit_strategy(), 0..60)) {
        let mut s = session();
        for edit in &edits {
            run(&mut s, edit);
        }

        while s.can_undo() {
            let before = s.graph().to_data();
            prop_assert!(s.undo());
            prop_assert!(s.redo());
            prop_assert_eq!(s.graph().to_data(), before);
            prop_assert!(s.undo());
        }
    }
}

