// Integration tests for MindX
use mindx_core::{
    estimate_size, parse_import, Error, GraphStore, ImportError, LayoutEngine, SequentialGenerator,
};
use mindx_storage::{open_backend, BackendKind, MemoryBackend, MindmapManager, Snapshot, SnapshotStore};
use std::sync::Arc;

fn session() -> MindmapManager {
    MindmapManager::with_id_generator(
        Arc::new(MemoryBackend::new()),
        Arc::new(SequentialGenerator::default()),
    )
}

fn test_graph() -> GraphStore {
    GraphStore::with_id_generator(Arc::new(SequentialGenerator::default()))
}

#[test]
fn test_add_node_grows_graph_by_one() {
    let mut graph = test_graph();
    let root = graph.add_node(0, "Motion", None).unwrap();
    graph.select(Some(root.as_str())).unwrap();

    let before = graph.node_count();
    let child = graph.add_node(1, "Kinematics", Some(root.as_str())).unwrap();
    assert_eq!(graph.node_count(), before + 1);
    assert_eq!(graph.node(&child).unwrap().level, 1);
    assert_eq!(graph.edge_count(), 1);
}

#[test]
fn test_delete_node_is_idempotent() {
    let mut graph = test_graph();
    let root = graph.add_node(0, "Motion", None).unwrap();
    graph.select(Some(root.as_str())).unwrap();
    graph.add_node(1, "Kinematics", Some(root.as_str())).unwrap();
    graph.add_node(1, "Dynamics", Some(root.as_str())).unwrap();

    assert!(graph.delete_node(&root));
    assert!(!graph.contains(&root));
    assert!(graph.edges().iter().all(|e| !e.touches(&root)));
    assert_eq!(graph.node_count(), 2);

    assert!(!graph.delete_node(&root));
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_blank_label_update_is_rejected() {
    let mut graph = test_graph();
    let root = graph.add_node(0, "Motion", None).unwrap();

    let err = graph.update_label(&root, " \t ").unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_eq!(graph.node(&root).unwrap().label, "Motion");
}

#[test]
fn test_size_estimate_is_pure() {
    let text = "Force is push or pull that changes state of motion.";
    assert_eq!(estimate_size(text, false), estimate_size(text, false));
    assert_eq!(estimate_size(text, true), estimate_size(text, true));
}

#[test]
fn test_level_one_row_is_centred_on_root() {
    let nodes: Vec<String> = (0..5)
        .map(|i| format!(r#"{{"id": "b{i}", "text": "Branch {i}", "parentId": "r", "level": 1}}"#))
        .collect();
    let raw = format!(
        r#"{{"nodes": [{{"id": "r", "text": "Root", "level": 0}}, {}]}}"#,
        nodes.join(", ")
    );
    let document = parse_import(&raw).unwrap();
    let layout = LayoutEngine::new().layout_document(&document, &SequentialGenerator::default());

    let root_x = layout.nodes[0].position.x;
    let offset: f64 = layout.nodes[1..].iter().map(|n| n.position.x - root_x).sum();
    assert!(offset.abs() < 1e-9);
    assert!(layout.nodes[1..].iter().all(|n| n.position.y == 200.0));
}

#[test]
fn test_fenced_import_yields_single_root() {
    let raw = "```json\n{\"nodes\":[{\"id\":\"1\",\"text\":\"Root\",\"level\":0}]}\n```";
    let document = parse_import(raw).unwrap();
    assert_eq!(document.nodes.len(), 1);
    assert_eq!(document.nodes[0].level, 0);
    assert_eq!(document.nodes[0].label, "Root");
}

#[test]
fn test_import_without_object_fails() {
    assert!(matches!(
        parse_import("Sorry, I cannot help with that."),
        Err(ImportError::ParseFailure(_))
    ));
}

#[test]
fn test_motion_scenario() {
    let session = session();
    session
        .with_graph_mut(|g| -> mindx_core::Result<()> {
            let root = g.add_node(0, "Motion", None)?;
            g.select(Some(root.as_str()))?;
            g.add_node(1, "Kinematics", Some(root.as_str()))?;
            Ok(())
        })
        .unwrap();

    let saved = session.save_current("M1").unwrap();
    session.clear();
    assert!(session.graph().is_empty());
    assert!(session.title().is_none());

    session.load(&saved.id, false).unwrap();
    let graph = session.graph();
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 1);
    let edge = &graph.edges()[0];
    assert_eq!(graph.node(&edge.source).unwrap().label, "Motion");
    assert_eq!(graph.node(&edge.target).unwrap().label, "Kinematics");
}

#[test]
fn test_orphan_import_keeps_node() {
    let session = session();
    let raw = r#"{"title": "Waves", "nodes": [
        {"id": "1", "text": "Waves", "parentId": null, "level": 0},
        {"id": "2", "text": "Sound", "parentId": "1", "level": 1},
        {"id": "3", "text": "Lost child", "parentId": "99", "level": 2}
    ]}"#;

    let summary = session.import_text(raw, None, false).unwrap();
    assert_eq!(summary.node_count, 3);
    assert_eq!(summary.edge_count, 1);

    let graph = session.graph();
    let orphan = graph.nodes().iter().find(|n| n.label == "Lost child").unwrap();
    assert!(graph.edges().iter().all(|e| e.target != orphan.id));
    assert_eq!(orphan.position.x, 200.0);
}

#[test]
fn test_snapshot_round_trip_on_disk() {
    for kind in [BackendKind::File, BackendKind::Lmdb] {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut graph = test_graph();
        let root = graph.add_node(0, "Optics", None).unwrap();
        graph.select(Some(root.as_str())).unwrap();
        graph.add_node(1, "Reflection", Some(root.as_str())).unwrap();
        let snapshot = Snapshot::capture("Light", &graph);

        {
            let store = SnapshotStore::new(open_backend(kind, temp_dir.path()).unwrap());
            store.save(snapshot.clone()).unwrap();
        }

        // A fresh handle sees what the first one wrote.
        let store = SnapshotStore::new(open_backend(kind, temp_dir.path()).unwrap());
        let loaded = store.load(&snapshot.id).unwrap();
        assert_eq!(loaded.nodes, snapshot.nodes);
        assert_eq!(loaded.edges, snapshot.edges);
    }
}

#[test]
fn test_session_reopens_saved_maps() {
    let temp_dir = tempfile::tempdir().unwrap();
    let id = {
        let session = MindmapManager::open(temp_dir.path(), BackendKind::File).unwrap();
        session
            .import_text(
                r#"{"title": "Cells", "nodes": [{"id": "1", "text": "Cells", "level": 0}]}"#,
                None,
                false,
            )
            .unwrap();
        session.save_current("Biology").unwrap().id
    };

    let session = MindmapManager::open(temp_dir.path(), BackendKind::File).unwrap();
    let list = session.list().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].name, "Biology");

    let summary = session.load(&id, false).unwrap();
    assert_eq!(summary.title.as_deref(), Some("Cells"));
    assert!(session.delete_snapshot(&id).unwrap());
    assert!(session.list().unwrap().is_empty());
}
