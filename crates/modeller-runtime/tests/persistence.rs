//! Persistence tests
//!
//! Save roots hold `Mental-Model/` plus `physics.bin` and are replaced through
//! `<root>.tmp` / `<root>.bak`. A failed save must leave the existing root
//! exactly as it was.

use modeller_core::error::{ModelError, PersistError, StoreError};
use modeller_core::types::Vec3;
use modeller_runtime::codec::{decode_positions, encode_positions};
use modeller_runtime::prelude::*;
use modeller_runtime::swap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn sample_store() -> GraphStore {
    let mut store = GraphStore::new();
    store.nodes.insert("Palau".into(), "Island nation in the Pacific.".into());
    store.nodes.insert("Tourism".into(), "Main\nexport\n".into());
    store.nodes.insert("Empty".into(), String::new());
    store.connections.push(("Tourism".into(), "Palau".into()));
    store.connections.push(("Empty".into(), "Palau".into()));
    store
}

/// Every file under `dir`, keyed by relative path.
fn tree(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(base: &Path, dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap().to_path_buf();
                out.insert(rel, fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(dir, dir, &mut out);
    out
}

#[test]
fn store_round_trip_preserves_order() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("Mental-Model");
    let store = sample_store();

    store.save(&dir).unwrap();
    let loaded = GraphStore::load(&dir).unwrap();

    assert_eq!(loaded.nodes, store.nodes);
    assert_eq!(loaded.connections, store.connections);
}

#[test]
fn positions_round_trip_through_a_save_root() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    let mut graph = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    graph.set_position("Palau", Vec3::new(12.5, -3.25, 0.125)).unwrap();
    graph.set_position("Tourism", Vec3::new(-40.0, 7.0, 99.0)).unwrap();
    graph.run(25);

    graph.save(&root).unwrap();
    assert!(root.join(GRAPH_DIR).join("Palau.txt").is_file());
    assert!(root.join(POSITIONS_FILE).is_file());
    assert!(!tmp.path().join("model.tmp").exists());
    assert!(!tmp.path().join("model.bak").exists());

    // A different seed proves the positions came from the file.
    let loaded = PhysicalGraph::load_with(&root, PhysicsConfig::default(), Some(999)).unwrap();
    for title in graph.id_to_title() {
        let (a, b) = (graph.position(title).unwrap(), loaded.position(title).unwrap());
        assert!(a.distance_to(&b) < 1e-6, "{title}: {a:?} vs {b:?}");
        assert_eq!(loaded.node(title).unwrap().velocity, Vec3::ZERO);
    }
    assert_eq!(loaded.store(), graph.store());
}

#[test]
fn missing_position_file_keeps_spawn_positions() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    fs::create_dir(&root).unwrap();
    sample_store().save(&root.join(GRAPH_DIR)).unwrap();

    let graph = PhysicalGraph::load_with(&root, PhysicsConfig::default(), Some(5)).unwrap();
    let fresh = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    assert_eq!(graph.position("Palau"), fresh.position("Palau"));
}

#[test]
fn stale_position_records_are_ignored() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    let graph = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    graph.save(&root).unwrap();

    // Rewrite the position file with one record for a node that no longer exists.
    let bytes = encode_positions([
        ("Deleted Long Ago", Vec3::new(1.0, 1.0, 1.0)),
        ("Palau", Vec3::new(2.0, 3.0, 4.0)),
    ]);
    fs::write(root.join(POSITIONS_FILE), bytes).unwrap();

    let loaded = PhysicalGraph::load(&root).unwrap();
    assert_eq!(loaded.position("Palau"), Some(Vec3::new(2.0, 3.0, 4.0)));
    assert!(!loaded.contains("Deleted Long Ago"));
}

#[test]
fn position_file_follows_sphere_order() {
    let graph = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    let records = decode_positions(&graph.encode_positions()).unwrap();
    let titles: Vec<&str> = records.iter().map(|(t, _)| t.as_str()).collect();
    assert_eq!(titles, ["Empty", "Palau", "Tourism"]);
}

#[test]
fn corrupt_position_file_fails_the_load() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    PhysicalGraph::with_seed(sample_store(), 5).unwrap().save(&root).unwrap();
    fs::write(root.join(POSITIONS_FILE), [3u8, 0, 0]).unwrap();

    let err = PhysicalGraph::load(&root).unwrap_err();
    assert!(matches!(err, ModelError::Persist(PersistError::CorruptPositions(_))));
}

#[test]
fn failed_save_leaves_the_root_byte_identical() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    let graph = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    graph.save(&root).unwrap();
    let before = tree(&root);

    // Positions get written first, then the store refuses the bad title.
    let mut store = sample_store();
    store.nodes.insert("bad?".into(), "x".into());
    let broken = PhysicalGraph::with_seed(store, 5).unwrap();
    let err = broken.save(&root).unwrap_err();

    assert!(matches!(err, ModelError::Persist(PersistError::InvalidTitle(ref t)) if t == "bad?"));
    assert!(!err.is_critical());
    assert_eq!(tree(&root), before);
    assert!(!tmp.path().join("model.tmp").exists());
    assert!(!tmp.path().join("model.bak").exists());
}

#[test]
fn writer_failure_mid_swap_discards_partial_output() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    PhysicalGraph::with_seed(sample_store(), 5).unwrap().save(&root).unwrap();
    let before = tree(&root);

    let paths = SwapPaths::for_save_root(&root).unwrap();
    let err = swap::replace_dir(&paths, |dir| {
        fs::write(dir.join("partial.bin"), [1, 2, 3]).unwrap();
        Err(PersistError::io(dir, std::io::Error::new(std::io::ErrorKind::Other, "disk full")).into())
    })
    .unwrap_err();

    assert!(matches!(err, ModelError::Persist(PersistError::Io { .. })));
    assert_eq!(tree(&root), before);
    assert!(!paths.temp.exists());
}

#[test]
fn missing_root_and_orphaned_backup_are_distinct() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");

    let err = PhysicalGraph::load(&root).unwrap_err();
    assert!(matches!(err, ModelError::Persist(PersistError::MissingRoot(_))));

    // Simulate a crash between "move root aside" and "move temp into place".
    PhysicalGraph::with_seed(sample_store(), 5).unwrap().save(&root).unwrap();
    let backup = tmp.path().join("model.bak");
    fs::rename(&root, &backup).unwrap();

    let err = PhysicalGraph::load(&root).unwrap_err();
    assert!(matches!(err, ModelError::Persist(PersistError::OrphanedBackup(ref p)) if *p == backup));

    let paths = SwapPaths::for_save_root(&root).unwrap();
    assert!(restore_backup(&paths).unwrap());
    let graph = PhysicalGraph::load(&root).unwrap();
    assert_eq!(graph.store(), &sample_store());
}

#[test]
fn malformed_graph_directory_fails_the_load() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    PhysicalGraph::with_seed(sample_store(), 5).unwrap().save(&root).unwrap();
    fs::write(root.join(GRAPH_DIR).join(CONNECTIONS_FILE), "Palau\tNowhere\n").unwrap();

    let err = PhysicalGraph::load(&root).unwrap_err();
    assert!(matches!(err, ModelError::Store(StoreError::UnknownEndpoint { line: 1, .. })));
}

#[test]
fn resaving_replaces_removed_nodes() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    let mut graph = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    graph.save(&root).unwrap();

    graph.remove_node("Empty").unwrap();
    graph.save(&root).unwrap();

    assert!(!root.join(GRAPH_DIR).join("Empty.txt").exists());
    let loaded = PhysicalGraph::load(&root).unwrap();
    assert_eq!(loaded.id_to_title(), ["Palau", "Tourism"]);
    assert_eq!(loaded.connection_count(), 1);
}

#[test]
fn blocked_backup_fails_the_save_without_touching_the_root() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("model");
    let mut graph = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    graph.save(&root).unwrap();
    let before = tree(&root);

    // A plain file where the backup directory would go.
    fs::write(tmp.path().join("model.bak"), "in the way").unwrap();
    graph.remove_node("Empty").unwrap();
    let err = graph.save(&root).unwrap_err();

    assert!(matches!(err, ModelError::Persist(PersistError::Io { .. })), "{err:?}");
    assert!(!err.is_critical());
    assert_eq!(tree(&root), before);
    assert!(!tmp.path().join("model.tmp").exists());
}

#[test]
fn failed_move_into_place_is_critical_and_keeps_the_data() {
    let tmp = TempDir::new().unwrap();
    let graph = PhysicalGraph::with_seed(sample_store(), 5).unwrap();
    let paths = SwapPaths {
        target: tmp.path().join("missing").join("model"),
        temp: tmp.path().join("model.tmp"),
        backup: tmp.path().join("missing").join("model.bak"),
    };

    let err = swap::replace_dir(&paths, |dir| {
        fs::write(dir.join(POSITIONS_FILE), graph.encode_positions())
            .map_err(|e| PersistError::io(dir, e))?;
        let graph_dir = dir.join(GRAPH_DIR);
        fs::create_dir(&graph_dir).map_err(|e| PersistError::io(&graph_dir, e))?;
        graph.store().write_into(&graph_dir)
    })
    .unwrap_err();

    assert!(err.is_critical());
    assert!(err.to_string().contains("model.tmp"), "{err}");
    assert!(matches!(
        err,
        ModelError::Persist(PersistError::SwapFailed { original_intact: false, .. })
    ));

    // The only copy is the temp directory, and it is a complete save root.
    let rescued = GraphStore::load(&paths.temp.join(GRAPH_DIR)).unwrap();
    assert_eq!(rescued, sample_store());
    assert!(paths.temp.join(POSITIONS_FILE).is_file());
}
