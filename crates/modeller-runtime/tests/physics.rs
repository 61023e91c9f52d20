//! Force layout tests
//!
//! Float accumulation order is not guaranteed, so everything here compares
//! within tolerances.

use modeller_core::types::Vec3;
use modeller_runtime::prelude::*;

fn pair(distance: f32) -> PhysicalGraph {
    let mut store = GraphStore::new();
    store.nodes.insert("Left".into(), String::new());
    store.nodes.insert("Right".into(), String::new());
    store.connections.push(("Left".into(), "Right".into()));
    let mut graph = PhysicalGraph::with_seed(store, 1).unwrap();
    graph.set_position("Left", Vec3::new(-distance / 2.0, 0.0, 0.0)).unwrap();
    graph.set_position("Right", Vec3::new(distance / 2.0, 0.0, 0.0)).unwrap();
    graph
}

fn separation(graph: &PhysicalGraph) -> f32 {
    let a = graph.position("Left").unwrap();
    let b = graph.position("Right").unwrap();
    a.distance_to(&b)
}

#[test]
fn connected_pair_settles_at_equilibrium() {
    let mut graph = pair(200.0);
    let target = graph.config().equilibrium_distance();
    let mut previous = separation(&graph);

    for step in 0..10_000 {
        assert!(graph.step());
        let current = separation(&graph);
        assert!(current.is_finite(), "diverged at step {step}");
        assert!(current <= previous + 1e-3, "step {step}: {previous} -> {current}");
        assert!(current >= target - 1e-2, "overshot at step {step}: {current}");
        previous = current;
    }

    assert!((previous - target).abs() < 0.05, "{previous} vs {target}");
}

#[test]
fn close_pair_is_pushed_out_to_equilibrium() {
    let mut graph = pair(2.0);
    graph.run(10_000);
    let target = graph.config().equilibrium_distance();
    assert!((separation(&graph) - target).abs() < 0.05);
}

#[test]
fn paused_simulation_does_not_move() {
    let mut graph = pair(100.0);
    graph.toggle_pause();
    let before = graph.position("Left");

    assert!(!graph.step());
    assert_eq!(graph.run(50), 0);
    assert_eq!(graph.position("Left"), before);

    graph.toggle_pause();
    assert_eq!(graph.run(3), 3);
    assert_ne!(graph.position("Left"), before);
}

#[test]
fn coincident_nodes_stay_finite() {
    let mut store = GraphStore::new();
    for title in ["A", "B", "C"] {
        store.nodes.insert(title.into(), String::new());
    }
    let mut graph = PhysicalGraph::with_seed(store, 2).unwrap();
    for title in ["A", "B", "C"] {
        graph.set_position(title, Vec3::ZERO).unwrap();
    }

    graph.run(500);

    for node in graph.nodes() {
        assert!(node.position.is_finite(), "{}", node.title);
        assert!(node.velocity.is_finite(), "{}", node.title);
    }
    assert!(graph.position("A").unwrap().distance_to(&graph.position("B").unwrap()) > 1.0);
}

#[test]
fn renderables_track_positions_after_a_step() {
    let mut graph = pair(60.0);
    graph.step();

    let left = graph.node("Left").unwrap();
    assert_eq!(left.sphere.center, left.position);
    assert_eq!(left.label.anchor, left.position + graph.config().label_offset);

    let line = &graph.line(0).unwrap().line;
    let ends = [line.a, line.b];
    assert!(ends.contains(&graph.position("Left").unwrap()));
    assert!(ends.contains(&graph.position("Right").unwrap()));
}

#[test]
fn unconnected_graph_stays_bounded() {
    let mut store = GraphStore::new();
    for i in 0..12 {
        store.nodes.insert(format!("Node {i}"), String::new());
    }
    let mut graph = PhysicalGraph::with_seed(store, 9).unwrap();
    graph.run(3_000);

    let extent = graph.config().spawn_extent * 4.0;
    for node in graph.nodes() {
        assert!(node.position.length() < extent, "{}: {:?}", node.title, node.position);
    }
}
