//! Mutation protocol tests
//!
//! Every structural mutation must keep the render index split into the three
//! dense ranges `[0,N)`, `[N,N+E)`, `[N+E,2N+E)`, with a node's sphere at `i`
//! and its label at `N+E+i`.

use modeller_core::error::{GraphError, ModelError};
use modeller_core::types::Vec3;
use modeller_runtime::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn graph_of(titles: &[&str], connections: &[(&str, &str)]) -> PhysicalGraph {
    let mut store = GraphStore::new();
    for title in titles {
        store.nodes.insert(title.to_string(), String::new());
    }
    for (a, b) in connections {
        store.connections.push((a.to_string(), b.to_string()));
    }
    PhysicalGraph::with_seed(store, 11).unwrap()
}

fn assert_partition(graph: &PhysicalGraph) {
    let layout = graph.layout();
    let index = graph.render_index();
    let n = graph.node_count();
    let e = graph.connection_count();

    assert_eq!(index.len(), 2 * n + e);
    assert_eq!(index.sorted_ids(), (0..2 * n + e).collect::<Vec<_>>());

    for (i, title) in graph.id_to_title().iter().enumerate() {
        let sphere = index.get(i);
        let label = index.get(n + e + i);
        match (sphere, label) {
            (Some(RenderTarget::Sphere(s)), Some(RenderTarget::Label(l))) => assert_eq!(s, l, "{title}"),
            other => panic!("node {i} ({title}) has {other:?}"),
        }
        assert_eq!(layout.label_id(i), n + e + i);
    }
    for k in 0..e {
        assert!(matches!(index.get(n + k), Some(RenderTarget::Line(_))), "line {k}");
    }

    graph.validate().unwrap();
}

#[test]
fn random_mutation_sequences_keep_the_partition() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut graph = graph_of(&["Alpha", "Beta", "Gamma"], &[("Alpha", "Beta")]);
    assert_partition(&graph);

    for _ in 0..400 {
        let titles: Vec<String> = graph.id_to_title().to_vec();
        match rng.gen_range(0..4) {
            0 => {
                graph.add_node(Vec3::new(rng.gen(), rng.gen(), rng.gen())).unwrap();
            }
            1 if !titles.is_empty() => {
                let title = &titles[rng.gen_range(0..titles.len())];
                graph.remove_node(title).unwrap();
            }
            2 if titles.len() >= 2 => {
                let a = &titles[rng.gen_range(0..titles.len())];
                let b = &titles[rng.gen_range(0..titles.len())];
                graph.add_connection(a, b).unwrap();
            }
            3 if graph.connection_count() > 0 => {
                let k = rng.gen_range(0..graph.connection_count());
                let (a, b) = graph.store().connections[k].clone();
                graph.remove_connection(&a, &b).unwrap();
            }
            _ => {}
        }
        assert_partition(&graph);
    }
}

#[test]
fn self_connection_is_rejected() {
    let mut graph = graph_of(&["A", "B"], &[]);
    assert_eq!(
        graph.add_connection("A", "A").unwrap(),
        Outcome::Ignored(Rejection::SelfConnection)
    );
    assert_eq!(graph.connection_count(), 0);
    assert_partition(&graph);
}

#[test]
fn self_connection_check_ignores_ascii_case() {
    let mut graph = graph_of(&["Idea", "IDEA"], &[]);
    assert_eq!(
        graph.add_connection("Idea", "IDEA").unwrap(),
        Outcome::Ignored(Rejection::SelfConnection)
    );
}

#[test]
fn reversed_duplicate_leaves_one_connection() {
    let mut graph = graph_of(&["A", "B"], &[]);
    assert_eq!(graph.add_connection("A", "B").unwrap(), Outcome::Applied);
    assert_eq!(
        graph.add_connection("B", "A").unwrap(),
        Outcome::Ignored(Rejection::AlreadyConnected)
    );
    assert_eq!(graph.connection_count(), 1);
    assert_eq!(graph.render_index().len(), 5);
}

#[test]
fn connecting_missing_nodes_is_an_error() {
    let mut graph = graph_of(&["A"], &[]);
    let err = graph.add_connection("A", "Ghost").unwrap_err();
    assert!(matches!(err, ModelError::Graph(GraphError::NodeNotFound(t)) if t == "Ghost"));
}

#[test]
fn removing_a_missing_connection_is_an_error() {
    let mut graph = graph_of(&["A", "B"], &[]);
    let err = graph.remove_connection("A", "B").unwrap_err();
    assert!(matches!(err, ModelError::Graph(GraphError::ConnectionNotFound(..))));
}

#[test]
fn cascade_removes_exactly_the_incident_connections() {
    let mut graph = graph_of(
        &["Hub", "A", "B", "C", "D"],
        &[("Hub", "A"), ("B", "Hub"), ("C", "D"), ("Hub", "C")],
    );
    let lines_before = graph.render_index().len() - 2 * graph.node_count();
    assert_eq!(lines_before, 4);

    let removed = graph.remove_node("Hub").unwrap();

    assert_eq!(removed, 3);
    assert_eq!(graph.connection_count(), 1);
    assert_eq!(graph.store().connections, vec![("C".to_string(), "D".to_string())]);
    let lines_after = graph.render_index().len() - 2 * graph.node_count();
    assert_eq!(lines_before - lines_after, 3);
    assert_partition(&graph);
}

#[test]
fn removing_the_middle_of_a_chain() {
    let mut graph = graph_of(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);

    graph.remove_node("B").unwrap();

    assert_eq!(graph.id_to_title(), ["A", "C"]);
    assert_eq!(graph.connection_count(), 0);
    assert_eq!(graph.render_index().len(), 4);
    assert_partition(&graph);
}

#[test]
fn removing_a_missing_node_is_an_error() {
    let mut graph = graph_of(&["A"], &[]);
    assert!(graph.remove_node("B").is_err());
    assert_partition(&graph);
}

#[test]
fn rename_rewrites_every_endpoint() {
    let mut graph = graph_of(&["A", "B", "C"], &[("A", "B"), ("C", "A")]);

    assert_eq!(graph.rename_node("A", "Zed").unwrap(), Outcome::Applied);

    assert_eq!(
        graph.store().connections,
        vec![
            ("Zed".to_string(), "B".to_string()),
            ("C".to_string(), "Zed".to_string()),
        ]
    );
    assert_eq!(graph.id_to_title()[0], "Zed");
    assert_partition(&graph);
}

#[test]
fn insert_node_rejections() {
    let mut graph = graph_of(&["A"], &[]);
    assert_eq!(
        graph.insert_node("A", "", Vec3::ZERO).unwrap(),
        Outcome::Ignored(Rejection::TitleTaken)
    );
    assert_eq!(
        graph.insert_node("AUX", "", Vec3::ZERO).unwrap(),
        Outcome::Ignored(Rejection::InvalidTitle)
    );
    assert_eq!(
        graph.insert_node("CONNECTIONS", "", Vec3::ZERO).unwrap(),
        Outcome::Ignored(Rejection::ReservedTitle)
    );
    assert_eq!(graph.insert_node("Notes", "text", Vec3::ZERO).unwrap(), Outcome::Applied);
    assert_eq!(graph.body("Notes"), Some("text"));
    assert_partition(&graph);
}

#[test]
fn body_edits_leave_ids_alone() {
    let mut graph = graph_of(&["A", "B"], &[("A", "B")]);
    let before: Vec<_> = graph.render_index().entries().to_vec();

    graph.set_body("B", "new body").unwrap();

    assert_eq!(graph.render_index().entries(), before.as_slice());
    assert_eq!(graph.body("B"), Some("new body"));
    assert!(graph.set_body("Missing", "x").is_err());
}

#[test]
fn line_geometry_follows_endpoints() {
    let mut graph = graph_of(&["A", "B"], &[]);
    graph.set_position("A", Vec3::new(1.0, 0.0, 0.0)).unwrap();
    graph.set_position("B", Vec3::new(0.0, 1.0, 0.0)).unwrap();
    graph.add_connection("B", "A").unwrap();

    let line = &graph.line(0).unwrap().line;
    assert_eq!(line.a, Vec3::new(0.0, 1.0, 0.0));
    assert_eq!(line.b, Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn rename_onto_a_neighbour_differing_only_in_case_is_ignored() {
    let mut graph = graph_of(&["a", "B", "C"], &[("a", "B"), ("B", "C")]);
    let before = graph.snapshot();

    assert_eq!(
        graph.rename_node("B", "A").unwrap(),
        Outcome::Ignored(Rejection::SelfConnection)
    );
    assert_eq!(graph.snapshot(), before);

    // Same title for a node that is not a neighbour is fine.
    assert_eq!(graph.rename_node("C", "A").unwrap(), Outcome::Applied);
    assert_partition(&graph);
}

#[test]
fn reserved_title_is_refused_in_any_case() {
    let mut graph = graph_of(&["A"], &[]);
    assert_eq!(
        graph.insert_node("connections", "", Vec3::ZERO).unwrap(),
        Outcome::Ignored(Rejection::ReservedTitle)
    );
    assert_eq!(graph.node_count(), 1);
}
