//! Inspect a save root: node listing, single nodes, statistics.

use anyhow::{bail, Result};
use colored::Colorize;
use modeller::prelude::*;
use std::collections::HashMap;

use super::Context;

pub fn show(ctx: &Context, title: Option<&str>, json: bool) -> Result<()> {
    let graph = ctx.load()?;
    let snapshot = graph.snapshot();

    match title {
        None if json => println!("{}", snapshot.to_json()?),
        None => list(&graph),
        Some(title) => {
            let Some(node) = snapshot.node(title) else {
                bail!("No node titled {}", title.cyan());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(node)?);
            } else {
                print_node(&graph, node);
            }
        }
    }
    Ok(())
}

fn list(graph: &PhysicalGraph) {
    if graph.node_count() == 0 {
        println!("{} The model is empty. Add a node with {}.", "•".yellow(), "modeller add".cyan());
        return;
    }
    for (i, node) in graph.nodes().enumerate() {
        let degree = graph.store().incident_connections(&node.title).len();
        println!(
            "  {:>3}  {:<32} {} connection(s)  ({:.1}, {:.1}, {:.1})",
            i.to_string().dimmed(),
            node.title.cyan(),
            degree,
            node.position.x,
            node.position.y,
            node.position.z
        );
    }
}

fn print_node(graph: &PhysicalGraph, node: &NodeSnapshot) {
    println!("{}", node.title.white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!(
        "  Position: ({:.2}, {:.2}, {:.2})",
        node.position.x, node.position.y, node.position.z
    );

    let neighbours: Vec<String> = graph
        .store()
        .incident_connections(&node.title)
        .into_iter()
        .map(|(a, b)| if a == node.title { b } else { a })
        .collect();
    if neighbours.is_empty() {
        println!("  Connections: {}", "none".dimmed());
    } else {
        println!("  Connections: {}", neighbours.join(", ").cyan());
    }
    println!();
    if node.body.is_empty() {
        println!("{}", "(empty body)".dimmed());
    } else {
        println!("{}", node.body);
    }
}

/// Number of connected components, by union-find over sphere order.
fn components(graph: &PhysicalGraph) -> usize {
    let slot: HashMap<&str, usize> = graph
        .id_to_title()
        .iter()
        .enumerate()
        .map(|(i, title)| (title.as_str(), i))
        .collect();
    let mut parent: Vec<usize> = (0..slot.len()).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    for (a, b) in &graph.store().connections {
        if let (Some(&a), Some(&b)) = (slot.get(a.as_str()), slot.get(b.as_str())) {
            let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
            parent[ra] = rb;
        }
    }
    (0..parent.len()).filter(|&i| find(&mut parent, i) == i).count()
}

pub fn stats(ctx: &Context) -> Result<()> {
    let graph = ctx.load()?;
    let n = graph.node_count();
    let e = graph.connection_count();

    let isolated = graph
        .id_to_title()
        .iter()
        .filter(|title| graph.store().incident_connections(title).is_empty())
        .count();

    let lengths: Vec<f32> = (0..e)
        .filter_map(|k| graph.line(k))
        .map(|record| record.line.a.distance_to(&record.line.b))
        .collect();
    let mean_length = if lengths.is_empty() {
        0.0
    } else {
        lengths.iter().sum::<f32>() / lengths.len() as f32
    };

    let centroid = if n > 0 {
        graph.nodes().fold(Vec3::ZERO, |acc, node| acc + node.position) * (1.0 / n as f32)
    } else {
        Vec3::ZERO
    };
    let radius = graph
        .nodes()
        .map(|node| node.position.distance_to(&centroid))
        .fold(0.0f32, f32::max);

    println!("{}", "Mental Model Statistics".white().bold());
    println!("{}", "═".repeat(40).dimmed());
    println!();

    println!("{}", "Graph Structure".blue().bold());
    println!("  Nodes:             {}", n.to_string().cyan());
    println!("  Connections:       {}", e.to_string().cyan());
    println!("  Components:        {}", components(&graph).to_string().cyan());
    println!("  Isolated nodes:    {}", isolated.to_string().cyan());
    println!("  Render ids:        {}", graph.layout().len().to_string().cyan());
    if n > 1 {
        let max_edges = n * (n - 1) / 2;
        println!("  Density:           {:.6}", e as f64 / max_edges as f64);
    }
    println!();

    println!("{}", "Layout".blue().bold());
    println!("  Mean line length:  {:.2}", mean_length);
    println!("  Radius:            {:.2}", radius);
    println!(
        "  Pair equilibrium:  {:.2}",
        graph.config().equilibrium_distance()
    );
    println!();
    println!("{}", "═".repeat(40).dimmed());

    Ok(())
}
