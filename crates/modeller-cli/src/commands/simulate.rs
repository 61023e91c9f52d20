//! Run the force layout.

use anyhow::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use modeller::prelude::*;

use super::Context;

fn kinetic_energy(graph: &PhysicalGraph) -> f32 {
    graph.nodes().map(|node| node.velocity.length_squared() / 2.0).sum()
}

pub fn run(ctx: &Context, steps: Option<usize>) -> Result<()> {
    let steps = steps.unwrap_or(ctx.config.simulation.default_steps);

    println!("{} Loading {}...", "→".blue(), ctx.root.display());
    let mut graph = ctx.load()?;
    println!(
        "  Loaded: {} nodes, {} connections",
        graph.node_count().to_string().cyan(),
        graph.connection_count().to_string().cyan()
    );

    println!("{} Running {} steps...", "→".blue(), steps.to_string().cyan());

    let pb = ProgressBar::new(steps as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} steps")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let report_every = (steps / 10).max(1);
    for step in 0..steps {
        graph.step();
        if ctx.verbose && (step + 1) % report_every == 0 {
            pb.println(format!("  step {}: energy {:.6}", step + 1, kinetic_energy(&graph)));
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    ctx.save(&graph)?;

    println!();
    println!("{} Simulation complete!", "✓".green().bold());
    println!("  Kinetic energy: {}", format!("{:.6}", kinetic_energy(&graph)).green());
    Ok(())
}
