//! Connection edits: connect and disconnect.

use anyhow::Result;
use colored::Colorize;
use modeller::prelude::*;

use super::{report_ignored, Context};

pub fn connect(ctx: &Context, a: &str, b: &str) -> Result<()> {
    let mut graph = ctx.load()?;
    match graph.add_connection(a, b)? {
        Outcome::Applied => {
            ctx.save(&graph)?;
            println!("{} Connected {} ↔ {}", "✓".green(), a.cyan(), b.cyan());
        }
        Outcome::Ignored(rejection) => report_ignored("Connection", rejection),
    }
    Ok(())
}

pub fn disconnect(ctx: &Context, a: &str, b: &str) -> Result<()> {
    let mut graph = ctx.load()?;
    graph.remove_connection(a, b)?;
    ctx.save(&graph)?;
    println!("{} Disconnected {} ↔ {}", "✓".green(), a.cyan(), b.cyan());
    Ok(())
}
