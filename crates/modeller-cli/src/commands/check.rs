//! Save root health: invariant check and backup recovery.

use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use modeller::prelude::*;

use super::Context;

pub fn check(ctx: &Context) -> Result<()> {
    let paths = SwapPaths::for_save_root(&ctx.root)?;
    let mut warnings = 0;

    if paths.temp.exists() {
        warnings += 1;
        println!(
            "  {} Leftover temp directory {} (an earlier save was interrupted)",
            "•".yellow(),
            paths.temp.display()
        );
    }
    if paths.backup.exists() && ctx.root.exists() {
        warnings += 1;
        println!(
            "  {} Stale backup {} next to a complete save root",
            "•".yellow(),
            paths.backup.display()
        );
    }

    let graph = ctx.load()?;
    if let Err(violation) = graph.validate() {
        bail!("{} is inconsistent: {}", ctx.root.display(), violation);
    }

    println!(
        "{} {} is valid: {} nodes, {} connections, {} render ids",
        "✓".green(),
        ctx.root.display(),
        graph.node_count(),
        graph.connection_count(),
        graph.layout().len()
    );
    if warnings > 0 {
        println!("  {} warning(s)", warnings.to_string().yellow());
    }
    Ok(())
}

pub fn recover(ctx: &Context) -> Result<()> {
    let paths = SwapPaths::for_save_root(&ctx.root)?;
    if ctx.root.exists() {
        println!("{} {} exists; nothing to recover", "•".yellow(), ctx.root.display());
        return Ok(());
    }

    let restored = restore_backup(&paths)
        .with_context(|| format!("Failed to restore {}", paths.backup.display()))?;
    if !restored {
        bail!(
            "No save root at {} and no backup at {}",
            ctx.root.display(),
            paths.backup.display()
        );
    }

    println!(
        "{} Restored {} from {}",
        "✓".green(),
        ctx.root.display(),
        paths.backup.display()
    );
    Ok(())
}
