//! Initialize a new Modeller project.

use anyhow::{Context, Result};
use colored::Colorize;
use modeller::prelude::*;
use std::path::PathBuf;

use crate::config::{Config, CONFIG_FILE};

pub fn run(path: Option<PathBuf>, root: Option<PathBuf>) -> Result<()> {
    let base_path = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    println!("{} Initializing Modeller project...", "→".blue());

    std::fs::create_dir_all(&base_path)
        .with_context(|| format!("Failed to create {}", base_path.display()))?;

    // Create default config
    let config_path = base_path.join(CONFIG_FILE);
    let mut config = Config::default();
    if let Some(root) = root {
        config.model.root = root;
    }
    if !config_path.exists() {
        config.save(&config_path)?;
        println!("  {} Created {}", "✓".green(), config_path.display());
    } else {
        config = Config::load_from(&config_path)?;
        println!("  {} {} already exists", "•".yellow(), config_path.display());
    }

    // Create an empty save root
    let root_path = base_path.join(&config.model.root);
    if root_path.exists() {
        println!("  {} {} already exists", "•".yellow(), root_path.display());
    } else {
        let graph = PhysicalGraph::new(GraphStore::new())?;
        graph
            .save(&root_path)
            .with_context(|| format!("Failed to create {}", root_path.display()))?;
        println!("  {} Created {}", "✓".green(), root_path.display());
    }

    println!();
    println!("{} Modeller project initialized!", "✓".green().bold());
    println!();
    println!("Next steps:");
    println!("  {} modeller add \"First idea\" --body \"...\"", "1.".blue());
    println!("  {} modeller connect \"First idea\" \"Second idea\"", "2.".blue());
    println!("  {} modeller simulate", "3.".blue());

    Ok(())
}
