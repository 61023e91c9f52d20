//! CLI command implementations.

pub mod init;
pub mod edit;
pub mod link;
pub mod simulate;
pub mod show;
pub mod check;

use anyhow::{bail, Context as _, Result};
use colored::Colorize;
use modeller::prelude::*;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// Settings shared by every command that works on a save root.
pub struct Context {
    pub root: PathBuf,
    pub config: Config,
    pub seed: Option<u64>,
    pub verbose: bool,
}

impl Context {
    /// Load the save root.
    pub fn load(&self) -> Result<PhysicalGraph> {
        debug!(root = %self.root.display(), seed = ?self.seed, "loading save root");
        match PhysicalGraph::load_with(&self.root, self.config.physics.clone(), self.seed) {
            Ok(graph) => Ok(graph),
            Err(ModelError::Persist(PersistError::OrphanedBackup(backup))) => bail!(
                "{} is missing but a backup survived at {}. Run {} to restore it.",
                self.root.display(),
                backup.display(),
                "modeller recover".cyan()
            ),
            Err(ModelError::Persist(PersistError::MissingRoot(_))) => bail!(
                "No save root at {}. Run {} first.",
                self.root.display(),
                "modeller init".cyan()
            ),
            Err(err) => Err(err).with_context(|| format!("Failed to load {}", self.root.display())),
        }
    }

    /// Save atomically back to the save root.
    pub fn save(&self, graph: &PhysicalGraph) -> Result<()> {
        if let Err(err) = graph.save(&self.root) {
            if err.is_critical() {
                eprintln!("{} {}", "CRITICAL:".red().bold(), err);
            }
            return Err(err).with_context(|| format!("Failed to save {}", self.root.display()));
        }
        if self.verbose {
            println!("  {} Saved {}", "✓".green(), self.root.display());
        }
        Ok(())
    }
}

/// Print why an edit did nothing.
pub fn report_ignored(what: &str, rejection: Rejection) {
    println!("{} {} not applied: {}", "•".yellow(), what, rejection);
}
