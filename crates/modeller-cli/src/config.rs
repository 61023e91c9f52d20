//! Configuration management for the Modeller CLI.

use anyhow::{Context, Result};
use modeller::prelude::PhysicsConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the config file searched for in the current and parent directories.
pub const CONFIG_FILE: &str = "modeller.toml";

/// Modeller project configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub physics: PhysicsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Save root used when `--root` is not given.
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default = "default_steps")]
    pub default_steps: usize,
}

// Default value functions
fn default_root() -> PathBuf { PathBuf::from("model") }
fn default_steps() -> usize { 500 }

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            default_steps: default_steps(),
        }
    }
}

impl Config {
    /// Load config from `explicit`, or from modeller.toml in the current or
    /// parent directories. The root path is resolved against the directory
    /// holding the file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => find_config_file(),
        };
        let Some(path) = path else {
            return Ok(Config::default());
        };

        let mut config = Self::load_from(&path)?;
        if config.model.root.is_relative() {
            if let Some(dir) = path.parent() {
                config.model.root = dir.join(&config.model.root);
            }
        }
        Ok(config)
    }

    /// Parse a config file as written, without resolving paths.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;
        config
            .physics
            .validate()
            .with_context(|| format!("Invalid [physics] in {}", path.display()))?;
        Ok(config)
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }
}

/// Find modeller.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
