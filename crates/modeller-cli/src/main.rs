//! Modeller CLI - command-line editing of mental model save roots.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use modeller::prelude::Vec3;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::commands::Context;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "modeller")]
#[command(author, version, about = "Modeller - mental models as force-directed graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Save root (default: [model] root from modeller.toml)
    #[arg(short, long, global = true)]
    root: Option<PathBuf>,

    /// Config file (default: modeller.toml in this or a parent directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Seed for the positions of nodes that have none saved
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a modeller.toml and an empty save root
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Add a node
    Add {
        /// Title (default: the next free "New Node" title)
        title: Option<String>,

        /// Body text
        #[arg(short, long)]
        body: Option<String>,

        /// Position as x,y,z (default: random)
        #[arg(long, value_parser = commands::edit::parse_vec3, allow_hyphen_values = true)]
        at: Option<Vec3>,
    },

    /// Rename a node
    Rename {
        old: String,
        new: String,
    },

    /// Replace a node's body
    Edit {
        title: String,

        /// New body text
        #[arg(short, long, conflicts_with = "file")]
        body: Option<String>,

        /// Read the new body from a file
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Remove a node and its connections
    Remove {
        title: String,
    },

    /// Connect two nodes
    Connect {
        a: String,
        b: String,
    },

    /// Remove the connection between two nodes
    Disconnect {
        a: String,
        b: String,
    },

    /// Run the force layout and save the result
    Simulate {
        /// Number of steps (default: [simulation] default_steps)
        #[arg(short, long)]
        steps: Option<usize>,
    },

    /// List nodes, or show one node
    Show {
        title: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Show graph statistics
    Stats,

    /// Verify the save root and report leftovers from interrupted saves
    Check,

    /// Move an orphaned backup back into place
    Recover,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let command = match cli.command {
        Commands::Init { path } => return commands::init::run(path, cli.root),
        command => command,
    };

    let config = Config::load(cli.config.as_deref())?;
    let ctx = Context {
        root: cli.root.unwrap_or_else(|| config.model.root.clone()),
        config,
        seed: cli.seed,
        verbose: cli.verbose,
    };

    match command {
        Commands::Init { .. } => Ok(()),
        Commands::Add { title, body, at } => commands::edit::add(&ctx, title, body, at),
        Commands::Rename { old, new } => commands::edit::rename(&ctx, &old, &new),
        Commands::Edit { title, body, file } => commands::edit::edit(&ctx, &title, body, file),
        Commands::Remove { title } => commands::edit::remove(&ctx, &title),
        Commands::Connect { a, b } => commands::link::connect(&ctx, &a, &b),
        Commands::Disconnect { a, b } => commands::link::disconnect(&ctx, &a, &b),
        Commands::Simulate { steps } => commands::simulate::run(&ctx, steps),
        Commands::Show { title, json } => commands::show::show(&ctx, title.as_deref(), json),
        Commands::Stats => commands::show::stats(&ctx),
        Commands::Check => commands::check::check(&ctx),
        Commands::Recover => commands::check::recover(&ctx),
    }
}
