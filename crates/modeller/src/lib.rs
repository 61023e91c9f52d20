//! # Modeller
//!
//! Mental models as force-directed graphs.
//!
//! A mental model is a set of titled free-text nodes joined by undirected
//! connections. Modeller keeps the text on disk as plain files (one `.txt`
//! per node plus a `CONNECTIONS.txt`), lays the graph out in 3-D with a
//! spring/repulsion simulation, and saves both atomically so an interrupted
//! save never destroys the previous copy.
//!
//! ## Quick Start
//!
//! ```rust
//! use modeller::prelude::*;
//!
//! let mut graph = PhysicalGraph::with_seed(GraphStore::new(), 42).unwrap();
//!
//! let first = graph.add_node(Vec3::new(-10.0, 0.0, 0.0)).unwrap();
//! let second = graph.add_node(Vec3::new(10.0, 0.0, 0.0)).unwrap();
//! assert_eq!(first, "New Node");
//! assert_eq!(second, "New Node 1");
//!
//! assert_eq!(graph.add_connection(&first, &second).unwrap(), Outcome::Applied);
//! // Ignored, not an error: the pair is already connected.
//! assert!(!graph.add_connection(&second, &first).unwrap().is_applied());
//!
//! graph.run(100);
//! ```
//!
//! ## Render ids
//!
//! For `N` nodes and `E` connections the render index holds `2N + E` dense
//! ids: spheres in `[0, N)`, lines in `[N, N+E)`, labels in `[N+E, 2N+E)`.
//! Node `i` owns sphere `i` and label `N+E+i`. Ids are renumbered on every
//! structural change, so hold on to titles rather than ids across edits.
//!
//! ## Saving and loading
//!
//! ```rust,no_run
//! use modeller::prelude::*;
//! use std::path::Path;
//!
//! let root = Path::new("my-model");
//! let graph = PhysicalGraph::load(root).unwrap();
//! // ... edit ...
//! graph.save(root).unwrap();
//! ```
//!
//! A save root contains `Mental-Model/` and `physics.bin`; saves go through
//! `my-model.tmp` and `my-model.bak`. If a crash leaves only the backup,
//! loading fails with `PersistError::OrphanedBackup` and
//! [`restore_backup`](runtime::swap::restore_backup) puts it back.

// Re-export all subcrates
pub use modeller_core as core;
pub use modeller_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust
/// use modeller::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use modeller_core::types::{Highlight, Label, Line, ScreenPoint, Sphere, Vec3};
    pub use modeller_core::filename::is_valid_filename;
    pub use modeller_core::selection::{resolve_selection, RenderKind, RenderLayout, Selection};

    // Core traits
    pub use modeller_core::render::{RenderBackend, Renderable};

    // Error types
    pub use modeller_core::error::{
        GraphError, ModelError, PersistError, Result, StoreError, Violation,
    };

    // Runtime
    pub use modeller_runtime::prelude::*;
}
