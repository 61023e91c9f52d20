//! Modeller Runtime Prelude: convenient imports for common usage.
//!
//! ```rust
//! use modeller_runtime::prelude::*;
//! ```

pub use crate::store::{GraphStore, CONNECTIONS_FILE, RESERVED_TITLE};

pub use crate::physical::{
    Outcome, PhysicalGraph, PhysicalLine, PhysicalNode, Rejection, Validation, GRAPH_DIR,
};

pub use crate::physics::{PhysicsConfig, SimulationState};

pub use crate::codec::POSITIONS_FILE;

pub use crate::render_index::{RenderEntry, RenderIndex, RenderTarget};

pub use crate::snapshot::{GraphSnapshot, NodeSnapshot};

pub use crate::editor::{Editor, EditorEvent, Focus, Intent, Mode, Refusal};

pub use crate::swap::{restore_backup, SwapPaths};
