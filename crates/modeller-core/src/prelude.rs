//! Modeller Core Prelude: convenient imports for common usage.
//!
//! ```rust
//! use modeller_core::prelude::*;
//! ```

pub use crate::types::{Highlight, Label, Line, ScreenPoint, Sphere, Vec3};

pub use crate::filename::is_valid_filename;

pub use crate::selection::{resolve_selection, RenderKind, RenderLayout, Selection};

pub use crate::render::{RenderBackend, Renderable};

pub use crate::error::{
    GraphError, ModelError, PersistError, Result, StoreError, Violation,
};
