//! # Modeller Core
//!
//! Core types and rules shared by every Mental Modeller crate.
//!
//! A mental model is a small graph of titled free-text nodes joined by
//! undirected connections. This crate holds the pieces that do not depend on
//! how the graph is stored or simulated:
//!
//! - **types**: `Vec3`, screen points, and the derived renderables
//!   (spheres, labels, lines)
//! - **filename**: the portable file-name predicate every node title must pass
//! - **selection**: the three-range render id layout and the
//!   node-over-connection hit resolution rule
//! - **render**: the trait a rendering collaborator implements
//! - **error**: the error taxonomy used across the workspace
//!
//! ## Quick Start
//!
//! ```rust
//! use modeller_core::prelude::*;
//!
//! assert!(is_valid_filename("Palau Economics"));
//! assert!(!is_valid_filename("CON.txt"));
//!
//! // Two nodes, one connection: ids 0..2 are spheres, 2 is the line, 3..5 are labels.
//! let layout = RenderLayout::new(2, 1);
//! assert_eq!(layout.classify(3), Some(RenderKind::Label(0)));
//! ```

pub mod types;
pub mod filename;
pub mod selection;
pub mod render;
pub mod error;
pub mod prelude;
