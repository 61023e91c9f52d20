//! # Modeller Runtime
//!
//! Graph storage, force layout, and persistence.
//!
//! A [`GraphStore`](store::GraphStore) owns node bodies and the connection
//! sequence. A [`PhysicalGraph`](physical::PhysicalGraph) wraps one store with
//! positions, velocities, and the render index, runs the mutation protocol and
//! the physics step, and saves everything into a save root through one shared
//! atomic swap routine.

pub mod store;
pub mod swap;
pub mod codec;
pub mod render_index;
pub mod physics;
pub mod physical;
pub mod snapshot;
pub mod editor;
pub mod prelude;
