//! The rendering collaborator.
//!
//! Projection, depth sorting keys, shape computation, and drawing belong to
//! whatever renderer hosts the graph. The graph only needs the handful of
//! answers below to run a frame and resolve what the pointer is over.

use crate::types::{Highlight, Label, Line, ScreenPoint, Sphere};

/// A borrowed view of one derived renderable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Renderable<'a> {
    Sphere(&'a Sphere),
    Line(&'a Line),
    Label(&'a Label),
}

/// Implemented by renderers that can display a graph frame.
pub trait RenderBackend {
    /// Screen-space shape used for hit testing.
    type Shape;

    /// Distance from the camera. Larger values are farther away.
    fn depth(&self, item: Renderable<'_>) -> f32;

    /// Project the item onto the viewport. `None` when it is off screen.
    fn compute_shape(&self, item: Renderable<'_>) -> Option<Self::Shape>;

    /// Whether the projected shape contains `point`.
    fn collides(&self, shape: &Self::Shape, point: ScreenPoint) -> bool;

    /// Draw the item.
    fn draw(&mut self, item: Renderable<'_>, highlight: Highlight);
}
