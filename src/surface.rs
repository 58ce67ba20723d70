//! Ports connecting the layout engine to a rendering environment.
//!
//! The engine never computes glyph metrics itself: it draws fragments
//! through a [`TextSurface`], forces a flush, and reads back measured
//! boxes in device space, mapping them into logical space with the
//! surface's [`Transform`]. Any backend that can draw a single-style
//! text run and report its bounding box can implement these traits.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::style::ResolvedStyle;
use crate::Rect;

mod mono;

pub use mono::{MonoFragment, MonoSurface, MonoTransform};

new_key_type! {
    /// Handle to a fragment drawn on a surface.
    pub struct FragmentId;

    /// Handle to a nested drawing region created on a surface.
    pub struct RegionId;
}

/// The logical coordinate space a caller positions text in.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoordinateSpace {
    /// The local plot region's data space.
    Data,
    /// The whole canvas, in normalized canvas coordinates.
    Canvas,
}

impl Default for CoordinateSpace {
    fn default() -> Self {
        CoordinateSpace::Data
    }
}

/// An error reported by a surface backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SurfaceError(pub String);

/// Maps between a logical coordinate space and device pixels.
pub trait Transform {
    fn logical_to_device(&self, point: Vec2) -> Vec2;

    fn device_to_logical(&self, rect: Rect) -> Rect;
}

/// A drawing surface that can render single-style text fragments and
/// report their measured extents.
///
/// Fragments are anchored at their top-left corner: `pos.x` is the left
/// edge and `pos.y` the top edge of the rendered run (logical space is
/// y-up). [`TextSurface::flush`] must commit pending draws so that
/// [`TextSurface::device_extent`] reflects final geometry.
pub trait TextSurface {
    type Transform: Transform;

    /// The transform for one of the surface's logical spaces.
    fn transform(&self, space: CoordinateSpace) -> Self::Transform;

    /// Renders a fragment at a logical position and returns its handle.
    fn draw_fragment(
        &mut self,
        text: &str,
        style: &ResolvedStyle,
        pos: Vec2,
        space: CoordinateSpace,
    ) -> Result<FragmentId, SurfaceError>;

    /// Commits pending draws so measurements are accurate.
    fn flush(&mut self);

    /// The tight bounding box of a committed fragment, in device pixels.
    fn device_extent(&self, id: FragmentId) -> Result<Rect, SurfaceError>;

    /// Moves an already-rendered fragment without re-measuring it.
    fn set_position(&mut self, id: FragmentId, pos: Vec2) -> Result<(), SurfaceError>;

    /// Creates a nested drawing region covering `bounds`.
    fn create_region(
        &mut self,
        bounds: Rect,
        space: CoordinateSpace,
    ) -> Result<RegionId, SurfaceError>;
}
