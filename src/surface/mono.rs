//! A deterministic software surface with fixed glyph metrics.
//!
//! [`MonoSurface`] treats every character as a fixed-width cell and
//! every row as one line height, so layout results are exactly
//! predictable. It backs the crate's tests and is useful for headless
//! callers that only need placement data, not pixels.

use glam::{vec2, Vec2};
use slotmap::SlotMap;

use super::{CoordinateSpace, FragmentId, RegionId, SurfaceError, TextSurface, Transform};
use crate::style::{ResolvedStyle, DEFAULT_SIZE};
use crate::Rect;

/// A fragment recorded by a [`MonoSurface`].
#[derive(Debug, Clone)]
pub struct MonoFragment {
    pub text: String,
    pub style: ResolvedStyle,
    /// Top-left anchor in logical coordinates.
    pub pos: Vec2,
    pub space: CoordinateSpace,
}

/// A uniform-scale transform between logical and device space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MonoTransform {
    scale: f32,
}

impl Transform for MonoTransform {
    fn logical_to_device(&self, point: Vec2) -> Vec2 {
        point * self.scale
    }

    fn device_to_logical(&self, rect: Rect) -> Rect {
        rect.scaled(1. / self.scale)
    }
}

/// Fixed-metrics software surface.
///
/// Every character advances by `advance` logical units and every
/// fragment is `line_height` tall, both scaled linearly by the style's
/// font size relative to [`DEFAULT_SIZE`]. Decorations (outline, box)
/// pad the measured extent on all sides, mirroring how a real
/// backend's measurement includes them.
#[derive(Debug)]
pub struct MonoSurface {
    fragments: SlotMap<FragmentId, MonoFragment>,
    regions: SlotMap<RegionId, (Rect, CoordinateSpace)>,
    advance: f32,
    line_height: f32,
    data_scale: f32,
    canvas_scale: f32,
    /// Draws or moves since the last flush. Measuring while dirty is
    /// an error, which keeps callers honest about flushing.
    dirty: bool,
    flushes: usize,
}

impl MonoSurface {
    pub fn new() -> Self {
        Self::with_metrics(8., 16.)
    }

    pub fn with_metrics(advance: f32, line_height: f32) -> Self {
        Self {
            fragments: SlotMap::with_key(),
            regions: SlotMap::with_key(),
            advance,
            line_height,
            data_scale: 2.,
            canvas_scale: 1.,
            dirty: false,
            flushes: 0,
        }
    }

    pub fn advance(&self) -> f32 {
        self.advance
    }

    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    pub fn fragment(&self, id: FragmentId) -> Option<&MonoFragment> {
        self.fragments.get(id)
    }

    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    pub fn region(&self, id: RegionId) -> Option<Rect> {
        self.regions.get(id).map(|(bounds, _)| *bounds)
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    pub fn flush_count(&self) -> usize {
        self.flushes
    }

    fn scale(&self, space: CoordinateSpace) -> f32 {
        match space {
            CoordinateSpace::Data => self.data_scale,
            CoordinateSpace::Canvas => self.canvas_scale,
        }
    }

    /// The tight logical box of a fragment at its current position.
    fn logical_extent(&self, fragment: &MonoFragment) -> Rect {
        let decoration = fragment
            .style
            .outline
            .map(|outline| 2. * outline.width)
            .unwrap_or(0.)
            + fragment.style.boxed.map(|b| 2. * b.pad).unwrap_or(0.);
        let size_factor = fragment.style.size / DEFAULT_SIZE;
        let width =
            fragment.text.chars().count() as f32 * self.advance * size_factor + decoration;
        let height = self.line_height * size_factor + decoration;
        Rect::new(
            vec2(fragment.pos.x, fragment.pos.y - height),
            vec2(width, height),
        )
    }
}

impl Default for MonoSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSurface for MonoSurface {
    type Transform = MonoTransform;

    fn transform(&self, space: CoordinateSpace) -> MonoTransform {
        MonoTransform {
            scale: self.scale(space),
        }
    }

    fn draw_fragment(
        &mut self,
        text: &str,
        style: &ResolvedStyle,
        pos: Vec2,
        space: CoordinateSpace,
    ) -> Result<FragmentId, SurfaceError> {
        if text.is_empty() {
            return Err(SurfaceError("cannot draw an empty fragment".to_owned()));
        }
        self.dirty = true;
        Ok(self.fragments.insert(MonoFragment {
            text: text.to_owned(),
            style: style.clone(),
            pos,
            space,
        }))
    }

    fn flush(&mut self) {
        self.dirty = false;
        self.flushes += 1;
    }

    fn device_extent(&self, id: FragmentId) -> Result<Rect, SurfaceError> {
        if self.dirty {
            return Err(SurfaceError(
                "measured before pending draws were flushed".to_owned(),
            ));
        }
        let fragment = self
            .fragments
            .get(id)
            .ok_or_else(|| SurfaceError("unknown fragment handle".to_owned()))?;
        Ok(self
            .logical_extent(fragment)
            .scaled(self.scale(fragment.space)))
    }

    fn set_position(&mut self, id: FragmentId, pos: Vec2) -> Result<(), SurfaceError> {
        let fragment = self
            .fragments
            .get_mut(id)
            .ok_or_else(|| SurfaceError("unknown fragment handle".to_owned()))?;
        fragment.pos = pos;
        self.dirty = true;
        Ok(())
    }

    fn create_region(
        &mut self,
        bounds: Rect,
        space: CoordinateSpace,
    ) -> Result<RegionId, SurfaceError> {
        Ok(self.regions.insert((bounds, space)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Outline;
    use palette::Srgba;

    #[test]
    fn measures_fixed_cells() {
        let mut surface = MonoSurface::new();
        let style = ResolvedStyle::default();
        let id = surface
            .draw_fragment("hello", &style, vec2(10., 50.), CoordinateSpace::Canvas)
            .unwrap();
        surface.flush();

        // Canvas scale is 1, so the device box equals the logical box.
        let extent = surface.device_extent(id).unwrap();
        assert_eq!(extent.left(), 10.);
        assert_eq!(extent.top(), 50.);
        assert_eq!(extent.width(), 5. * 8.);
        assert_eq!(extent.height(), 16.);
    }

    #[test]
    fn data_space_is_scaled() {
        let mut surface = MonoSurface::new();
        let style = ResolvedStyle::default();
        let id = surface
            .draw_fragment("ab", &style, vec2(4., 8.), CoordinateSpace::Data)
            .unwrap();
        surface.flush();

        let device = surface.device_extent(id).unwrap();
        assert_eq!(device.width(), 2. * 8. * 2.);

        let transform = surface.transform(CoordinateSpace::Data);
        let logical = transform.device_to_logical(device);
        assert_eq!(logical.width(), 16.);
        assert_eq!(logical.left(), 4.);
        assert_eq!(logical.top(), 8.);
    }

    #[test]
    fn decorations_grow_the_extent() {
        let mut surface = MonoSurface::new();
        let mut style = ResolvedStyle::default();
        style.outline = Some(Outline {
            width: 1.5,
            color: Srgba::new(0, 0, 0, 255),
        });
        let id = surface
            .draw_fragment("x", &style, Vec2::ZERO, CoordinateSpace::Canvas)
            .unwrap();
        surface.flush();

        let extent = surface.device_extent(id).unwrap();
        assert_eq!(extent.width(), 8. + 3.);
        assert_eq!(extent.height(), 16. + 3.);
    }

    #[test]
    fn metrics_scale_with_font_size() {
        let mut surface = MonoSurface::new();
        let mut style = ResolvedStyle::default();
        style.size = DEFAULT_SIZE * 2.;
        let id = surface
            .draw_fragment("ab", &style, Vec2::ZERO, CoordinateSpace::Canvas)
            .unwrap();
        surface.flush();

        let extent = surface.device_extent(id).unwrap();
        assert_eq!(extent.width(), 2. * 8. * 2.);
        assert_eq!(extent.height(), 32.);
    }

    #[test]
    fn measuring_before_flush_fails() {
        let mut surface = MonoSurface::new();
        let style = ResolvedStyle::default();
        let id = surface
            .draw_fragment("x", &style, Vec2::ZERO, CoordinateSpace::Canvas)
            .unwrap();
        assert!(surface.device_extent(id).is_err());

        surface.flush();
        assert!(surface.device_extent(id).is_ok());

        surface.set_position(id, vec2(1., 1.)).unwrap();
        assert!(surface.device_extent(id).is_err());
    }

    #[test]
    fn empty_fragment_is_rejected() {
        let mut surface = MonoSurface::new();
        let style = ResolvedStyle::default();
        assert!(surface
            .draw_fragment("", &style, Vec2::ZERO, CoordinateSpace::Canvas)
            .is_err());
    }
}
