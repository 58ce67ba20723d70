//! The public call surface: one entry point that parses, lays out, and
//! commits a whole block of highlighted text.

use glam::Vec2;
use palette::Srgba;

use crate::layout::{
    Anchor, BlankLinePolicy, Capabilities, HAlign, Layouter, PlacedText, Spacing, VAlign,
};
use crate::markup::parse;
use crate::style::{
    default_color, default_highlight_color, BoxEffect, OneOrMany, Outline, Slant, TextStyle,
    Weight, DEFAULT_SIZE,
};
use crate::surface::{CoordinateSpace, RegionId, TextSurface, Transform};
use crate::Error;

/// Style and placement options for [`text_at`].
///
/// The `highlight_*` lists are broadcast-or-per-occurrence: a single
/// value applies to every highlighted span, while a longer list must
/// have exactly one entry per span (anything else is a hard error
/// naming both counts).
#[derive(Debug, Clone, PartialEq)]
pub struct TextOptions {
    /// Color of unhighlighted text.
    pub color: Srgba<u8>,
    /// Base font size in points.
    pub size: f32,
    /// Weight of unhighlighted text.
    pub weight: Weight,
    /// Slant of unhighlighted text.
    pub slant: Slant,

    pub highlight_colors: OneOrMany<Srgba<u8>>,
    pub highlight_weights: OneOrMany<Weight>,
    pub highlight_slants: OneOrMany<Slant>,
    pub highlight_outlines: OneOrMany<Option<Outline>>,
    pub highlight_boxes: OneOrMany<Option<BoxEffect>>,

    /// Delimiter pair enclosing highlighted spans.
    pub delim: (char, char),

    pub ha: HAlign,
    pub va: VAlign,
    pub spacing: Spacing,
    pub capabilities: Capabilities,
    /// Which of the surface's logical spaces `pos` is given in.
    pub space: CoordinateSpace,
}

impl Default for TextOptions {
    fn default() -> Self {
        Self {
            color: default_color(),
            size: DEFAULT_SIZE,
            weight: Weight::default(),
            slant: Slant::default(),
            highlight_colors: OneOrMany::One(default_highlight_color()),
            highlight_weights: OneOrMany::One(Weight::default()),
            highlight_slants: OneOrMany::One(Slant::default()),
            highlight_outlines: OneOrMany::One(None),
            highlight_boxes: OneOrMany::One(None),
            delim: ('<', '>'),
            ha: HAlign::default(),
            va: VAlign::default(),
            spacing: Spacing::default(),
            capabilities: Capabilities::default(),
            space: CoordinateSpace::default(),
        }
    }
}

impl TextOptions {
    pub fn color(mut self, color: Srgba<u8>) -> Self {
        self.color = color;
        self
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn weight(mut self, weight: Weight) -> Self {
        self.weight = weight;
        self
    }

    pub fn slant(mut self, slant: Slant) -> Self {
        self.slant = slant;
        self
    }

    pub fn highlight_colors(mut self, colors: impl Into<OneOrMany<Srgba<u8>>>) -> Self {
        self.highlight_colors = colors.into();
        self
    }

    pub fn highlight_weights(mut self, weights: impl Into<OneOrMany<Weight>>) -> Self {
        self.highlight_weights = weights.into();
        self
    }

    pub fn highlight_slants(mut self, slants: impl Into<OneOrMany<Slant>>) -> Self {
        self.highlight_slants = slants.into();
        self
    }

    pub fn highlight_outlines(mut self, outlines: impl Into<OneOrMany<Option<Outline>>>) -> Self {
        self.highlight_outlines = outlines.into();
        self
    }

    pub fn highlight_boxes(mut self, boxes: impl Into<OneOrMany<Option<BoxEffect>>>) -> Self {
        self.highlight_boxes = boxes.into();
        self
    }

    pub fn delim(mut self, open: char, close: char) -> Self {
        self.delim = (open, close);
        self
    }

    pub fn ha(mut self, ha: HAlign) -> Self {
        self.ha = ha;
        self
    }

    pub fn va(mut self, va: VAlign) -> Self {
        self.va = va;
        self
    }

    pub fn hpadding(mut self, hpadding: f32) -> Self {
        self.spacing.hpadding = hpadding;
        self
    }

    pub fn linespacing(mut self, linespacing: f32) -> Self {
        self.spacing.linespacing = linespacing;
        self
    }

    pub fn blank_line_policy(mut self, policy: BlankLinePolicy) -> Self {
        self.spacing.blank_line_policy = policy;
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn space(mut self, space: CoordinateSpace) -> Self {
        self.space = space;
        self
    }

    /// The merged base style for plain fragments.
    fn base_style(&self) -> TextStyle {
        TextStyle {
            color: Some(self.color),
            size: Some(self.size),
            weight: Some(self.weight),
            slant: Some(self.slant),
            outline: None,
            boxed: None,
        }
    }

    /// Expands the broadcast lists into one style per occurrence,
    /// validating every list length first.
    fn occurrence_styles(&self, occurrences: usize) -> Result<Vec<TextStyle>, Error> {
        self.highlight_colors.validate(occurrences, "colors")?;
        self.highlight_weights.validate(occurrences, "weights")?;
        self.highlight_slants.validate(occurrences, "styles")?;
        self.highlight_outlines.validate(occurrences, "outlines")?;
        self.highlight_boxes.validate(occurrences, "boxes")?;

        Ok((0..occurrences)
            .map(|i| TextStyle {
                color: Some(*self.highlight_colors.get(i)),
                size: None,
                weight: Some(*self.highlight_weights.get(i)),
                slant: Some(*self.highlight_slants.get(i)),
                outline: *self.highlight_outlines.get(i),
                boxed: *self.highlight_boxes.get(i),
            })
            .collect())
    }
}

/// Parses `markup` and lays it out on `surface` anchored at `pos`.
///
/// Delimiter balance and the highlight style lists are validated
/// before anything is drawn, so those failures have no side effects.
/// A measurement or placement failure mid-layout aborts the call and
/// leaves any fragments drawn so far on the surface.
pub fn text_at<S: TextSurface>(
    surface: &mut S,
    pos: Vec2,
    markup: &str,
    options: &TextOptions,
) -> Result<PlacedText, Error> {
    let (open, close) = options.delim;
    let open_count = markup.matches(open).count();
    let close_count = markup.matches(close).count();
    if open_count != close_count {
        return Err(Error::Markup {
            open,
            close,
            open_count,
            close_count,
        });
    }

    let styles = options.occurrence_styles(open_count)?;
    let rows = parse(markup, options.delim, &options.base_style(), &styles)?;

    let anchor = Anchor {
        pos,
        ha: options.ha,
        va: options.va,
    };
    Layouter::new(surface, options.space, options.spacing, options.capabilities)
        .layout(&rows, anchor)
}

/// Creates a nested drawing region over each placed highlight.
///
/// `requested` must equal the number of highlighted fragments in
/// `placed`. The surface is flushed first so the committed boxes are
/// current; regions come back in highlight-occurrence order.
pub fn highlight_regions<S: TextSurface>(
    surface: &mut S,
    placed: &PlacedText,
    requested: usize,
) -> Result<Vec<RegionId>, Error> {
    if !placed.capabilities().nested_regions {
        return Err(Error::RegionsUnsupported);
    }
    let highlights = placed.highlight_count();
    if requested != highlights {
        return Err(Error::RegionCount {
            requested,
            highlights,
        });
    }

    surface.flush();
    let transform = surface.transform(placed.space());

    let mut regions = Vec::with_capacity(requested);
    for fragment in placed.highlights() {
        let device = surface
            .device_extent(fragment.id())
            .map_err(|source| Error::Measurement {
                row: fragment.row(),
                index: fragment.index(),
                source,
            })?;
        let bounds = transform.device_to_logical(device);
        let region = surface
            .create_region(bounds, placed.space())
            .map_err(|source| Error::Placement {
                row: fragment.row(),
                index: fragment.index(),
                source,
            })?;
        regions.push(region);
    }
    Ok(regions)
}
