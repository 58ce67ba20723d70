//! Two-pass measure-then-place layout.
//!
//! Fragment extents depend on an opaque measurement backend, so they
//! cannot be computed analytically. The engine first draws every
//! fragment of a row at a provisional position, flushes the surface,
//! and reads back measured boxes; a second pass then derives final
//! positions from the measured widths, row stacking, and the requested
//! alignment, and commits them through the placement port.
//!
//! Two simplifying assumptions are inherited from the system this
//! engine models and kept deliberately:
//! - a row's height is the measured height of its *first* fragment
//!   (rows are assumed single-line with uniform height), and
//! - the block height assumes that height for every row of the block.
//! Both are documented here rather than silently corrected; see
//! [`BlankLinePolicy`] for the one place the variants disagreed.

use std::str::FromStr;

use glam::{vec2, Vec2};
use serde::{Deserialize, Serialize};

use crate::markup::{Fragment, Row};
use crate::surface::{CoordinateSpace, FragmentId, TextSurface, Transform};
use crate::{Error, Rect};

/// Horizontal alignment of each row relative to the anchor x.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

impl Default for HAlign {
    fn default() -> Self {
        HAlign::Left
    }
}

impl FromStr for HAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "left" => Ok(HAlign::Left),
            "center" => Ok(HAlign::Center),
            "right" => Ok(HAlign::Right),
            _ => Err(Error::InvalidAlignment {
                axis: "horizontal",
                value: s.to_owned(),
                allowed: "left, center, right",
            }),
        }
    }
}

/// Vertical alignment of the block relative to the anchor y.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Center,
    Bottom,
}

impl Default for VAlign {
    fn default() -> Self {
        VAlign::Bottom
    }
}

impl FromStr for VAlign {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "top" => Ok(VAlign::Top),
            "center" => Ok(VAlign::Center),
            "bottom" => Ok(VAlign::Bottom),
            _ => Err(Error::InvalidAlignment {
                axis: "vertical",
                value: s.to_owned(),
                allowed: "top, center, bottom",
            }),
        }
    }
}

/// The reference point and alignment rule tying the block to a location.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Anchor {
    pub pos: Vec2,
    pub ha: HAlign,
    pub va: VAlign,
}

impl Anchor {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            ha: HAlign::default(),
            va: VAlign::default(),
        }
    }

    pub fn ha(mut self, ha: HAlign) -> Self {
        self.ha = ha;
        self
    }

    pub fn va(mut self, va: VAlign) -> Self {
        self.va = va;
        self
    }
}

/// Which measured height a blank separator row advances the cursor by.
///
/// The system this engine models had two variants that disagreed here,
/// so the choice is configuration rather than a hardcoded guess.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlankLinePolicy {
    /// Advance by the previous measured row's height.
    PreviousRow,
    /// Advance by the first measured row's height (a block-wide constant).
    FirstRow,
}

impl Default for BlankLinePolicy {
    fn default() -> Self {
        BlankLinePolicy::PreviousRow
    }
}

/// Spacing parameters for a layout run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spacing {
    /// Extra horizontal padding between adjacent fragments.
    pub hpadding: f32,
    /// Inter-row spacing as a factor of row height.
    pub linespacing: f32,
    pub blank_line_policy: BlankLinePolicy,
}

impl Default for Spacing {
    fn default() -> Self {
        Self {
            hpadding: 0.,
            linespacing: 0.25,
            blank_line_policy: BlankLinePolicy::default(),
        }
    }
}

/// Which optional features a layout run supports.
///
/// One engine serves the plain, decorated, and region-deriving use
/// cases; the capability set selects between them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capabilities {
    /// Apply outline and background-box effects when drawing.
    pub decorations: bool,
    /// Allow deriving nested regions from placed highlights.
    pub nested_regions: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            decorations: true,
            nested_regions: true,
        }
    }
}

/// A fragment with a committed position on the surface.
#[derive(Debug, Clone)]
pub struct PlacedFragment {
    fragment: Fragment,
    id: FragmentId,
    bounds: Rect,
    pos: Vec2,
}

impl PlacedFragment {
    pub fn id(&self) -> FragmentId {
        self.id
    }

    /// The fragment's measured box, offset to its final position.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// The committed top-left anchor position.
    pub fn pos(&self) -> Vec2 {
        self.pos
    }

    pub fn text(&self) -> &str {
        self.fragment.text()
    }

    pub fn style(&self) -> &crate::style::ResolvedStyle {
        self.fragment.style()
    }

    pub fn is_highlight(&self) -> bool {
        self.fragment.is_highlight()
    }

    pub fn highlight(&self) -> Option<usize> {
        self.fragment.highlight()
    }

    pub fn row(&self) -> usize {
        self.fragment.row()
    }

    pub fn index(&self) -> usize {
        self.fragment.index()
    }
}

/// The result of a layout run: placed fragments grouped by row.
///
/// Blank separator rows appear as empty groups so row indices line up
/// with the parsed input.
#[derive(Debug, Clone)]
pub struct PlacedText {
    rows: Vec<Vec<PlacedFragment>>,
    space: CoordinateSpace,
    capabilities: Capabilities,
}

impl PlacedText {
    pub fn rows(&self) -> &[Vec<PlacedFragment>] {
        &self.rows
    }

    pub fn fragments(&self) -> impl Iterator<Item = &PlacedFragment> {
        self.rows.iter().flatten()
    }

    /// The highlighted fragments, in occurrence order.
    pub fn highlights(&self) -> impl Iterator<Item = &PlacedFragment> {
        self.fragments().filter(|f| f.is_highlight())
    }

    pub fn highlight_count(&self) -> usize {
        self.highlights().count()
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Vec::is_empty)
    }

    /// The union of all placed fragment boxes, if any.
    pub fn bounds(&self) -> Option<Rect> {
        self.fragments()
            .map(PlacedFragment::bounds)
            .reduce(Rect::union)
    }
}

struct MeasuredRow {
    fragments: Vec<(Fragment, FragmentId, Rect)>,
    /// Per-fragment x offsets before horizontal alignment.
    xs: Vec<f32>,
    /// The provisional top-anchor y of this row.
    top: f32,
    /// Total row width including inter-fragment padding.
    width: f32,
    /// Block height estimated from this row's measured height.
    block_height: f32,
}

/// Drives the two layout passes against a surface.
///
/// Not reentrant: a layout run owns the surface for its duration, and a
/// mid-run failure leaves any fragments drawn so far in place.
pub struct Layouter<'a, S> {
    surface: &'a mut S,
    space: CoordinateSpace,
    spacing: Spacing,
    capabilities: Capabilities,
}

impl<'a, S: TextSurface> Layouter<'a, S> {
    pub fn new(
        surface: &'a mut S,
        space: CoordinateSpace,
        spacing: Spacing,
        capabilities: Capabilities,
    ) -> Self {
        Self {
            surface,
            space,
            spacing,
            capabilities,
        }
    }

    pub fn layout(self, rows: &[Row], anchor: Anchor) -> Result<PlacedText, Error> {
        let Self {
            surface,
            space,
            spacing,
            capabilities,
        } = self;
        let Spacing {
            hpadding,
            linespacing,
            blank_line_policy,
        } = spacing;

        let transform = surface.transform(space);
        let n_rows = rows.len() as f32;

        // Pass 1: draw every fragment of a row at the row cursor,
        // flush, and read back measured boxes. Blank rows only advance
        // the cursor.
        let mut cursor_y = anchor.pos.y;
        let mut first_row_height: Option<f32> = None;
        let mut last_row_height = 0.;
        let mut measured: Vec<Option<MeasuredRow>> = Vec::with_capacity(rows.len());

        for row in rows {
            if row.fragments().is_empty() {
                let height = match blank_line_policy {
                    BlankLinePolicy::PreviousRow => last_row_height,
                    BlankLinePolicy::FirstRow => first_row_height.unwrap_or(last_row_height),
                };
                cursor_y -= height * (1. + linespacing);
                measured.push(None);
                continue;
            }

            let mut drawn = Vec::with_capacity(row.fragments().len());
            for fragment in row.fragments() {
                let style = if capabilities.decorations {
                    fragment.style().clone()
                } else {
                    fragment.style().without_decorations()
                };
                let id = surface
                    .draw_fragment(
                        fragment.text(),
                        &style,
                        vec2(anchor.pos.x, cursor_y),
                        space,
                    )
                    .map_err(|source| Error::Measurement {
                        row: fragment.row(),
                        index: fragment.index(),
                        source,
                    })?;
                drawn.push((fragment.clone(), id));
            }
            surface.flush();

            let mut boxes = Vec::with_capacity(drawn.len());
            for (fragment, id) in &drawn {
                let device = surface
                    .device_extent(*id)
                    .map_err(|source| Error::Measurement {
                        row: fragment.row(),
                        index: fragment.index(),
                        source,
                    })?;
                boxes.push(transform.device_to_logical(device));
            }

            // Row height comes from the first fragment's measured box.
            let row_height = boxes[0].height();
            first_row_height.get_or_insert(row_height);
            last_row_height = row_height;

            let block_height = row_height * (n_rows + (n_rows - 1.) * linespacing);

            let left = boxes[0].left();
            let mut running = 0.;
            let mut xs = Vec::with_capacity(boxes.len());
            for (i, fragment_box) in boxes.iter().enumerate() {
                xs.push(left + running + i as f32 * hpadding);
                running += fragment_box.width();
            }
            let width = running + (boxes.len() - 1) as f32 * hpadding;

            log::debug!(
                "measured row {}: {} fragments, height {}, width {}",
                drawn[0].0.row(),
                drawn.len(),
                row_height,
                width,
            );

            let top = cursor_y;
            cursor_y = boxes[0].bottom() - row_height * linespacing;

            let fragments = drawn
                .into_iter()
                .zip(boxes)
                .map(|((fragment, id), fragment_box)| (fragment, id, fragment_box))
                .collect();
            measured.push(Some(MeasuredRow {
                fragments,
                xs,
                top,
                width,
                block_height,
            }));
        }

        // Pass 2: shift rows for the vertical anchor, align each row
        // horizontally, and commit final positions.
        let mut placed_rows = Vec::with_capacity(measured.len());
        for row in measured {
            let Some(row) = row else {
                placed_rows.push(Vec::new());
                continue;
            };

            let vshift = match anchor.va {
                VAlign::Top => 0.,
                VAlign::Center => 0.5 * row.block_height,
                VAlign::Bottom => row.block_height,
            };
            let adjust = match anchor.ha {
                HAlign::Left => 0.,
                HAlign::Center => -0.5 * row.width,
                HAlign::Right => -row.width,
            };

            let mut placed = Vec::with_capacity(row.fragments.len());
            for ((fragment, id, bounds), x) in row.fragments.into_iter().zip(row.xs) {
                let pos = vec2(x + adjust, row.top + vshift);
                surface
                    .set_position(id, pos)
                    .map_err(|source| Error::Placement {
                        row: fragment.row(),
                        index: fragment.index(),
                        source,
                    })?;
                log::trace!(
                    "placed fragment {}/{} at ({}, {})",
                    fragment.row(),
                    fragment.index(),
                    pos.x,
                    pos.y,
                );

                let delta = pos - vec2(anchor.pos.x, row.top);
                placed.push(PlacedFragment {
                    fragment,
                    id,
                    bounds: bounds.offset(delta),
                    pos,
                });
            }
            placed_rows.push(placed);
        }

        Ok(PlacedText {
            rows: placed_rows,
            space,
            capabilities,
        })
    }
}
