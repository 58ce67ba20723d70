//! Laying out text with delimiter-highlighted substrings.
//!
//! `hltext` turns a marked-up string like `"The weather is <sunny>
//! today."` into styled fragments and places them on a drawing surface
//! so that the pieces read as one continuous block of text. Highlighted
//! spans take per-occurrence styles (broadcast from a single value or
//! listed one per span) plus optional inline overrides written in the
//! markup itself.
//!
//! Fragment metrics come from the backend, never from this crate: the
//! layout engine draws provisionally through a [`TextSurface`], flushes,
//! reads back measured boxes, and then commits aligned positions. Any
//! backend that can draw a single-style run and measure it can plug in;
//! [`MonoSurface`] is a deterministic fixed-metrics implementation used
//! by the tests.
//!
//! ```
//! use hltext::{text_at, MonoSurface, TextOptions, Vec2};
//!
//! let mut surface = MonoSurface::new();
//! let placed = text_at(
//!     &mut surface,
//!     Vec2::new(10., 90.),
//!     "The weather is <sunny> today.",
//!     &TextOptions::default(),
//! )
//! .unwrap();
//! assert_eq!(placed.highlight_count(), 1);
//! ```

mod draw;
mod error;
mod layout;
mod markup;
mod rect;
mod style;
mod surface;

pub use draw::{highlight_regions, text_at, TextOptions};
pub use error::Error;
pub use layout::{
    Anchor, BlankLinePolicy, Capabilities, HAlign, Layouter, PlacedFragment, PlacedText, Spacing,
    VAlign,
};
pub use markup::{count_highlights, parse, Fragment, Row, OVERRIDE_SEPARATOR};
pub use rect::Rect;
pub use style::{
    default_color, default_highlight_color, BoxEffect, OneOrMany, Outline, ResolvedStyle, Slant,
    TextStyle, Weight, DEFAULT_SIZE,
};
pub use surface::{
    CoordinateSpace, FragmentId, MonoFragment, MonoSurface, MonoTransform, RegionId, SurfaceError,
    TextSurface, Transform,
};

pub use glam::Vec2;
pub use palette::Srgba;
