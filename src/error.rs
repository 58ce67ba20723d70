//! Error taxonomy for parsing and layout.

use crate::surface::SurfaceError;

/// Any error produced while parsing markup or laying out text.
///
/// Parse-time errors (`Markup`, `StyleCount`, `InvalidAlignment`,
/// `StyleOverride`) are detected before anything is drawn and leave the
/// surface untouched. `Measurement` and `Placement` occur mid-layout; by
/// then the surface may already carry fragments from the current or earlier
/// rows, and those are not rolled back.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unbalanced markup: {open_count} occurrences of '{open}' but {close_count} of '{close}'")]
    Markup {
        open: char,
        close: char,
        open_count: usize,
        close_count: usize,
    },

    #[error("expected 1 or {expected} highlight {what}, got {actual}")]
    StyleCount {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid {axis} alignment '{value}' (allowed: {allowed})")]
    InvalidAlignment {
        axis: &'static str,
        value: String,
        allowed: &'static str,
    },

    #[error("malformed style override in fragment '{fragment}': {reason}")]
    StyleOverride { fragment: String, reason: String },

    #[error("failed to measure fragment {index} of row {row}")]
    Measurement {
        row: usize,
        index: usize,
        #[source]
        source: SurfaceError,
    },

    #[error("failed to position fragment {index} of row {row}")]
    Placement {
        row: usize,
        index: usize,
        #[source]
        source: SurfaceError,
    },

    #[error("requested {requested} highlight regions but the text has {highlights} highlights")]
    RegionCount {
        requested: usize,
        highlights: usize,
    },

    #[error("the layout was run without nested-region support")]
    RegionsUnsupported,
}
