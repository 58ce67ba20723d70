//! Fragment styling.
//!
//! A [`TextStyle`] is a set of optional attributes. Styles from three
//! sources merge into a [`ResolvedStyle`] with a fixed precedence:
//! inline override > per-occurrence highlight style > base style. Unset
//! attributes at every level fall back to hardcoded defaults.

use palette::Srgba;
use serde::{Deserialize, Serialize};

use crate::Error;

pub const DEFAULT_SIZE: f32 = 12.;

/// The default color for plain text: opaque black.
pub fn default_color() -> Srgba<u8> {
    Srgba::new(0, 0, 0, u8::MAX)
}

/// The default color for highlighted text.
pub fn default_highlight_color() -> Srgba<u8> {
    Srgba::new(255, 127, 14, u8::MAX)
}

/// A font weight, indicating how dark it appears.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weight {
    Thin,
    ExtraLight,
    Light,
    Normal,
    Medium,
    SemiBold,
    Bold,
    ExtraBold,
    Black,
}

impl Default for Weight {
    fn default() -> Self {
        Self::Normal
    }
}

impl Weight {
    /// Parses the names accepted in inline style overrides.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "thin" => Weight::Thin,
            "extralight" | "extra-light" => Weight::ExtraLight,
            "light" => Weight::Light,
            "normal" | "regular" => Weight::Normal,
            "medium" => Weight::Medium,
            "semibold" | "semi-bold" => Weight::SemiBold,
            "bold" => Weight::Bold,
            "extrabold" | "extra-bold" => Weight::ExtraBold,
            "black" | "heavy" => Weight::Black,
            _ => return None,
        })
    }
}

/// Font slant.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slant {
    Normal,
    Italic,
    Oblique,
}

impl Default for Slant {
    fn default() -> Self {
        Self::Normal
    }
}

impl Slant {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "normal" => Slant::Normal,
            "italic" => Slant::Italic,
            "oblique" => Slant::Oblique,
            _ => return None,
        })
    }
}

/// An outline stroke drawn around the glyphs of a fragment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Outline {
    /// Stroke width in device pixels.
    pub width: f32,
    pub color: Srgba<u8>,
}

/// A filled box drawn behind a fragment.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BoxEffect {
    pub fill: Srgba<u8>,
    /// Optional edge color; `None` draws no border.
    pub edge: Option<Srgba<u8>>,
    /// Padding between the text extent and the box edge.
    pub pad: f32,
}

/// Style attributes for a run of text.
///
/// Every field is optional. Unset fields fall back to the next
/// precedence level during resolution.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextStyle {
    pub color: Option<Srgba<u8>>,
    /// Font size in points.
    pub size: Option<f32>,
    pub weight: Option<Weight>,
    pub slant: Option<Slant>,
    pub outline: Option<Outline>,
    pub boxed: Option<BoxEffect>,
}

/// A style with every attribute decided.
///
/// Produced only by [`ResolvedStyle::resolve`]; this is what surfaces
/// receive when a fragment is drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStyle {
    pub color: Srgba<u8>,
    pub size: f32,
    pub weight: Weight,
    pub slant: Slant,
    pub outline: Option<Outline>,
    pub boxed: Option<BoxEffect>,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self::resolve(None, None, &TextStyle::default())
    }
}

impl ResolvedStyle {
    /// Merges the three style sources into one concrete style.
    ///
    /// Precedence from highest to lowest: `inline` (an override parsed
    /// from the fragment text), `occurrence` (the per-highlight style for
    /// this occurrence index), `base` (the call-wide default).
    pub fn resolve(
        inline: Option<&TextStyle>,
        occurrence: Option<&TextStyle>,
        base: &TextStyle,
    ) -> Self {
        fn pick<T: Copy>(
            inline: Option<&TextStyle>,
            occurrence: Option<&TextStyle>,
            base: &TextStyle,
            get: impl Fn(&TextStyle) -> Option<T>,
        ) -> Option<T> {
            inline
                .and_then(&get)
                .or_else(|| occurrence.and_then(&get))
                .or_else(|| get(base))
        }

        Self {
            color: pick(inline, occurrence, base, |s| s.color).unwrap_or_else(default_color),
            size: pick(inline, occurrence, base, |s| s.size).unwrap_or(DEFAULT_SIZE),
            weight: pick(inline, occurrence, base, |s| s.weight).unwrap_or_default(),
            slant: pick(inline, occurrence, base, |s| s.slant).unwrap_or_default(),
            outline: pick(inline, occurrence, base, |s| s.outline),
            boxed: pick(inline, occurrence, base, |s| s.boxed),
        }
    }

    /// A copy with the decorative effects stripped.
    ///
    /// Used when the layout runs without decoration support.
    pub fn without_decorations(&self) -> Self {
        Self {
            outline: None,
            boxed: None,
            ..self.clone()
        }
    }
}

/// A broadcast-or-per-occurrence list of style values.
///
/// A single value (or a one-element list) applies to every highlight
/// occurrence; a longer list must have exactly one entry per occurrence.
#[derive(Debug, Clone, PartialEq)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Checks the broadcast invariant against the total highlight count.
    pub fn validate(&self, expected: usize, what: &'static str) -> Result<(), Error> {
        match self {
            OneOrMany::One(_) => Ok(()),
            OneOrMany::Many(values) if values.len() == 1 || values.len() == expected => Ok(()),
            OneOrMany::Many(values) => Err(Error::StyleCount {
                what,
                expected,
                actual: values.len(),
            }),
        }
    }

    /// The value for occurrence `index`. Call [`Self::validate`] first.
    pub fn get(&self, index: usize) -> &T {
        match self {
            OneOrMany::One(value) => value,
            OneOrMany::Many(values) if values.len() == 1 => &values[0],
            OneOrMany::Many(values) => &values[index],
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_precedence() {
        let base = TextStyle {
            color: Some(Srgba::new(1, 1, 1, 255)),
            size: Some(10.),
            weight: Some(Weight::Light),
            ..Default::default()
        };
        let occurrence = TextStyle {
            color: Some(Srgba::new(2, 2, 2, 255)),
            weight: Some(Weight::Bold),
            ..Default::default()
        };
        let inline = TextStyle {
            color: Some(Srgba::new(3, 3, 3, 255)),
            ..Default::default()
        };

        let resolved = ResolvedStyle::resolve(Some(&inline), Some(&occurrence), &base);
        assert_eq!(resolved.color, Srgba::new(3, 3, 3, 255));
        assert_eq!(resolved.weight, Weight::Bold);
        assert_eq!(resolved.size, 10.);
        assert_eq!(resolved.slant, Slant::Normal);
    }

    #[test]
    fn resolve_falls_back_to_hardcoded_defaults() {
        let resolved = ResolvedStyle::resolve(None, None, &TextStyle::default());
        assert_eq!(resolved.color, default_color());
        assert_eq!(resolved.size, DEFAULT_SIZE);
        assert_eq!(resolved.weight, Weight::Normal);
        assert!(resolved.outline.is_none());
        assert!(resolved.boxed.is_none());
    }

    #[test]
    fn one_or_many_broadcast() {
        let one: OneOrMany<u8> = 7.into();
        assert!(one.validate(3, "colors").is_ok());
        assert_eq!(*one.get(0), 7);
        assert_eq!(*one.get(2), 7);

        let single_entry: OneOrMany<u8> = vec![9].into();
        assert!(single_entry.validate(4, "colors").is_ok());
        assert_eq!(*single_entry.get(3), 9);
    }

    #[test]
    fn one_or_many_exact_length() {
        let many: OneOrMany<u8> = vec![1, 2, 3].into();
        assert!(many.validate(3, "colors").is_ok());
        assert_eq!(*many.get(1), 2);
    }

    #[test]
    fn one_or_many_mismatch() {
        let many: OneOrMany<u8> = vec![1, 2, 3].into();
        let err = many.validate(2, "colors").unwrap_err();
        match err {
            Error::StyleCount {
                what,
                expected,
                actual,
            } => {
                assert_eq!(what, "colors");
                assert_eq!(expected, 2);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
