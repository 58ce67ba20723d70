//! Delimiter-markup parsing.
//!
//! An input string like `"The weather is <sunny> today."` is tokenized
//! into rows of alternating plain and highlighted [`Fragment`]s. Each
//! highlighted span may carry an inline style override after a `::`
//! separator, e.g. `<sunny::{color: #ffd700; weight: bold}>`.

use std::ops::Range;
use std::str::FromStr;

use logos::Logos;
use palette::Srgba;
use smallvec::SmallVec;
use smartstring::{LazyCompact, SmartString};

use crate::style::{ResolvedStyle, Slant, TextStyle, Weight};
use crate::Error;

mod lexer;

use lexer::{ColorToken, MapToken};

/// Separator between highlight content and an inline style map.
pub const OVERRIDE_SEPARATOR: &str = "::";

/// A maximal run of text sharing one style.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    text: SmartString<LazyCompact>,
    style: ResolvedStyle,
    /// Global highlight-occurrence index; `None` for plain text.
    highlight: Option<usize>,
    row: usize,
    index: usize,
}

impl Fragment {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &ResolvedStyle {
        &self.style
    }

    pub fn is_highlight(&self) -> bool {
        self.highlight.is_some()
    }

    /// The highlight occurrence this fragment belongs to, counted
    /// left-to-right, top-to-bottom across the whole input.
    pub fn highlight(&self) -> Option<usize> {
        self.highlight
    }

    pub fn row(&self) -> usize {
        self.row
    }

    /// Position of this fragment within its row.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// An ordered sequence of fragments sharing a row, or a blank
/// separator row that translates into vertical spacing.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    fragments: SmallVec<[Fragment; 4]>,
    blank: bool,
}

impl Row {
    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_blank(&self) -> bool {
        self.blank
    }
}

/// Counts the highlight occurrences in `text`: one per opening delimiter.
pub fn count_highlights(text: &str, delim: (char, char)) -> usize {
    text.matches(delim.0).count()
}

/// Parses a delimiter-marked string into rows of styled fragments.
///
/// `highlight_styles` holds one style per highlight occurrence, already
/// expanded from any broadcast lists. Leading all-whitespace rows are
/// dropped; interior and trailing blank rows are preserved as blank
/// [`Row`]s.
pub fn parse(
    text: &str,
    delim: (char, char),
    base: &TextStyle,
    highlight_styles: &[TextStyle],
) -> Result<Vec<Row>, Error> {
    let (open, close) = delim;
    let open_count = text.matches(open).count();
    let close_count = text.matches(close).count();
    if open_count != close_count {
        return Err(Error::Markup {
            open,
            close,
            open_count,
            close_count,
        });
    }

    let mut raw_rows: Vec<&str> = text.split('\n').collect();
    let leading_blank = raw_rows
        .iter()
        .take_while(|row| row.trim().is_empty())
        .count();
    raw_rows.drain(..leading_blank);

    let mut rows = Vec::with_capacity(raw_rows.len());
    let mut occurrence = 0;

    for (row_index, raw_row) in raw_rows.iter().enumerate() {
        if raw_row.trim().is_empty() {
            rows.push(Row {
                fragments: SmallVec::new(),
                blank: true,
            });
            continue;
        }

        let mut fragments = SmallVec::new();
        let mut index = 0;

        let pieces = raw_row.split(open).flat_map(|part| part.split(close));
        for (flat_index, piece) in pieces.enumerate() {
            let highlighted = flat_index % 2 == 1;

            let (content, style) = if highlighted {
                let occ = occurrence;
                // An empty highlight still consumes an occurrence slot.
                occurrence += 1;
                let (content, inline) = split_override(piece)?;
                let style =
                    ResolvedStyle::resolve(inline.as_ref(), highlight_styles.get(occ), base);
                (content, style)
            } else {
                (piece, ResolvedStyle::resolve(None, None, base))
            };

            if content.is_empty() {
                continue;
            }

            fragments.push(Fragment {
                text: content.into(),
                style,
                highlight: highlighted.then(|| occurrence - 1),
                row: row_index,
                index,
            });
            index += 1;
        }

        rows.push(Row {
            fragments,
            blank: false,
        });
    }

    log::debug!(
        "parsed {} rows with {} highlight occurrences",
        rows.len(),
        occurrence
    );

    Ok(rows)
}

/// Splits an inline style override off a highlight piece.
///
/// Only a `::` followed by a braced map is treated as an override; any
/// other `::` is ordinary text.
fn split_override(piece: &str) -> Result<(&str, Option<TextStyle>), Error> {
    if let Some((content, rest)) = piece.split_once(OVERRIDE_SEPARATOR) {
        let map = rest.trim();
        if map.starts_with('{') && map.ends_with('}') {
            let style = parse_override(map).map_err(|reason| Error::StyleOverride {
                fragment: piece.to_owned(),
                reason,
            })?;
            return Ok((content, Some(style)));
        }
    }
    Ok((piece, None))
}

struct MapParser<'a> {
    source: &'a str,
    tokens: Vec<(MapToken, Range<usize>)>,
    cursor: usize,
}

impl<'a> MapParser<'a> {
    fn new(source: &'a str) -> Result<Self, String> {
        let mut tokens = Vec::new();
        let mut lexer = MapToken::lexer(source);
        while let Some(tok) = lexer.next() {
            match tok {
                MapToken::Error => {
                    return Err(format!("unexpected character '{}'", lexer.slice()))
                }
                MapToken::Whitespace => {}
                tok => tokens.push((tok, lexer.span())),
            }
        }
        Ok(Self {
            source,
            tokens,
            cursor: 0,
        })
    }

    fn peek(&self) -> Option<MapToken> {
        self.tokens.get(self.cursor).map(|(tok, _)| *tok)
    }

    fn consume(&mut self) {
        self.cursor += 1;
    }

    fn expect(&mut self, tok: MapToken) -> Result<&'a str, String> {
        match self.tokens.get(self.cursor) {
            Some((found, span)) if *found == tok => {
                let slice = &self.source[span.clone()];
                self.cursor += 1;
                Ok(slice)
            }
            Some((found, _)) => Err(format!("expected {:?}, found {:?}", tok, found)),
            None => Err(format!("expected {:?}, found end of map", tok)),
        }
    }

    /// Takes the source slice of a value: every token up to the next
    /// `;` or `}`.
    fn take_value(&mut self) -> Result<&'a str, String> {
        let start = match self.tokens.get(self.cursor) {
            Some((MapToken::Semi | MapToken::RBrace, _)) | None => {
                return Err("missing value".to_owned())
            }
            Some((_, span)) => span.start,
        };
        let mut end = start;
        while let Some((tok, span)) = self.tokens.get(self.cursor) {
            if matches!(tok, MapToken::Semi | MapToken::RBrace) {
                break;
            }
            end = span.end;
            self.cursor += 1;
        }
        Ok(self.source[start..end].trim())
    }

    fn is_done(&self) -> bool {
        self.cursor >= self.tokens.len()
    }
}

/// Parses a `{key: value; ...}` map into a partial style.
fn parse_override(source: &str) -> Result<TextStyle, String> {
    let mut p = MapParser::new(source)?;
    p.expect(MapToken::LBrace)?;

    let mut style = TextStyle::default();
    loop {
        match p.peek() {
            Some(MapToken::RBrace) => {
                p.consume();
                break;
            }
            Some(MapToken::Ident) => {
                let key = p.expect(MapToken::Ident)?;
                p.expect(MapToken::Colon)?;
                let value = p.take_value()?;
                apply_entry(&mut style, key, value)?;
                if p.peek() == Some(MapToken::Semi) {
                    p.consume();
                }
            }
            Some(other) => return Err(format!("expected style key, found {:?}", other)),
            None => return Err("unterminated style map".to_owned()),
        }
    }

    if !p.is_done() {
        return Err("unexpected tokens after '}'".to_owned());
    }
    Ok(style)
}

fn apply_entry(style: &mut TextStyle, key: &str, value: &str) -> Result<(), String> {
    match key {
        "color" => style.color = Some(parse_color(value)?),
        "weight" => {
            style.weight = Some(
                Weight::from_name(value)
                    .ok_or_else(|| format!("'{}' is not a recognized weight", value))?,
            )
        }
        "style" => {
            style.slant = Some(
                Slant::from_name(value)
                    .ok_or_else(|| format!("'{}' is not a recognized style", value))?,
            )
        }
        "size" => {
            style.size =
                Some(f32::from_str(value).map_err(|_| format!("'{}' is not a size", value))?)
        }
        other => return Err(format!("'{}' is not a recognized style key", other)),
    }
    Ok(())
}

/// Parses a color literal: `#rrggbb`, `#rrggbbaa`, or an `r, g, b[, a]`
/// component list.
fn parse_color(input: &str) -> Result<Srgba<u8>, String> {
    let input = input.trim();

    if let Some(hex) = input.strip_prefix('#') {
        if hex.len() != 6 && hex.len() != 8 {
            return Err(format!("'#{}' is not a 6- or 8-digit hex color", hex));
        }
        let mut components = [u8::MAX; 4];
        for (i, component) in components.iter_mut().take(hex.len() / 2).enumerate() {
            *component = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| format!("'#{}' contains a non-hex digit", hex))?;
        }
        let [r, g, b, a] = components;
        return Ok(Srgba::new(r, g, b, a));
    }

    let mut lexer = ColorToken::lexer(input);

    let mut components = [u8::MAX; 4];
    let mut count = 0;
    let mut waiting_for_comma = false;

    while let Some(token) = lexer.next() {
        match token {
            ColorToken::Comma => {
                if !waiting_for_comma {
                    return Err("expected color component".to_owned());
                }
                waiting_for_comma = false;
            }
            ColorToken::Number => {
                if count > 3 {
                    return Err("too many color components".to_owned());
                }
                components[count] = u8::from_str(lexer.slice())
                    .map_err(|_| format!("'{}' is not in 0..=255", lexer.slice()))?;
                count += 1;
                waiting_for_comma = true;
            }
            ColorToken::Whitespace => continue,
            ColorToken::Error => {
                return Err(format!("unexpected character '{}' in color", lexer.slice()))
            }
        }
    }

    if count < 3 {
        return Err("expected 3 or 4 color components".to_owned());
    }

    let [r, g, b, a] = components;
    Ok(Srgba::new(r, g, b, a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::default_color;

    const DELIM: (char, char) = ('<', '>');

    fn highlight_style(color: Srgba<u8>) -> TextStyle {
        TextStyle {
            color: Some(color),
            ..Default::default()
        }
    }

    #[test]
    fn weather_scenario() {
        let styles = vec![highlight_style(Srgba::new(255, 215, 0, 255))];
        let rows = parse(
            "The weather is <sunny> today.",
            DELIM,
            &TextStyle::default(),
            &styles,
        )
        .unwrap();

        assert_eq!(rows.len(), 1);
        let fragments = rows[0].fragments();
        assert_eq!(fragments.len(), 3);

        assert_eq!(fragments[0].text(), "The weather is ");
        assert!(!fragments[0].is_highlight());
        assert_eq!(fragments[0].style().color, default_color());

        assert_eq!(fragments[1].text(), "sunny");
        assert_eq!(fragments[1].highlight(), Some(0));
        assert_eq!(fragments[1].style().color, Srgba::new(255, 215, 0, 255));

        assert_eq!(fragments[2].text(), " today.");
        assert!(!fragments[2].is_highlight());

        assert_eq!(fragments[0].index(), 0);
        assert_eq!(fragments[1].index(), 1);
        assert_eq!(fragments[2].index(), 2);
    }

    #[test]
    fn unbalanced_delimiters() {
        let err = parse("a <b> <c", DELIM, &TextStyle::default(), &[]).unwrap_err();
        match err {
            Error::Markup {
                open_count,
                close_count,
                ..
            } => {
                assert_eq!(open_count, 2);
                assert_eq!(close_count, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn concatenation_equals_input_without_delimiters() {
        let input = "one <two> three\nfour <five> six";
        let styles = vec![TextStyle::default(), TextStyle::default()];
        let rows = parse(input, DELIM, &TextStyle::default(), &styles).unwrap();

        let joined: Vec<String> = rows
            .iter()
            .map(|row| row.fragments().iter().map(Fragment::text).collect())
            .collect();
        assert_eq!(joined.join("\n"), input.replace(['<', '>'], ""));
    }

    #[test]
    fn empty_highlight_consumes_occurrence() {
        let styles = vec![
            highlight_style(Srgba::new(1, 0, 0, 255)),
            highlight_style(Srgba::new(2, 0, 0, 255)),
        ];
        let rows = parse("a<>b<c>", DELIM, &TextStyle::default(), &styles).unwrap();

        let fragments = rows[0].fragments();
        // "a", "b", "c" -- the empty highlight emits nothing but its
        // style slot is burned.
        assert_eq!(fragments.len(), 3);
        assert_eq!(fragments[2].text(), "c");
        assert_eq!(fragments[2].highlight(), Some(1));
        assert_eq!(fragments[2].style().color, Srgba::new(2, 0, 0, 255));
    }

    #[test]
    fn leading_blank_rows_dropped_interior_kept() {
        let input = "\n   \nfirst\n\nsecond\n";
        let rows = parse(input, DELIM, &TextStyle::default(), &[]).unwrap();

        assert_eq!(rows.len(), 4);
        assert!(!rows[0].is_blank());
        assert_eq!(rows[0].fragments()[0].text(), "first");
        assert!(rows[1].is_blank());
        assert!(!rows[2].is_blank());
        assert!(rows[3].is_blank());
    }

    #[test]
    fn occurrence_counter_runs_across_rows() {
        let styles = vec![
            highlight_style(Srgba::new(1, 0, 0, 255)),
            highlight_style(Srgba::new(2, 0, 0, 255)),
        ];
        let rows = parse("<a>\n<b>", DELIM, &TextStyle::default(), &styles).unwrap();
        assert_eq!(rows[0].fragments()[0].highlight(), Some(0));
        assert_eq!(rows[1].fragments()[0].highlight(), Some(1));
        assert_eq!(
            rows[1].fragments()[0].style().color,
            Srgba::new(2, 0, 0, 255)
        );
    }

    #[test]
    fn inline_override_merges_over_occurrence_style() {
        let styles = vec![highlight_style(Srgba::new(9, 9, 9, 255))];
        let rows = parse(
            "see <here::{color: #00ff00; weight: bold}> now",
            DELIM,
            &TextStyle::default(),
            &styles,
        )
        .unwrap();

        let fragment = &rows[0].fragments()[1];
        assert_eq!(fragment.text(), "here");
        assert_eq!(fragment.style().color, Srgba::new(0, 255, 0, 255));
        assert_eq!(fragment.style().weight, Weight::Bold);
    }

    #[test]
    fn override_with_component_color_and_size() {
        let styles = vec![TextStyle::default()];
        let rows = parse(
            "<x::{color: 5, 10, 100; size: 20; style: italic}>",
            DELIM,
            &TextStyle::default(),
            &styles,
        )
        .unwrap();

        let style = rows[0].fragments()[0].style();
        assert_eq!(style.color, Srgba::new(5, 10, 100, 255));
        assert_eq!(style.size, 20.);
        assert_eq!(style.slant, Slant::Italic);
    }

    #[test]
    fn double_colon_without_braces_is_literal() {
        let styles = vec![TextStyle::default()];
        let rows = parse("<std::vec>", DELIM, &TextStyle::default(), &styles).unwrap();
        assert_eq!(rows[0].fragments()[0].text(), "std::vec");
    }

    #[test]
    fn malformed_override_names_fragment() {
        let styles = vec![TextStyle::default()];
        let err = parse(
            "<x::{hue: red}>",
            DELIM,
            &TextStyle::default(),
            &styles,
        )
        .unwrap_err();
        match err {
            Error::StyleOverride { fragment, reason } => {
                assert!(fragment.contains("hue"));
                assert!(reason.contains("not a recognized style key"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_color_hex() {
        assert_eq!(
            parse_color("#ff0080").unwrap(),
            Srgba::new(255, 0, 128, 255)
        );
        assert_eq!(
            parse_color("#ff008040").unwrap(),
            Srgba::new(255, 0, 128, 64)
        );
    }

    #[test]
    fn parse_color_components() {
        assert_eq!(
            parse_color("5, 10 ,235 ").unwrap(),
            Srgba::new(5, 10, 235, 255)
        );
        assert_eq!(
            parse_color("235, 10,5,100").unwrap(),
            Srgba::new(235, 10, 5, 100)
        );
    }

    #[test]
    fn parse_color_rejects_bad_input() {
        assert!(parse_color("235,100,20,40,20").is_err());
        assert!(parse_color("1,2").is_err());
        assert!(parse_color("#12345").is_err());
        assert!(parse_color("300,0,0").is_err());
    }

    #[test]
    fn count_highlights_counts_open_delimiters() {
        assert_eq!(count_highlights("a <b> c <d>", DELIM), 2);
        assert_eq!(count_highlights("plain", DELIM), 0);
    }
}
