use logos::Logos;

/// Tokens of an inline style-override map, e.g.
/// `{color: 5, 10, 100; weight: bold}`.
///
/// Entries are separated by `;` so the commas inside color
/// component lists stay unambiguous.
#[derive(Copy, Clone, Debug, Logos, PartialEq, Eq)]
pub enum MapToken {
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,

    #[regex("#[0-9a-fA-F]+")]
    HexColor,

    #[regex("[0-9]+(\\.[0-9]+)?")]
    Number,

    #[regex("[A-Za-z][A-Za-z0-9_-]*")]
    Ident,

    #[regex("[ \n\t]+")]
    Whitespace,

    #[error]
    Error,
}

/// Tokens of a color component list: `r, g, b` or `r, g, b, a`.
#[derive(Copy, Clone, Debug, Logos, PartialEq, Eq)]
pub enum ColorToken {
    #[token(",")]
    Comma,

    #[regex("[0-9]+")]
    Number,

    #[regex("[ \n\t]+")]
    Whitespace,

    #[error]
    Error,
}
