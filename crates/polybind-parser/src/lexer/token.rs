//! Token types for the header lexer.
//!
//! Only the shapes the declaration scanner needs are distinguished; every
//! other operator character becomes [`TokenKind::Punct`].

use polybind_core::Span;
use std::fmt;

/// A token borrowed from the header text.
#[derive(Clone, Copy, PartialEq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub lexeme: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    #[inline]
    pub fn new(kind: TokenKind, lexeme: &'src str, span: Span) -> Self {
        Self { kind, lexeme, span }
    }

    /// Identifier with exactly this text.
    #[inline]
    pub fn is_ident(&self, text: &str) -> bool {
        self.kind == TokenKind::Identifier && self.lexeme == text
    }

    /// Identifiers, numbers and literals print with a separating space.
    #[inline]
    pub fn is_wordish(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Identifier
                | TokenKind::Number
                | TokenKind::StringLiteral
                | TokenKind::CharLiteral
        )
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}({:?} @ {:?})", self.kind, self.lexeme, self.span)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    /// Integer or floating literal including suffixes: `42`, `1.0f`, `0xFF`.
    Number,
    StringLiteral,
    CharLiteral,

    /// `(`
    LeftParen,
    /// `)`
    RightParen,
    /// `{`
    LeftBrace,
    /// `}`
    RightBrace,
    /// `[`
    LeftBracket,
    /// `]`
    RightBracket,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `::`
    ColonColon,
    /// `=`
    Equal,
    /// `*`
    Star,
    /// `&`
    Amp,
    /// `~`
    Tilde,
    /// Any other operator character.
    Punct,

    Eof,
    /// A lexing failure; the error is recorded on the lexer.
    Error,
}

/// Map a single punctuation character to its kind.
pub fn punct_kind(ch: char) -> TokenKind {
    match ch {
        '(' => TokenKind::LeftParen,
        ')' => TokenKind::RightParen,
        '{' => TokenKind::LeftBrace,
        '}' => TokenKind::RightBrace,
        '[' => TokenKind::LeftBracket,
        ']' => TokenKind::RightBracket,
        '<' => TokenKind::Less,
        '>' => TokenKind::Greater,
        ',' => TokenKind::Comma,
        ';' => TokenKind::Semicolon,
        ':' => TokenKind::Colon,
        '=' => TokenKind::Equal,
        '*' => TokenKind::Star,
        '&' => TokenKind::Amp,
        '~' => TokenKind::Tilde,
        _ => TokenKind::Punct,
    }
}
