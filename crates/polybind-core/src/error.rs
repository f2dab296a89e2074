//! Error types shared across the workspace.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ParseError   - header could not be scanned (fatal for the whole run)
//! ModelError   - class model is inconsistent (duplicate class names)
//! ```
//!
//! Members that fail an acceptance rule are not errors; the filter drops them.

use thiserror::Error;

use crate::Span;

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of header scanning failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    /// `/*` without a closing `*/`.
    UnterminatedComment,
    /// String or character literal without its closing quote.
    UnterminatedString,
    /// Closing delimiter with no opener, or input ended with openers pending.
    UnbalancedDelimiter,
    /// A declaration that cannot be split into type and name.
    MalformedDeclaration,
    /// A character that cannot start any token.
    UnexpectedChar,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnterminatedComment => "unterminated comment",
            ParseErrorKind::UnterminatedString => "unterminated string",
            ParseErrorKind::UnbalancedDelimiter => "unbalanced delimiter",
            ParseErrorKind::MalformedDeclaration => "malformed declaration",
            ParseErrorKind::UnexpectedChar => "unexpected character",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A header that could not be parsed.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{file}:{span}: {kind}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
    /// Header file name, filled in by whoever knows it.
    pub file: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
            file: String::from("<input>"),
        }
    }

    /// Attach the header file name.
    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = file.into();
        self
    }
}

// ============================================================================
// Model Errors
// ============================================================================

/// Inconsistencies in the class model as a whole.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    /// Two headers declare a class with the same name.
    #[error("class '{name}' declared in both {first} and {second}")]
    DuplicateClass {
        name: String,
        first: String,
        second: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_error_display() {
        let err = ParseError::new(
            ParseErrorKind::UnterminatedComment,
            Span::new(4, 2),
            "comment opened here never closes",
        )
        .in_file("PolyScene.h");
        assert_eq!(
            err.to_string(),
            "PolyScene.h:4:2: unterminated comment: comment opened here never closes"
        );
    }

    #[test]
    fn model_error_display() {
        let err = ModelError::DuplicateClass {
            name: "Scene".into(),
            first: "PolyScene.h".into(),
            second: "PolyScene2.h".into(),
        };
        assert!(err.to_string().contains("'Scene'"));
    }
}
