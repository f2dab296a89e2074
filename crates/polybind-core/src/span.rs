//! Source location tracking for header diagnostics.

use std::fmt;

/// Position of a token or declaration inside a header file.
///
/// Only the start is tracked; the generator reports locations for parse
/// failures and debug logging, never ranges.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Line number (1-indexed).
    pub line: u32,
    /// Column number (1-indexed, byte-based).
    pub col: u32,
}

impl Span {
    /// Create a span at a line and column.
    #[inline]
    pub fn new(line: u32, col: u32) -> Self {
        Self { line, col }
    }

    /// Span for models that were not read from a header (built in code or
    /// synthesised by the filter).
    #[inline]
    pub fn synthetic() -> Self {
        Self::default()
    }

    /// Whether this span points at real source text.
    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.line == 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "<synthetic>")
        } else {
            write!(f, "{}:{}", self.line, self.col)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_display() {
        let span = Span::new(3, 15);
        assert_eq!(format!("{}", span), "3:15");
    }

    #[test]
    fn synthetic_span_display() {
        let span = Span::synthetic();
        assert!(span.is_synthetic());
        assert_eq!(span.to_string(), "<synthetic>");
    }
}
