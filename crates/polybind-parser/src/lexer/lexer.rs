//! Header lexer.
//!
//! The [`Lexer`] turns header text into [`Token`]s that borrow from the
//! source. Comments and preprocessor lines are skipped entirely; the scanner
//! never needs them.

use polybind_core::{ParseError, ParseErrorKind, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, punct_kind};

pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    errors: Vec<ParseError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            errors: Vec::new(),
        }
    }

    /// Lex the whole input, failing on the first lexical error.
    ///
    /// The returned vector always ends with an [`TokenKind::Eof`] token.
    pub fn tokenize(source: &'src str) -> Result<Vec<Token<'src>>, ParseError> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            match token.kind {
                TokenKind::Error => break,
                TokenKind::Eof => {
                    tokens.push(token);
                    break;
                }
                _ => tokens.push(token),
            }
        }
        match lexer.take_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(tokens),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn next_token(&mut self) -> Token<'src> {
        loop {
            self.skip_whitespace();
            let span = self.span();
            let start = self.cursor.offset();

            let Some(ch) = self.cursor.peek() else {
                return Token::new(TokenKind::Eof, "", span);
            };

            match ch {
                '/' if self.cursor.check_str("//") => self.skip_line(),
                '/' if self.cursor.check_str("/*") => {
                    if let Err(err) = self.skip_block_comment(span) {
                        return self.make_error(err);
                    }
                }
                '#' => self.skip_directive(),
                '"' | '\'' => return self.scan_quoted(ch, start, span),
                c if c.is_ascii_digit() => return self.scan_number(start, span),
                '.' if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                    return self.scan_number(start, span);
                }
                c if is_ident_start(c) => {
                    let lexeme = self.cursor.eat_while(is_ident_continue);
                    return Token::new(TokenKind::Identifier, lexeme, span);
                }
                ':' if self.cursor.check_str("::") => {
                    self.cursor.advance();
                    self.cursor.advance();
                    return Token::new(TokenKind::ColonColon, self.cursor.slice_from(start), span);
                }
                c if c.is_ascii_punctuation() => {
                    self.cursor.advance();
                    return Token::new(punct_kind(c), self.cursor.slice_from(start), span);
                }
                c => {
                    self.cursor.advance();
                    return self.make_error(ParseError::new(
                        ParseErrorKind::UnexpectedChar,
                        span,
                        format!("character {c:?} cannot start a token"),
                    ));
                }
            }
        }
    }

    // =========================================
    // Internal: skipping
    // =========================================

    fn span(&self) -> Span {
        Span::new(self.cursor.line(), self.cursor.column())
    }

    fn make_error(&mut self, error: ParseError) -> Token<'src> {
        let span = error.span;
        self.errors.push(error);
        Token::new(TokenKind::Error, "", span)
    }

    fn skip_whitespace(&mut self) {
        if self.cursor.check_str("\u{FEFF}") {
            self.cursor.advance();
        }
        self.cursor.eat_while(char::is_whitespace);
    }

    fn skip_line(&mut self) {
        self.cursor.eat_while(|c| c != '\n');
    }

    /// Skip a preprocessor line, following `\` continuations.
    fn skip_directive(&mut self) {
        while let Some(c) = self.cursor.advance() {
            match c {
                '\\' if self.cursor.peek() == Some('\n') => {
                    self.cursor.advance();
                }
                '\\' if self.cursor.check_str("\r\n") => {
                    self.cursor.advance();
                    self.cursor.advance();
                }
                '\n' => break,
                _ => {}
            }
        }
    }

    fn skip_block_comment(&mut self, opened: Span) -> Result<(), ParseError> {
        self.cursor.advance();
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => {
                    return Err(ParseError::new(
                        ParseErrorKind::UnterminatedComment,
                        opened,
                        "block comment never closes",
                    ));
                }
                Some('*') if self.cursor.eat('/') => return Ok(()),
                Some(_) => {}
            }
        }
    }

    // =========================================
    // Internal: scanning
    // =========================================

    fn scan_quoted(&mut self, quote: char, start: u32, span: Span) -> Token<'src> {
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None | Some('\n') => {
                    return self.make_error(ParseError::new(
                        ParseErrorKind::UnterminatedString,
                        span,
                        "literal is missing its closing quote",
                    ));
                }
                Some('\\') => {
                    self.cursor.advance();
                }
                Some(c) if c == quote => break,
                Some(_) => {}
            }
        }
        let kind = if quote == '"' {
            TokenKind::StringLiteral
        } else {
            TokenKind::CharLiteral
        };
        Token::new(kind, self.cursor.slice_from(start), span)
    }

    /// Numbers are scanned loosely: digits, letters (suffixes, hex, exponent
    /// markers), dots, and a sign directly after an exponent marker.
    fn scan_number(&mut self, start: u32, span: Span) -> Token<'src> {
        let mut prev = '\0';
        while let Some(c) = self.cursor.peek() {
            let exponent_sign = matches!(c, '+' | '-') && matches!(prev, 'e' | 'E')
                && !self.cursor.slice_from(start).starts_with("0x");
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign {
                prev = c;
                self.cursor.advance();
            } else {
                break;
            }
        }
        Token::new(TokenKind::Number, self.cursor.slice_from(start), span)
    }
}
