//! Declaration scanner for C++ headers.
//!
//! [`HeaderParser`] walks the token stream looking for class and struct
//! definitions and records their public surface. It understands enough C++
//! to find member declarations (namespaces, access sections, inline bodies,
//! default arguments, base lists) and skips everything else by balancing
//! delimiters. It is deliberately forgiving: a declaration it cannot make
//! sense of is skipped, and only structural breakage (unterminated comments
//! or strings, unbalanced braces) is reported as an error.

use rustc_hash::FxHashSet;

use polybind_core::{
    ClassModel, HeaderUnit, MethodFlags, MethodModel, ParameterModel, ParseError,
    ParseErrorKind, PropertyModel, Span, TypeRef,
};

use crate::lexer::{Lexer, Token, TokenKind};

/// Builtin type words that can never be a parameter name.
const TYPE_WORDS: &[&str] = &[
    "int", "long", "short", "char", "double", "float", "bool", "unsigned", "signed", "void",
    "const", "size_t",
];

/// Anything that turns header text into a [`HeaderUnit`].
///
/// The generator only depends on this trait, so a different front end (a
/// libclang bridge, a metadata dump) can replace the built-in scanner.
pub trait HeaderSource {
    fn parse_header(&self, file_name: &str, source: &str) -> Result<HeaderUnit, ParseError>;
}

/// The built-in header scanner.
#[derive(Debug, Clone, Default)]
pub struct HeaderParser {
    /// Identifiers dropped wherever they appear (export macros such as
    /// `_PolyExport`).
    ignored_macros: FxHashSet<String>,
}

impl HeaderParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ignore these identifiers while scanning.
    pub fn with_ignored_macros<I, S>(mut self, macros: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_macros.extend(macros.into_iter().map(Into::into));
        self
    }

    /// Parse one header.
    pub fn parse(&self, file_name: &str, source: &str) -> Result<HeaderUnit, ParseError> {
        let tokens: Vec<Token<'_>> = Lexer::tokenize(source)
            .map_err(|e| e.in_file(file_name))?
            .into_iter()
            .filter(|t| !(t.kind == TokenKind::Identifier && self.ignored_macros.contains(t.lexeme)))
            .collect();

        let mut scanner = Scanner {
            tokens: &tokens,
            pos: 0,
            unit: HeaderUnit {
                file_name: file_name.to_string(),
                ..Default::default()
            },
        };
        scanner
            .scan_scope(false)
            .map_err(|e| e.in_file(file_name))?;
        Ok(scanner.unit)
    }
}

impl HeaderSource for HeaderParser {
    fn parse_header(&self, file_name: &str, source: &str) -> Result<HeaderUnit, ParseError> {
        self.parse(file_name, source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Access {
    Public,
    Restricted,
}

struct Scanner<'t, 'src> {
    tokens: &'t [Token<'src>],
    pos: usize,
    unit: HeaderUnit,
}

impl<'t, 'src> Scanner<'t, 'src> {
    // =========================================
    // Token access
    // =========================================

    fn peek(&self) -> Token<'src> {
        self.peek_nth(0)
    }

    fn peek_nth(&self, n: usize) -> Token<'src> {
        let last = self.tokens.len().saturating_sub(1);
        self.tokens[(self.pos + n).min(last)]
    }

    fn bump(&mut self) -> Token<'src> {
        let token = self.peek();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.peek().kind == kind {
            self.bump();
            true
        } else {
            false
        }
    }

    fn declare_type(&mut self, name: &str) {
        if !self.unit.declared_types.iter().any(|t| t == name) {
            self.unit.declared_types.push(name.to_string());
        }
    }

    // =========================================
    // Scopes
    // =========================================

    /// Scan declarations until EOF, or until the closing brace of the scope
    /// when `braced` is set.
    fn scan_scope(&mut self, braced: bool) -> Result<(), ParseError> {
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof if braced => {
                    return Err(unbalanced(token.span, "scope is missing its closing brace"));
                }
                TokenKind::Eof => return Ok(()),
                TokenKind::RightBrace if braced => {
                    self.bump();
                    return Ok(());
                }
                TokenKind::RightBrace => {
                    return Err(unbalanced(token.span, "closing brace without an opening brace"));
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Identifier => match token.lexeme {
                    "namespace" => self.scan_namespace()?,
                    "extern" if self.peek_nth(1).kind == TokenKind::StringLiteral
                        && self.peek_nth(2).kind == TokenKind::LeftBrace =>
                    {
                        self.pos += 3;
                        self.scan_scope(true)?;
                    }
                    "class" | "struct" => self.scan_class(None)?,
                    _ => self.scan_other_declaration()?,
                },
                _ => {
                    self.skip_declaration()?;
                }
            }
        }
    }

    fn scan_namespace(&mut self) -> Result<(), ParseError> {
        self.bump();
        if self.peek().kind == TokenKind::Identifier {
            self.bump();
        }
        if self.eat(TokenKind::LeftBrace) {
            self.scan_scope(true)
        } else {
            self.skip_declaration().map(|_| ())
        }
    }

    /// Declarations other than classes: record type names introduced by
    /// `enum`, `typedef` and `union`, skip the rest.
    fn scan_other_declaration(&mut self) -> Result<(), ParseError> {
        let first = self.peek();
        match first.lexeme {
            "enum" | "union" => {
                let mut n = 1;
                if self.peek_nth(n).is_ident("class") || self.peek_nth(n).is_ident("struct") {
                    n += 1;
                }
                let name = self.peek_nth(n);
                if name.kind == TokenKind::Identifier {
                    self.declare_type(name.lexeme);
                }
                self.skip_declaration().map(|_| ())
            }
            "typedef" => {
                let tokens = self.skip_declaration()?;
                if let Some(name) = tokens
                    .iter()
                    .rev()
                    .find(|t| t.kind == TokenKind::Identifier)
                {
                    let name = name.lexeme.to_string();
                    self.declare_type(&name);
                }
                Ok(())
            }
            _ => self.skip_declaration().map(|_| ()),
        }
    }

    // =========================================
    // Classes
    // =========================================

    /// Scan `class`/`struct`. With `outer` set, the declaration is nested and
    /// only its name is recorded.
    fn scan_class(&mut self, outer: Option<&str>) -> Result<(), ParseError> {
        let keyword = self.bump();
        let is_struct = keyword.lexeme == "struct";

        let name_token = self.peek();
        if name_token.kind != TokenKind::Identifier {
            // Anonymous struct or something we don't understand.
            return self.skip_declaration().map(|_| ());
        }
        self.bump();
        let name = name_token.lexeme.to_string();

        match self.peek().kind {
            TokenKind::Semicolon => {
                self.bump();
                self.declare_type(&name);
                return Ok(());
            }
            TokenKind::Colon | TokenKind::LeftBrace => {}
            _ => {
                // `class Foo *ptr;` and similar elaborated uses.
                return self.skip_declaration().map(|_| ());
            }
        }

        self.declare_type(&name);

        if outer.is_some() {
            return self.skip_declaration().map(|_| ());
        }

        let mut class = ClassModel::new(name);
        class.span = name_token.span;

        if self.eat(TokenKind::Colon) {
            class.bases = self.scan_base_list();
        }

        if !self.eat(TokenKind::LeftBrace) {
            return self.skip_declaration().map(|_| ());
        }

        self.scan_class_body(&mut class, is_struct)?;
        // Trailing declarators: `struct Foo { ... } foo;`
        if !self.eat(TokenKind::Semicolon) {
            self.skip_declaration()?;
        }
        self.unit.classes.push(class);
        Ok(())
    }

    fn scan_base_list(&mut self) -> Vec<String> {
        let mut bases = Vec::new();
        let mut current = String::new();
        let mut angle_depth = 0usize;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::LeftBrace | TokenKind::Semicolon | TokenKind::Eof => break,
                TokenKind::Less => angle_depth += 1,
                TokenKind::Greater => angle_depth = angle_depth.saturating_sub(1),
                TokenKind::Comma if angle_depth == 0 => {
                    if !current.is_empty() {
                        bases.push(std::mem::take(&mut current));
                    }
                }
                TokenKind::Identifier if angle_depth == 0 => match token.lexeme {
                    "public" | "protected" | "private" | "virtual" => {}
                    // Only the final scope segment names the base.
                    name => current = name.to_string(),
                },
                _ => {}
            }
            self.bump();
        }
        if !current.is_empty() {
            bases.push(current);
        }
        bases
    }

    fn scan_class_body(&mut self, class: &mut ClassModel, is_struct: bool) -> Result<(), ParseError> {
        let mut access = if is_struct {
            Access::Public
        } else {
            Access::Restricted
        };

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => {
                    return Err(unbalanced(
                        class.span,
                        format!("class '{}' is missing its closing brace", class.name),
                    ));
                }
                TokenKind::RightBrace => {
                    self.bump();
                    return Ok(());
                }
                TokenKind::Semicolon => {
                    self.bump();
                }
                TokenKind::Identifier
                    if matches!(token.lexeme, "public" | "protected" | "private")
                        && self.peek_nth(1).kind == TokenKind::Colon =>
                {
                    access = if token.lexeme == "public" {
                        Access::Public
                    } else {
                        Access::Restricted
                    };
                    self.pos += 2;
                }
                TokenKind::Identifier if matches!(token.lexeme, "class" | "struct") => {
                    let outer = class.name.clone();
                    self.scan_class(Some(&outer))?;
                }
                TokenKind::Identifier
                    if matches!(
                        token.lexeme,
                        "friend" | "using" | "typedef" | "template" | "static_assert" | "enum" | "union"
                    ) =>
                {
                    self.scan_other_declaration()?;
                }
                _ => {
                    let (tokens, span) = self.collect_member()?;
                    if access == Access::Public && !tokens.is_empty() {
                        interpret_member(class, &tokens, span);
                    }
                }
            }
        }
    }

    /// Collect one member declaration: tokens up to `;` or up to an inline
    /// body, which is skipped.
    fn collect_member(&mut self) -> Result<(Vec<Token<'src>>, Span), ParseError> {
        let span = self.peek().span;
        let mut tokens = Vec::new();
        let mut paren_depth = 0usize;
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => return Err(unbalanced(span, "member declaration never ends")),
                TokenKind::Semicolon if paren_depth == 0 => {
                    self.bump();
                    break;
                }
                TokenKind::RightBrace if paren_depth == 0 => break,
                TokenKind::LeftBrace if paren_depth == 0 => {
                    self.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace)?;
                    self.eat(TokenKind::Semicolon);
                    break;
                }
                TokenKind::LeftParen => paren_depth += 1,
                TokenKind::RightParen => {
                    if paren_depth == 0 {
                        return Err(unbalanced(token.span, "closing parenthesis without an opener"));
                    }
                    paren_depth -= 1;
                }
                _ => {}
            }
            tokens.push(self.bump());
        }
        Ok((tokens, span))
    }

    // =========================================
    // Skipping
    // =========================================

    /// Skip to the end of a declaration: a `;` at depth zero, or the end of a
    /// braced block (plus an optional trailing `;`). Returns skipped tokens
    /// outside braces.
    fn skip_declaration(&mut self) -> Result<Vec<Token<'src>>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Eof => return Ok(tokens),
                TokenKind::Semicolon => {
                    self.bump();
                    return Ok(tokens);
                }
                TokenKind::RightBrace => return Ok(tokens),
                TokenKind::LeftBrace => {
                    self.skip_balanced(TokenKind::LeftBrace, TokenKind::RightBrace)?;
                    // `typedef struct { } Name;` keeps going to the name.
                    if self.peek().kind == TokenKind::Identifier {
                        continue;
                    }
                    self.eat(TokenKind::Semicolon);
                    return Ok(tokens);
                }
                TokenKind::LeftParen => {
                    self.skip_balanced(TokenKind::LeftParen, TokenKind::RightParen)?;
                }
                _ => tokens.push(self.bump()),
            }
        }
    }

    /// Skip a delimited group starting at the current opener.
    fn skip_balanced(&mut self, open: TokenKind, close: TokenKind) -> Result<(), ParseError> {
        let opened = self.bump().span;
        let mut depth = 1usize;
        while depth > 0 {
            let token = self.bump();
            match token.kind {
                TokenKind::Eof => {
                    return Err(unbalanced(opened, "delimiter is never closed"));
                }
                k if k == open => depth += 1,
                k if k == close => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }
}

fn unbalanced(span: Span, message: impl Into<String>) -> ParseError {
    ParseError::new(ParseErrorKind::UnbalancedDelimiter, span, message)
}

// ============================================================================
// Member interpretation
// ============================================================================

fn interpret_member(class: &mut ClassModel, tokens: &[Token<'_>], span: Span) {
    match find_call_parens(tokens) {
        Some((open, close)) => {
            if let Some(mut method) = interpret_method(&class.name, tokens, open, close) {
                method.span = span;
                class.methods.push(method);
            }
        }
        // Function pointer members are not bindable.
        None if tokens.iter().any(|t| t.kind == TokenKind::LeftParen) => {}
        None => {
            for mut property in interpret_properties(tokens) {
                property.span = span;
                class.properties.push(property);
            }
        }
    }
}

/// Locate the parameter list of a function declaration: the first top-level
/// `(` that follows a name, and its matching `)`. Function pointer members
/// (`void (*cb)(int)`) yield `None`.
fn find_call_parens(tokens: &[Token<'_>]) -> Option<(usize, usize)> {
    let operator_at = tokens.iter().position(|t| t.is_ident("operator"));
    let search_from = match operator_at {
        // `operator()` names itself with a paren pair; skip past it.
        Some(i) if tokens.get(i + 1).is_some_and(|t| t.kind == TokenKind::LeftParen) => i + 3,
        Some(i) => i + 1,
        None => 0,
    };
    let open = search_from
        + tokens
            .get(search_from..)?
            .iter()
            .position(|t| t.kind == TokenKind::LeftParen)?;
    if open == 0 || tokens.get(open + 1).is_some_and(|t| t.kind == TokenKind::Star) {
        return None;
    }
    let close = matching_paren(tokens, open)?;
    Some((open, close))
}

fn matching_paren(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (i, token) in tokens.iter().enumerate().skip(open) {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn interpret_method(
    class_name: &str,
    tokens: &[Token<'_>],
    open: usize,
    close: usize,
) -> Option<MethodModel> {
    let head = &tokens[..open];
    let (name, type_end) = match head.iter().position(|t| t.is_ident("operator")) {
        Some(at) => (join_tokens(&tokens[at..open]).replace(' ', ""), at),
        None => {
            let last = head.last()?;
            if last.kind != TokenKind::Identifier {
                return None;
            }
            let is_dtor = head.len() >= 2 && head[head.len() - 2].kind == TokenKind::Tilde;
            if is_dtor {
                (format!("~{}", last.lexeme), head.len() - 2)
            } else {
                (last.lexeme.to_string(), head.len() - 1)
            }
        }
    };
    // Strip `Class::` qualification from out-of-line style declarations.
    let type_tokens = strip_trailing_scope(&tokens[..type_end]);

    let mut method = if name == class_name {
        MethodModel::constructor(class_name)
    } else if name == format!("~{class_name}") {
        MethodModel::destructor(class_name)
    } else {
        MethodModel::new(name, TypeRef::parse(&join_tokens(type_tokens)))
    };
    if type_tokens.iter().any(|t| t.is_ident("static")) {
        method.flags |= MethodFlags::STATIC;
    }
    if type_tokens.iter().any(|t| t.is_ident("virtual")) {
        method.flags |= MethodFlags::VIRTUAL;
    }
    if tokens[close + 1..].first().is_some_and(|t| t.is_ident("const")) {
        method.flags |= MethodFlags::CONST;
    }

    let params = &tokens[open + 1..close];
    let groups = split_top_level(params, TokenKind::Comma);
    let only_void = groups.len() == 1 && groups[0].len() == 1 && groups[0][0].is_ident("void");
    if !only_void {
        for (index, group) in groups.iter().enumerate() {
            if let Some(param) = interpret_param(group, index) {
                method.params.push(param);
            }
        }
    }
    Some(method)
}

fn strip_trailing_scope<'a, 'src>(tokens: &'a [Token<'src>]) -> &'a [Token<'src>] {
    if tokens.len() >= 2 && tokens[tokens.len() - 1].kind == TokenKind::ColonColon {
        &tokens[..tokens.len() - 2]
    } else {
        tokens
    }
}

fn interpret_param(tokens: &[Token<'_>], index: usize) -> Option<ParameterModel> {
    if tokens.is_empty() || tokens.iter().all(|t| t.kind == TokenKind::Punct) {
        // Empty group or a `...` variadic tail.
        return None;
    }
    let (decl, default) = split_default(tokens);

    let (decl, is_array) = match decl.iter().position(|t| t.kind == TokenKind::LeftBracket) {
        Some(at) => (&decl[..at], true),
        None => (decl, false),
    };

    let last = decl.last()?;
    let named = decl.len() >= 2
        && last.kind == TokenKind::Identifier
        && !TYPE_WORDS.contains(&last.lexeme)
        && decl[decl.len() - 2].kind != TokenKind::ColonColon;

    let (name, type_tokens) = if named {
        (last.lexeme.to_string(), &decl[..decl.len() - 1])
    } else {
        (format!("arg{}", index + 1), decl)
    };

    let mut type_text = join_tokens(type_tokens);
    if is_array {
        type_text.push('*');
    }
    let mut param = ParameterModel::new(name, TypeRef::parse(&type_text));
    param.default = default;
    Some(param)
}

fn interpret_properties(tokens: &[Token<'_>]) -> Vec<PropertyModel> {
    let declarators = split_top_level(tokens, TokenKind::Comma);
    let Some(first) = declarators.first() else {
        return Vec::new();
    };

    let (first_decl, _) = split_default(first);
    let first_decl = strip_bitfield(first_decl);
    let Some(name_at) = declarator_name(first_decl) else {
        return Vec::new();
    };
    if name_at == 0 {
        return Vec::new();
    }
    // Base type without the first declarator's own `*`/`&`.
    let mut base_end = name_at;
    while base_end > 0
        && matches!(first_decl[base_end - 1].kind, TokenKind::Star | TokenKind::Amp)
    {
        base_end -= 1;
    }
    let base = join_tokens(&first_decl[..base_end]);

    let mut properties = Vec::new();
    for (i, declarator) in declarators.iter().enumerate() {
        let (decl, default) = split_default(declarator);
        let decl = strip_bitfield(decl);
        let decl = if i == 0 { &decl[base_end..] } else { decl };
        let Some(name_at) = declarator_name(decl) else {
            continue;
        };
        let mut type_text = base.clone();
        for token in &decl[..name_at] {
            type_text.push_str(token.lexeme);
        }
        if decl[name_at + 1..]
            .iter()
            .any(|t| t.kind == TokenKind::LeftBracket)
        {
            type_text.push_str("[]");
        }
        let mut property = PropertyModel::new(decl[name_at].lexeme, TypeRef::parse(&type_text));
        property.default = default;
        properties.push(property);
    }
    properties
}

/// Index of the declared name: the last identifier before any array extent.
fn declarator_name(decl: &[Token<'_>]) -> Option<usize> {
    let end = decl
        .iter()
        .position(|t| t.kind == TokenKind::LeftBracket)
        .unwrap_or(decl.len());
    decl[..end]
        .iter()
        .rposition(|t| t.kind == TokenKind::Identifier)
}

fn strip_bitfield<'a, 'src>(decl: &'a [Token<'src>]) -> &'a [Token<'src>] {
    match decl.iter().position(|t| t.kind == TokenKind::Colon) {
        Some(at) => &decl[..at],
        None => decl,
    }
}

/// Split `decl = default` at the first top-level `=`.
fn split_default<'a, 'src>(tokens: &'a [Token<'src>]) -> (&'a [Token<'src>], Option<String>) {
    match tokens.iter().position(|t| t.kind == TokenKind::Equal) {
        Some(at) => (&tokens[..at], Some(join_tokens(&tokens[at + 1..]))),
        None => (tokens, None),
    }
}

/// Split on a separator that is not nested inside `()`, `<>`, `[]` or `{}`.
fn split_top_level<'a, 'src>(tokens: &'a [Token<'src>], sep: TokenKind) -> Vec<&'a [Token<'src>]> {
    let mut groups = Vec::new();
    let mut depth = 0isize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token.kind {
            TokenKind::LeftParen | TokenKind::Less | TokenKind::LeftBracket | TokenKind::LeftBrace => {
                depth += 1
            }
            TokenKind::RightParen
            | TokenKind::Greater
            | TokenKind::RightBracket
            | TokenKind::RightBrace => depth -= 1,
            k if k == sep && depth == 0 => {
                groups.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < tokens.len() || !groups.is_empty() {
        groups.push(&tokens[start..]);
    }
    groups
}

/// Re-assemble tokens into readable source text: words are separated by a
/// space, commas are followed by one, punctuation is glued.
pub(crate) fn join_tokens(tokens: &[Token<'_>]) -> String {
    let mut out = String::new();
    let mut prev: Option<Token<'_>> = None;
    for token in tokens {
        if let Some(p) = prev {
            let space = (p.is_wordish() && token.is_wordish())
                || p.kind == TokenKind::Comma
                || (matches!(p.kind, TokenKind::Star | TokenKind::Amp) && token.is_wordish());
            if space {
                out.push(' ');
            }
        }
        out.push_str(token.lexeme);
        prev = Some(*token);
    }
    out
}
