//! Core parser infrastructure: token cursor, error reporting, recovery.

use idlc_lexer::token::{Token, TokenKind};
use idlc_types::ast::{Definitions, Ident};
use idlc_types::{CompileErrors, ErrorCode, IdlError, SourceFile, Span};

/// Consumes a token stream produced by the lexer and builds [`Definitions`].
/// Collects errors and resynchronises at `;` / `}` boundaries.
pub struct Parser<'src> {
    tokens: Vec<Token>,
    pos: usize,
    source_file: &'src SourceFile,
    errors: CompileErrors,
}

/// Result of parsing.
pub struct ParseResult {
    /// `None` when any error was reported.
    pub definitions: Option<Definitions>,
    pub errors: CompileErrors,
}

impl<'src> Parser<'src> {
    pub fn new(tokens: Vec<Token>, source_file: &'src SourceFile) -> Self {
        Self {
            tokens,
            pos: 0,
            source_file,
            errors: CompileErrors::empty(),
        }
    }

    // ── Token Cursor ──────────────────────────────────────────────────────────

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        self.look_ahead(0)
    }

    /// Kind of the token `n` positions ahead; `Eof` past the end.
    pub(crate) fn look_ahead(&self, n: usize) -> &TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    pub(crate) fn previous_span(&self) -> Span {
        match self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)) {
            Some(token) => token.span,
            None => Span::point(1, 1),
        }
    }

    pub(crate) fn current_span(&self) -> Span {
        match self.tokens.get(self.pos).or_else(|| self.tokens.last()) {
            Some(token) => token.span,
            None => Span::point(1, 1),
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn check(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    /// If the current token matches, advance and return `true`.
    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// True when the current token is the identifier `word`.
    pub(crate) fn check_word(&self, word: &str) -> bool {
        matches!(self.peek_kind(), TokenKind::Identifier(name) if name == word)
    }

    // ── Expect Helpers ────────────────────────────────────────────────────────

    pub(crate) fn expect(&mut self, expected: &TokenKind) -> Option<Span> {
        self.expect_with(expected, ErrorCode::UNEXPECTED_TOKEN)
    }

    /// Like [`Parser::expect`], reporting `code` on mismatch.
    pub(crate) fn expect_with(&mut self, expected: &TokenKind, code: ErrorCode) -> Option<Span> {
        if self.check(expected) {
            return self.advance().map(|t| t.span);
        }
        self.error_at_current(
            code,
            format!("expected '{}', got '{}'", expected, self.peek_kind()),
        );
        None
    }

    pub(crate) fn expect_identifier(&mut self) -> Option<Ident> {
        if let TokenKind::Identifier(name) = self.peek_kind().clone() {
            let span = self.current_span();
            self.advance();
            return Some(Ident::new(name, span));
        }
        self.error_at_current(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected identifier, got '{}'", self.peek_kind()),
        );
        None
    }

    /// An identifier or a keyword used as a member/argument name.
    pub(crate) fn expect_name(&mut self) -> Option<Ident> {
        if let Some(name) = self.peek_kind().name_text().map(str::to_string) {
            let span = self.current_span();
            self.advance();
            return Some(Ident::new(name, span));
        }
        self.error_at_current(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected name, got '{}'", self.peek_kind()),
        );
        None
    }

    pub(crate) fn expect_string_literal(&mut self) -> Option<String> {
        if let TokenKind::Str(value) = self.peek_kind().clone() {
            self.advance();
            return Some(value);
        }
        self.error_at_current(
            ErrorCode::UNEXPECTED_TOKEN,
            format!("expected string literal, got '{}'", self.peek_kind()),
        );
        None
    }

    // ── Error Reporting ───────────────────────────────────────────────────────

    pub(crate) fn error_at_current(&mut self, code: ErrorCode, message: impl Into<String>) {
        let span = self.current_span();
        self.error_at(code, message, span);
    }

    pub(crate) fn error_at(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line_text(span.line);
        let error = IdlError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(error);
    }

    pub(crate) fn too_many_errors(&self) -> bool {
        self.errors.at_limit()
    }

    // ── Synchronization ───────────────────────────────────────────────────────

    /// Skip to the end of the current member: past the next `;`, or up to
    /// (not past) the `}` closing the enclosing body.
    pub(crate) fn synchronize_member(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::RBrace if depth == 0 => return,
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Skip to the end of the current top-level definition: past the next
    /// `;` outside any braces.
    pub(crate) fn synchronize_definition(&mut self) {
        let mut depth = 0usize;
        while !self.at_end() {
            match self.peek_kind() {
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => depth += 1,
                TokenKind::RBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
        }
    }

    // ── Public API ────────────────────────────────────────────────────────────

    pub fn parse(mut self) -> ParseResult {
        let definitions = self.parse_definitions();
        let definitions = (!self.errors.has_errors()).then_some(definitions);
        ParseResult {
            definitions,
            errors: self.errors,
        }
    }
}
