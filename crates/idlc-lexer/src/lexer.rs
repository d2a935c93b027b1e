//! Core lexer: description text to token stream.
//!
//! - Whitespace (newlines included) and both comment styles are skipped
//! - Unterminated string literals and block comments report E101
//! - Error recovery: collects up to [`idlc_types::MAX_ERRORS`] errors

use idlc_types::{CompileErrors, ErrorCode, IdlError, SourceFile, Span};

use crate::token::{Token, TokenKind};

pub struct Lexer<'src> {
    source: &'src [u8],
    source_file: &'src SourceFile,
    /// Current byte offset into `source`.
    pos: usize,
    line: u32,
    col: u32,
    errors: CompileErrors,
}

/// Result of lexing: tokens plus any errors collected.
pub struct LexResult {
    /// Always ends with [`TokenKind::Eof`].
    pub tokens: Vec<Token>,
    pub errors: CompileErrors,
}

impl<'src> Lexer<'src> {
    pub fn new(source_file: &'src SourceFile) -> Self {
        Self {
            source: source_file.text.as_bytes(),
            source_file,
            pos: 0,
            line: 1,
            col: 1,
            errors: CompileErrors::empty(),
        }
    }

    /// Lex the entire file.
    pub fn lex(mut self) -> LexResult {
        let mut tokens = Vec::new();
        loop {
            if self.errors.at_limit() {
                break;
            }
            let token = self.scan_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        if tokens.last().is_none_or(|t| t.kind != TokenKind::Eof) {
            tokens.push(Token::new(TokenKind::Eof, self.current_span()));
        }
        LexResult {
            tokens,
            errors: self.errors,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Character-level helpers
    // ─────────────────────────────────────────────────────────────

    fn peek(&self) -> Option<u8> {
        self.source.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.source.get(self.pos + offset).copied()
    }

    fn advance(&mut self) -> Option<u8> {
        let ch = self.source.get(self.pos).copied()?;
        self.pos += 1;
        if ch == b'\n' {
            self.line += 1;
            self.col = 1;
        } else {
            self.col += 1;
        }
        Some(ch)
    }

    fn current_span(&self) -> Span {
        Span::point(self.line, self.col)
    }

    fn span_from(&self, start_line: u32, start_col: u32) -> Span {
        Span::new(
            start_line,
            start_col,
            self.line,
            self.col.saturating_sub(1).max(1),
        )
    }

    fn text_from(&self, start: usize) -> String {
        String::from_utf8_lossy(&self.source[start..self.pos]).into_owned()
    }

    fn emit_error(&mut self, code: ErrorCode, message: impl Into<String>, span: Span) {
        let source_line = self.source_file.line_text(span.line);
        let err = IdlError::new(&self.source_file.name, code, message, span, source_line);
        self.errors.push(err);
    }

    // ─────────────────────────────────────────────────────────────
    // Whitespace & comments
    // ─────────────────────────────────────────────────────────────

    /// Skip whitespace and comments until the next significant byte.
    fn skip_trivia(&mut self) {
        loop {
            match (self.peek(), self.peek_at(1)) {
                (Some(ch), _) if ch.is_ascii_whitespace() => {
                    self.advance();
                }
                (Some(b'/'), Some(b'/')) => {
                    while let Some(ch) = self.peek() {
                        if ch == b'\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                (Some(b'/'), Some(b'*')) => self.skip_block_comment(),
                _ => return,
            }
        }
    }

    fn skip_block_comment(&mut self) {
        let (start_line, start_col) = (self.line, self.col);
        self.advance();
        self.advance();
        loop {
            match self.peek() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(ErrorCode::UNTERMINATED, "Unterminated block comment", span);
                    return;
                }
                Some(b'*') if self.peek_at(1) == Some(b'/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Scanning
    // ─────────────────────────────────────────────────────────────

    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            let start_line = self.line;
            let start_col = self.col;
            let start = self.pos;
            let Some(ch) = self.advance() else {
                return Token::new(TokenKind::Eof, self.current_span());
            };
            let kind = match ch {
                b'"' => Some(self.scan_string(start_line, start_col)),
                b'0'..=b'9' => Some(self.scan_number(start)),
                b'-' if matches!(self.peek(), Some(b'0'..=b'9')) => Some(self.scan_number(start)),
                b'a'..=b'z' | b'A'..=b'Z' | b'_' => Some(self.scan_identifier(start)),
                b'.' if self.peek() == Some(b'.') && self.peek_at(1) == Some(b'.') => {
                    self.advance();
                    self.advance();
                    Some(TokenKind::Ellipsis)
                }
                b'{' => Some(TokenKind::LBrace),
                b'}' => Some(TokenKind::RBrace),
                b'(' => Some(TokenKind::LParen),
                b')' => Some(TokenKind::RParen),
                b'[' => Some(TokenKind::LBracket),
                b']' => Some(TokenKind::RBracket),
                b'<' => Some(TokenKind::Less),
                b'>' => Some(TokenKind::Greater),
                b';' => Some(TokenKind::Semicolon),
                b':' => Some(TokenKind::Colon),
                b',' => Some(TokenKind::Comma),
                b'=' => Some(TokenKind::Eq),
                b'?' => Some(TokenKind::Question),
                b'|' => Some(TokenKind::Pipe),
                b'&' => Some(TokenKind::Amp),
                other => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("Unexpected character '{}'", other as char),
                        span,
                    );
                    if self.errors.at_limit() {
                        return Token::new(TokenKind::Eof, self.current_span());
                    }
                    None
                }
            };
            if let Some(kind) = kind {
                return Token::new(kind, self.span_from(start_line, start_col));
            }
        }
    }

    fn scan_identifier(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'_')) {
            self.advance();
        }
        let text = self.text_from(start);
        TokenKind::from_keyword(&text).unwrap_or(TokenKind::Identifier(text))
    }

    /// Integer (decimal or hex) or float; a leading `-` is already consumed.
    fn scan_number(&mut self, start: usize) -> TokenKind {
        let first = self.source[self.pos - 1];
        let leading_zero = first == b'0' || (first == b'-' && self.peek() == Some(b'0'));
        if leading_zero {
            let hex_at = if first == b'-' { 1 } else { 0 };
            if matches!(self.peek_at(hex_at), Some(b'x' | b'X')) {
                for _ in 0..=hex_at {
                    self.advance();
                }
                while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                    self.advance();
                }
                return TokenKind::Integer(self.text_from(start));
            }
        }

        self.eat_digits();
        let mut is_float = false;
        if self.peek() == Some(b'.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.advance();
            self.eat_digits();
        }
        if matches!(self.peek(), Some(b'e' | b'E')) {
            let digit_at = if matches!(self.peek_at(1), Some(b'+' | b'-')) { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                for _ in 0..digit_at {
                    self.advance();
                }
                self.eat_digits();
            }
        }
        let text = self.text_from(start);
        if is_float {
            TokenKind::Float(text)
        } else {
            TokenKind::Integer(text)
        }
    }

    fn eat_digits(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    /// Contents of a double-quoted string; `\"` and `\\` are the only escapes.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> TokenKind {
        let mut bytes = Vec::new();
        loop {
            match self.advance() {
                None => {
                    let span = self.span_from(start_line, start_col);
                    self.emit_error(ErrorCode::UNTERMINATED, "Unterminated string literal", span);
                    break;
                }
                Some(b'"') => break,
                Some(b'\\') if matches!(self.peek(), Some(b'"' | b'\\')) => {
                    if let Some(escaped) = self.advance() {
                        bytes.push(escaped);
                    }
                }
                Some(other) => bytes.push(other),
            }
        }
        TokenKind::Str(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> LexResult {
        let file = SourceFile::new("unit.idl", text);
        Lexer::new(&file).lex()
    }

    #[test]
    fn empty_input_is_just_eof() {
        let result = lex("");
        assert_eq!(result.tokens.len(), 1);
        assert_eq!(result.tokens[0].kind, TokenKind::Eof);
    }

    #[test]
    fn spans_track_lines_and_columns() {
        let result = lex("interface\n  Widget");
        assert_eq!(result.tokens[0].span, Span::new(1, 1, 1, 9));
        assert_eq!(result.tokens[1].span, Span::new(2, 3, 2, 8));
    }

    #[test]
    fn minus_without_digit_is_an_error() {
        let result = lex("- x");
        assert_eq!(result.errors.total_errors, 1);
        assert_eq!(result.errors.errors[0].code, ErrorCode::UNEXPECTED_TOKEN);
    }
}
