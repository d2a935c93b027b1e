//! Type parsing.
//!
//! Types are built straight into [`IdlType`] variants. Unbalanced
//! brackets inside a type report E201 instead of the generic E100.

use idlc_lexer::token::TokenKind;
use idlc_types::{ErrorCode, IdlType};

use crate::parser::Parser;

impl<'src> Parser<'src> {
    /// A type followed by an optional `?`.
    pub(crate) fn parse_type_with_nullable(&mut self) -> Option<(IdlType, bool)> {
        let idl_type = self.parse_type()?;
        let nullable = self.eat(&TokenKind::Question);
        Some((idl_type, nullable))
    }

    /// ```ebnf
    /// Type = "sequence" "<" Type ">" { "[]" }
    ///      | "(" Type "or" Type { "or" Type } ")" { "[]" }
    ///      | ["unsigned"] ("short" | "long" ["long"]) { "[]" }
    ///      | ["unrestricted"] ("float" | "double") { "[]" }
    ///      | Ident { "[]" } ;
    /// ```
    pub(crate) fn parse_type(&mut self) -> Option<IdlType> {
        let mut idl_type = match self.peek_kind().clone() {
            TokenKind::Sequence => {
                self.advance();
                self.expect_with(&TokenKind::Less, ErrorCode::MALFORMED_TYPE_SYNTAX)?;
                let inner = self.parse_type()?;
                self.eat(&TokenKind::Question);
                self.expect_with(&TokenKind::Greater, ErrorCode::MALFORMED_TYPE_SYNTAX)?;
                IdlType::sequence(inner)
            }
            TokenKind::LParen => self.parse_union_type()?,
            TokenKind::Identifier(word) => {
                self.advance();
                IdlType::Named(self.parse_primitive_tail(word)?)
            }
            other => {
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected type, got '{other}'"),
                );
                return None;
            }
        };
        while self.eat(&TokenKind::LBracket) {
            self.expect_with(&TokenKind::RBracket, ErrorCode::MALFORMED_TYPE_SYNTAX)?;
            idl_type = IdlType::array(idl_type);
        }
        Some(idl_type)
    }

    fn parse_union_type(&mut self) -> Option<IdlType> {
        let start = self.current_span();
        self.advance();
        let mut members = vec![self.parse_type()?];
        self.eat(&TokenKind::Question);
        while self.eat(&TokenKind::Or) {
            members.push(self.parse_type()?);
            self.eat(&TokenKind::Question);
        }
        self.expect_with(&TokenKind::RParen, ErrorCode::MALFORMED_TYPE_SYNTAX)?;
        if members.len() < 2 {
            let span = start.to(self.previous_span());
            self.error_at(
                ErrorCode::MALFORMED_TYPE_SYNTAX,
                "union type needs at least two member types",
                span,
            );
            return None;
        }
        Some(IdlType::Union(members))
    }

    /// Join multi-word primitive names (`unsigned long long`,
    /// `unrestricted double`) after their first word was consumed.
    fn parse_primitive_tail(&mut self, first: String) -> Option<String> {
        match first.as_str() {
            "unsigned" => {
                if self.check_word("short") {
                    self.advance();
                    return Some("unsigned short".to_string());
                }
                if !self.check_word("long") {
                    self.error_at_current(
                        ErrorCode::UNEXPECTED_TOKEN,
                        format!("expected 'short' or 'long' after 'unsigned', got '{}'", self.peek_kind()),
                    );
                    return None;
                }
                self.advance();
                Some(self.long_long_tail("unsigned long"))
            }
            "long" => Some(self.long_long_tail("long")),
            "unrestricted" => {
                if self.check_word("float") || self.check_word("double") {
                    let word = self.peek_kind().to_string();
                    self.advance();
                    return Some(format!("unrestricted {word}"));
                }
                self.error_at_current(
                    ErrorCode::UNEXPECTED_TOKEN,
                    format!("expected 'float' or 'double' after 'unrestricted', got '{}'", self.peek_kind()),
                );
                None
            }
            _ => Some(first),
        }
    }

    /// `long` optionally followed by a second `long`.
    fn long_long_tail(&mut self, base: &str) -> String {
        if self.check_word("long") {
            self.advance();
            format!("{base} long")
        } else {
            base.to_string()
        }
    }
}
