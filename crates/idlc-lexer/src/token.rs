//! Token types for the description-language lexer.

use idlc_types::Span;
use std::fmt;

/// Reserved words of the description language.
///
/// Primitive type names (`long`, `unsigned`, `double`, ...) are plain
/// identifiers; only structural words are reserved.
pub const ALL_KEYWORDS: &[&str] = &[
    "interface", "partial", "callback", "attribute", "readonly", "static", "const",
    "optional", "enum", "typedef", "sequence", "or", "inherit",
];

// ─────────────────────────────────────────────────────────────────────
// Token
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn is_keyword(&self) -> bool {
        self.kind.is_keyword()
    }
}

// ─────────────────────────────────────────────────────────────────────
// TokenKind
// ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // ── Literals ──
    /// Integer literal text as written: `42`, `-1`, `0x7F`.
    Integer(String),
    /// Float literal text as written: `1.5`, `-2e10`.
    Float(String),
    /// String literal contents without the quotes.
    Str(String),

    Identifier(String),

    // ── Keywords ──
    Interface,
    Partial,
    Callback,
    Attribute,
    Readonly,
    Static,
    Const,
    Optional,
    Enum,
    Typedef,
    Sequence,
    Or,
    Inherit,

    // ── Punctuation ──
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Less,
    Greater,
    Semicolon,
    Colon,
    Comma,
    Eq,
    Question,
    Ellipsis,
    Pipe,
    Amp,

    Eof,
}

impl TokenKind {
    pub fn from_keyword(s: &str) -> Option<TokenKind> {
        Some(match s {
            "interface" => TokenKind::Interface,
            "partial" => TokenKind::Partial,
            "callback" => TokenKind::Callback,
            "attribute" => TokenKind::Attribute,
            "readonly" => TokenKind::Readonly,
            "static" => TokenKind::Static,
            "const" => TokenKind::Const,
            "optional" => TokenKind::Optional,
            "enum" => TokenKind::Enum,
            "typedef" => TokenKind::Typedef,
            "sequence" => TokenKind::Sequence,
            "or" => TokenKind::Or,
            "inherit" => TokenKind::Inherit,
            _ => return None,
        })
    }

    pub fn is_keyword(&self) -> bool {
        self.keyword_text().is_some()
    }

    /// Source spelling of a keyword token.
    pub fn keyword_text(&self) -> Option<&'static str> {
        Some(match self {
            TokenKind::Interface => "interface",
            TokenKind::Partial => "partial",
            TokenKind::Callback => "callback",
            TokenKind::Attribute => "attribute",
            TokenKind::Readonly => "readonly",
            TokenKind::Static => "static",
            TokenKind::Const => "const",
            TokenKind::Optional => "optional",
            TokenKind::Enum => "enum",
            TokenKind::Typedef => "typedef",
            TokenKind::Sequence => "sequence",
            TokenKind::Or => "or",
            TokenKind::Inherit => "inherit",
            _ => return None,
        })
    }

    /// Identifier text, also accepting keywords.
    ///
    /// Member and argument names may legally spell a keyword
    /// (`attribute long static;` is unusual but valid).
    pub fn name_text(&self) -> Option<&str> {
        match self {
            TokenKind::Identifier(name) => Some(name),
            other => other.keyword_text(),
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(word) = self.keyword_text() {
            return f.write_str(word);
        }
        match self {
            TokenKind::Integer(text) | TokenKind::Float(text) => f.write_str(text),
            TokenKind::Str(text) => write!(f, "\"{text}\""),
            TokenKind::Identifier(name) => f.write_str(name),
            TokenKind::LBrace => f.write_str("{"),
            TokenKind::RBrace => f.write_str("}"),
            TokenKind::LParen => f.write_str("("),
            TokenKind::RParen => f.write_str(")"),
            TokenKind::LBracket => f.write_str("["),
            TokenKind::RBracket => f.write_str("]"),
            TokenKind::Less => f.write_str("<"),
            TokenKind::Greater => f.write_str(">"),
            TokenKind::Semicolon => f.write_str(";"),
            TokenKind::Colon => f.write_str(":"),
            TokenKind::Comma => f.write_str(","),
            TokenKind::Eq => f.write_str("="),
            TokenKind::Question => f.write_str("?"),
            TokenKind::Ellipsis => f.write_str("..."),
            TokenKind::Pipe => f.write_str("|"),
            TokenKind::Amp => f.write_str("&"),
            TokenKind::Eof => f.write_str("end of file"),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_keyword_round_trips() {
        for word in ALL_KEYWORDS {
            let kind = TokenKind::from_keyword(word).unwrap();
            assert!(kind.is_keyword());
            assert_eq!(kind.to_string(), *word);
        }
    }

    #[test]
    fn type_names_are_not_keywords() {
        for word in ["long", "unsigned", "DOMString", "boolean", "any", "void"] {
            assert!(TokenKind::from_keyword(word).is_none(), "{word}");
        }
    }

    #[test]
    fn keywords_are_usable_as_names() {
        assert_eq!(TokenKind::Static.name_text(), Some("static"));
        assert_eq!(TokenKind::Identifier("id".into()).name_text(), Some("id"));
        assert_eq!(TokenKind::Semicolon.name_text(), None);
    }
}
