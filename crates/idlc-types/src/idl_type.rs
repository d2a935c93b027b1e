//! The tagged representation of an IDL type.
//!
//! Type text such as `sequence<Node>` or `(DOMString or long)[]` is parsed
//! exactly once into an [`IdlType`]; later stages match on the variant
//! instead of re-inspecting strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IdlType {
    /// A single (possibly multi-word) type name: `long`, `unsigned long long`, `Node`.
    Named(String),
    /// `sequence<T>`
    Sequence(Box<IdlType>),
    /// `T[]`
    Array(Box<IdlType>),
    /// `(A or B or ...)`, at least two members.
    Union(Vec<IdlType>),
}

/// Type text that could not be turned into an [`IdlType`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed type '{text}': {reason}")]
pub struct TypeSyntaxError {
    pub text: String,
    pub reason: String,
}

impl IdlType {
    pub fn named(name: impl Into<String>) -> Self {
        IdlType::Named(name.into())
    }

    pub fn sequence(inner: IdlType) -> Self {
        IdlType::Sequence(Box::new(inner))
    }

    pub fn array(inner: IdlType) -> Self {
        IdlType::Array(Box::new(inner))
    }

    /// The bare name for [`IdlType::Named`].
    pub fn name(&self) -> Option<&str> {
        match self {
            IdlType::Named(name) => Some(name),
            _ => None,
        }
    }

    /// True when this is exactly the named type `name`.
    pub fn is(&self, name: &str) -> bool {
        self.name() == Some(name)
    }

    /// Element type of a sequence or array.
    pub fn element_type(&self) -> Option<&IdlType> {
        match self {
            IdlType::Sequence(inner) | IdlType::Array(inner) => Some(inner),
            _ => None,
        }
    }

    /// Parse type text.
    pub fn parse(text: &str) -> Result<IdlType, TypeSyntaxError> {
        let fail = |reason: &str| TypeSyntaxError {
            text: text.to_string(),
            reason: reason.to_string(),
        };
        let pieces = split_pieces(text).map_err(|c| fail(&format!("unexpected character '{c}'")))?;
        let mut cursor = PieceCursor { pieces, pos: 0 };
        let ty = cursor.parse_type().map_err(|reason| fail(&reason))?;
        if let Some(extra) = cursor.peek() {
            return Err(fail(&format!("unexpected '{extra}' after type")));
        }
        Ok(ty)
    }
}

impl fmt::Display for IdlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlType::Named(name) => f.write_str(name),
            IdlType::Sequence(inner) => write!(f, "sequence<{inner}>"),
            IdlType::Array(inner) => write!(f, "{inner}[]"),
            IdlType::Union(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" or ")?;
                    }
                    write!(f, "{member}")?;
                }
                f.write_str(")")
            }
        }
    }
}

// ── Text parsing ─────────────────────────────────────────────────────────────

fn split_pieces(text: &str) -> Result<Vec<String>, char> {
    let mut pieces = Vec::new();
    let mut word = String::new();
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            word.push(ch);
            continue;
        }
        if !word.is_empty() {
            pieces.push(std::mem::take(&mut word));
        }
        match ch {
            '<' | '>' | '(' | ')' | '[' | ']' => pieces.push(ch.to_string()),
            c if c.is_whitespace() => {}
            other => return Err(other),
        }
    }
    if !word.is_empty() {
        pieces.push(word);
    }
    Ok(pieces)
}

struct PieceCursor {
    pieces: Vec<String>,
    pos: usize,
}

impl PieceCursor {
    fn peek(&self) -> Option<&str> {
        self.pieces.get(self.pos).map(String::as_str)
    }

    fn bump(&mut self) -> Option<String> {
        let piece = self.pieces.get(self.pos).cloned();
        self.pos += 1;
        piece
    }

    fn expect(&mut self, wanted: &str) -> Result<(), String> {
        match self.bump() {
            Some(piece) if piece == wanted => Ok(()),
            Some(piece) => Err(format!("expected '{wanted}', found '{piece}'")),
            None => Err(format!("expected '{wanted}', found end of text")),
        }
    }

    fn parse_type(&mut self) -> Result<IdlType, String> {
        let mut ty = match self.peek() {
            Some("sequence") => {
                self.bump();
                self.expect("<")?;
                let inner = self.parse_type()?;
                self.expect(">")?;
                IdlType::sequence(inner)
            }
            Some("(") => {
                self.bump();
                let mut members = vec![self.parse_type()?];
                while self.peek() == Some("or") {
                    self.bump();
                    members.push(self.parse_type()?);
                }
                self.expect(")")?;
                if members.len() < 2 {
                    return Err("union needs at least two member types".to_string());
                }
                IdlType::Union(members)
            }
            Some(piece) if is_word(piece) && piece != "or" => {
                let mut words = Vec::new();
                while let Some(piece) = self.peek() {
                    if !is_word(piece) || piece == "or" {
                        break;
                    }
                    words.push(piece.to_string());
                    self.bump();
                }
                IdlType::Named(words.join(" "))
            }
            Some(piece) => return Err(format!("unexpected '{piece}'")),
            None => return Err("missing type name".to_string()),
        };
        while self.peek() == Some("[") {
            self.bump();
            self.expect("]")?;
            ty = IdlType::array(ty);
        }
        Ok(ty)
    }
}

fn is_word(piece: &str) -> bool {
    piece
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multi_word_primitives() {
        assert_eq!(
            IdlType::parse("unsigned  long long").unwrap(),
            IdlType::named("unsigned long long")
        );
    }

    #[test]
    fn parses_nested_composites() {
        let ty = IdlType::parse("sequence<(Node or DOMString)[]>").unwrap();
        assert_eq!(
            ty,
            IdlType::sequence(IdlType::array(IdlType::Union(vec![
                IdlType::named("Node"),
                IdlType::named("DOMString"),
            ])))
        );
        assert_eq!(ty.to_string(), "sequence<(Node or DOMString)[]>");
    }

    #[test]
    fn rejects_unbalanced_brackets() {
        for text in ["sequence<long", "long[", "(A or B", "sequence<>", "A>", "(A)", ""] {
            let err = IdlType::parse(text).unwrap_err();
            assert_eq!(err.text, text);
        }
    }

    #[test]
    fn rejects_stray_characters() {
        let err = IdlType::parse("long;").unwrap_err();
        assert!(err.reason.contains("';'"), "{}", err.reason);
    }

    #[test]
    fn element_type_of_containers() {
        let seq = IdlType::parse("sequence<long>").unwrap();
        assert_eq!(seq.element_type(), Some(&IdlType::named("long")));
        assert!(IdlType::named("long").element_type().is_none());
        assert!(IdlType::named("Node").is("Node"));
    }
}
