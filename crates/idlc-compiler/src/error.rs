//! Compiler error types.
//!
//! Every variant is local to one interface: it aborts that interface's
//! compile and nothing else.

use idlc_types::{ErrorCode, IdlError, SourceFile, Span, TypeSyntaxError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    /// Composite type text with unbalanced brackets.
    #[error("malformed type syntax: {message}")]
    MalformedTypeSyntax { message: String, span: Span },

    /// A type shape with no defined conversion (e.g. a union).
    #[error("'{member}' has no supported conversion: {message}")]
    UnsupportedConversion {
        member: String,
        message: String,
        span: Span,
    },

    /// Mutually exclusive extended attributes on one member.
    #[error("'{member}' has conflicting extended attributes: {message}")]
    ConflictingMemberPolicy {
        member: String,
        message: String,
        span: Span,
    },

    /// Declared inheritance target was never defined.
    #[error("interface '{interface}' inherits from unknown interface '{parent}'")]
    UnknownParent {
        interface: String,
        parent: String,
        span: Span,
    },

    /// The requested interface is not declared in the input.
    #[error("no interface named '{name}' is defined")]
    UnknownDefinition { name: String, span: Span },
}

impl CompileError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MalformedTypeSyntax { .. } => ErrorCode::MALFORMED_TYPE_SYNTAX,
            Self::UnsupportedConversion { .. } => ErrorCode::UNSUPPORTED_CONVERSION,
            Self::ConflictingMemberPolicy { .. } => ErrorCode::CONFLICTING_MEMBER_POLICY,
            Self::UnknownParent { .. } => ErrorCode::UNKNOWN_PARENT,
            Self::UnknownDefinition { .. } => ErrorCode::UNKNOWN_DEFINITION,
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Self::MalformedTypeSyntax { span, .. }
            | Self::UnsupportedConversion { span, .. }
            | Self::ConflictingMemberPolicy { span, .. }
            | Self::UnknownParent { span, .. }
            | Self::UnknownDefinition { span, .. } => *span,
        }
    }

    /// Structured diagnostic pointing into `file`.
    pub fn to_diagnostic(&self, file: &SourceFile) -> IdlError {
        let span = self.span();
        let diagnostic = IdlError::new(
            &file.name,
            self.code(),
            self.to_string(),
            span,
            file.line_text(span.line),
        );
        match self {
            Self::UnknownParent { parent, .. } => diagnostic.with_suggestion(format!(
                "declare interface '{parent}' or pass the file defining it with --dependency"
            )),
            Self::UnsupportedConversion { .. } => {
                diagnostic.with_suggestion("mark the member [Custom] and implement it by hand")
            }
            _ => diagnostic,
        }
    }
}

/// Type text parsed outside a source file has no position of its own.
impl From<TypeSyntaxError> for CompileError {
    fn from(err: TypeSyntaxError) -> Self {
        Self::MalformedTypeSyntax {
            message: err.to_string(),
            span: Span::point(1, 1),
        }
    }
}

/// Compiler result type alias.
pub type Result<T> = std::result::Result<T, CompileError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_taxonomy() {
        let span = Span::point(1, 1);
        let err = CompileError::UnknownParent {
            interface: "Widget".into(),
            parent: "Gadget".into(),
            span,
        };
        assert_eq!(err.code(), ErrorCode::UNKNOWN_PARENT);
        assert_eq!(
            err.to_string(),
            "interface 'Widget' inherits from unknown interface 'Gadget'"
        );
    }

    #[test]
    fn type_syntax_errors_convert() {
        let err = CompileError::from(idlc_types::IdlType::parse("sequence<long").unwrap_err());
        assert_eq!(err.code(), ErrorCode::MALFORMED_TYPE_SYNTAX);
        assert!(err.to_string().starts_with("malformed type syntax: malformed type 'sequence<long'"));
        assert_eq!(err.span(), Span::point(1, 1));
    }

    #[test]
    fn diagnostic_carries_source_line() {
        let file = SourceFile::new("Widget.idl", "interface Widget : Gadget {\n};");
        let err = CompileError::UnknownParent {
            interface: "Widget".into(),
            parent: "Gadget".into(),
            span: Span::new(1, 20, 1, 25),
        };
        let diagnostic = err.to_diagnostic(&file);
        assert_eq!(diagnostic.source_line, "interface Widget : Gadget {");
        assert!(diagnostic.suggestion.is_some());
    }
}
