use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of errors stored before further ones are only counted.
pub const MAX_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// Error category, derived from the code range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Syntax,
    Type,
    Member,
    Interface,
    Limitation,
    Render,
}

/// Numeric diagnostic code (E100–E599).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ErrorCode(pub u16);

impl ErrorCode {
    // ── Syntax (E100–E199) ──
    pub const UNEXPECTED_TOKEN: Self = Self(100);
    pub const UNTERMINATED: Self = Self(101);

    // ── Types (E200–E299) ──
    pub const UNKNOWN_DEFINITION: Self = Self(200);
    pub const MALFORMED_TYPE_SYNTAX: Self = Self(201);
    pub const UNSUPPORTED_CONVERSION: Self = Self(202);

    // ── Members (E300–E399) ──
    pub const CONFLICTING_MEMBER_POLICY: Self = Self(301);

    // ── Interfaces (E400–E499) ──
    pub const UNKNOWN_PARENT: Self = Self(401);

    // ── Declared limitations (E500–E599) ──
    pub const OVERLOAD_LIMITATION: Self = Self(501);

    // ── Rendering (E600–E699) ──
    pub const RENDER_FAILED: Self = Self(600);

    pub fn category(self) -> ErrorCategory {
        match self.0 {
            100..=199 => ErrorCategory::Syntax,
            200..=299 => ErrorCategory::Type,
            300..=399 => ErrorCategory::Member,
            400..=499 => ErrorCategory::Interface,
            500..=599 => ErrorCategory::Limitation,
            _ => ErrorCategory::Render,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{}", self.0)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Syntax => "syntax",
            Self::Type => "type",
            Self::Member => "member",
            Self::Interface => "interface",
            Self::Limitation => "limitation",
            Self::Render => "render",
        })
    }
}

/// A structured diagnostic produced by any compiler stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlError {
    pub file: String,
    pub code: ErrorCode,
    pub severity: Severity,
    pub category: ErrorCategory,
    pub message: String,
    #[serde(flatten)]
    pub span: Span,
    /// The offending source line, for context.
    pub source_line: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl IdlError {
    pub fn new(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            code,
            severity: Severity::Error,
            category: code.category(),
            message: message.into(),
            span,
            source_line: source_line.into(),
            suggestion: None,
        }
    }

    /// Same as [`IdlError::new`] with warning severity.
    pub fn warning(
        file: impl Into<String>,
        code: ErrorCode,
        message: impl Into<String>,
        span: Span,
        source_line: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::new(file, code, message, span, source_line)
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for IdlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} [{}] {}",
            self.file, self.span, self.code, self.category, self.message
        )
    }
}

impl std::error::Error for IdlError {}

/// Errors and warnings collected over one compile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompileErrors {
    pub errors: Vec<IdlError>,
    pub warnings: Vec<IdlError>,
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl CompileErrors {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn has_errors(&self) -> bool {
        self.total_errors > 0
    }

    /// True once the stored error list is full.
    pub fn at_limit(&self) -> bool {
        self.total_errors >= MAX_ERRORS
    }

    /// Record a diagnostic, routing warnings to the warning list.
    pub fn push(&mut self, diagnostic: IdlError) {
        match diagnostic.severity {
            Severity::Warning => {
                self.warnings.push(diagnostic);
                self.total_warnings += 1;
            }
            Severity::Error => {
                if self.errors.len() < MAX_ERRORS {
                    self.errors.push(diagnostic);
                }
                self.total_errors += 1;
            }
        }
    }

    /// Append everything from another collection.
    pub fn extend(&mut self, other: CompileErrors) {
        for diagnostic in other.errors.into_iter().chain(other.warnings) {
            self.push(diagnostic);
        }
    }
}

impl fmt::Display for CompileErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for diagnostic in self.errors.iter().chain(&self.warnings) {
            writeln!(f, "{diagnostic}")?;
        }
        if self.total_errors > self.errors.len() {
            writeln!(
                f,
                "... and {} more errors",
                self.total_errors - self.errors.len()
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(code: ErrorCode) -> IdlError {
        IdlError::new(
            "Widget.idl",
            code,
            "bad thing",
            Span::new(3, 5, 3, 12),
            "    attribute sequence<long id;",
        )
    }

    #[test]
    fn categories_follow_code_ranges() {
        assert_eq!(ErrorCode::UNEXPECTED_TOKEN.category(), ErrorCategory::Syntax);
        assert_eq!(ErrorCode::MALFORMED_TYPE_SYNTAX.category(), ErrorCategory::Type);
        assert_eq!(
            ErrorCode::CONFLICTING_MEMBER_POLICY.category(),
            ErrorCategory::Member
        );
        assert_eq!(ErrorCode::UNKNOWN_PARENT.category(), ErrorCategory::Interface);
        assert_eq!(
            ErrorCode::OVERLOAD_LIMITATION.category(),
            ErrorCategory::Limitation
        );
    }

    #[test]
    fn display_includes_location_and_code() {
        let err = sample(ErrorCode::MALFORMED_TYPE_SYNTAX);
        assert_eq!(err.to_string(), "Widget.idl:3:5: E201 [type] bad thing");
    }

    #[test]
    fn json_shape_flattens_span() {
        let err = sample(ErrorCode::UNKNOWN_PARENT).with_suggestion("declare the parent");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["line"], 3);
        assert_eq!(json["end_column"], 12);
        assert_eq!(json["severity"], "error");
        assert_eq!(json["category"], "interface");
        assert_eq!(json["suggestion"], "declare the parent");
        let back: IdlError = serde_json::from_value(json).unwrap();
        assert_eq!(back, err);
    }

    #[test]
    fn warnings_do_not_count_as_errors() {
        let mut errs = CompileErrors::empty();
        errs.push(IdlError::warning(
            "Widget.idl",
            ErrorCode::OVERLOAD_LIMITATION,
            "variadic and optional",
            Span::point(1, 1),
            "",
        ));
        assert!(!errs.has_errors());
        assert_eq!(errs.total_warnings, 1);
    }

    #[test]
    fn error_list_is_capped() {
        let mut errs = CompileErrors::empty();
        for _ in 0..MAX_ERRORS + 4 {
            errs.push(sample(ErrorCode::UNEXPECTED_TOKEN));
        }
        assert_eq!(errs.errors.len(), MAX_ERRORS);
        assert_eq!(errs.total_errors, MAX_ERRORS + 4);
        assert!(errs.at_limit());
        assert!(errs.to_string().contains("... and 4 more errors"));
    }
}
