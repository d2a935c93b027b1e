//! Per-interface state shared by the member compilers.

use idlc_types::Span;

use crate::classify::Classifier;
use crate::conversion::ConversionError;
use crate::error::CompileError;
use crate::ext_attrs::ExtendedAttributes;

pub(crate) struct MemberContext<'a> {
    pub classifier: Classifier<'a>,
    pub interface_name: &'a str,
    /// Native class name (`[ImplementedAs]` applied).
    pub cpp_class: &'a str,
    pub interface_attrs: &'a ExtendedAttributes,
}

impl MemberContext<'_> {
    /// Prefix of generated callback names.
    pub fn internal_namespace(&self) -> String {
        format!("{}V8Internal", self.cpp_class)
    }
}

pub(crate) fn unsupported(member: &str, span: Span, err: ConversionError) -> CompileError {
    CompileError::UnsupportedConversion {
        member: member.to_string(),
        message: err.to_string(),
        span,
    }
}

/// Reject mutually exclusive tags on one member.
pub(crate) fn check_conflicts(
    member: &str,
    span: Span,
    attrs: &ExtendedAttributes,
) -> Result<(), CompileError> {
    match attrs.conflict() {
        Some(message) => Err(CompileError::ConflictingMemberPolicy {
            member: member.to_string(),
            message,
            span,
        }),
        None => Ok(()),
    }
}
