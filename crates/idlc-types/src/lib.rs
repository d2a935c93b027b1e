//! Shared types for the IDL bindings compiler.
//!
//! This crate defines the description-language AST, the tagged [`IdlType`],
//! source spans, diagnostics, and the emission records handed from the
//! compiler to the renderer.

pub mod ast;
mod error;
mod idl_type;
pub mod record;
mod span;

pub use error::{CompileErrors, ErrorCategory, ErrorCode, IdlError, Severity, MAX_ERRORS};
pub use idl_type::{IdlType, TypeSyntaxError};
pub use span::{SourceFile, Span};
