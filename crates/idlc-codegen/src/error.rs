//! Codegen error types.

use thiserror::Error;

/// Errors that can occur while rendering an emission record.
#[derive(Debug, Error)]
pub enum CodegenError {
    /// The record is internally inconsistent (e.g. a dangling overload index).
    #[error("internal codegen error: {0}")]
    Internal(String),

    /// Writing to the output buffer failed.
    #[error("formatting failed: {0}")]
    Format(#[from] std::fmt::Error),
}

/// Codegen result type alias.
pub type CodegenResult<T> = Result<T, CodegenError>;
