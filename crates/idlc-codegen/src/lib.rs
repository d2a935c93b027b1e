//! IDL bindings renderer: one [`InterfaceRecord`] to C++ text.
//!
//! # Architecture
//!
//! The renderer is a pure function of the record. It never consults the
//! description, the registries or the side-table, so identical records
//! always render to identical bytes.
//!
//! ## Outputs
//! - declaration unit: wrapper class, `wrap`/`toV8` helpers, return-value
//!   overloads ([`render_header`])
//! - definition unit: type info, per-member callbacks inside the
//!   `<Class>V8Internal` namespace, installation tables, template
//!   configuration and wrapper creation ([`render_source`])

pub mod error;
mod header;
mod members;
mod source;
pub mod writer;

pub use error::{CodegenError, CodegenResult};
pub use header::render_header;
pub use source::render_source;

use idlc_types::record::InterfaceRecord;

/// First line of every generated file.
pub const GENERATED_BANNER: &str =
    "// This file has been auto-generated by idlc. DO NOT MODIFY!";

/// Both output units for one interface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedInterface {
    pub header: String,
    pub source: String,
}

/// Render the declaration and definition units for `record`.
pub fn render(record: &InterfaceRecord) -> CodegenResult<RenderedInterface> {
    Ok(RenderedInterface {
        header: render_header(record)?,
        source: render_source(record)?,
    })
}

/// Header of the implementation class: the side-table `include_path` when
/// present, `<Class>.h` otherwise.
pub(crate) fn implementation_include(record: &InterfaceRecord) -> String {
    record
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get("include_path"))
        .and_then(serde_json::Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}.h", record.cpp_class))
}
