//! IDL bindings compiler: orchestrates the full compilation pipeline.
//!
//! ```text
//! Description → Lexer → Parser → Interface Compiler → EmissionRecord → Renderer → .h / .cpp
//! ```
//!
//! Every entry point is a pure function of its inputs. The type registry and
//! the metadata side-table are passed in explicitly, so independent
//! interfaces can be compiled on separate threads against one shared
//! snapshot.

mod attributes;
pub mod classify;
mod context;
pub mod conversion;
mod error;
pub mod ext_attrs;
mod interface;
pub mod metadata;
mod methods;
pub mod overload;
pub mod registry;
pub mod utilities;

pub use classify::{Classification, Classifier, PrimitiveKind, SpecialBuiltin};
pub use conversion::{Conversion, ConversionError, ConversionOptions, IntegerConversion};
pub use error::CompileError;
pub use ext_attrs::ExtendedAttributes;
pub use interface::{compile_interface, CompiledInterface};
pub use metadata::{InterfaceInfo, InterfacesInfo};
pub use overload::OverloadLimitation;
pub use registry::{TypeRegistry, TypeRegistryBuilder};

use idlc_types::ast::Definitions;
use idlc_types::record::InterfaceRecord;
use idlc_types::{CompileErrors, ErrorCode, IdlError, SourceFile, Span};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ══════════════════════════════════════════════════════════════════════════════
// Pipeline output
// ══════════════════════════════════════════════════════════════════════════════

/// A successfully compiled interface.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub interface_name: String,
    pub record: InterfaceRecord,
    /// Declaration unit.
    pub header: String,
    /// Definition unit.
    pub source: String,
    /// Non-fatal diagnostics (overload limitations).
    pub warnings: CompileErrors,
}

/// Serializable outcome of one compile, for tooling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompileResult {
    pub success: bool,
    pub interface_name: Option<String>,
    pub header: Option<String>,
    pub source: Option<String>,
    pub record: Option<InterfaceRecord>,
    pub errors: CompileErrors,
    /// Hex SHA-256 of the description text.
    pub input_sha256: String,
}

// ══════════════════════════════════════════════════════════════════════════════
// Entry points
// ══════════════════════════════════════════════════════════════════════════════

/// Compile one description file into its declaration and definition units.
///
/// The interface compiled is the one named after the file stem, or the only
/// non-partial interface when the stem matches none. Declarations in the
/// file itself are added on top of `registry` for this compile only.
pub fn compile(
    source: &str,
    filename: &str,
    registry: &TypeRegistry,
    info: &InterfacesInfo,
) -> Result<CompileOutput, CompileErrors> {
    let source_file = SourceFile::new(filename, source);
    let _span = tracing::debug_span!(target: "pipeline", "compile", file = filename).entered();

    // ── Parse ──
    let parsed = idlc_parser::parse_source(&source_file);
    tracing::debug!(
        target: "pipeline",
        stage = "parse",
        errors = parsed.errors.total_errors,
        "parsed description"
    );
    let defs = match parsed.definitions {
        Some(defs) if !parsed.errors.has_errors() => defs,
        _ => return Err(parsed.errors),
    };

    // ── Compile ──
    let name = select_interface(&defs, source_file.stem());
    let registry = registry.extended_with(&defs);
    let classifier = Classifier::new(&registry);
    let compiled = compile_interface(&defs, &name, classifier, info).map_err(|err| {
        tracing::debug!(target: "pipeline", stage = "compile", code = %err.code(), "interface rejected");
        let mut errors = CompileErrors::empty();
        errors.push(err.to_diagnostic(&source_file));
        errors
    })?;

    let mut warnings = CompileErrors::empty();
    for limitation in &compiled.limitations {
        warnings.push(limitation_warning(&source_file, limitation));
    }

    // ── Render ──
    let rendered = idlc_codegen::render(&compiled.record).map_err(|err| {
        let mut errors = CompileErrors::empty();
        errors.push(IdlError::new(
            &source_file.name,
            ErrorCode::RENDER_FAILED,
            err.to_string(),
            Span::point(1, 1),
            source_file.line_text(1),
        ));
        errors
    })?;
    tracing::debug!(
        target: "pipeline",
        stage = "render",
        interface = %name,
        header_bytes = rendered.header.len(),
        source_bytes = rendered.source.len(),
        "rendered interface"
    );

    Ok(CompileOutput {
        interface_name: name,
        record: compiled.record,
        header: rendered.header,
        source: rendered.source,
        warnings,
    })
}

/// Compile and package the outcome as a [`CompileResult`].
///
/// A failed compile carries no header, source or record.
pub fn compile_to_result(
    source: &str,
    filename: &str,
    registry: &TypeRegistry,
    info: &InterfacesInfo,
) -> CompileResult {
    let input_sha256 = sha256_hex(source.as_bytes());
    match compile(source, filename, registry, info) {
        Ok(output) => CompileResult {
            success: true,
            interface_name: Some(output.interface_name),
            header: Some(output.header),
            source: Some(output.source),
            record: Some(output.record),
            errors: output.warnings,
            input_sha256,
        },
        Err(errors) => CompileResult {
            success: false,
            interface_name: None,
            header: None,
            source: None,
            record: None,
            errors,
            input_sha256,
        },
    }
}

/// Parse a description file and report only its diagnostics.
pub fn check(source: &str, filename: &str, registry: &TypeRegistry, info: &InterfacesInfo) -> CompileErrors {
    match compile(source, filename, registry, info) {
        Ok(output) => output.warnings,
        Err(errors) => errors,
    }
}

/// Parse `source` and register its declarations on top of `base`.
///
/// Used for `--dependency` files, which contribute names but are never
/// compiled themselves.
pub fn register_dependency(
    base: TypeRegistryBuilder,
    source: &str,
    filename: &str,
) -> Result<TypeRegistryBuilder, CompileErrors> {
    let source_file = SourceFile::new(filename, source);
    let parsed = idlc_parser::parse_source(&source_file);
    match parsed.definitions {
        Some(defs) if !parsed.errors.has_errors() => {
            tracing::trace!(target: "pipeline", stage = "registry", file = filename, "registered dependency");
            Ok(base.add_definitions(&defs))
        }
        _ => Err(parsed.errors),
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn select_interface(defs: &Definitions, stem: &str) -> String {
    if defs.interface(stem).is_some() {
        return stem.to_string();
    }
    let mut complete = defs.interfaces.iter().filter(|i| !i.is_partial);
    match (complete.next(), complete.next()) {
        (Some(only), None) => only.name.name.clone(),
        _ => stem.to_string(),
    }
}

fn limitation_warning(file: &SourceFile, limitation: &OverloadLimitation) -> IdlError {
    IdlError::warning(
        &file.name,
        ErrorCode::OVERLOAD_LIMITATION,
        limitation.message.clone(),
        limitation.span,
        file.line_text(limitation.span.line),
    )
    .with_suggestion("give the method distinct names or drop the optional arguments")
}

fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}
