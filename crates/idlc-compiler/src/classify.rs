//! Type Classifier.
//!
//! [`Classifier::classify`] maps every [`IdlType`] to exactly one
//! [`Classification`]. Anything not otherwise recognized is a reference to
//! another compiled interface. Node-likeness is a separate predicate
//! ([`is_node_like`]) used only by the lifetime policy.

use std::collections::BTreeSet;
use std::fmt;

use idlc_types::IdlType;

use crate::conversion::ConversionError;
use crate::error::CompileError;
use crate::registry::TypeRegistry;

// ══════════════════════════════════════════════════════════════════════════════
// Classification
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Octet,
    Short,
    UnsignedShort,
    Long,
    UnsignedLong,
    LongLong,
    UnsignedLongLong,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "boolean" => Self::Boolean,
            "byte" => Self::Byte,
            "octet" => Self::Octet,
            "short" => Self::Short,
            "unsigned short" => Self::UnsignedShort,
            "long" => Self::Long,
            "unsigned long" => Self::UnsignedLong,
            "long long" => Self::LongLong,
            "unsigned long long" => Self::UnsignedLongLong,
            "float" | "unrestricted float" => Self::Float,
            "double" | "unrestricted double" => Self::Double,
            _ => return None,
        };
        Some(kind)
    }

    pub fn idl_name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Octet => "octet",
            Self::Short => "short",
            Self::UnsignedShort => "unsigned short",
            Self::Long => "long",
            Self::UnsignedLong => "unsigned long",
            Self::LongLong => "long long",
            Self::UnsignedLongLong => "unsigned long long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// Native representation of the primitive.
    pub fn cpp_type(self) -> &'static str {
        match self {
            Self::Boolean => "bool",
            Self::Byte | Self::Short | Self::Long => "int",
            Self::Octet | Self::UnsignedShort | Self::UnsignedLong => "unsigned",
            Self::LongLong => "long long",
            Self::UnsignedLongLong => "unsigned long long",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, Self::Boolean | Self::Float | Self::Double)
    }

    /// 64-bit integers cannot round-trip through the runtime's number type.
    pub fn is_wide_integer(self) -> bool {
        matches!(self, Self::LongLong | Self::UnsignedLongLong)
    }
}

/// Built-in names with fixed handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecialBuiltin {
    Any,
    Object,
    Void,
    Date,
    Promise,
    Dictionary,
    EventHandler,
}

impl SpecialBuiltin {
    fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "any" => Self::Any,
            "object" => Self::Object,
            "void" => Self::Void,
            "Date" => Self::Date,
            "Promise" => Self::Promise,
            "Dictionary" => Self::Dictionary,
            "EventHandler" => Self::EventHandler,
            _ => return None,
        };
        Some(builtin)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    Primitive(PrimitiveKind),
    /// `DOMString`, `ByteString`, `USVString`.
    StringLike,
    EnumLike(String),
    Sequence(Box<IdlType>),
    Array(Box<IdlType>),
    Union(Vec<IdlType>),
    Callback(String),
    SpecialBuiltin(SpecialBuiltin),
    InterfaceReference(String),
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "primitive '{}'", kind.idl_name()),
            Self::StringLike => f.write_str("string"),
            Self::EnumLike(name) => write!(f, "enum '{name}'"),
            Self::Sequence(inner) => write!(f, "sequence of {inner}"),
            Self::Array(inner) => write!(f, "array of {inner}"),
            Self::Union(_) => f.write_str("union"),
            Self::Callback(name) => write!(f, "callback '{name}'"),
            Self::SpecialBuiltin(builtin) => write!(f, "built-in {builtin:?}"),
            Self::InterfaceReference(name) => write!(f, "interface '{name}'"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Fixed type tables
// ══════════════════════════════════════════════════════════════════════════════

/// Types whose lifetime is managed by object grouping.
const DOM_NODE_TYPES: &[&str] = &[
    "Attr",
    "CDATASection",
    "CharacterData",
    "Comment",
    "Document",
    "DocumentFragment",
    "DocumentType",
    "Element",
    "Entity",
    "HTMLDocument",
    "Node",
    "Notation",
    "ProcessingInstruction",
    "ShadowRoot",
    "SVGDocument",
    "Text",
    "TestNode",
];

/// Interface types that are not held through a wrapper.
const NON_WRAPPER_TYPES: &[&str] = &["NodeFilter", "SerializedScriptValue"];

const TYPED_ARRAYS: &[&str] = &[
    "ArrayBuffer",
    "ArrayBufferView",
    "Float32Array",
    "Float64Array",
    "Int8Array",
    "Int16Array",
    "Int32Array",
    "Uint8Array",
    "Uint8ClampedArray",
    "Uint16Array",
    "Uint32Array",
];

const STRING_TYPES: &[&str] = &["DOMString", "ByteString", "USVString"];

/// True for node types and `HTML*Element` / `SVG*Element`.
pub fn is_node_like(ty: &IdlType) -> bool {
    let Some(name) = ty.name() else {
        return false;
    };
    DOM_NODE_TYPES.contains(&name)
        || ((name.starts_with("HTML") || name.starts_with("SVG")) && name.ends_with("Element"))
}

pub fn is_typed_array(name: &str) -> bool {
    TYPED_ARRAYS.contains(&name)
}

/// `V8` prefixed class name for an interface.
pub fn v8_type(name: &str) -> String {
    format!("V8{name}")
}

/// `Template<Inner>`, with a space before the closing bracket when `inner`
/// itself ends in `>`.
pub fn cpp_template_type(template: &str, inner: &str) -> String {
    if inner.ends_with('>') {
        format!("{template}<{inner} >")
    } else {
        format!("{template}<{inner}>")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Classifier
// ══════════════════════════════════════════════════════════════════════════════

/// Classifies types against one registry snapshot.
#[derive(Debug, Clone, Copy)]
pub struct Classifier<'r> {
    registry: &'r TypeRegistry,
}

impl<'r> Classifier<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r TypeRegistry {
        self.registry
    }

    /// Classify a type. Total: every input yields exactly one variant.
    pub fn classify(&self, ty: &IdlType) -> Classification {
        match self.registry.resolve_typedefs(ty) {
            IdlType::Sequence(inner) => Classification::Sequence(inner),
            IdlType::Array(inner) => Classification::Array(inner),
            IdlType::Union(members) => Classification::Union(members),
            IdlType::Named(name) => self.classify_named(name),
        }
    }

    /// Classify type text, parsing it first. Unbalanced text is
    /// [`CompileError::MalformedTypeSyntax`].
    pub fn classify_name(&self, text: &str) -> Result<Classification, CompileError> {
        let ty = IdlType::parse(text)?;
        Ok(self.classify(&ty))
    }

    fn classify_named(&self, name: String) -> Classification {
        if let Some(kind) = PrimitiveKind::from_name(&name) {
            return Classification::Primitive(kind);
        }
        if STRING_TYPES.contains(&name.as_str()) {
            return Classification::StringLike;
        }
        if let Some(builtin) = SpecialBuiltin::from_name(&name) {
            return Classification::SpecialBuiltin(builtin);
        }
        if self.registry.is_enum(&name) {
            return Classification::EnumLike(name);
        }
        if self.registry.is_callback_function(&name) {
            return Classification::Callback(name);
        }
        Classification::InterfaceReference(name)
    }

    /// The name of the referenced interface, if `ty` is one.
    pub fn interface_name(&self, ty: &IdlType) -> Option<String> {
        match self.classify(ty) {
            Classification::InterfaceReference(name) => Some(name),
            _ => None,
        }
    }

    pub fn is_interface_type(&self, ty: &IdlType) -> bool {
        self.interface_name(ty).is_some()
    }

    /// Whether instances are held through a wrapper handle rather than
    /// copied by value.
    pub fn is_wrapper_reference(&self, ty: &IdlType) -> bool {
        self.interface_name(ty)
            .is_some_and(|name| !NON_WRAPPER_TYPES.contains(&name.as_str()))
    }

    pub fn is_enum(&self, ty: &IdlType) -> bool {
        matches!(self.classify(ty), Classification::EnumLike(_))
    }

    pub fn enum_values(&self, ty: &IdlType) -> Option<&'r [String]> {
        match self.classify(ty) {
            Classification::EnumLike(name) => self.registry.enum_values(&name),
            _ => None,
        }
    }

    pub fn is_sequence_or_array(&self, ty: &IdlType) -> bool {
        matches!(
            self.classify(ty),
            Classification::Sequence(_) | Classification::Array(_)
        )
    }

    // ── Native representation ──

    /// Native type for `ty`; arguments use the borrowed/pass-through forms.
    pub fn cpp_type(&self, ty: &IdlType, used_as_argument: bool) -> Result<String, ConversionError> {
        let cpp = match self.classify(ty) {
            Classification::Primitive(kind) => kind.cpp_type().to_string(),
            Classification::StringLike | Classification::EnumLike(_) => {
                if used_as_argument {
                    "V8StringResource<>".to_string()
                } else {
                    "String".to_string()
                }
            }
            Classification::Callback(_) => "ScriptValue".to_string(),
            Classification::Union(_) => {
                return Err(ConversionError::Unsupported {
                    type_text: ty.to_string(),
                    reason: "union types have no native representation".to_string(),
                })
            }
            Classification::Sequence(inner) | Classification::Array(inner) => {
                let element = match self.interface_name(&inner) {
                    Some(name) => cpp_template_type("RefPtr", &name),
                    None => self.cpp_type(&inner, false)?,
                };
                cpp_template_type("Vector", &element)
            }
            Classification::SpecialBuiltin(builtin) => match builtin {
                SpecialBuiltin::Any | SpecialBuiltin::Object => "ScriptValue".to_string(),
                SpecialBuiltin::Promise => "ScriptPromise".to_string(),
                SpecialBuiltin::Void => "void".to_string(),
                SpecialBuiltin::Date => "double".to_string(),
                SpecialBuiltin::Dictionary => "Dictionary".to_string(),
                SpecialBuiltin::EventHandler => "EventListener*".to_string(),
            },
            Classification::InterfaceReference(name) => {
                if used_as_argument {
                    cpp_template_type("PassRefPtr", &name)
                } else {
                    cpp_template_type("RefPtr", &name)
                }
            }
        };
        Ok(cpp)
    }

    /// Headers pulled in by mentioning `ty`.
    pub fn includes_for_type(&self, ty: &IdlType) -> BTreeSet<String> {
        let mut includes = BTreeSet::new();
        match self.classify(ty) {
            Classification::SpecialBuiltin(SpecialBuiltin::Promise) => {
                includes.insert("ScriptPromise.h".to_string());
            }
            Classification::Sequence(inner) | Classification::Array(inner) => {
                includes = self.includes_for_type(&inner);
            }
            Classification::Union(members) => {
                for member in &members {
                    includes.extend(self.includes_for_type(member));
                }
            }
            Classification::InterfaceReference(name) => {
                includes.insert(includes_for_interface(&name));
            }
            Classification::Primitive(_)
            | Classification::StringLike
            | Classification::EnumLike(_)
            | Classification::Callback(_)
            | Classification::SpecialBuiltin(_) => {}
        }
        includes
    }
}

/// Header for a referenced interface.
pub fn includes_for_interface(name: &str) -> String {
    if name == "SerializedScriptValue" {
        return "bindings/v8/SerializedScriptValue.h".to_string();
    }
    if is_typed_array(name) {
        return format!("bindings/v8/custom/V8{name}Custom.h");
    }
    format!("V8{name}.h")
}
