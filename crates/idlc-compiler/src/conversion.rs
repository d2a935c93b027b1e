//! Value Conversion Engine.
//!
//! Produces the expressions converting a runtime value into its native
//! form and back, keyed off the type's [`Classification`]. Every function
//! is pure: the same inputs always produce the same [`Conversion`].

use std::collections::BTreeSet;

use idlc_types::IdlType;
use thiserror::Error;

use crate::classify::{
    cpp_template_type, v8_type, Classification, Classifier, PrimitiveKind, SpecialBuiltin,
};

/// A type shape with no defined conversion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot convert '{type_text}': {reason}")]
    Unsupported { type_text: String, reason: String },
}

/// A generated expression or statement plus the headers it needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub expr: String,
    pub includes: BTreeSet<String>,
}

impl Conversion {
    fn new(expr: impl Into<String>) -> Self {
        Self {
            expr: expr.into(),
            includes: BTreeSet::new(),
        }
    }

    fn with_include(mut self, include: &str) -> Self {
        self.includes.insert(include.to_string());
        self
    }
}

/// Integer overflow policy for runtime → native conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IntegerConversion {
    /// Modular truncation.
    #[default]
    Normal,
    /// Throw on out-of-range values.
    EnforceRange,
    /// Saturate at the range bounds.
    Clamp,
}

/// Context names used inside generated expressions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOptions {
    pub integer_conversion: IntegerConversion,
    /// The getter reads a reflected content attribute.
    pub reflect: bool,
    pub callback_info: String,
    pub isolate: String,
    pub creation_context: String,
    /// Receiver enabling the fast wrapper return path.
    pub script_wrappable: Option<String>,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            integer_conversion: IntegerConversion::Normal,
            reflect: false,
            callback_info: "info".to_string(),
            isolate: "info.GetIsolate()".to_string(),
            creation_context: "info.Holder()".to_string(),
            script_wrappable: None,
        }
    }
}

impl ConversionOptions {
    pub fn with_integer_conversion(mut self, policy: IntegerConversion) -> Self {
        self.integer_conversion = policy;
        self
    }

    pub fn with_reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }

    pub fn with_script_wrappable(mut self, receiver: &str) -> Self {
        self.script_wrappable = Some(receiver.to_string());
        self
    }
}

/// How a native value re-enters the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReturnKind {
    Boolean,
    Int,
    Unsigned,
    Float,
    Double,
    String,
    Date,
    Void,
    ScriptValue,
    Array,
    EventHandler,
    SerializedScriptValue,
    DomWrapper,
}

fn unsupported(ty: &IdlType, reason: &str) -> ConversionError {
    ConversionError::Unsupported {
        type_text: ty.to_string(),
        reason: reason.to_string(),
    }
}

impl Classifier<'_> {
    // ══════════════════════════════════════════════════════════════════════
    // Runtime → native
    // ══════════════════════════════════════════════════════════════════════

    /// Expression converting the runtime value `v8_value` into `ty`.
    pub fn to_native(
        &self,
        ty: &IdlType,
        v8_value: &str,
        options: &ConversionOptions,
    ) -> Result<Conversion, ConversionError> {
        let isolate = &options.isolate;
        let conversion = match self.classify(ty) {
            Classification::Sequence(inner) | Classification::Array(inner) => {
                match self.interface_name(&inner) {
                    Some(name) => Conversion::new(format!(
                        "(toRefPtrNativeArray<{name}, V8{name}>({v8_value}, {isolate}))"
                    ))
                    .with_include(&format!("V8{name}.h")),
                    None => {
                        let cpp = self.cpp_type(&inner, false)?;
                        Conversion::new(format!("toNativeArray<{cpp}>({v8_value}, {isolate})"))
                    }
                }
            }
            Classification::Primitive(kind) => {
                Conversion::new(primitive_to_native(kind, v8_value, options.integer_conversion))
            }
            Classification::StringLike | Classification::EnumLike(_) => Conversion::new(v8_value),
            Classification::Callback(_)
            | Classification::SpecialBuiltin(SpecialBuiltin::Any | SpecialBuiltin::Object) => {
                Conversion::new(format!("ScriptValue({v8_value}, {isolate})"))
                    .with_include("bindings/v8/ScriptValue.h")
            }
            Classification::SpecialBuiltin(SpecialBuiltin::Dictionary) => {
                Conversion::new(format!("Dictionary({v8_value}, {isolate})"))
                    .with_include("bindings/v8/Dictionary.h")
            }
            Classification::SpecialBuiltin(SpecialBuiltin::Date) => {
                Conversion::new(format!("toCoreDate({v8_value})"))
            }
            Classification::SpecialBuiltin(SpecialBuiltin::EventHandler) => Conversion::new(format!(
                "V8EventListenerList::getEventListener({v8_value}, true, ListenerFindOrCreate)"
            ))
            .with_include("bindings/v8/V8EventListenerList.h"),
            Classification::SpecialBuiltin(
                builtin @ (SpecialBuiltin::Void | SpecialBuiltin::Promise),
            ) => {
                return Err(unsupported(
                    ty,
                    &format!("{builtin:?} values are never passed in from script"),
                ))
            }
            Classification::Union(_) => {
                return Err(unsupported(ty, "union types have no native representation"))
            }
            Classification::InterfaceReference(name) if name == "SerializedScriptValue" => {
                Conversion::new(format!("SerializedScriptValue::create({v8_value}, {isolate})"))
                    .with_include("bindings/v8/SerializedScriptValue.h")
            }
            Classification::InterfaceReference(name) => {
                let v8_class = v8_type(&name);
                let mut conversion = Conversion::new(format!(
                    "{v8_class}::HasInstance({v8_value}, {isolate}, worldType({isolate})) ? \
                     {v8_class}::toNative(v8::Handle<v8::Object>::Cast({v8_value})) : 0"
                ));
                conversion.includes = self.includes_for_type(ty);
                conversion.includes.insert(format!("{v8_class}.h"));
                conversion
            }
        };
        Ok(conversion)
    }

    /// Statement declaring `variable` from `v8_value`, bailing out of the
    /// callback if conversion throws.
    pub fn to_native_statement(
        &self,
        ty: &IdlType,
        v8_value: &str,
        variable: &str,
        options: &ConversionOptions,
    ) -> Result<Conversion, ConversionError> {
        let cpp = self.cpp_type(ty, true)?;
        let Conversion { expr, includes } = self.to_native(ty, v8_value, options)?;
        let statement = match self.classify(ty) {
            Classification::StringLike | Classification::EnumLike(_) => {
                format!("V8TRYCATCH_FOR_V8STRINGRESOURCE_VOID({cpp}, {variable}, {expr});")
            }
            Classification::Primitive(kind)
                if kind.is_integer() && options.integer_conversion != IntegerConversion::Normal =>
            {
                format!(
                    "V8TRYCATCH_WITH_TYPECHECK_VOID({cpp}, {variable}, {expr}, {});",
                    options.isolate
                )
            }
            _ => format!("V8TRYCATCH_VOID({cpp}, {variable}, {expr});"),
        };
        Ok(Conversion {
            expr: statement,
            includes,
        })
    }

    /// Statement collecting a variadic tail starting at argument `index`.
    pub fn variadic_statement(
        &self,
        ty: &IdlType,
        variable: &str,
        index: usize,
        options: &ConversionOptions,
    ) -> Result<Conversion, ConversionError> {
        let element = match self.interface_name(ty) {
            Some(name) => cpp_template_type("RefPtr", &name),
            None => self.cpp_type(ty, false)?,
        };
        let vector = cpp_template_type("Vector", &element);
        let mut conversion = Conversion::new(format!(
            "V8TRYCATCH_VOID({vector}, {variable}, toNativeArguments<{element}>({}, {index}));",
            options.callback_info
        ));
        conversion.includes = self.includes_for_type(ty);
        Ok(conversion)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Native → runtime
    // ══════════════════════════════════════════════════════════════════════

    /// Expression converting the native value `cpp_value` of type `ty` into a
    /// runtime value.
    ///
    /// 64-bit integers come back as the nearest double: the runtime's number
    /// type cannot hold their full range.
    pub fn from_native(
        &self,
        ty: &IdlType,
        cpp_value: &str,
        options: &ConversionOptions,
    ) -> Result<Conversion, ConversionError> {
        let (kind, value) = self.preprocess(ty, cpp_value, options)?;
        let includes = self.return_includes(ty, kind);
        let isolate = &options.isolate;
        let expr = match kind {
            ReturnKind::Date => format!("v8DateOrNull({value}, {isolate})"),
            ReturnKind::String => format!("v8String({value}, {isolate})"),
            ReturnKind::ScriptValue => format!("{value}.v8Value()"),
            ReturnKind::SerializedScriptValue => format!(
                "{value} ? {value}->deserialize() : v8::Handle<v8::Value>(v8::Null({isolate}))"
            ),
            ReturnKind::Boolean => format!("v8Boolean({value}, {isolate})"),
            ReturnKind::Int => format!("v8::Integer::New({value}, {isolate})"),
            ReturnKind::Unsigned => format!("v8::Integer::NewFromUnsigned({value}, {isolate})"),
            ReturnKind::Float | ReturnKind::Double => format!("v8::Number::New({value})"),
            ReturnKind::Void => "v8Undefined()".to_string(),
            ReturnKind::EventHandler => format!(
                "{value} ? v8::Handle<v8::Value>(V8AbstractEventListener::cast({value})\
                 ->getListenerObject(imp->executionContext())) : \
                 v8::Handle<v8::Value>(v8::Null({isolate}))"
            ),
            ReturnKind::Array => format!("v8Array({value}, {isolate})"),
            ReturnKind::DomWrapper => {
                format!("toV8({value}, {}, {isolate})", options.creation_context)
            }
        };
        Ok(Conversion { expr, includes })
    }

    /// Statement converting `cpp_value` and storing it as the callback's
    /// return value.
    pub fn set_return_value(
        &self,
        ty: &IdlType,
        cpp_value: &str,
        options: &ConversionOptions,
    ) -> Result<Conversion, ConversionError> {
        let (kind, value) = self.preprocess(ty, cpp_value, options)?;
        let info = &options.callback_info;
        let statement = match kind {
            ReturnKind::Boolean => format!("v8SetReturnValueBool({info}, {value});"),
            ReturnKind::Int => format!("v8SetReturnValueInt({info}, {value});"),
            ReturnKind::Unsigned => format!("v8SetReturnValueUnsigned({info}, {value});"),
            ReturnKind::String => {
                format!("v8SetReturnValueString({info}, {value}, {});", options.isolate)
            }
            ReturnKind::Void => String::new(),
            ReturnKind::Float | ReturnKind::Double => format!("v8SetReturnValue({info}, {value});"),
            ReturnKind::Array
            | ReturnKind::Date
            | ReturnKind::EventHandler
            | ReturnKind::ScriptValue
            | ReturnKind::SerializedScriptValue => {
                let converted = self.from_native(ty, cpp_value, options)?;
                format!("v8SetReturnValue({info}, {});", converted.expr)
            }
            ReturnKind::DomWrapper => match &options.script_wrappable {
                Some(receiver) => format!("v8SetReturnValueFast({info}, {value}, {receiver});"),
                None => format!(
                    "v8SetReturnValue({info}, {value}, {});",
                    options.creation_context
                ),
            },
        };
        Ok(Conversion {
            expr: statement,
            includes: self.return_includes(ty, kind),
        })
    }

    /// Pick the return path and apply value adjustments that precede it.
    fn preprocess(
        &self,
        ty: &IdlType,
        cpp_value: &str,
        options: &ConversionOptions,
    ) -> Result<(ReturnKind, String), ConversionError> {
        let mut value = cpp_value.to_string();
        let kind = match self.classify(ty) {
            Classification::Primitive(kind) => {
                if kind.is_wide_integer() {
                    value = format!("static_cast<double>({value})");
                    ReturnKind::Double
                } else {
                    if options.reflect
                        && matches!(kind, PrimitiveKind::UnsignedLong | PrimitiveKind::UnsignedShort)
                    {
                        value = format!(
                            "std::max(0, {})",
                            value.replace("getUnsignedIntegralAttribute", "getIntegralAttribute")
                        );
                    }
                    match kind {
                        PrimitiveKind::Boolean => ReturnKind::Boolean,
                        PrimitiveKind::Byte | PrimitiveKind::Short | PrimitiveKind::Long => {
                            ReturnKind::Int
                        }
                        PrimitiveKind::Float => ReturnKind::Float,
                        PrimitiveKind::Double => ReturnKind::Double,
                        _ => ReturnKind::Unsigned,
                    }
                }
            }
            Classification::StringLike | Classification::EnumLike(_) => ReturnKind::String,
            Classification::Callback(_) => ReturnKind::ScriptValue,
            Classification::Sequence(_) | Classification::Array(_) => ReturnKind::Array,
            Classification::SpecialBuiltin(builtin) => match builtin {
                SpecialBuiltin::Any | SpecialBuiltin::Object | SpecialBuiltin::Promise => {
                    ReturnKind::ScriptValue
                }
                SpecialBuiltin::Void => ReturnKind::Void,
                SpecialBuiltin::Date => ReturnKind::Date,
                SpecialBuiltin::EventHandler => ReturnKind::EventHandler,
                SpecialBuiltin::Dictionary => {
                    return Err(unsupported(ty, "dictionaries cannot be returned to script"))
                }
            },
            Classification::Union(_) => {
                return Err(unsupported(ty, "union types have no native representation"))
            }
            Classification::InterfaceReference(name) if name == "SerializedScriptValue" => {
                ReturnKind::SerializedScriptValue
            }
            Classification::InterfaceReference(_) => ReturnKind::DomWrapper,
        };
        Ok((kind, value))
    }

    fn return_includes(&self, ty: &IdlType, kind: ReturnKind) -> BTreeSet<String> {
        let mut includes = BTreeSet::new();
        match kind {
            ReturnKind::Array => {
                if let Some(element) = element_type(self, ty) {
                    if self.is_interface_type(&element) {
                        includes = self.includes_for_type(&element);
                    }
                }
            }
            ReturnKind::EventHandler => {
                includes.insert("bindings/v8/V8AbstractEventListener.h".to_string());
            }
            ReturnKind::SerializedScriptValue => includes = self.includes_for_type(ty),
            ReturnKind::DomWrapper => {
                includes = self.includes_for_type(ty);
                includes.insert("wtf/GetPtr.h".to_string());
                includes.insert("wtf/RefPtr.h".to_string());
            }
            _ => {}
        }
        includes
    }
}

fn element_type(classifier: &Classifier<'_>, ty: &IdlType) -> Option<IdlType> {
    match classifier.classify(ty) {
        Classification::Sequence(inner) | Classification::Array(inner) => Some(*inner),
        _ => None,
    }
}

fn primitive_to_native(kind: PrimitiveKind, v8_value: &str, policy: IntegerConversion) -> String {
    let arguments = match policy {
        IntegerConversion::Normal => v8_value.to_string(),
        IntegerConversion::EnforceRange => format!("{v8_value}, EnforceRange, ok"),
        IntegerConversion::Clamp => format!("{v8_value}, Clamp, ok"),
    };
    match kind {
        PrimitiveKind::Boolean => format!("{v8_value}->BooleanValue()"),
        PrimitiveKind::Float => format!("static_cast<float>({v8_value}->NumberValue())"),
        PrimitiveKind::Double => format!("static_cast<double>({v8_value}->NumberValue())"),
        PrimitiveKind::Byte => format!("toInt8({arguments})"),
        PrimitiveKind::Octet => format!("toUInt8({arguments})"),
        PrimitiveKind::Short | PrimitiveKind::Long => format!("toInt32({arguments})"),
        PrimitiveKind::UnsignedShort | PrimitiveKind::UnsignedLong => {
            format!("toUInt32({arguments})")
        }
        PrimitiveKind::LongLong => format!("toInt64({arguments})"),
        PrimitiveKind::UnsignedLongLong => format!("toUInt64({arguments})"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeRegistry;

    fn ty(text: &str) -> IdlType {
        IdlType::parse(text).unwrap()
    }

    #[test]
    fn integer_policies() {
        let registry = TypeRegistry::empty();
        let c = Classifier::new(&registry);
        let normal = ConversionOptions::default();
        assert_eq!(c.to_native(&ty("long"), "v", &normal).unwrap().expr, "toInt32(v)");
        let enforce = normal.clone().with_integer_conversion(IntegerConversion::EnforceRange);
        assert_eq!(
            c.to_native(&ty("octet"), "v", &enforce).unwrap().expr,
            "toUInt8(v, EnforceRange, ok)"
        );
        let statement = c.to_native_statement(&ty("long"), "info[0]", "x", &enforce).unwrap();
        assert_eq!(
            statement.expr,
            "V8TRYCATCH_WITH_TYPECHECK_VOID(int, x, toInt32(info[0], EnforceRange, ok), info.GetIsolate());"
        );
    }

    #[test]
    fn strings_use_scoped_resource() {
        let registry = TypeRegistry::empty();
        let c = Classifier::new(&registry);
        let statement = c
            .to_native_statement(&ty("DOMString"), "info[0]", "name", &ConversionOptions::default())
            .unwrap();
        assert_eq!(
            statement.expr,
            "V8TRYCATCH_FOR_V8STRINGRESOURCE_VOID(V8StringResource<>, name, info[0]);"
        );
    }

    #[test]
    fn sequences_choose_expansion_by_element() {
        let registry = TypeRegistry::empty();
        let c = Classifier::new(&registry);
        let options = ConversionOptions::default();
        let wrapped = c.to_native(&ty("sequence<Node>"), "v", &options).unwrap();
        assert_eq!(wrapped.expr, "(toRefPtrNativeArray<Node, V8Node>(v, info.GetIsolate()))");
        assert!(wrapped.includes.contains("V8Node.h"));
        let plain = c.to_native(&ty("long[]"), "v", &options).unwrap();
        assert_eq!(plain.expr, "toNativeArray<int>(v, info.GetIsolate())");
    }

    #[test]
    fn unions_are_unsupported() {
        let registry = TypeRegistry::empty();
        let c = Classifier::new(&registry);
        let options = ConversionOptions::default();
        assert!(c.to_native(&ty("(long or Node)"), "v", &options).is_err());
        assert!(c.from_native(&ty("(long or Node)"), "x", &options).is_err());
    }

    #[test]
    fn wide_integers_return_as_doubles() {
        let registry = TypeRegistry::empty();
        let c = Classifier::new(&registry);
        let options = ConversionOptions::default();
        assert_eq!(
            c.from_native(&ty("unsigned long long"), "x", &options).unwrap().expr,
            "v8::Number::New(static_cast<double>(x))"
        );
    }

    #[test]
    fn reflected_unsigned_getters_clamp_at_zero() {
        let registry = TypeRegistry::empty();
        let c = Classifier::new(&registry);
        let options = ConversionOptions::default().with_reflect(true);
        let statement = c
            .set_return_value(
                &ty("unsigned long"),
                "imp->getUnsignedIntegralAttribute(HTMLNames::spanAttr)",
                &options,
            )
            .unwrap();
        assert_eq!(
            statement.expr,
            "v8SetReturnValueUnsigned(info, std::max(0, imp->getIntegralAttribute(HTMLNames::spanAttr)));"
        );
    }

    #[test]
    fn wrapper_return_paths() {
        let registry = TypeRegistry::empty();
        let c = Classifier::new(&registry);
        let fast = ConversionOptions::default().with_script_wrappable("imp");
        let statement = c.set_return_value(&ty("Node"), "imp->owner()", &fast).unwrap();
        assert_eq!(statement.expr, "v8SetReturnValueFast(info, imp->owner(), imp);");
        assert!(statement.includes.contains("wtf/RefPtr.h"));
        let default = c
            .set_return_value(&ty("Node"), "result", &ConversionOptions::default())
            .unwrap();
        assert_eq!(default.expr, "v8SetReturnValue(info, result, info.Holder());");
        let void = c
            .set_return_value(&ty("void"), "", &ConversionOptions::default())
            .unwrap();
        assert!(void.expr.is_empty());
    }
}
