//! Member Compiler: attributes.

use std::collections::BTreeSet;

use idlc_types::ast::Attribute;
use idlc_types::record::AttributeRecord;

use crate::classify::{is_node_like, Classification, SpecialBuiltin};
use crate::context::{check_conflicts, unsupported, MemberContext};
use crate::conversion::{ConversionOptions, IntegerConversion};
use crate::error::Result;
use crate::ext_attrs::ExtendedAttributes;
use crate::utilities::{self, capitalize, cpp_name, uncapitalize};

/// Reference types whose wrappers are never pinned to their owner.
const KEEP_ALIVE_EXCLUDED_TYPES: &[&str] = &["EventHandler", "Promise", "Window"];

/// Compile one attribute, adding the headers it needs to `includes`.
pub(crate) fn compile_attribute(
    cx: &MemberContext<'_>,
    attribute: &Attribute,
    includes: &mut BTreeSet<String>,
) -> Result<AttributeRecord> {
    let name = attribute.name.name.as_str();
    let attrs = ExtendedAttributes::from_list(&attribute.extended_attributes);
    check_conflicts(name, attribute.span, &attrs)?;

    let idl_type = &attribute.idl_type;
    let has_custom_getter = attrs.has_custom_getter();
    let has_setter = !attribute.is_read_only;
    let has_custom_setter = has_setter && attrs.has_custom_setter();
    let fully_custom = has_custom_getter && (!has_setter || has_custom_setter);

    let cpp_type = match cx.classifier.cpp_type(idl_type, false) {
        Ok(cpp_type) => cpp_type,
        Err(_) if fully_custom => "ScriptValue".to_string(),
        Err(err) => return Err(unsupported(name, attribute.span, err)),
    };

    let namespace = cx.internal_namespace();
    let is_per_world_bindings = attrs.per_world_bindings;
    let mut record = AttributeRecord {
        name: name.to_string(),
        idl_type: idl_type.to_string(),
        cpp_type,
        v8_type: format!("V8{idl_type}"),
        is_static: attribute.is_static,
        is_read_only: attribute.is_read_only,
        is_nullable: attribute.is_nullable,
        has_setter,
        has_custom_getter,
        has_custom_setter,
        getter_callback_name: format!("{namespace}::{name}AttributeGetterCallback"),
        setter_callback_name: setter_callback_name(cx, attribute, &attrs),
        getter_callback_name_for_main_world: if is_per_world_bindings {
            format!("{namespace}::{name}AttributeGetterCallbackForMainWorld")
        } else {
            "0".to_string()
        },
        setter_callback_name_for_main_world: if is_per_world_bindings && has_setter {
            format!("{namespace}::{name}AttributeSetterCallbackForMainWorld")
        } else {
            "0".to_string()
        },
        world_suffixes: if is_per_world_bindings {
            vec![String::new(), "ForMainWorld".to_string()]
        } else {
            vec![String::new()]
        },
        is_getter_raises_exception: attrs.getter_raises_exception
            || attrs.raises_exception_for("Getter"),
        is_setter_raises_exception: attrs.setter_raises_exception
            || attrs.raises_exception_for("Setter"),
        is_keep_alive_for_gc: is_keep_alive_for_gc(cx, attribute, &attrs),
        cached_attribute_validation_method: attrs.cached_attribute.clone(),
        is_replaceable: attrs.replaceable,
        is_reflect: attrs.is_reflect(),
        is_unforgeable: attrs.unforgeable,
        is_check_security_for_node: attrs.check_security_for_node,
        has_strict_type_checking: attrs.strict_type_checking
            && cx.classifier.is_interface_type(idl_type),
        is_per_world_bindings,
        access_control_list: access_control_list(attribute, &attrs),
        property_attributes: property_attributes(&attrs),
        runtime_enabled_function_name: utilities::runtime_enabled_function_name(&attrs),
        per_context_enabled_function_name: utilities::per_context_enabled_function_name(&attrs),
        activity_logging_world_list_for_getter: utilities::activity_logging_world_list(
            &attrs,
            Some("Getter"),
            includes,
        ),
        activity_logging_world_list_for_setter: utilities::activity_logging_world_list(
            &attrs,
            Some("Setter"),
            includes,
        ),
        conditional_string: utilities::conditional_string(&attrs),
        measure_as: utilities::measure_as(&attrs, includes),
        deprecate_as: utilities::deprecate_as(&attrs, includes),
        cpp_value: None,
        cpp_value_original: None,
        v8_set_return_value: None,
        cpp_setter: None,
        v8_value_to_local_cpp_value: None,
        enum_validation_expression: None,
    };

    if !has_custom_getter {
        compile_getter(cx, attribute, &attrs, &mut record, includes)?;
    }
    if has_setter && !has_custom_setter {
        compile_setter(cx, attribute, &attrs, &mut record, includes)?;
    }
    Ok(record)
}

// ══════════════════════════════════════════════════════════════════════════════
// Getter
// ══════════════════════════════════════════════════════════════════════════════

fn compile_getter(
    cx: &MemberContext<'_>,
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
    record: &mut AttributeRecord,
    includes: &mut BTreeSet<String>,
) -> Result<()> {
    let idl_type = &attribute.idl_type;
    let classification = cx.classifier.classify(idl_type);
    let is_event_handler =
        classification == Classification::SpecialBuiltin(SpecialBuiltin::EventHandler);
    includes.extend(cx.classifier.includes_for_type(idl_type));

    let mut cpp_value = getter_expression(cx, attribute, attrs, record, includes);
    if attribute.is_nullable
        || is_event_handler
        || attrs.cached_attribute.is_some()
        || record.is_getter_raises_exception
    {
        record.cpp_value_original = Some(cpp_value);
        cpp_value = "jsValue".to_string();
    }

    let set_return_value = if record.is_keep_alive_for_gc {
        includes.insert("bindings/v8/V8HiddenPropertyName.h".to_string());
        "v8SetReturnValue(info, wrapper);".to_string()
    } else {
        let options = ConversionOptions::default()
            .with_reflect(attrs.is_reflect())
            .with_script_wrappable("imp");
        let conversion = cx
            .classifier
            .set_return_value(idl_type, &cpp_value, &options)
            .map_err(|err| unsupported(&record.name, attribute.span, err))?;
        includes.extend(conversion.includes);
        conversion.expr
    };
    record.cpp_value = Some(cpp_value);
    record.v8_set_return_value = Some(set_return_value);

    if is_event_handler
        && matches!(cx.interface_name, "Window" | "WorkerGlobalScope")
        && attribute.name.name == "onerror"
    {
        includes.insert("bindings/v8/V8ErrorHandler.h".to_string());
    }
    if attrs.check_security_for_node {
        includes.insert("bindings/v8/BindingSecurity.h".to_string());
    }
    if attrs.check_security_for_node || record.is_getter_raises_exception {
        includes.insert("bindings/v8/ExceptionMessages.h".to_string());
        includes.insert("bindings/v8/ExceptionState.h".to_string());
    }
    Ok(())
}

fn getter_expression(
    cx: &MemberContext<'_>,
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
    record: &AttributeRecord,
    includes: &mut BTreeSet<String>,
) -> String {
    let mut arguments = Vec::new();
    let base_name = getter_base_name(attribute, attrs, &mut arguments, includes);
    let getter_name = scoped_name(cx, attribute, &base_name);

    arguments.extend(utilities::call_with_arguments(&attrs.call_with));
    if attribute.is_nullable {
        arguments.push("isNull".to_string());
    }
    if record.is_getter_raises_exception {
        arguments.push("es".to_string());
    }
    if attribute.idl_type.is("EventHandler") {
        arguments.push("isolatedWorldForIsolate(info.GetIsolate())".to_string());
    }
    format!("{getter_name}({})", arguments.join(", "))
}

fn getter_base_name(
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
    arguments: &mut Vec<String>,
    includes: &mut BTreeSet<String>,
) -> String {
    if !attrs.is_reflect() {
        return uncapitalize(cpp_name(&attribute.name.name, attrs));
    }
    let content_attribute = content_attribute_name(attribute, attrs);
    if matches!(content_attribute.as_str(), "class" | "id" | "name") {
        return format!("get{}Attribute", capitalize(&content_attribute));
    }
    arguments.push(scoped_content_attribute_name(&content_attribute, includes));

    let base = match attribute.idl_type.name() {
        Some("boolean") => "fastHasAttribute",
        Some("long") => "getIntegralAttribute",
        Some("unsigned long") => "getUnsignedIntegralAttribute",
        _ if attrs.url => "getURLAttribute",
        _ => "fastGetAttribute",
    };
    base.to_string()
}

// ══════════════════════════════════════════════════════════════════════════════
// Setter
// ══════════════════════════════════════════════════════════════════════════════

fn compile_setter(
    cx: &MemberContext<'_>,
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
    record: &mut AttributeRecord,
    includes: &mut BTreeSet<String>,
) -> Result<()> {
    let idl_type = &attribute.idl_type;
    if attrs.is_reflect() {
        includes.insert("core/dom/custom/CustomElementCallbackDispatcher.h".to_string());
    }
    record.cpp_setter = Some(setter_expression(cx, attribute, attrs, record, includes));
    record.enum_validation_expression = cx.classifier.enum_values(idl_type).map(|values| {
        values
            .iter()
            .map(|value| format!("string == {}", utilities::cpp_string_literal(value)))
            .collect::<Vec<_>>()
            .join(" || ")
    });

    if !idl_type.is("EventHandler") {
        let options = ConversionOptions::default().with_integer_conversion(integer_policy(attrs));
        let statement = cx
            .classifier
            .to_native_statement(idl_type, "jsValue", "cppValue", &options)
            .map_err(|err| unsupported(&record.name, attribute.span, err))?;
        includes.extend(statement.includes);
        record.v8_value_to_local_cpp_value = Some(statement.expr);
    }
    Ok(())
}

fn setter_expression(
    cx: &MemberContext<'_>,
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
    record: &AttributeRecord,
    includes: &mut BTreeSet<String>,
) -> String {
    let call_with = if attrs.setter_call_with.is_empty() {
        &attrs.call_with
    } else {
        &attrs.setter_call_with
    };
    let mut arguments = utilities::call_with_arguments(call_with);

    let base_name = setter_base_name(attribute, attrs, &mut arguments, includes);
    let setter_name = scoped_name(cx, attribute, &base_name);

    let idl_type = &attribute.idl_type;
    if idl_type.is("EventHandler") {
        includes.insert("bindings/v8/V8EventListenerList.h".to_string());
        arguments.push(
            "V8EventListenerList::getEventListener(jsValue, true, ListenerFindOrCreate)".to_string(),
        );
        arguments.push("isolatedWorldForIsolate(info.GetIsolate())".to_string());
    } else if cx.classifier.is_interface_type(idl_type) {
        arguments.push("WTF::getPtr(cppValue)".to_string());
    } else {
        arguments.push("cppValue".to_string());
    }
    if record.is_setter_raises_exception {
        arguments.push("es".to_string());
    }
    format!("{setter_name}({})", arguments.join(", "))
}

fn setter_base_name(
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
    arguments: &mut Vec<String>,
    includes: &mut BTreeSet<String>,
) -> String {
    if !attrs.is_reflect() {
        return format!("set{}", capitalize(cpp_name(&attribute.name.name, attrs)));
    }
    let content_attribute = content_attribute_name(attribute, attrs);
    arguments.push(scoped_content_attribute_name(&content_attribute, includes));
    let base = match attribute.idl_type.name() {
        Some("boolean") => "setBooleanAttribute",
        Some("long") => "setIntegralAttribute",
        Some("unsigned long") => "setUnsignedIntegralAttribute",
        _ => "setAttribute",
    };
    base.to_string()
}

// ══════════════════════════════════════════════════════════════════════════════
// Policy
// ══════════════════════════════════════════════════════════════════════════════

/// Whether the wrapper returned by the getter is pinned to its owner so
/// repeated reads return the same object.
pub(crate) fn is_keep_alive_for_gc(
    cx: &MemberContext<'_>,
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
) -> bool {
    let idl_type = &attribute.idl_type;
    if attrs.keep_attribute_alive_for_gc {
        return true;
    }
    if !attribute.is_read_only || !cx.classifier.is_wrapper_reference(idl_type) {
        return false;
    }
    let type_text = idl_type.to_string();
    let excluded = is_node_like(idl_type)
        || attribute.name.name == "self"
        || KEEP_ALIVE_EXCLUDED_TYPES.contains(&type_text.as_str())
        || type_text.starts_with("HTML");
    !excluded
}

fn setter_callback_name(
    cx: &MemberContext<'_>,
    attribute: &Attribute,
    attrs: &ExtendedAttributes,
) -> String {
    let namespace = cx.internal_namespace();
    if attrs.replaceable {
        return format!("{namespace}::{}ReplaceableAttributeSetterCallback", cx.cpp_class);
    }
    if attribute.is_read_only {
        return "0".to_string();
    }
    format!("{namespace}::{}AttributeSetterCallback", attribute.name.name)
}

fn access_control_list(attribute: &Attribute, attrs: &ExtendedAttributes) -> Vec<String> {
    let mut list = Vec::new();
    if attrs.do_not_check_security {
        list.push("v8::ALL_CAN_READ");
        if !attribute.is_read_only {
            list.push("v8::ALL_CAN_WRITE");
        }
    }
    if attrs.do_not_check_security_on_setter {
        list.push("v8::ALL_CAN_WRITE");
    }
    if attrs.do_not_check_security_on_getter {
        list.push("v8::ALL_CAN_READ");
    }
    if attrs.unforgeable {
        list.push("v8::PROHIBITS_OVERWRITING");
    }
    if list.is_empty() {
        list.push("v8::DEFAULT");
    }
    list.into_iter().map(str::to_string).collect()
}

fn property_attributes(attrs: &ExtendedAttributes) -> Vec<String> {
    let mut list = Vec::new();
    if attrs.not_enumerable {
        list.push("v8::DontEnum");
    }
    if attrs.unforgeable {
        list.push("v8::DontDelete");
    }
    if list.is_empty() {
        list.push("v8::None");
    }
    list.into_iter().map(str::to_string).collect()
}

pub(crate) fn integer_policy(attrs: &ExtendedAttributes) -> IntegerConversion {
    if attrs.enforce_range {
        IntegerConversion::EnforceRange
    } else if attrs.clamp {
        IntegerConversion::Clamp
    } else {
        IntegerConversion::Normal
    }
}

fn content_attribute_name(attribute: &Attribute, attrs: &ExtendedAttributes) -> String {
    attrs
        .reflect_value()
        .map(str::to_string)
        .unwrap_or_else(|| attribute.name.name.to_lowercase())
}

fn scoped_content_attribute_name(content_attribute: &str, includes: &mut BTreeSet<String>) -> String {
    includes.insert("HTMLNames.h".to_string());
    format!("HTMLNames::{content_attribute}Attr")
}

fn scoped_name(cx: &MemberContext<'_>, attribute: &Attribute, base_name: &str) -> String {
    if attribute.is_static {
        format!("{}::{base_name}", cx.cpp_class)
    } else {
        format!("imp->{base_name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classifier;
    use crate::registry::TypeRegistry;
    use idlc_types::ast::{ExtendedAttribute, ExtendedAttributeList, Ident};
    use idlc_types::{IdlType, Span};

    fn attribute(name: &str, ty: &str, read_only: bool, tags: &[(&str, Option<&str>)]) -> Attribute {
        Attribute {
            name: Ident::new(name, Span::point(1, 1)),
            idl_type: IdlType::parse(ty).unwrap(),
            is_read_only: read_only,
            is_static: false,
            is_nullable: false,
            extended_attributes: ExtendedAttributeList {
                items: tags
                    .iter()
                    .map(|(name, value)| ExtendedAttribute {
                        name: name.to_string(),
                        value: value.map(str::to_string),
                        arguments: None,
                        span: Span::point(1, 1),
                    })
                    .collect(),
            },
            span: Span::point(1, 1),
        }
    }

    fn compile(attr: &Attribute) -> (AttributeRecord, BTreeSet<String>) {
        let registry = TypeRegistry::builder()
            .enum_type("Mode", ["open".to_string(), "closed".to_string()])
            .build();
        let interface_attrs = ExtendedAttributes::default();
        let cx = MemberContext {
            classifier: Classifier::new(&registry),
            interface_name: "Widget",
            cpp_class: "Widget",
            interface_attrs: &interface_attrs,
        };
        let mut includes = BTreeSet::new();
        let record = compile_attribute(&cx, attr, &mut includes).unwrap();
        (record, includes)
    }

    #[test]
    fn plain_string_attribute() {
        let (record, _) = compile(&attribute("label", "DOMString", false, &[]));
        assert_eq!(record.cpp_value.as_deref(), Some("imp->label()"));
        assert_eq!(
            record.v8_set_return_value.as_deref(),
            Some("v8SetReturnValueString(info, imp->label(), info.GetIsolate());")
        );
        assert_eq!(record.cpp_setter.as_deref(), Some("imp->setLabel(cppValue)"));
        assert_eq!(
            record.v8_value_to_local_cpp_value.as_deref(),
            Some("V8TRYCATCH_FOR_V8STRINGRESOURCE_VOID(V8StringResource<>, cppValue, jsValue);")
        );
        assert_eq!(record.getter_callback_name, "WidgetV8Internal::labelAttributeGetterCallback");
        assert_eq!(record.setter_callback_name, "WidgetV8Internal::labelAttributeSetterCallback");
    }

    #[test]
    fn reflected_attributes() {
        let (record, includes) = compile(&attribute("className", "DOMString", false, &[("Reflect", Some("class"))]));
        assert_eq!(record.cpp_value.as_deref(), Some("imp->getClassAttribute()"));
        assert_eq!(
            record.cpp_setter.as_deref(),
            Some("imp->setAttribute(HTMLNames::classAttr, cppValue)")
        );
        assert!(includes.contains("core/dom/custom/CustomElementCallbackDispatcher.h"));

        let (record, _) = compile(&attribute("hidden", "boolean", false, &[("Reflect", None)]));
        assert_eq!(
            record.cpp_value.as_deref(),
            Some("imp->fastHasAttribute(HTMLNames::hiddenAttr)")
        );
        assert_eq!(
            record.cpp_setter.as_deref(),
            Some("imp->setBooleanAttribute(HTMLNames::hiddenAttr, cppValue)")
        );
    }

    #[test]
    fn raises_exception_uses_local() {
        let (record, includes) = compile(&attribute("depth", "long", false, &[("RaisesException", None)]));
        assert_eq!(record.cpp_value.as_deref(), Some("jsValue"));
        assert_eq!(record.cpp_value_original.as_deref(), Some("imp->depth(es)"));
        assert_eq!(record.cpp_setter.as_deref(), Some("imp->setDepth(cppValue, es)"));
        assert!(includes.contains("bindings/v8/ExceptionState.h"));

        let (record, _) = compile(&attribute("depth", "long", false, &[("RaisesException", Some("Setter"))]));
        assert!(!record.is_getter_raises_exception);
        assert!(record.is_setter_raises_exception);
    }

    #[test]
    fn enum_setter_validation() {
        let (record, _) = compile(&attribute("mode", "Mode", false, &[]));
        assert_eq!(
            record.enum_validation_expression.as_deref(),
            Some("string == \"open\" || string == \"closed\"")
        );
    }

    #[test]
    fn keep_alive_pins_wrapper() {
        let (record, includes) = compile(&attribute("owner", "Gadget", true, &[]));
        assert!(record.is_keep_alive_for_gc);
        assert_eq!(record.v8_set_return_value.as_deref(), Some("v8SetReturnValue(info, wrapper);"));
        assert!(includes.contains("bindings/v8/V8HiddenPropertyName.h"));
        assert_eq!(record.setter_callback_name, "0");
    }

    #[test]
    fn security_and_property_lists() {
        let (record, _) = compile(&attribute(
            "location",
            "DOMString",
            false,
            &[("DoNotCheckSecurity", None), ("Unforgeable", None), ("NotEnumerable", None)],
        ));
        assert_eq!(
            record.access_control_list,
            vec!["v8::ALL_CAN_READ", "v8::ALL_CAN_WRITE", "v8::PROHIBITS_OVERWRITING"]
        );
        assert_eq!(record.property_attributes, vec!["v8::DontEnum", "v8::DontDelete"]);
        let (plain, _) = compile(&attribute("x", "long", true, &[]));
        assert_eq!(plain.access_control_list, vec!["v8::DEFAULT"]);
        assert_eq!(plain.property_attributes, vec!["v8::None"]);
    }

    #[test]
    fn per_world_bindings_callbacks() {
        let (record, _) = compile(&attribute("x", "long", true, &[("PerWorldBindings", None)]));
        assert_eq!(record.world_suffixes, vec!["", "ForMainWorld"]);
        assert_eq!(
            record.getter_callback_name_for_main_world,
            "WidgetV8Internal::xAttributeGetterCallbackForMainWorld"
        );
        assert_eq!(record.setter_callback_name_for_main_world, "0");
    }

    #[test]
    fn replaceable_setter_callback() {
        let (record, _) = compile(&attribute("frames", "long", true, &[("Replaceable", None)]));
        assert_eq!(
            record.setter_callback_name,
            "WidgetV8Internal::WidgetReplaceableAttributeSetterCallback"
        );
    }
}
