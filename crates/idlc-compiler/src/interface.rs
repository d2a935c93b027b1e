//! Interface Compiler.
//!
//! Resolves the parent, compiles every attribute then every operation,
//! runs overload resolution, and only then computes the aggregate flags.

use std::collections::BTreeSet;

use idlc_types::ast::{Constant, Definitions, Interface};
use idlc_types::record::{ConstantRecord, InterfaceRecord};
use idlc_types::Span;

use crate::attributes::compile_attribute;
use crate::classify::{includes_for_interface, Classifier};
use crate::context::MemberContext;
use crate::error::{CompileError, Result};
use crate::ext_attrs::ExtendedAttributes;
use crate::metadata::InterfacesInfo;
use crate::methods::compile_operation;
use crate::overload::{resolve_overloads, OverloadLimitation};
use crate::utilities::{self, cpp_name};

const INTERFACE_HEADER_INCLUDES: &[&str] = &[
    "bindings/v8/V8Binding.h",
    "bindings/v8/V8DOMWrapper.h",
    "bindings/v8/WrapperTypeInfo.h",
];

const INTERFACE_CPP_INCLUDES: &[&str] = &[
    "RuntimeEnabledFeatures.h",
    "bindings/v8/ExceptionMessages.h",
    "bindings/v8/V8DOMConfiguration.h",
    "core/dom/ContextFeatures.h",
    "core/dom/Document.h",
    "platform/TraceEvent.h",
];

/// A compiled interface plus non-fatal findings.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledInterface {
    pub record: InterfaceRecord,
    pub limitations: Vec<OverloadLimitation>,
}

/// Compile the interface called `name` from `defs`.
pub fn compile_interface(
    defs: &Definitions,
    name: &str,
    classifier: Classifier<'_>,
    info: &InterfacesInfo,
) -> Result<CompiledInterface> {
    let interface = merged_interface(defs, name)?;
    let parent = resolve_parent(defs, &interface, classifier, info)?;
    let attrs = ExtendedAttributes::from_list(&interface.extended_attributes);
    let cpp_class = cpp_name(name, &attrs).to_string();
    let v8_class = format!("V8{name}");
    tracing::debug!(target: "pipeline", stage = "interface", interface = name, "compiling members");

    let mut header_includes: BTreeSet<String> =
        INTERFACE_HEADER_INCLUDES.iter().map(|s| s.to_string()).collect();
    if let Some(parent) = &parent {
        header_includes.insert(includes_for_interface(parent));
    }
    let mut includes: BTreeSet<String> =
        INTERFACE_CPP_INCLUDES.iter().map(|s| s.to_string()).collect();

    if attrs.check_security {
        includes.insert("bindings/v8/BindingSecurity.h".to_string());
        includes.insert("bindings/v8/ExceptionState.h".to_string());
    }
    if attrs.generate_visit_dom_wrapper.is_some() {
        includes.insert("bindings/v8/V8GCController.h".to_string());
        includes.insert("core/dom/Element.h".to_string());
    }
    let measure_as = utilities::measure_as(&attrs, &mut includes);
    let is_constructor_raises_exception = attrs.raises_exception_value() == Some("Constructor");
    if is_constructor_raises_exception {
        includes.insert("bindings/v8/ExceptionState.h".to_string());
    }
    for special in &attrs.special_wrap_for {
        includes.insert(includes_for_interface(special));
    }
    let has_constructor = attrs.constructor.is_some();
    if has_constructor {
        includes.insert("bindings/v8/V8ObjectConstructor.h".to_string());
    }
    let has_any_type_attributes = interface.attributes.iter().any(|a| a.idl_type.is("any"));
    if attrs.event_constructor {
        includes.insert("bindings/v8/Dictionary.h".to_string());
        includes.insert("bindings/v8/V8ObjectConstructor.h".to_string());
        if has_any_type_attributes {
            includes.insert("bindings/v8/SerializedScriptValue.h".to_string());
        }
    }

    // ── Members ──
    let cx = MemberContext {
        classifier,
        interface_name: name,
        cpp_class: &cpp_class,
        interface_attrs: &attrs,
    };
    let mut attributes = Vec::with_capacity(interface.attributes.len());
    for attribute in &interface.attributes {
        attributes.push(compile_attribute(&cx, attribute, &mut includes)?);
    }
    let mut methods = Vec::with_capacity(interface.operations.len());
    for operation in &interface.operations {
        methods.push(compile_operation(&cx, operation, &mut includes)?);
    }
    let limitations = resolve_overloads(&classifier, &interface.operations, &mut methods);
    for method in &mut methods {
        method.do_generate_method_configuration = method.is_do_not_check_signature
            && method.per_context_enabled_function_name.is_none()
            && method.overload_index.map_or(true, |index| index == 1);
    }
    let constants: Vec<ConstantRecord> = interface.constants.iter().map(constant_record).collect();
    let has_attribute_table = attributes.iter().any(|a| {
        a.runtime_enabled_function_name.is_none()
            && a.per_context_enabled_function_name.is_none()
            && !a.is_static
    });

    // ── Aggregates ──
    let record = InterfaceRecord {
        interface_name: name.to_string(),
        v8_class: v8_class.clone(),
        cpp_class: cpp_class.clone(),
        parent_interface: parent,
        is_callback: interface.is_callback,
        conditional_string: utilities::conditional_string(&attrs),
        runtime_enabled_function: utilities::runtime_enabled_function_name(&attrs),
        measure_as,
        is_check_security: attrs.check_security,
        is_active_dom_object: attrs.active_dom_object,
        is_dependent_lifetime: attrs.dependent_lifetime,
        do_not_check_constants: attrs.do_not_check_constants,
        special_wrap_for: attrs.special_wrap_for.clone(),
        has_custom_wrap: attrs.has_custom_value("Wrap"),
        has_custom_to_v8: attrs.has_custom_value("ToV8"),
        has_custom_legacy_call_as_function: attrs.has_custom_value("LegacyCallAsFunction"),
        has_visit_dom_wrapper: attrs.has_custom_value("VisitDOMWrapper")
            || attrs.generate_visit_dom_wrapper.is_some(),
        generate_visit_dom_wrapper_function: attrs.generate_visit_dom_wrapper.clone(),
        has_constructor,
        has_custom_constructor: attrs.has_custom_value("Constructor"),
        has_event_constructor: attrs.event_constructor,
        is_constructor_raises_exception,
        is_constructor_call_with_document: attrs
            .constructor_call_with
            .iter()
            .any(|v| v == "Document"),
        is_constructor_call_with_execution_context: attrs
            .constructor_call_with
            .iter()
            .any(|v| v == "ExecutionContext"),
        constructor_arguments: constructor_arguments(&attrs, is_constructor_raises_exception),
        length: usize::from(attrs.event_constructor),
        has_any_type_attributes,
        has_per_context_enabled_attributes: attributes
            .iter()
            .any(|a| a.per_context_enabled_function_name.is_some()),
        has_replaceable_attributes: attributes.iter().any(|a| a.is_replaceable),
        has_runtime_enabled_attributes: attributes
            .iter()
            .any(|a| a.runtime_enabled_function_name.is_some()),
        has_static_attributes: attributes.iter().any(|a| a.is_static),
        has_per_context_enabled_methods: methods
            .iter()
            .any(|m| m.per_context_enabled_function_name.is_some()),
        has_runtime_enabled_methods: methods
            .iter()
            .any(|m| m.runtime_enabled_function_name.is_some()),
        has_method_configuration: methods.iter().any(|m| m.do_generate_method_configuration),
        has_origin_safe_method_setter: methods
            .iter()
            .any(|m| m.is_check_security_for_frame && !m.is_read_only),
        has_runtime_enabled_constants: constants
            .iter()
            .any(|c| c.runtime_enabled_function.is_some()),
        installed_attributes: if has_attribute_table {
            format!("{v8_class}Attributes")
        } else {
            "0".to_string()
        },
        number_of_attributes: if has_attribute_table {
            format!("WTF_ARRAY_LENGTH({v8_class}Attributes)")
        } else {
            "0".to_string()
        },
        constants,
        attributes,
        methods,
        header_includes,
        cpp_includes: includes,
        metadata: info.get(name).and_then(|entry| serde_json::to_value(entry).ok()),
    };
    Ok(CompiledInterface {
        record,
        limitations,
    })
}

/// The named interface with its partial interfaces' members appended.
fn merged_interface(defs: &Definitions, name: &str) -> Result<Interface> {
    let Some(base) = defs.interface(name) else {
        let span = defs
            .partials_of(name)
            .next()
            .map(|partial| partial.span)
            .unwrap_or_else(|| Span::point(1, 1));
        return Err(CompileError::UnknownDefinition {
            name: name.to_string(),
            span,
        });
    };
    let mut merged = base.clone();
    for partial in defs.partials_of(name) {
        merged.attributes.extend(partial.attributes.iter().cloned());
        merged.operations.extend(partial.operations.iter().cloned());
        merged.constants.extend(partial.constants.iter().cloned());
    }
    Ok(merged)
}

fn resolve_parent(
    defs: &Definitions,
    interface: &Interface,
    classifier: Classifier<'_>,
    info: &InterfacesInfo,
) -> Result<Option<String>> {
    let Some(parent) = &interface.parent else {
        return Ok(None);
    };
    let known = parent.name != interface.name.name
        && (defs.interface(&parent.name).is_some()
            || classifier.registry().knows_interface(&parent.name)
            || info.contains(&parent.name));
    if !known {
        return Err(CompileError::UnknownParent {
            interface: interface.name.name.clone(),
            parent: parent.name.clone(),
            span: parent.span,
        });
    }
    Ok(Some(parent.name.clone()))
}

fn constant_record(constant: &Constant) -> ConstantRecord {
    let attrs = ExtendedAttributes::from_list(&constant.extended_attributes);
    let value = if constant.idl_type.is("DOMString") {
        utilities::cpp_string_literal(&constant.value)
    } else {
        constant.value.clone()
    };
    ConstantRecord {
        name: constant.name.name.clone(),
        reflected_name: attrs
            .reflect_value()
            .map(str::to_string)
            .unwrap_or_else(|| constant.name.name.clone()),
        value,
        runtime_enabled_function: utilities::runtime_enabled_function_name(&attrs),
    }
}

fn constructor_arguments(attrs: &ExtendedAttributes, raises: bool) -> Vec<String> {
    let mut arguments = Vec::new();
    if attrs.constructor_call_with.iter().any(|v| v == "ExecutionContext") {
        arguments.push("context".to_string());
    }
    if attrs.constructor_call_with.iter().any(|v| v == "Document") {
        arguments.push("document".to_string());
    }
    if raises {
        arguments.push("exceptionState".to_string());
    }
    arguments
}
