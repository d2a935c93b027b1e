//! Renderer tests over hand-built emission records.

use idlc_codegen::{render, render_header, render_source, CodegenError, GENERATED_BANNER};
use idlc_types::record::{
    ArgumentRecord, AttributeRecord, ConstantRecord, DispatchClause, InterfaceRecord,
    OperationRecord, OverloadGroup,
};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn interface(name: &str) -> InterfaceRecord {
    InterfaceRecord {
        interface_name: name.to_string(),
        v8_class: format!("V8{name}"),
        cpp_class: name.to_string(),
        installed_attributes: "0".to_string(),
        number_of_attributes: "0".to_string(),
        ..Default::default()
    }
}

fn string_attribute(name: &str) -> AttributeRecord {
    AttributeRecord {
        name: name.to_string(),
        idl_type: "DOMString".to_string(),
        cpp_type: "String".to_string(),
        v8_type: "V8DOMString".to_string(),
        has_setter: true,
        getter_callback_name: format!("WidgetV8Internal::{name}AttributeGetterCallback"),
        setter_callback_name: format!("WidgetV8Internal::{name}AttributeSetterCallback"),
        getter_callback_name_for_main_world: "0".to_string(),
        setter_callback_name_for_main_world: "0".to_string(),
        world_suffixes: vec![String::new()],
        access_control_list: vec!["v8::DEFAULT".to_string()],
        property_attributes: vec!["v8::None".to_string()],
        cpp_value: Some(format!("imp->{name}()")),
        v8_set_return_value: Some(format!(
            "v8SetReturnValueString(info, imp->{name}(), info.GetIsolate());"
        )),
        cpp_setter: Some(format!("imp->set{}(cppValue)", capitalize(name))),
        v8_value_to_local_cpp_value: Some(
            "V8TRYCATCH_FOR_V8STRINGRESOURCE_VOID(V8StringResource<>, cppValue, jsValue);".to_string(),
        ),
        ..Default::default()
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn long_argument(name: &str, index: usize) -> ArgumentRecord {
    ArgumentRecord {
        name: name.to_string(),
        index,
        idl_type: "long".to_string(),
        cpp_type: "int".to_string(),
        v8_value_to_local_cpp_value: format!("V8TRYCATCH_VOID(int, {name}, toInt32(info[{index}]));"),
        ..Default::default()
    }
}

fn void_method(name: &str, arguments: Vec<ArgumentRecord>) -> OperationRecord {
    let call = arguments
        .iter()
        .map(|a| a.name.clone())
        .collect::<Vec<_>>()
        .join(", ");
    OperationRecord {
        name: name.to_string(),
        idl_type: "void".to_string(),
        callback_name: format!("WidgetV8Internal::{name}MethodCallback"),
        cpp_method: format!("imp->{name}({call})"),
        number_of_arguments: arguments.len(),
        number_of_required_arguments: arguments.len(),
        arguments,
        is_do_not_check_signature: true,
        do_generate_method_configuration: true,
        ..Default::default()
    }
}

/// `f(long a)` and `f(long a, long b)` as an overload group.
fn overloaded_widget() -> InterfaceRecord {
    let mut first = void_method("f", vec![long_argument("a", 0)]);
    first.overload_index = Some(1);
    first.overload_clauses = vec![DispatchClause {
        argument_count: 1,
        at_least: false,
        type_checks: Vec::new(),
    }];
    first.overload_resolution_expression = Some("((info.Length() == 1))".to_string());

    let mut second = void_method("f", vec![long_argument("a", 0), long_argument("b", 1)]);
    second.overload_index = Some(2);
    second.do_generate_method_configuration = false;
    second.overload_resolution_expression = Some("((info.Length() == 2))".to_string());
    second.overloads = Some(OverloadGroup {
        name: "f".to_string(),
        method_indices: vec![0, 1],
        minimum_number_of_required_arguments: 1,
    });

    InterfaceRecord {
        methods: vec![first, second],
        has_method_configuration: true,
        ..interface("Widget")
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Header
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn header_has_guard_banner_and_class() {
    let header = render_header(&interface("Widget")).unwrap();
    assert!(header.starts_with(GENERATED_BANNER));
    assert!(header.contains("#ifndef V8Widget_h\n#define V8Widget_h\n"));
    assert!(header.trim_end().ends_with("#endif // V8Widget_h"));
    assert!(header.contains("class V8Widget {"));
    assert!(header.contains("#include \"Widget.h\""));
    assert!(header.contains("inline v8::Handle<v8::Object> wrap(Widget* impl"));
}

#[test]
fn header_uses_side_table_include_path() {
    let record = InterfaceRecord {
        metadata: Some(serde_json::json!({"include_path": "core/dom/Widget.h"})),
        ..interface("Widget")
    };
    let header = render_header(&record).unwrap();
    assert!(header.contains("#include \"core/dom/Widget.h\""));
    assert!(!header.contains("#include \"Widget.h\""));
}

#[test]
fn custom_wrap_and_to_v8_are_declared_not_defined() {
    let record = InterfaceRecord {
        has_custom_wrap: true,
        has_custom_to_v8: true,
        ..interface("Widget")
    };
    let header = render_header(&record).unwrap();
    assert!(header.contains(
        "v8::Handle<v8::Object> wrap(Widget* impl, v8::Handle<v8::Object> creationContext, v8::Isolate* isolate);"
    ));
    assert!(!header.contains("inline v8::Handle<v8::Object> wrap("));
    assert!(!header.contains("inline v8::Handle<v8::Value> toV8(Widget* impl"));
}

#[test]
fn special_wrap_for_dispatches_first() {
    let record = InterfaceRecord {
        special_wrap_for: vec!["Gadget".to_string()],
        ..interface("Widget")
    };
    let header = render_header(&record).unwrap();
    assert!(header.contains("if (impl->isGadget())"));
    assert!(header.contains("return wrap(toGadget(impl), creationContext, isolate);"));
}

#[test]
fn custom_members_are_declared_in_class() {
    let mut attribute = string_attribute("label");
    attribute.has_custom_getter = true;
    let mut method = void_method("draw", Vec::new());
    method.is_custom = true;
    let record = InterfaceRecord {
        attributes: vec![attribute],
        methods: vec![method],
        ..interface("Widget")
    };
    let header = render_header(&record).unwrap();
    assert!(header.contains("static void labelAttributeGetterCustom("));
    assert!(header.contains("static void drawMethodCustom("));
    assert!(!header.contains("labelAttributeSetterCustom"));
}

#[test]
fn conditional_interface_is_guarded() {
    let record = InterfaceRecord {
        conditional_string: Some("ENABLE(GADGETS)".to_string()),
        ..interface("Widget")
    };
    let rendered = render(&record).unwrap();
    assert!(rendered.header.contains("#if ENABLE(GADGETS)\n"));
    assert!(rendered.header.contains("#endif // ENABLE(GADGETS)\n"));
    assert!(rendered.source.contains("#if ENABLE(GADGETS)\n#include \"V8Widget.h\""));
}

// ══════════════════════════════════════════════════════════════════════════════
// Source
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn attribute_getter_and_setter_bodies() {
    let record = InterfaceRecord {
        attributes: vec![string_attribute("label")],
        installed_attributes: "V8WidgetAttributes".to_string(),
        number_of_attributes: "WTF_ARRAY_LENGTH(V8WidgetAttributes)".to_string(),
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    assert!(source.contains("static void labelAttributeGetter(v8::Local<v8::String> name"));
    assert!(source.contains("    Widget* imp = V8Widget::toNative(info.Holder());\n"));
    assert!(source.contains("    v8SetReturnValueString(info, imp->label(), info.GetIsolate());\n"));
    assert!(source.contains("    imp->setLabel(cppValue);\n"));
    assert!(source.contains("static const V8DOMConfiguration::AttributeConfiguration V8WidgetAttributes[] = {"));
    assert!(source.contains(
        "{\"label\", WidgetV8Internal::labelAttributeGetterCallback, WidgetV8Internal::labelAttributeSetterCallback, 0, 0, 0, static_cast<v8::AccessControl>(v8::DEFAULT), static_cast<v8::PropertyAttribute>(v8::None), 0 /* on instance */},"
    ));
}

#[test]
fn nullable_raising_getter_uses_local_value() {
    let mut attribute = string_attribute("title");
    attribute.is_nullable = true;
    attribute.is_getter_raises_exception = true;
    attribute.cpp_value_original = Some("imp->title(isNull, es)".to_string());
    attribute.cpp_value = Some("jsValue".to_string());
    attribute.v8_set_return_value =
        Some("v8SetReturnValueString(info, jsValue, info.GetIsolate());".to_string());
    let record = InterfaceRecord {
        attributes: vec![attribute],
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    let expected = [
        "    ExceptionState es(info.GetIsolate());",
        "    bool isNull = false;",
        "    String jsValue = imp->title(isNull, es);",
        "    if (isNull) {",
    ];
    let mut position = 0;
    for line in expected {
        let found = source[position..].find(line).unwrap_or_else(|| panic!("missing {line}"));
        position += found;
    }
    assert!(source.contains("    if (UNLIKELY(es.throwIfNeeded()))"));
}

#[test]
fn read_only_attribute_has_no_setter() {
    let mut attribute = string_attribute("kind");
    attribute.has_setter = false;
    attribute.is_read_only = true;
    attribute.setter_callback_name = "0".to_string();
    let record = InterfaceRecord {
        attributes: vec![attribute],
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    assert!(source.contains("kindAttributeGetterCallback"));
    assert!(!source.contains("kindAttributeSetter"));
}

#[test]
fn per_world_attribute_gets_main_world_variants() {
    let mut attribute = string_attribute("label");
    attribute.world_suffixes = vec![String::new(), "ForMainWorld".to_string()];
    let record = InterfaceRecord {
        attributes: vec![attribute],
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    assert!(source.contains("static void labelAttributeGetterCallbackForMainWorld("));
    assert!(source.contains("WidgetV8Internal::labelAttributeSetterForMainWorld(name, jsValue, info);"));
}

#[test]
fn method_checks_required_arguments() {
    let record = InterfaceRecord {
        methods: vec![void_method("move", vec![long_argument("x", 0)])],
        has_method_configuration: true,
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    assert!(source.contains("    if (UNLIKELY(info.Length() < 1)) {"));
    assert!(source.contains("ExceptionMessages::notEnoughArguments(1, info.Length())"));
    assert!(source.contains("    V8TRYCATCH_VOID(int, x, toInt32(info[0]));\n    imp->move(x);\n"));
    assert!(source.contains("{\"move\", WidgetV8Internal::moveMethodCallback, 0, 1},"));
}

#[test]
fn overloads_render_dispatcher_in_declaration_order() {
    let source = render_source(&overloaded_widget()).unwrap();
    assert!(source.contains("static void fMethod1(const v8::FunctionCallbackInfo<v8::Value>& info)"));
    assert!(source.contains("static void fMethod2(const v8::FunctionCallbackInfo<v8::Value>& info)"));
    let first = source.find("if (((info.Length() == 1))) {").unwrap();
    let second = source.find("if (((info.Length() == 2))) {").unwrap();
    assert!(first < second);
    assert!(source.contains("No function was found that matched the signature provided."));
    // One callback for the whole group.
    assert_eq!(source.matches("static void fMethodCallback(").count(), 1);
    // Members do not re-check the argument count themselves.
    let body = &source[source.find("static void fMethod1(").unwrap()..first];
    assert!(!body.contains("notEnoughArguments"));
}

#[test]
fn dangling_overload_index_is_an_internal_error() {
    let mut record = overloaded_widget();
    if let Some(group) = record.methods[1].overloads.as_mut() {
        group.method_indices.push(7);
    }
    let err = render_source(&record).unwrap_err();
    assert!(matches!(err, CodegenError::Internal(_)));
    assert!(err.to_string().contains("#7"));
}

#[test]
fn constants_are_installed_and_checked() {
    let record = InterfaceRecord {
        constants: vec![
            ConstantRecord {
                name: "SMALL".to_string(),
                reflected_name: "SMALL".to_string(),
                value: "1".to_string(),
                runtime_enabled_function: None,
            },
            ConstantRecord {
                name: "HUGE".to_string(),
                reflected_name: "HUGE".to_string(),
                value: "9".to_string(),
                runtime_enabled_function: Some("RuntimeEnabledFeatures::hugeEnabled".to_string()),
            },
        ],
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    assert!(source.contains("        {\"SMALL\", 1},"));
    assert!(source.contains("    if (RuntimeEnabledFeatures::hugeEnabled()) {"));
    assert!(source.contains(
        "COMPILE_ASSERT(1 == Widget::SMALL, TheValueOfWidget_SMALLDoesntMatchWithImplementation);"
    ));

    let unchecked = InterfaceRecord {
        do_not_check_constants: true,
        ..record
    };
    assert!(!render_source(&unchecked).unwrap().contains("COMPILE_ASSERT"));
}

#[test]
fn constructor_passes_call_with_arguments() {
    let record = InterfaceRecord {
        has_constructor: true,
        is_constructor_raises_exception: true,
        is_constructor_call_with_document: true,
        constructor_arguments: vec!["document".to_string(), "exceptionState".to_string()],
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    assert!(source.contains("RefPtr<Widget> impl = Widget::create(document, exceptionState);"));
    assert!(source.contains("void V8Widget::constructorCallback("));
    assert!(source.contains("desc->SetCallHandler(V8Widget::constructorCallback);"));
}

#[test]
fn parent_template_is_inherited() {
    let record = InterfaceRecord {
        parent_interface: Some("EventTarget".to_string()),
        ..interface("Widget")
    };
    let source = render_source(&record).unwrap();
    assert!(source.contains("V8EventTarget::GetTemplate(isolate, currentWorldType)"));
    assert!(source.contains("&V8EventTarget::info"));
}

#[test]
fn rendering_is_deterministic() {
    let record = overloaded_widget();
    let first = render(&record).unwrap();
    for _ in 0..100 {
        assert_eq!(render(&record).unwrap(), first);
    }
}
