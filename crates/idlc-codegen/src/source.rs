//! Definition unit (`V8<Interface>.cpp`).

use std::fmt;

use idlc_types::record::{AttributeRecord, InterfaceRecord, OperationRecord};

use crate::error::CodegenResult;
use crate::members::{internal_namespace, render_attribute, render_method, render_replaceable_setter};
use crate::writer::CodeWriter;
use crate::GENERATED_BANNER;

/// Render the definition unit for `record`.
pub fn render_source(record: &InterfaceRecord) -> CodegenResult<String> {
    let mut w = CodeWriter::new();
    w.line(GENERATED_BANNER)?;
    w.blank()?;
    w.directive("#include \"config.h\"")?;
    let mut body = CodeWriter::new();
    definitions(&mut body, record)?;
    let body = body.finish();

    w.conditional(record.conditional_string.as_deref(), |w| {
        w.directive(format!("#include \"{}.h\"", record.v8_class))?;
        w.blank()?;
        for include in &record.cpp_includes {
            w.directive(format!("#include \"{include}\""))?;
        }
        w.directive("#include <wtf/UnusedParam.h>")?;
        w.blank()?;
        w.line("namespace WebCore {")?;
        w.blank()?;
        fmt::Write::write_str(w, &body)?;
        w.line("} // namespace WebCore")
    })?;
    Ok(w.finish())
}

fn definitions(w: &mut CodeWriter, record: &InterfaceRecord) -> CodegenResult<()> {
    wrapper_type_info(w, record)?;
    w.blank()?;

    let namespace = internal_namespace(record);
    w.line(format!("namespace {namespace} {{"))?;
    w.blank()?;
    w.line("template <typename T> void V8_USE(T) { }")?;
    w.blank()?;
    for attribute in &record.attributes {
        render_attribute(w, record, attribute)?;
    }
    if record.has_replaceable_attributes {
        render_replaceable_setter(w, record)?;
        w.blank()?;
    }
    for method in &record.methods {
        render_method(w, record, method)?;
    }
    if record.has_origin_safe_method_setter {
        origin_safe_method_setter(w, record)?;
        w.blank()?;
    }
    if (record.has_constructor || record.has_event_constructor) && !record.has_custom_constructor {
        if record.has_event_constructor {
            event_constructor(w, record)?;
        } else {
            constructor(w, record)?;
        }
        w.blank()?;
    }
    w.line(format!("}} // namespace {namespace}"))?;
    w.blank()?;

    if record.has_constructor || record.has_custom_constructor || record.has_event_constructor {
        constructor_callback(w, record)?;
        w.blank()?;
    }
    if record.installed_attributes != "0" {
        attribute_table(w, record)?;
        w.blank()?;
    }
    if record.has_method_configuration {
        method_table(w, record)?;
        w.blank()?;
    }
    configure_template(w, record)?;
    w.blank()?;
    get_template(w, record)?;
    w.blank()?;
    has_instance(w, record)?;
    w.blank()?;
    if record.is_active_dom_object {
        w.function(
            format!(
                "ActiveDOMObject* {}::toActiveDOMObject(v8::Handle<v8::Object> object)",
                record.v8_class
            ),
            |w| w.line("return toNative(object);"),
        )?;
        w.blank()?;
    }
    if let Some(function) = &record.generate_visit_dom_wrapper_function {
        visit_dom_wrapper(w, record, function)?;
        w.blank()?;
    }
    if record.has_per_context_enabled_attributes {
        install_per_context_attributes(w, record)?;
        w.blank()?;
    }
    if record.has_per_context_enabled_methods {
        install_per_context_methods(w, record)?;
        w.blank()?;
    }
    create_wrapper(w, record)?;
    w.blank()?;
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Wrapper type info
// ══════════════════════════════════════════════════════════════════════════════

fn wrapper_type_info(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    let active = if record.is_active_dom_object {
        format!("{v8}::toActiveDOMObject")
    } else {
        "0".to_string()
    };
    let visit = if record.has_visit_dom_wrapper {
        format!("{v8}::visitDOMWrapper")
    } else {
        "0".to_string()
    };
    let parent = match &record.parent_interface {
        Some(parent) => format!("&V8{parent}::info"),
        None => "0".to_string(),
    };
    let lifetime = if record.is_dependent_lifetime {
        "WrapperTypeObjectPrototype, Dependent"
    } else {
        "WrapperTypeObjectPrototype, Independent"
    };
    w.line(format!(
        "const WrapperTypeInfo {v8}::info = {{ {v8}::GetTemplate, {v8}::derefObject, {active}, {visit}, {v8}::installPerContextEnabledMethods, {parent}, {lifetime} }};"
    ))
}

// ══════════════════════════════════════════════════════════════════════════════
// Internal callbacks not tied to one member
// ══════════════════════════════════════════════════════════════════════════════

fn origin_safe_method_setter(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    let signature =
        "(v8::Local<v8::String> name, v8::Local<v8::Value> jsValue, const v8::PropertyCallbackInfo<void>& info)";
    w.function(format!("static void {cpp}OriginSafeMethodSetter{signature}"), |w| {
        w.line(format!(
            "v8::Handle<v8::Object> holder = info.This()->FindInstanceInPrototypeChain({v8}::GetTemplate(info.GetIsolate(), worldType(info.GetIsolate())));"
        ))?;
        w.line("if (holder.IsEmpty())")?;
        w.line("    return;")?;
        w.line(format!("{cpp}* imp = {v8}::toNative(holder);"))?;
        w.line("ExceptionState es(info.GetIsolate());")?;
        w.block("if (!BindingSecurity::shouldAllowAccessToFrame(imp->frame(), es))", |w| {
            w.line("es.throwIfNeeded();")?;
            w.line("return;")
        })?;
        w.line("info.This()->SetHiddenValue(name, jsValue);")
    })?;
    w.blank()?;
    w.function(format!("static void {cpp}OriginSafeMethodSetterCallback{signature}"), |w| {
        w.line(format!(
            "{}::{cpp}OriginSafeMethodSetter(name, jsValue, info);",
            internal_namespace(record)
        ))
    })
}

fn constructor(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    w.function("static void constructor(const v8::FunctionCallbackInfo<v8::Value>& info)", |w| {
        if record.is_constructor_raises_exception {
            w.line("ExceptionState exceptionState(info.GetIsolate());")?;
        }
        if record.is_constructor_call_with_execution_context {
            w.line("ExecutionContext* context = getExecutionContext();")?;
        }
        if record.is_constructor_call_with_document {
            w.line("Document& document = *toDocument(getExecutionContext());")?;
        }
        w.line(format!(
            "RefPtr<{cpp}> impl = {cpp}::create({});",
            record.constructor_arguments.join(", ")
        ))?;
        w.line("v8::Handle<v8::Object> wrapper = info.Holder();")?;
        if record.is_constructor_raises_exception {
            w.line("if (exceptionState.throwIfNeeded())")?;
            w.line("    return;")?;
        }
        w.blank()?;
        w.line(format!(
            "V8DOMWrapper::associateObjectWithWrapper<{v8}>(impl.release(), &{v8}::info, wrapper, info.GetIsolate(), WrapperConfiguration::Dependent);"
        ))?;
        w.line("info.GetReturnValue().Set(wrapper);")
    })
}

fn event_constructor(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    w.function("static void constructor(const v8::FunctionCallbackInfo<v8::Value>& info)", |w| {
        w.block("if (info.Length() < 1)", |w| {
            w.line(format!(
                "throwTypeError(ExceptionMessages::failedToConstruct(\"{}\", \"An event name must be provided.\"), info.GetIsolate());",
                record.interface_name
            ))?;
            w.line("return;")
        })?;
        w.blank()?;
        w.line("V8TRYCATCH_FOR_V8STRINGRESOURCE_VOID(V8StringResource<>, type, info[0]);")?;
        w.line(format!("{cpp}Init eventInit;"))?;
        w.block("if (info.Length() >= 2)", |w| {
            w.line("V8TRYCATCH_VOID(Dictionary, options, Dictionary(info[1], info.GetIsolate()));")?;
            w.line(format!("if (!fill{cpp}Init(eventInit, options))"))?;
            w.line("    return;")
        })?;
        w.blank()?;
        w.line(format!("RefPtr<{cpp}> event = {cpp}::create(type, eventInit);"))?;
        w.line("v8::Handle<v8::Object> wrapper = info.Holder();")?;
        w.line(format!(
            "V8DOMWrapper::associateObjectWithWrapper<{v8}>(event.release(), &{v8}::info, wrapper, info.GetIsolate(), WrapperConfiguration::Dependent);"
        ))?;
        w.line("v8SetReturnValue(info, wrapper);")
    })
}

fn constructor_callback(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    w.function(
        format!("void {v8}::constructorCallback(const v8::FunctionCallbackInfo<v8::Value>& info)"),
        |w| {
            w.line("TRACE_EVENT_SCOPED_SAMPLING_STATE(\"Blink\", \"DOMConstructor\");")?;
            if let Some(feature) = &record.measure_as {
                w.line(format!(
                    "UseCounter::count(activeDOMWindow(), UseCounter::{feature});"
                ))?;
            }
            w.block("if (!info.IsConstructCall())", |w| {
                w.line(format!(
                    "throwTypeError(ExceptionMessages::failedToConstruct(\"{}\", \"Please use the 'new' operator, this DOM object constructor cannot be called as a function.\"), info.GetIsolate());",
                    record.interface_name
                ))?;
                w.line("return;")
            })?;
            w.blank()?;
            w.block("if (ConstructorMode::current() == ConstructorMode::WrapExistingObject)", |w| {
                w.line("v8SetReturnValue(info, info.Holder());")?;
                w.line("return;")
            })?;
            w.blank()?;
            if record.has_custom_constructor {
                w.line(format!("{v8}::constructorCustom(info);"))
            } else {
                w.line(format!("{}::constructor(info);", internal_namespace(record)))
            }
        },
    )
}

// ══════════════════════════════════════════════════════════════════════════════
// Installation tables
// ══════════════════════════════════════════════════════════════════════════════

fn attribute_configuration(attribute: &AttributeRecord) -> String {
    format!(
        "{{\"{}\", {}, {}, {}, {}, 0, static_cast<v8::AccessControl>({}), static_cast<v8::PropertyAttribute>({}), 0 /* on instance */}}",
        attribute.name,
        attribute.getter_callback_name,
        attribute.setter_callback_name,
        attribute.getter_callback_name_for_main_world,
        attribute.setter_callback_name_for_main_world,
        attribute.access_control_list.join(" | "),
        attribute.property_attributes.join(" | "),
    )
}

fn is_table_attribute(attribute: &AttributeRecord) -> bool {
    attribute.runtime_enabled_function_name.is_none()
        && attribute.per_context_enabled_function_name.is_none()
        && !attribute.is_static
}

fn attribute_table(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    w.declaration(
        format!(
            "static const V8DOMConfiguration::AttributeConfiguration {}Attributes[] =",
            record.v8_class
        ),
        |w| {
            for attribute in record.attributes.iter().filter(|a| is_table_attribute(a)) {
                w.conditional(attribute.conditional_string.as_deref(), |w| {
                    w.line(format!("{},", attribute_configuration(attribute)))
                })?;
            }
            Ok(())
        },
    )
}

/// Declared `length` of a method: the group minimum for overloads.
fn method_length(record: &InterfaceRecord, method: &OperationRecord) -> usize {
    if method.overload_index.is_some() {
        if let Some(group) = record.overload_group(&method.name, method.is_static) {
            return group.minimum_number_of_required_arguments;
        }
    }
    method.number_of_required_arguments
}

fn main_world_callback(method: &OperationRecord) -> String {
    if method.is_per_world_bindings {
        format!("{}ForMainWorld", method.callback_name)
    } else {
        "0".to_string()
    }
}

fn method_table(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    w.declaration(
        format!(
            "static const V8DOMConfiguration::MethodConfiguration {}Methods[] =",
            record.v8_class
        ),
        |w| {
            for method in record.methods.iter().filter(|m| m.do_generate_method_configuration) {
                w.conditional(method.conditional_string.as_deref(), |w| {
                    w.line(format!(
                        "{{\"{}\", {}, {}, {}}},",
                        method.name,
                        method.callback_name,
                        main_world_callback(method),
                        method_length(record, method)
                    ))
                })?;
            }
            Ok(())
        },
    )
}

fn configure_template(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    w.function(
        format!(
            "static v8::Handle<v8::FunctionTemplate> Configure{v8}Template(v8::Handle<v8::FunctionTemplate> desc, v8::Isolate* isolate, WrapperWorldType currentWorldType)"
        ),
        |w| {
            w.line("desc->ReadOnlyPrototype();")?;
            w.blank()?;
            w.line("v8::Local<v8::Signature> defaultSignature;")?;
            let parent_template = match &record.parent_interface {
                Some(parent) => format!("V8{parent}::GetTemplate(isolate, currentWorldType)"),
                None => "v8::Local<v8::FunctionTemplate>()".to_string(),
            };
            let (methods, method_count) = if record.has_method_configuration {
                (format!("{v8}Methods"), format!("WTF_ARRAY_LENGTH({v8}Methods)"))
            } else {
                ("0".to_string(), "0".to_string())
            };
            w.line(format!(
                "defaultSignature = V8DOMConfiguration::installDOMClassTemplate(desc, \"{}\", {parent_template}, {v8}::internalFieldCount,",
                record.interface_name
            ))?;
            w.line(format!(
                "    {}, {},",
                record.installed_attributes, record.number_of_attributes
            ))?;
            w.line(format!("    {methods}, {method_count},"))?;
            w.line("    isolate, currentWorldType);")?;
            w.line("UNUSED_PARAM(defaultSignature);")?;
            if record.has_constructor || record.has_custom_constructor || record.has_event_constructor {
                w.line(format!("desc->SetCallHandler({v8}::constructorCallback);"))?;
                w.line(format!("desc->SetLength({});", record.length))?;
            }
            if record.has_custom_legacy_call_as_function {
                w.line(format!(
                    "desc->InstanceTemplate()->SetCallAsFunctionHandler({v8}::legacyCallCustom);"
                ))?;
            }
            w.line("v8::Local<v8::ObjectTemplate> instance = desc->InstanceTemplate();")?;
            w.line("v8::Local<v8::ObjectTemplate> proto = desc->PrototypeTemplate();")?;
            w.line("UNUSED_PARAM(instance);")?;
            w.line("UNUSED_PARAM(proto);")?;

            for attribute in record.attributes.iter().filter(|a| a.runtime_enabled_function_name.is_some() && !a.is_static) {
                let gate = attribute.runtime_enabled_function_name.as_deref().unwrap_or_default();
                w.conditional(attribute.conditional_string.as_deref(), |w| {
                    w.block(format!("if ({gate}())"), |w| {
                        w.line("static const V8DOMConfiguration::AttributeConfiguration attributeConfiguration =\\")?;
                        w.line(format!("{};", attribute_configuration(attribute)))?;
                        w.line("V8DOMConfiguration::installAttribute(instance, proto, attributeConfiguration, isolate, currentWorldType);")
                    })
                })?;
            }
            for attribute in record.attributes.iter().filter(|a| a.is_static) {
                w.line(format!(
                    "desc->SetNativeDataProperty(v8::String::NewSymbol(\"{}\"), {}, {}, v8::External::New(0), static_cast<v8::PropertyAttribute>(v8::None), v8::Handle<v8::AccessorSignature>(), static_cast<v8::AccessControl>(v8::DEFAULT));",
                    attribute.name, attribute.getter_callback_name, attribute.setter_callback_name
                ))?;
            }
            install_remaining_methods(w, record)?;
            if !record.constants.is_empty() {
                install_constants(w, record)?;
            }
            w.blank()?;
            w.line("// Custom toString template")?;
            w.line("desc->Set(v8::String::NewSymbol(\"toString\"), V8PerIsolateData::current()->toStringTemplate());")?;
            w.line("return desc;")
        },
    )
}

/// Methods the configuration table does not cover.
fn install_remaining_methods(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let remaining = record.methods.iter().filter(|m| {
        !m.do_generate_method_configuration
            && m.per_context_enabled_function_name.is_none()
            && m.overload_index.map_or(true, |index| index == 1)
    });
    for method in remaining {
        let length = method_length(record, method);
        let signature = if method.is_do_not_check_signature || method.is_static {
            "v8::Local<v8::Signature>()"
        } else {
            "defaultSignature"
        };
        let target = if method.is_static {
            "desc"
        } else if method.is_check_security_for_frame || method.property_attributes.iter().any(|p| p == "v8::ReadOnly") {
            "instance"
        } else {
            "proto"
        };
        let attributes = if method.property_attributes.is_empty() {
            "v8::None".to_string()
        } else {
            method.property_attributes.join(" | ")
        };
        let install = format!(
            "{target}->Set(v8::String::NewSymbol(\"{}\"), v8::FunctionTemplate::New({}, v8Undefined(), {signature}, {length}), static_cast<v8::PropertyAttribute>({attributes}));",
            method.name, method.callback_name
        );
        w.conditional(method.conditional_string.as_deref(), |w| {
            match &method.runtime_enabled_function_name {
                Some(gate) => {
                    w.line(format!("if ({gate}())"))?;
                    w.line(format!("    {install}"))
                }
                None => w.line(&install),
            }
        })?;
    }
    if record.has_origin_safe_method_setter {
        w.line(format!(
            "instance->SetAccessor(v8::String::NewSymbol(\"__proto__\"), 0, {}::{}OriginSafeMethodSetterCallback);",
            internal_namespace(record),
            record.cpp_class
        ))?;
    }
    Ok(())
}

fn install_constants(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    let has_plain = record.constants.iter().any(|c| c.runtime_enabled_function.is_none());
    if has_plain {
        w.declaration(
            format!("static const V8DOMConfiguration::ConstantConfiguration {v8}Constants[] ="),
            |w| {
                for constant in record.constants.iter().filter(|c| c.runtime_enabled_function.is_none()) {
                    w.line(format!("{{\"{}\", {}}},", constant.name, constant.value))?;
                }
                Ok(())
            },
        )?;
        w.line(format!(
            "V8DOMConfiguration::installConstants(desc, proto, {v8}Constants, WTF_ARRAY_LENGTH({v8}Constants), isolate);"
        ))?;
    }
    for constant in &record.constants {
        let Some(gate) = &constant.runtime_enabled_function else {
            continue;
        };
        w.block(format!("if ({gate}())"), |w| {
            w.line(format!(
                "static const V8DOMConfiguration::ConstantConfiguration constantConfiguration = {{\"{}\", static_cast<signed int>({})}};",
                constant.name, constant.value
            ))?;
            w.line("V8DOMConfiguration::installConstants(desc, proto, &constantConfiguration, 1, isolate);")
        })?;
    }
    if !record.do_not_check_constants {
        for constant in &record.constants {
            w.line(format!(
                "COMPILE_ASSERT({} == {cpp}::{}, TheValueOf{cpp}_{}DoesntMatchWithImplementation);",
                constant.value, constant.reflected_name, constant.reflected_name
            ))?;
        }
    }
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════════
// Class members
// ══════════════════════════════════════════════════════════════════════════════

fn get_template(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    w.function(
        format!(
            "v8::Handle<v8::FunctionTemplate> {v8}::GetTemplate(v8::Isolate* isolate, WrapperWorldType currentWorldType)"
        ),
        |w| {
            w.line("V8PerIsolateData* data = V8PerIsolateData::from(isolate);")?;
            w.line("V8PerIsolateData::TemplateMap::iterator result = data->templateMap(currentWorldType).find(&info);")?;
            w.line("if (result != data->templateMap(currentWorldType).end())")?;
            w.line("    return result->value.newLocal(isolate);")?;
            w.blank()?;
            w.line("TRACE_EVENT_SCOPED_SAMPLING_STATE(\"Blink\", \"BuildDOMTemplate\");")?;
            w.line("v8::HandleScope handleScope(isolate);")?;
            w.line("v8::Handle<v8::FunctionTemplate> templ =")?;
            w.line(format!(
                "    Configure{v8}Template(data->rawTemplate(&info, currentWorldType), isolate, currentWorldType);"
            ))?;
            w.line("data->templateMap(currentWorldType).add(&info, UnsafePersistent<v8::FunctionTemplate>(isolate, templ));")?;
            w.line("return handleScope.Close(templ);")
        },
    )
}

fn has_instance(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    w.function(
        format!(
            "bool {v8}::HasInstance(v8::Handle<v8::Value> jsValue, v8::Isolate* isolate, WrapperWorldType currentWorldType)"
        ),
        |w| w.line("return V8PerIsolateData::from(isolate)->hasInstance(&info, jsValue, currentWorldType);"),
    )?;
    w.blank()?;
    w.function(
        format!("bool {v8}::HasInstanceInAnyWorld(v8::Handle<v8::Value> jsValue, v8::Isolate* isolate)"),
        |w| {
            w.line("return V8PerIsolateData::from(isolate)->hasInstance(&info, jsValue, MainWorld)")?;
            w.line("    || V8PerIsolateData::from(isolate)->hasInstance(&info, jsValue, IsolatedWorld)")?;
            w.line("    || V8PerIsolateData::from(isolate)->hasInstance(&info, jsValue, WorkerWorld);")
        },
    )
}

fn visit_dom_wrapper(w: &mut CodeWriter, record: &InterfaceRecord, function: &str) -> fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    w.function(
        format!(
            "void {v8}::visitDOMWrapper(void* object, const v8::Persistent<v8::Object>& wrapper, v8::Isolate* isolate)"
        ),
        |w| {
            w.line(format!("{cpp}* impl = fromInternalPointer(object);"))?;
            w.block(format!("if (Node* owner = impl->{function}())"), |w| {
                w.line("Node* root = V8GCController::opaqueRootForGC(owner, isolate);")?;
                w.line("isolate->SetReferenceFromGroup(v8::UniqueId(reinterpret_cast<intptr_t>(root)), wrapper);")?;
                w.line("return;")
            })?;
            w.line("setObjectGroup(object, wrapper, isolate);")
        },
    )
}

fn install_per_context_attributes(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    w.function(
        format!(
            "void {v8}::installPerContextEnabledProperties(v8::Handle<v8::Object> instance, {cpp}* impl, v8::Isolate* isolate)"
        ),
        |w| {
            w.line("v8::Local<v8::Object> proto = v8::Local<v8::Object>::Cast(instance->GetPrototype());")?;
            for attribute in &record.attributes {
                let Some(gate) = &attribute.per_context_enabled_function_name else {
                    continue;
                };
                w.block(format!("if ({gate}(impl->document()))"), |w| {
                    w.line("static const V8DOMConfiguration::AttributeConfiguration attributeConfiguration =\\")?;
                    w.line(format!("{};", attribute_configuration(attribute)))?;
                    w.line("V8DOMConfiguration::installAttribute(instance, proto, attributeConfiguration, isolate);")
                })?;
            }
            Ok(())
        },
    )
}

fn install_per_context_methods(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    w.function(
        format!(
            "void {v8}::installPerContextEnabledMethods(v8::Handle<v8::Object> prototypeTemplate, v8::Isolate* isolate)"
        ),
        |w| {
            w.line("UNUSED_PARAM(isolate);")?;
            w.line("ExecutionContext* context = toExecutionContext(prototypeTemplate->CreationContext());")?;
            for method in &record.methods {
                let Some(gate) = &method.per_context_enabled_function_name else {
                    continue;
                };
                if !method.overload_index.map_or(true, |index| index == 1) {
                    continue;
                }
                w.block(format!("if (context && context->isDocument() && {gate}(toDocument(context)))"), |w| {
                    w.line(format!(
                        "prototypeTemplate->Set(v8::String::NewSymbol(\"{}\"), v8::FunctionTemplate::New({}, v8Undefined(), v8::Local<v8::Signature>(), {})->GetFunction());",
                        method.name,
                        method.callback_name,
                        method_length(record, method)
                    ))
                })?;
            }
            Ok(())
        },
    )
}

fn create_wrapper(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    let configuration = if record.is_dependent_lifetime || record.is_active_dom_object {
        "WrapperConfiguration::Dependent"
    } else {
        "WrapperConfiguration::Independent"
    };
    w.function(
        format!(
            "v8::Handle<v8::Object> {v8}::createWrapper(PassRefPtr<{cpp}> impl, v8::Handle<v8::Object> creationContext, v8::Isolate* isolate)"
        ),
        |w| {
            w.line("ASSERT(impl);")?;
            w.line(format!("ASSERT(!DOMDataStore::containsWrapper<{v8}>(impl.get(), isolate));"))?;
            w.block("if (ScriptWrappable::wrapperCanBeStoredInObject(impl.get()))", |w| {
                w.line("const WrapperTypeInfo* actualInfo = ScriptWrappable::getTypeInfoFromObject(impl.get());")?;
                w.line("RELEASE_ASSERT_WITH_SECURITY_IMPLICATION(actualInfo->derefObjectFunction == info.derefObjectFunction);")
            })?;
            w.blank()?;
            w.line("v8::Handle<v8::Object> wrapper = V8DOMWrapper::createWrapper(creationContext, &info, toInternalPointer(impl.get()), isolate);")?;
            w.line("if (UNLIKELY(wrapper.IsEmpty()))")?;
            w.line("    return wrapper;")?;
            w.blank()?;
            w.line("installPerContextEnabledProperties(wrapper, impl.get(), isolate);")?;
            w.line(format!(
                "V8DOMWrapper::associateObjectWithWrapper<{v8}>(impl, &info, wrapper, isolate, {configuration});"
            ))?;
            w.line("return wrapper;")
        },
    )?;
    w.blank()?;
    w.function(format!("void {v8}::derefObject(void* object)"), |w| {
        w.line("fromInternalPointer(object)->deref();")
    })
}
