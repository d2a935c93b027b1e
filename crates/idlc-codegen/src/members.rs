//! Per-member callbacks inside the `<Class>V8Internal` namespace.

use std::fmt;

use idlc_types::record::{AttributeRecord, InterfaceRecord, OperationRecord, OverloadGroup};

use crate::error::{CodegenError, CodegenResult};
use crate::writer::CodeWriter;

const GETTER_SIGNATURE: &str =
    "(v8::Local<v8::String> name, const v8::PropertyCallbackInfo<v8::Value>& info)";
const SETTER_SIGNATURE: &str =
    "(v8::Local<v8::String> name, v8::Local<v8::Value> jsValue, const v8::PropertyCallbackInfo<void>& info)";
const METHOD_SIGNATURE: &str = "(const v8::FunctionCallbackInfo<v8::Value>& info)";

// ══════════════════════════════════════════════════════════════════════════════
// Attributes
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) fn render_attribute(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    attribute: &AttributeRecord,
) -> fmt::Result {
    w.conditional(attribute.conditional_string.as_deref(), |w| {
        for suffix in &attribute.world_suffixes {
            if !attribute.has_custom_getter {
                attribute_getter(w, record, attribute, suffix)?;
                w.blank()?;
            }
            attribute_getter_callback(w, record, attribute, suffix)?;
            w.blank()?;
            if attribute.has_setter && !attribute.is_replaceable {
                if !attribute.has_custom_setter {
                    attribute_setter(w, record, attribute, suffix)?;
                    w.blank()?;
                }
                attribute_setter_callback(w, record, attribute, suffix)?;
                w.blank()?;
            }
        }
        Ok(())
    })
}

fn attribute_getter(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    attribute: &AttributeRecord,
    suffix: &str,
) -> fmt::Result {
    let name = &attribute.name;
    let cpp_value = attribute.cpp_value.as_deref().unwrap_or_default();
    let set_return_value = attribute.v8_set_return_value.as_deref().unwrap_or_default();
    w.function(
        format!("static void {name}AttributeGetter{suffix}{GETTER_SIGNATURE}"),
        |w| {
            if !attribute.is_static {
                receiver(w, record)?;
            }
            if attribute.is_keep_alive_for_gc {
                w.line(format!("{} result = {cpp_value};", attribute.cpp_type))?;
                w.line(format!(
                    "if (result.get() && DOMDataStore::setReturnValueFromWrapper<{}>(info.GetReturnValue(), result.get()))",
                    attribute.v8_type
                ))?;
                w.line("    return;")?;
                w.line("v8::Handle<v8::Value> wrapper = toV8(result.get(), info.Holder(), info.GetIsolate());")?;
                return w.block("if (!wrapper.IsEmpty())", |w| {
                    w.line(format!(
                        "V8HiddenPropertyName::setNamedHiddenReference(info.Holder(), \"{name}\", wrapper);"
                    ))?;
                    w.line(set_return_value)
                });
            }
            if attribute.is_check_security_for_node {
                w.line("ExceptionState es(info.GetIsolate());")?;
                let value = attribute.cpp_value_original.as_deref().unwrap_or(cpp_value);
                w.block(
                    format!("if (!BindingSecurity::shouldAllowAccessToNode({value}, es))"),
                    |w| {
                        w.line("v8SetReturnValueNull(info);")?;
                        w.line("es.throwIfNeeded();")?;
                        w.line("return;")
                    },
                )?;
            } else if attribute.is_getter_raises_exception {
                w.line("ExceptionState es(info.GetIsolate());")?;
            }
            if let Some(validation) = &attribute.cached_attribute_validation_method {
                w.line(format!(
                    "v8::Handle<v8::String> propertyName = v8::String::NewSymbol(\"{name}\");"
                ))?;
                w.block(format!("if (!imp->{validation}())"), |w| {
                    w.line("v8::Handle<v8::Value> jsValue = info.Holder()->GetHiddenValue(propertyName);")?;
                    w.block("if (!jsValue.IsEmpty())", |w| {
                        w.line("v8SetReturnValue(info, jsValue);")?;
                        w.line("return;")
                    })
                })?;
            }
            if attribute.is_nullable {
                w.line("bool isNull = false;")?;
            }
            if let Some(original) = &attribute.cpp_value_original {
                w.line(format!("{} {cpp_value} = {original};", attribute.cpp_type))?;
            }
            if attribute.is_nullable {
                w.block("if (isNull)", |w| {
                    w.line("v8SetReturnValueNull(info);")?;
                    w.line("return;")
                })?;
            }
            if attribute.is_getter_raises_exception {
                w.line("if (UNLIKELY(es.throwIfNeeded()))")?;
                w.line("    return;")?;
            }
            if attribute.cached_attribute_validation_method.is_some() {
                w.line(format!(
                    "info.Holder()->SetHiddenValue(propertyName, {});",
                    cached_value_expression(attribute, cpp_value)
                ))?;
            }
            w.line(set_return_value)
        },
    )
}

/// The value stored as the hidden cached copy.
fn cached_value_expression(attribute: &AttributeRecord, cpp_value: &str) -> String {
    if attribute.cpp_type == "ScriptValue" {
        format!("{cpp_value}.v8Value()")
    } else {
        cpp_value.to_string()
    }
}

fn attribute_getter_callback(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    attribute: &AttributeRecord,
    suffix: &str,
) -> fmt::Result {
    let name = &attribute.name;
    w.function(
        format!("static void {name}AttributeGetterCallback{suffix}{GETTER_SIGNATURE}"),
        |w| {
            w.line("TRACE_EVENT_SET_SAMPLING_STATE(\"Blink\", \"DOMGetter\");")?;
            use_counters(w, attribute.deprecate_as.as_deref(), attribute.measure_as.as_deref())?;
            if attribute.activity_logging_world_list_for_getter.iter().any(|s| s == suffix) {
                activity_log(w, &format!("{}.{name}", record.interface_name), "0, 0", "Getter")?;
            }
            if attribute.has_custom_getter {
                w.line(format!("{}::{name}AttributeGetterCustom(name, info);", record.v8_class))?;
            } else {
                w.line(format!(
                    "{}::{name}AttributeGetter{suffix}(name, info);",
                    internal_namespace(record)
                ))?;
            }
            w.line("TRACE_EVENT_SET_SAMPLING_STATE(\"V8\", \"Execution\");")
        },
    )
}

fn attribute_setter(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    attribute: &AttributeRecord,
    suffix: &str,
) -> fmt::Result {
    let name = &attribute.name;
    let setter = attribute.cpp_setter.as_deref().unwrap_or_default();
    w.function(
        format!("static void {name}AttributeSetter{suffix}{SETTER_SIGNATURE}"),
        |w| {
            if !attribute.is_static {
                receiver(w, record)?;
            }
            if attribute.has_strict_type_checking {
                w.block(
                    format!(
                        "if (!isUndefinedOrNull(jsValue) && !{}::HasInstance(jsValue, info.GetIsolate(), worldType(info.GetIsolate())))",
                        attribute.v8_type
                    ),
                    |w| {
                        w.line(format!(
                            "throwTypeError(ExceptionMessages::failedToSet(\"{name}\", \"{}\", \"The provided value is not of type '{}'.\"), info.GetIsolate());",
                            record.interface_name, attribute.idl_type
                        ))?;
                        w.line("return;")
                    },
                )?;
            }
            if let Some(statement) = &attribute.v8_value_to_local_cpp_value {
                w.line(statement)?;
            }
            if let Some(validation) = &attribute.enum_validation_expression {
                w.line("String string = cppValue;")?;
                w.line(format!("if (!({validation}))"))?;
                w.line("    return;")?;
            }
            if attribute.is_reflect {
                w.line("CustomElementCallbackDispatcher::CallbackDeliveryScope deliveryScope;")?;
            }
            if attribute.is_setter_raises_exception {
                w.line("ExceptionState es(info.GetIsolate());")?;
            }
            w.line(format!("{setter};"))?;
            if attribute.is_setter_raises_exception {
                w.line("es.throwIfNeeded();")?;
            }
            if attribute.cached_attribute_validation_method.is_some() {
                w.line(format!(
                    "info.Holder()->DeleteHiddenValue(v8::String::NewSymbol(\"{name}\"));"
                ))?;
            }
            Ok(())
        },
    )
}

fn attribute_setter_callback(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    attribute: &AttributeRecord,
    suffix: &str,
) -> fmt::Result {
    let name = &attribute.name;
    w.function(
        format!("static void {name}AttributeSetterCallback{suffix}{SETTER_SIGNATURE}"),
        |w| {
            w.line("TRACE_EVENT_SET_SAMPLING_STATE(\"Blink\", \"DOMSetter\");")?;
            use_counters(w, attribute.deprecate_as.as_deref(), attribute.measure_as.as_deref())?;
            if attribute.activity_logging_world_list_for_setter.iter().any(|s| s == suffix) {
                w.line("v8::Handle<v8::Value> loggerArg[] = { jsValue };")?;
                activity_log(w, &format!("{}.{name}", record.interface_name), "1, &loggerArg[0]", "Setter")?;
            }
            if attribute.has_custom_setter {
                w.line(format!(
                    "{}::{name}AttributeSetterCustom(name, jsValue, info);",
                    record.v8_class
                ))?;
            } else {
                w.line(format!(
                    "{}::{name}AttributeSetter{suffix}(name, jsValue, info);",
                    internal_namespace(record)
                ))?;
            }
            w.line("TRACE_EVENT_SET_SAMPLING_STATE(\"V8\", \"Execution\");")
        },
    )
}

pub(crate) fn render_replaceable_setter(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    let cpp = &record.cpp_class;
    w.function(
        format!("static void {cpp}ReplaceableAttributeSetter{SETTER_SIGNATURE}"),
        |w| w.line("info.This()->ForceSet(name, jsValue);"),
    )?;
    w.blank()?;
    w.function(
        format!("static void {cpp}ReplaceableAttributeSetterCallback{SETTER_SIGNATURE}"),
        |w| {
            w.line(format!(
                "{}::{cpp}ReplaceableAttributeSetter(name, jsValue, info);",
                internal_namespace(record)
            ))
        },
    )
}

// ══════════════════════════════════════════════════════════════════════════════
// Operations
// ══════════════════════════════════════════════════════════════════════════════

/// Body, dispatcher and callback for one method, as applicable.
pub(crate) fn render_method(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    method: &OperationRecord,
) -> CodegenResult<()> {
    let suffixes = world_suffixes(method);
    w.conditional(method.conditional_string.as_deref(), |w| {
        if !method.is_custom {
            for suffix in &suffixes {
                method_body(w, record, method, suffix)?;
                w.blank()?;
            }
        }
        Ok(())
    })?;

    // Only the last group member carries the group; the callback is emitted once.
    let group = match (&method.overload_index, &method.overloads) {
        (None, _) => None,
        (Some(_), Some(group)) => Some(group),
        (Some(_), None) => return Ok(()),
    };
    let members = match group {
        Some(group) => group_members(record, group)?,
        None => Vec::new(),
    };

    w.conditional(method.conditional_string.as_deref(), |w| {
        for suffix in &suffixes {
            if let Some(group) = group {
                if !method.is_custom {
                    overload_dispatcher(w, record, group, &members, suffix)?;
                    w.blank()?;
                }
            }
            method_callback(w, record, method, suffix)?;
            w.blank()?;
        }
        Ok(())
    })?;
    Ok(())
}

fn world_suffixes(method: &OperationRecord) -> Vec<&'static str> {
    if method.is_per_world_bindings {
        vec!["", "ForMainWorld"]
    } else {
        vec![""]
    }
}

fn group_members<'a>(
    record: &'a InterfaceRecord,
    group: &OverloadGroup,
) -> CodegenResult<Vec<&'a OperationRecord>> {
    group
        .method_indices
        .iter()
        .map(|&index| {
            record.methods.get(index).ok_or_else(|| {
                CodegenError::Internal(format!(
                    "overload group '{}' refers to missing method #{index}",
                    group.name
                ))
            })
        })
        .collect()
}

fn method_body(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    method: &OperationRecord,
    suffix: &str,
) -> fmt::Result {
    let name = &method.name;
    let stem = method.function_stem();
    let index = method.overload_index.map(|i| i.to_string()).unwrap_or_default();
    w.function(format!("static void {stem}Method{index}{suffix}{METHOD_SIGNATURE}"), |w| {
        if method.overload_index.is_none() && method.number_of_required_arguments > 0 {
            not_enough_arguments(w, record, name, method.number_of_required_arguments)?;
        }
        if !method.is_static {
            receiver(w, record)?;
        }
        let needs_exception_state = method.is_raises_exception
            || method.is_check_security_for_frame
            || method.is_check_security_for_node;
        if needs_exception_state {
            w.line("ExceptionState es(info.GetIsolate());")?;
        }
        if method.is_check_security_for_frame && !method.is_static {
            w.block("if (!BindingSecurity::shouldAllowAccessToFrame(imp->frame(), es))", |w| {
                w.line("es.throwIfNeeded();")?;
                w.line("return;")
            })?;
        }
        for argument in &method.arguments {
            if argument.is_strict_type_checking {
                let i = argument.index;
                w.block(
                    format!(
                        "if (info.Length() > {i} && !isUndefinedOrNull(info[{i}]) && !V8{}::HasInstance(info[{i}], info.GetIsolate(), worldType(info.GetIsolate())))",
                        argument.idl_type
                    ),
                    |w| {
                        w.line(format!(
                            "throwTypeError(ExceptionMessages::failedToExecute(\"{name}\", \"{}\", \"parameter {} is not of type '{}'.\"), info.GetIsolate());",
                            record.interface_name,
                            i + 1,
                            argument.idl_type
                        ))?;
                        w.line("return;")
                    },
                )?;
            }
            w.line(&argument.v8_value_to_local_cpp_value)?;
        }
        match (&method.cpp_type, &method.v8_set_return_value) {
            (Some(cpp_type), Some(set_return_value)) => {
                w.line(format!("{cpp_type} result = {};", method.cpp_method))?;
                if method.is_raises_exception {
                    w.line("if (es.throwIfNeeded())")?;
                    w.line("    return;")?;
                }
                if method.is_check_security_for_node {
                    w.block(
                        "if (!BindingSecurity::shouldAllowAccessToNode(WTF::getPtr(result), es))",
                        |w| {
                            w.line("v8SetReturnValueNull(info);")?;
                            w.line("es.throwIfNeeded();")?;
                            w.line("return;")
                        },
                    )?;
                }
                w.line(set_return_value)
            }
            _ => {
                w.line(format!("{};", method.cpp_method))?;
                if method.is_raises_exception {
                    w.line("es.throwIfNeeded();")?;
                }
                Ok(())
            }
        }
    })
}

fn overload_dispatcher(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    group: &OverloadGroup,
    members: &[&OperationRecord],
    suffix: &str,
) -> fmt::Result {
    let name = &group.name;
    let stem = match members.first() {
        Some(member) => member.function_stem(),
        None => name.clone(),
    };
    w.function(format!("static void {stem}Method{suffix}{METHOD_SIGNATURE}"), |w| {
        for member in members {
            let (Some(index), Some(expression)) =
                (member.overload_index, &member.overload_resolution_expression)
            else {
                continue;
            };
            if expression.is_empty() {
                continue;
            }
            w.conditional(member.conditional_string.as_deref(), |w| {
                w.block(format!("if ({expression})"), |w| {
                    w.line(format!("{stem}Method{index}{suffix}(info);"))?;
                    w.line("return;")
                })
            })?;
        }
        if group.minimum_number_of_required_arguments > 0 {
            not_enough_arguments(w, record, name, group.minimum_number_of_required_arguments)?;
        }
        w.line(format!(
            "throwTypeError(ExceptionMessages::failedToExecute(\"{name}\", \"{}\", \"No function was found that matched the signature provided.\"), info.GetIsolate());",
            record.interface_name
        ))
    })
}

fn method_callback(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    method: &OperationRecord,
    suffix: &str,
) -> fmt::Result {
    let name = &method.name;
    let stem = method.function_stem();
    w.function(format!("static void {stem}MethodCallback{suffix}{METHOD_SIGNATURE}"), |w| {
        w.line("TRACE_EVENT_SET_SAMPLING_STATE(\"Blink\", \"DOMMethod\");")?;
        use_counters(w, method.deprecate_as.as_deref(), method.measure_as.as_deref())?;
        if method.activity_logging_world_list.iter().any(|s| s == suffix) {
            w.line("Vector<v8::Handle<v8::Value> > loggerArgs = toNativeArguments<v8::Handle<v8::Value> >(info, 0);")?;
            activity_log(
                w,
                &format!("{}.{name}", record.interface_name),
                "info.Length(), loggerArgs.data()",
                "Method",
            )?;
        }
        if method.is_custom {
            w.line(format!("{}::{stem}MethodCustom(info);", record.v8_class))?;
        } else {
            w.line(format!("{}::{stem}Method{suffix}(info);", internal_namespace(record)))?;
        }
        w.line("TRACE_EVENT_SET_SAMPLING_STATE(\"V8\", \"Execution\");")
    })
}

// ══════════════════════════════════════════════════════════════════════════════
// Shared snippets
// ══════════════════════════════════════════════════════════════════════════════

pub(crate) fn internal_namespace(record: &InterfaceRecord) -> String {
    format!("{}V8Internal", record.cpp_class)
}

fn receiver(w: &mut CodeWriter, record: &InterfaceRecord) -> fmt::Result {
    w.line(format!(
        "{}* imp = {}::toNative(info.Holder());",
        record.cpp_class, record.v8_class
    ))
}

fn not_enough_arguments(
    w: &mut CodeWriter,
    record: &InterfaceRecord,
    name: &str,
    required: usize,
) -> fmt::Result {
    w.block(format!("if (UNLIKELY(info.Length() < {required}))"), |w| {
        w.line(format!(
            "throwTypeError(ExceptionMessages::failedToExecute(\"{name}\", \"{}\", ExceptionMessages::notEnoughArguments({required}, info.Length())), info.GetIsolate());",
            record.interface_name
        ))?;
        w.line("return;")
    })
}

fn use_counters(w: &mut CodeWriter, deprecate_as: Option<&str>, measure_as: Option<&str>) -> fmt::Result {
    if let Some(feature) = deprecate_as {
        w.line(format!(
            "UseCounter::countDeprecation(activeExecutionContext(), UseCounter::{feature});"
        ))?;
    }
    if let Some(feature) = measure_as {
        w.line(format!("UseCounter::count(activeDOMWindow(), UseCounter::{feature});"))?;
    }
    Ok(())
}

fn activity_log(w: &mut CodeWriter, api: &str, arguments: &str, kind: &str) -> fmt::Result {
    w.line("V8PerContextData* contextData = V8PerContextData::from(info.GetIsolate()->GetCurrentContext());")?;
    w.line("if (contextData && contextData->activityLogger())")?;
    w.line(format!(
        "    contextData->activityLogger()->log(\"{api}\", {arguments}, \"{kind}\");"
    ))
}
