//! Declaration unit (`V8<Interface>.h`).

use idlc_types::record::InterfaceRecord;

use crate::error::CodegenResult;
use crate::writer::CodeWriter;
use crate::{implementation_include, GENERATED_BANNER};

/// Render the declaration unit for `record`.
pub fn render_header(record: &InterfaceRecord) -> CodegenResult<String> {
    let mut w = CodeWriter::new();
    let v8 = &record.v8_class;
    let guard = format!("{v8}_h");

    w.line(GENERATED_BANNER)?;
    w.blank()?;
    w.directive(format!("#ifndef {guard}"))?;
    w.directive(format!("#define {guard}"))?;
    w.blank()?;
    w.conditional(record.conditional_string.as_deref(), |w| {
        w.directive(format!("#include \"{}\"", implementation_include(record)))?;
        for include in &record.header_includes {
            w.directive(format!("#include \"{include}\""))?;
        }
        w.blank()?;
        w.line("namespace WebCore {")?;
        w.blank()?;
        class_declaration(w, record)?;
        w.blank()?;
        wrap_and_to_v8(w, record)?;
        w.blank()?;
        w.line("}")
    })?;
    w.directive(format!("#endif // {guard}"))?;
    Ok(w.finish())
}

fn class_declaration(w: &mut CodeWriter, record: &InterfaceRecord) -> std::fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    w.line(format!("class {v8} {{"))?;
    w.line("public:")?;
    w.depth_scope(|w| {
        w.line("static bool HasInstance(v8::Handle<v8::Value>, v8::Isolate*, WrapperWorldType);")?;
        w.line("static bool HasInstanceInAnyWorld(v8::Handle<v8::Value>, v8::Isolate*);")?;
        w.line("static v8::Handle<v8::FunctionTemplate> GetTemplate(v8::Isolate*, WrapperWorldType);")?;
        w.function(format!("static {cpp}* toNative(v8::Handle<v8::Object> object)"), |w| {
            w.line("return fromInternalPointer(object->GetAlignedPointerFromInternalField(v8DOMWrapperObjectIndex));")
        })?;
        w.line("static void derefObject(void*);")?;
        w.line("static const WrapperTypeInfo info;")?;
        if record.is_active_dom_object {
            w.line("static ActiveDOMObject* toActiveDOMObject(v8::Handle<v8::Object>);")?;
        }
        if record.has_visit_dom_wrapper {
            w.line("static void visitDOMWrapper(void*, const v8::Persistent<v8::Object>&, v8::Isolate*);")?;
        }

        // ── Hand-written entry points ──
        for method in record.methods.iter().filter(|m| m.is_custom) {
            if method.overload_index.map_or(true, |index| index == 1) {
                w.conditional(method.conditional_string.as_deref(), |w| {
                    w.line(format!(
                        "static void {}MethodCustom(const v8::FunctionCallbackInfo<v8::Value>&);",
                        method.function_stem()
                    ))
                })?;
            }
        }
        for attribute in &record.attributes {
            if !attribute.has_custom_getter && !attribute.has_custom_setter {
                continue;
            }
            w.conditional(attribute.conditional_string.as_deref(), |w| {
                if attribute.has_custom_getter {
                    w.line(format!(
                        "static void {}AttributeGetterCustom(v8::Local<v8::String> name, const v8::PropertyCallbackInfo<v8::Value>&);",
                        attribute.name
                    ))?;
                }
                if attribute.has_custom_setter {
                    w.line(format!(
                        "static void {}AttributeSetterCustom(v8::Local<v8::String> name, v8::Local<v8::Value>, const v8::PropertyCallbackInfo<void>&);",
                        attribute.name
                    ))?;
                }
                Ok(())
            })?;
        }
        if record.has_constructor || record.has_custom_constructor || record.has_event_constructor {
            w.line("static void constructorCallback(const v8::FunctionCallbackInfo<v8::Value>&);")?;
        }
        if record.has_custom_constructor {
            w.line("static void constructorCustom(const v8::FunctionCallbackInfo<v8::Value>&);")?;
        }
        if record.has_custom_legacy_call_as_function {
            w.line("static void legacyCallCustom(const v8::FunctionCallbackInfo<v8::Value>&);")?;
        }

        w.line("static const int internalFieldCount = v8DefaultWrapperInternalFieldCount + 0;")?;
        w.function(format!("static inline void* toInternalPointer({cpp}* impl)"), |w| {
            w.line("return impl;")
        })?;
        w.function(format!("static inline {cpp}* fromInternalPointer(void* object)"), |w| {
            w.line(format!("return static_cast<{cpp}*>(object);"))
        })?;
        if record.has_per_context_enabled_attributes {
            w.line(format!(
                "static void installPerContextEnabledProperties(v8::Handle<v8::Object>, {cpp}*, v8::Isolate*);"
            ))?;
        } else {
            w.line(format!(
                "static void installPerContextEnabledProperties(v8::Handle<v8::Object>, {cpp}*, v8::Isolate*) {{ }}"
            ))?;
        }
        if record.has_per_context_enabled_methods {
            w.line("static void installPerContextEnabledMethods(v8::Handle<v8::Object>, v8::Isolate*);")
        } else {
            w.line("static void installPerContextEnabledMethods(v8::Handle<v8::Object>, v8::Isolate*) { }")
        }
    })?;
    w.line("private:")?;
    w.depth_scope(|w| {
        w.line(format!(
            "friend v8::Handle<v8::Object> wrap({cpp}*, v8::Handle<v8::Object> creationContext, v8::Isolate*);"
        ))?;
        w.line(format!(
            "static v8::Handle<v8::Object> createWrapper(PassRefPtr<{cpp}>, v8::Handle<v8::Object> creationContext, v8::Isolate*);"
        ))
    })?;
    w.line("};")
}

fn wrap_and_to_v8(w: &mut CodeWriter, record: &InterfaceRecord) -> std::fmt::Result {
    let v8 = &record.v8_class;
    let cpp = &record.cpp_class;
    let wrap_signature = format!(
        "v8::Handle<v8::Object> wrap({cpp}* impl, v8::Handle<v8::Object> creationContext, v8::Isolate* isolate)"
    );
    if record.has_custom_wrap {
        w.line(format!("{wrap_signature};"))?;
    } else {
        w.function(format!("inline {wrap_signature}"), |w| {
            w.line("ASSERT(impl);")?;
            for special in &record.special_wrap_for {
                w.line(format!("if (impl->is{special}())"))?;
                w.line(format!("    return wrap(to{special}(impl), creationContext, isolate);"))?;
            }
            w.line(format!("ASSERT(!DOMDataStore::containsWrapper<{v8}>(impl, isolate));"))?;
            w.line(format!("return {v8}::createWrapper(impl, creationContext, isolate);"))
        })?;
    }
    w.blank()?;

    let to_v8_signature = format!(
        "v8::Handle<v8::Value> toV8({cpp}* impl, v8::Handle<v8::Object> creationContext, v8::Isolate* isolate)"
    );
    if record.has_custom_to_v8 {
        w.line(format!("{to_v8_signature};"))?;
    } else {
        w.function(format!("inline {to_v8_signature}"), |w| {
            w.line("if (UNLIKELY(!impl))")?;
            w.line("    return v8NullWithCheck(isolate);")?;
            w.line(format!(
                "v8::Handle<v8::Value> wrapper = DOMDataStore::getWrapper<{v8}>(impl, isolate);"
            ))?;
            w.line("if (!wrapper.IsEmpty())")?;
            w.line("    return wrapper;")?;
            w.line("return wrap(impl, creationContext, isolate);")
        })?;
    }
    w.blank()?;

    w.line("template<typename CallbackInfo>")?;
    w.function(
        format!("inline void v8SetReturnValue(const CallbackInfo& callbackInfo, {cpp}* impl)"),
        |w| {
            w.line("if (UNLIKELY(!impl)) {")?;
            w.line("    v8SetReturnValueNull(callbackInfo);")?;
            w.line("    return;")?;
            w.line("}")?;
            w.line(format!(
                "if (DOMDataStore::setReturnValueFromWrapper<{v8}>(callbackInfo.GetReturnValue(), impl))"
            ))?;
            w.line("    return;")?;
            w.line("v8::Handle<v8::Object> wrapper = wrap(impl, callbackInfo.Holder(), callbackInfo.GetIsolate());")?;
            w.line("v8SetReturnValue(callbackInfo, wrapper);")
        },
    )?;
    w.blank()?;

    w.line("template<class CallbackInfo, class Wrappable>")?;
    w.function(
        format!(
            "inline void v8SetReturnValueFast(const CallbackInfo& callbackInfo, {cpp}* impl, Wrappable* wrappable)"
        ),
        |w| {
            w.line("if (UNLIKELY(!impl)) {")?;
            w.line("    v8SetReturnValueNull(callbackInfo);")?;
            w.line("    return;")?;
            w.line("}")?;
            w.line(format!(
                "if (DOMDataStore::setReturnValueFromWrapperFast<{v8}>(callbackInfo.GetReturnValue(), impl, callbackInfo.Holder(), wrappable))"
            ))?;
            w.line("    return;")?;
            w.line("v8::Handle<v8::Object> wrapper = wrap(impl, callbackInfo.Holder(), callbackInfo.GetIsolate());")?;
            w.line("v8SetReturnValue(callbackInfo, wrapper);")
        },
    )?;
    w.blank()?;

    w.function(
        format!(
            "inline v8::Handle<v8::Value> toV8(PassRefPtr<{cpp}> impl, v8::Handle<v8::Object> creationContext, v8::Isolate* isolate)"
        ),
        |w| w.line("return toV8(impl.get(), creationContext, isolate);"),
    )
}
